use crate::assets::decode::DecodedImage;
use crate::assets::loader::{ImageLoader, ImageRef};
use crate::effects::catalog::Effect;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{KarmaError, KarmaResult};
use crate::render::clock::{Tick, TransitionClock};
use crate::render::cpu::{CpuRasterizer, SlidePaint};
use crate::render::fit::{FitPolicy, Placement};
use crate::render::frame::FrameRGBA;

/// Effect and duration shared by every image of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransitionSpec {
    /// Catalog effect; unknown names deserialize to [`Effect::None`].
    pub effect: Effect,
    /// Length of one transition in milliseconds, `> 0`.
    pub duration_ms: u32,
}

impl TransitionSpec {
    /// Build a spec; call [`TransitionSpec::validate`] before use.
    pub fn new(effect: Effect, duration_ms: u32) -> Self {
        Self {
            effect,
            duration_ms,
        }
    }

    /// Reject a zero duration.
    pub fn validate(&self) -> KarmaResult<()> {
        if self.duration_ms == 0 {
            return Err(KarmaError::validation("transition duration_ms must be > 0"));
        }
        Ok(())
    }

    /// Progress for `elapsed_ms` since the transition started, clamped into `[0, 1]`.
    pub fn progress_at(&self, elapsed_ms: f64) -> f64 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        (elapsed_ms / f64::from(self.duration_ms)).clamp(0.0, 1.0)
    }
}

/// An image resolved onto the canvas and ready to be drawn at any progress.
pub struct PreparedSlide {
    paint: SlidePaint,
    placement: Placement,
}

impl PreparedSlide {
    /// Where the image lands before the effect transform.
    pub fn placement(&self) -> Placement {
        self.placement
    }
}

/// Draws a prepared slide for a given effect and progress.
///
/// Rendering is a pure function of `(slide, effect, progress)`: nothing is carried between calls
/// and every call starts from a cleared frame.
pub struct SlideRenderer {
    canvas: Canvas,
    fit: FitPolicy,
    raster: CpuRasterizer,
}

impl SlideRenderer {
    /// Create a renderer for `canvas`, filling behind each image with `background_rgba`.
    pub fn new(canvas: Canvas, fit: FitPolicy, background_rgba: [u8; 4]) -> KarmaResult<Self> {
        fit.validate()?;
        Ok(Self {
            canvas,
            fit,
            raster: CpuRasterizer::new(canvas, background_rgba)?,
        })
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Resolve the fit policy for `image` and upload it as a paint.
    pub fn prepare(&self, image: &DecodedImage) -> KarmaResult<PreparedSlide> {
        Ok(PreparedSlide {
            paint: SlidePaint::from_decoded(image)?,
            placement: self.fit.place(image.width, image.height, self.canvas),
        })
    }

    /// Render `slide` under `effect` at `progress`.
    pub fn render(
        &self,
        slide: &PreparedSlide,
        effect: Effect,
        progress: f64,
    ) -> KarmaResult<FrameRGBA> {
        let fx = effect.transform(progress, self.canvas.center());
        self.raster.draw(&slide.paint, &slide.placement, &fx)
    }
}

/// Where one image's transition stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionPhase {
    /// Waiting for the image to decode.
    Loading,
    /// Emitting frames from the transition clock.
    Animating,
    /// The settled frame at `progress == 1` has been produced.
    Done,
}

/// A frame produced by a [`TransitionPass`], with the tick that requested it.
#[derive(Clone, Debug)]
pub struct RenderedFrame {
    /// Clock tick for this frame.
    pub tick: Tick,
    /// Rendered pixels.
    pub frame: FrameRGBA,
}

/// One image's transition: load, then animate until the terminal tick.
///
/// The decoded image lives only as long as the pass.
pub struct TransitionPass<'r> {
    renderer: &'r SlideRenderer,
    image: ImageRef,
    transition: TransitionSpec,
    fps: Fps,
    phase: TransitionPhase,
    slide: Option<PreparedSlide>,
    clock: Option<TransitionClock>,
}

impl<'r> TransitionPass<'r> {
    /// Create a pass in [`TransitionPhase::Loading`].
    pub fn new(
        renderer: &'r SlideRenderer,
        image: ImageRef,
        transition: TransitionSpec,
        fps: Fps,
    ) -> Self {
        Self {
            renderer,
            image,
            transition,
            fps,
            phase: TransitionPhase::Loading,
            slide: None,
            clock: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// Image this pass animates.
    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    /// Number of frames the pass emits once loaded.
    pub fn frame_count(&self) -> Option<u64> {
        self.clock.as_ref().map(TransitionClock::frame_count)
    }

    /// Decode the image and start the clock.
    ///
    /// On failure the pass stays in [`TransitionPhase::Loading`] and the error is a
    /// [`KarmaError::Load`]; no retry is attempted.
    #[tracing::instrument(
        level = "debug",
        skip(self, loader),
        fields(image = %self.image.label(), effect = %self.transition.effect)
    )]
    pub fn load(&mut self, loader: &dyn ImageLoader) -> KarmaResult<()> {
        if self.phase != TransitionPhase::Loading {
            return Err(KarmaError::validation("transition pass already loaded"));
        }
        let decoded = loader.load(&self.image)?;
        let slide = self.renderer.prepare(&decoded)?;
        let clock = TransitionClock::new(self.transition.duration_ms, self.fps)?;
        tracing::debug!(
            width = decoded.width,
            height = decoded.height,
            frames = clock.frame_count(),
            "image decoded, transition clock started"
        );
        self.slide = Some(slide);
        self.clock = Some(clock);
        self.phase = TransitionPhase::Animating;
        Ok(())
    }

    /// Render the next frame, or `None` once the pass is done (or not yet loaded).
    pub fn next_frame(&mut self) -> Option<KarmaResult<RenderedFrame>> {
        if self.phase != TransitionPhase::Animating {
            return None;
        }
        let tick = self.clock.as_mut()?.next()?;
        let slide = self.slide.as_ref()?;

        let rendered = self
            .renderer
            .render(slide, self.transition.effect, tick.progress);
        if tick.terminal {
            self.phase = TransitionPhase::Done;
            self.slide = None;
        }
        tracing::trace!(tick = tick.index, progress = tick.progress, "frame");
        Some(rendered.map(|frame| RenderedFrame { tick, frame }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
