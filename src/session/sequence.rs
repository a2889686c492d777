use std::ops::ControlFlow;

use crate::assets::loader::{ImageLoader, ImageRef};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{KarmaError, KarmaResult};
use crate::render::compositor::{RenderedFrame, SlideRenderer, TransitionPass, TransitionSpec};

/// Outcome of one pass over the image list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SequenceStats {
    /// Images in the input list.
    pub images_total: usize,
    /// Images whose transition ran to its settled frame.
    pub images_rendered: usize,
    /// Labels of images skipped after a load error.
    pub skipped: Vec<String>,
    /// Frames handed to the sink.
    pub frames: u64,
    /// Sum of the rendered transitions' clock time, loader latency excluded.
    pub elapsed_ms: f64,
    /// Whether the sink stopped the sequence early.
    pub stopped: bool,
}

/// Run one transition per image, strictly in order, feeding every frame to `sink`.
///
/// Frames carry a sequence-wide [`FrameIndex`]. An image that fails to load is logged, recorded
/// in [`SequenceStats::skipped`] and skipped. Any other error ends the sequence. The sink can
/// stop the sequence by returning [`ControlFlow::Break`].
pub fn run_sequence<F>(
    renderer: &SlideRenderer,
    loader: &dyn ImageLoader,
    images: &[ImageRef],
    transition: TransitionSpec,
    fps: Fps,
    mut sink: F,
) -> KarmaResult<SequenceStats>
where
    F: FnMut(FrameIndex, RenderedFrame) -> KarmaResult<ControlFlow<()>>,
{
    transition.validate()?;
    let mut stats = SequenceStats {
        images_total: images.len(),
        ..SequenceStats::default()
    };

    for (pos, image) in images.iter().enumerate() {
        let mut pass = TransitionPass::new(renderer, image.clone(), transition, fps);
        match pass.load(loader) {
            Ok(()) => {}
            Err(KarmaError::Load(msg)) => {
                tracing::warn!(image = %image.label(), index = pos, "skipping image: {msg}");
                stats.skipped.push(image.label());
                continue;
            }
            Err(e) => return Err(e),
        }

        while let Some(rendered) = pass.next_frame() {
            let rendered = rendered?;
            let terminal_elapsed = rendered.tick.terminal.then_some(rendered.tick.elapsed_ms);
            let idx = FrameIndex(stats.frames);
            stats.frames += 1;
            if let Some(ms) = terminal_elapsed {
                stats.elapsed_ms += ms;
            }
            if sink(idx, rendered)?.is_break() {
                stats.stopped = true;
                return Ok(stats);
            }
        }
        stats.images_rendered += 1;
    }

    tracing::debug!(
        images = stats.images_rendered,
        skipped = stats.skipped.len(),
        frames = stats.frames,
        "sequence complete"
    );
    Ok(stats)
}

#[cfg(test)]
#[path = "../../tests/unit/session/sequence.rs"]
mod tests;
