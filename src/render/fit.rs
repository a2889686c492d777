use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::{KarmaError, KarmaResult};

/// Overscale applied by [`FitMode::CoverWithMargin`] so transform-induced movement never
/// exposes a frame edge.
pub const COVER_OVERSCALE: f64 = 1.05;
/// Width of the white frame drawn around a letterboxed image.
pub const LETTERBOX_STROKE_PX: f64 = 5.0;

/// How an image maps onto the output frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitMode {
    /// Fit fully inside the margin-reduced frame, framed by a white border on black.
    ContainWithLetterbox,
    /// Cover the whole frame, cropping overflow, centered.
    #[default]
    CoverFill,
    /// [`FitMode::CoverFill`] scaled up by [`COVER_OVERSCALE`].
    CoverWithMargin,
}

impl std::str::FromStr for FitMode {
    type Err = KarmaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "contain" | "contain-with-letterbox" | "letterbox" => Ok(FitMode::ContainWithLetterbox),
            "cover" | "cover-fill" => Ok(FitMode::CoverFill),
            "cover-with-margin" => Ok(FitMode::CoverWithMargin),
            other => Err(KarmaError::validation(format!("unknown fit mode '{other}'"))),
        }
    }
}

/// Fit policy shared by every slide of a session.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FitPolicy {
    /// Placement rule.
    pub mode: FitMode,
    /// Margin on each side as a fraction of the frame, in `[0, 1)`.
    ///
    /// Only [`FitMode::ContainWithLetterbox`] shrinks the target box by it.
    pub margin_fraction: f64,
}

impl Default for FitPolicy {
    fn default() -> Self {
        Self {
            mode: FitMode::default(),
            margin_fraction: 0.02,
        }
    }
}

/// Where one image lands on the frame before the effect transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Destination rectangle of the scaled image (may extend past the frame when covering).
    pub image_rect: Rect,
    /// Outer rectangle of the letterbox border, when the policy draws one.
    pub border_rect: Option<Rect>,
}

impl FitPolicy {
    /// Build a policy with the default margin.
    pub fn new(mode: FitMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Validate the margin range.
    pub fn validate(&self) -> KarmaResult<()> {
        if !self.margin_fraction.is_finite() || !(0.0..1.0).contains(&self.margin_fraction) {
            return Err(KarmaError::validation(
                "fit margin_fraction must be within [0, 1)",
            ));
        }
        Ok(())
    }

    /// Resolve the placement of a `width x height` image on `canvas`, centered.
    pub fn place(&self, width: u32, height: u32, canvas: Canvas) -> Placement {
        let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
        let (iw, ih) = (f64::from(width.max(1)), f64::from(height.max(1)));

        let scale = match self.mode {
            FitMode::ContainWithLetterbox => {
                let m = self.margin_fraction.clamp(0.0, 0.49);
                let max_w = cw * (1.0 - 2.0 * m);
                let max_h = ch * (1.0 - 2.0 * m);
                (max_w / iw).min(max_h / ih)
            }
            FitMode::CoverFill => (cw / iw).max(ch / ih),
            FitMode::CoverWithMargin => (cw / iw).max(ch / ih) * COVER_OVERSCALE,
        };

        let (w, h) = (iw * scale, ih * scale);
        let x = (cw - w) / 2.0;
        let y = (ch - h) / 2.0;
        let image_rect = Rect::new(x, y, x + w, y + h);
        let border_rect = match self.mode {
            FitMode::ContainWithLetterbox => {
                Some(image_rect.inflate(LETTERBOX_STROKE_PX, LETTERBOX_STROKE_PX))
            }
            FitMode::CoverFill | FitMode::CoverWithMargin => None,
        };

        Placement {
            image_rect,
            border_rect,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/fit.rs"]
mod tests;
