use std::f64::consts::PI;

use crate::foundation::core::{Affine, Point};
use crate::foundation::math::clamp01;

/// Horizontal travel of [`Effect::Slide`] at `p = 0`, in pixels.
pub const SLIDE_OFFSET_PX: f64 = 300.0;
/// Peak vertical lift of [`Effect::Bounce`] at `p = 0.5`, in pixels.
pub const BOUNCE_AMPLITUDE_PX: f64 = 100.0;
/// Gaussian blur standard deviation of [`Effect::Blur`] at `p = 0`, in pixels.
pub const BLUR_MAX_PX: f64 = 15.0;

/// The closed set of slide transitions.
///
/// Every effect is a pure function of progress `p` and the frame center. Names are matched
/// case-insensitively; an unrecognized name resolves to [`Effect::None`], which draws the image
/// under the fit policy with no transform.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(from = "String", into = "String")]
pub enum Effect {
    /// Uniform scale `0.8 + 0.2p` around the frame center.
    Zoom,
    /// Opacity `p`.
    #[default]
    Fade,
    /// Horizontal offset `(1 - p) * 300px`, centered at `p = 1`.
    Slide,
    /// Gaussian blur of `15 * (1 - p)` px, sharp at `p = 1`.
    Blur,
    /// Full turn, rotation `2πp`.
    Spin,
    /// Horizontal scale `cos(πp)`.
    ///
    /// Passes through zero at `p = 0.5` (the image is edge-on for a frame and disappears) and
    /// ends mirrored at `p = 1`. Both are intentional.
    Flip3d,
    /// Horizontal scale `p`.
    ScaleX,
    /// Vertical scale `p`.
    ScaleY,
    /// Vertical lift `-sin(πp) * 100px`, back on baseline at both ends.
    Bounce,
    /// Rotation `(p - 0.5)π`.
    Rotate3d,
    /// Vertical scale `p`; same law as [`Effect::ScaleY`] under a separate name.
    Shutter,
    /// No transform. Also what unknown names resolve to.
    None,
}

/// Drawing parameters produced by an effect for one progress value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectTransform {
    /// Transform in frame pixel space, applied after the fit policy placement.
    pub affine: Affine,
    /// Layer opacity in `[0, 1]`.
    pub opacity: f64,
    /// Gaussian blur standard deviation in pixels (`0` = sharp).
    pub blur_px: f64,
}

impl EffectTransform {
    /// The identity transform: fully opaque, sharp, unmoved.
    pub const IDENTITY: EffectTransform = EffectTransform {
        affine: Affine::IDENTITY,
        opacity: 1.0,
        blur_px: 0.0,
    };

    fn with_affine(affine: Affine) -> Self {
        Self {
            affine,
            ..Self::IDENTITY
        }
    }

    /// Whether the transform collapses the image to zero area.
    pub fn is_degenerate(&self) -> bool {
        self.affine.determinant().abs() < 1e-9
    }
}

impl Effect {
    /// All named effects in catalog order (excludes [`Effect::None`]).
    pub const ALL: [Effect; 11] = [
        Effect::Zoom,
        Effect::Fade,
        Effect::Slide,
        Effect::Blur,
        Effect::Spin,
        Effect::Flip3d,
        Effect::ScaleX,
        Effect::ScaleY,
        Effect::Bounce,
        Effect::Rotate3d,
        Effect::Shutter,
    ];

    /// Catalog name of this effect.
    pub fn name(self) -> &'static str {
        match self {
            Effect::Zoom => "zoom",
            Effect::Fade => "fade",
            Effect::Slide => "slide",
            Effect::Blur => "blur",
            Effect::Spin => "spin",
            Effect::Flip3d => "flip3d",
            Effect::ScaleX => "scalex",
            Effect::ScaleY => "scaley",
            Effect::Bounce => "bounce",
            Effect::Rotate3d => "rotate3d",
            Effect::Shutter => "shutter",
            Effect::None => "none",
        }
    }

    /// Strict lookup: `None` (the Option) for names outside the catalog.
    pub fn lookup(name: &str) -> Option<Effect> {
        let name = name.trim().to_ascii_lowercase();
        if name == "none" {
            return Some(Effect::None);
        }
        Effect::ALL.into_iter().find(|e| e.name() == name)
    }

    /// Lenient lookup: unknown names resolve to [`Effect::None`].
    pub fn from_name(name: &str) -> Effect {
        match Effect::lookup(name) {
            Some(effect) => effect,
            None => {
                tracing::debug!(effect = name, "unknown effect name, drawing without transform");
                Effect::None
            }
        }
    }

    /// Compute the drawing transform for progress `p` around `center`.
    ///
    /// `p` is clamped into `[0, 1]`.
    pub fn transform(self, p: f64, center: Point) -> EffectTransform {
        let p = clamp01(p);
        let about_center = |local: Affine| {
            Affine::translate(center.to_vec2()) * local * Affine::translate(-center.to_vec2())
        };

        match self {
            Effect::Zoom => EffectTransform::with_affine(about_center(Affine::scale(0.8 + 0.2 * p))),
            Effect::Fade => EffectTransform {
                opacity: p,
                ..EffectTransform::IDENTITY
            },
            Effect::Slide => {
                EffectTransform::with_affine(Affine::translate(((1.0 - p) * SLIDE_OFFSET_PX, 0.0)))
            }
            Effect::Blur => EffectTransform {
                blur_px: BLUR_MAX_PX * (1.0 - p),
                ..EffectTransform::IDENTITY
            },
            Effect::Spin => EffectTransform::with_affine(about_center(Affine::rotate(2.0 * PI * p))),
            Effect::Flip3d => EffectTransform::with_affine(about_center(
                Affine::scale_non_uniform((PI * p).cos(), 1.0),
            )),
            Effect::ScaleX => {
                EffectTransform::with_affine(about_center(Affine::scale_non_uniform(p, 1.0)))
            }
            Effect::ScaleY | Effect::Shutter => {
                EffectTransform::with_affine(about_center(Affine::scale_non_uniform(1.0, p)))
            }
            Effect::Bounce => EffectTransform::with_affine(Affine::translate((
                0.0,
                (PI * p).sin() * -BOUNCE_AMPLITUDE_PX,
            ))),
            Effect::Rotate3d => {
                EffectTransform::with_affine(about_center(Affine::rotate((p - 0.5) * PI)))
            }
            Effect::None => EffectTransform::IDENTITY,
        }
    }
}

impl From<String> for Effect {
    fn from(name: String) -> Self {
        Effect::from_name(&name)
    }
}

impl From<Effect> for String {
    fn from(effect: Effect) -> Self {
        effect.name().to_owned()
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/catalog.rs"]
mod tests;
