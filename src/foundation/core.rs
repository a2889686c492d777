use crate::foundation::error::{KarmaError, KarmaResult};

pub use kurbo::{Affine, Point, Rect};

/// Absolute 0-based frame index in output video space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// The capture rate used for exports unless configured otherwise.
    pub const DEFAULT: Fps = Fps { num: 60, den: 1 };

    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> KarmaResult<Self> {
        if den == 0 {
            return Err(KarmaError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(KarmaError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in milliseconds.
    pub fn frame_duration_ms(self) -> f64 {
        1000.0 * f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to milliseconds.
    pub fn frames_to_ms(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_ms()
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Default export canvas (720p, 16:9).
    pub const HD: Canvas = Canvas {
        width: 1280,
        height: 720,
    };

    /// Largest canvas with aspect `ratio_w:ratio_h` that fits inside `avail_w x avail_h`.
    ///
    /// Both sides are rounded down to even numbers, as required by 4:2:0 video encoders.
    pub fn fit_aspect(avail_w: u32, avail_h: u32, ratio_w: u32, ratio_h: u32) -> KarmaResult<Self> {
        if avail_w < 2 || avail_h < 2 || ratio_w == 0 || ratio_h == 0 {
            return Err(KarmaError::validation(
                "fit_aspect requires a non-empty area and a non-zero ratio",
            ));
        }
        let target = f64::from(ratio_w) / f64::from(ratio_h);
        let (w, h) = if f64::from(avail_w) / f64::from(avail_h) > target {
            let h = f64::from(avail_h);
            (h * target, h)
        } else {
            let w = f64::from(avail_w);
            (w, w / target)
        };
        let even = |v: f64| ((v.floor() as u32) / 2 * 2).max(2);
        Ok(Self {
            width: even(w),
            height: even(h),
        })
    }

    /// Frame midpoint in pixel space.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Full-frame rectangle.
    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Byte length of one RGBA8 frame.
    pub fn rgba8_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::HD
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
