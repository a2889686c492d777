use std::iter::FusedIterator;

use crate::foundation::core::Fps;
use crate::foundation::error::{KarmaError, KarmaResult};

/// One render request produced by a [`TransitionClock`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    /// 0-based tick number within the transition.
    pub index: u64,
    /// Transition time this tick shows, in milliseconds (`progress * duration`).
    pub elapsed_ms: f64,
    /// Normalized progress in `[0, 1]`.
    pub progress: f64,
    /// Whether this is the tick that settles the transition at `progress == 1`.
    pub terminal: bool,
}

/// Finite, non-restartable frame clock for one transition.
///
/// The clock starts when the image has been decoded, so loader latency never counts against the
/// duration. A transition spans [`TransitionClock::frame_count`] ticks at the capture rate. The
/// first tick shows the transition at its start (`progress == 0`), progress advances evenly, and
/// the last tick reports `progress == 1` exactly. No tick follows it.
#[derive(Clone, Debug)]
pub struct TransitionClock {
    duration_ms: u32,
    fps: Fps,
    next: u64,
    done: bool,
}

impl TransitionClock {
    /// Create a clock for a transition lasting `duration_ms` at `fps`.
    pub fn new(duration_ms: u32, fps: Fps) -> KarmaResult<Self> {
        if duration_ms == 0 {
            return Err(KarmaError::validation("transition duration_ms must be > 0"));
        }
        if fps.num == 0 || fps.den == 0 {
            return Err(KarmaError::validation("fps must be non-zero"));
        }
        Ok(Self {
            duration_ms,
            fps,
            next: 0,
            done: false,
        })
    }

    /// Total number of ticks this clock yields.
    pub fn frame_count(&self) -> u64 {
        // Smallest k with k * 1000 * den >= duration * num.
        let num = u64::from(self.duration_ms) * u64::from(self.fps.num);
        let den = 1000 * u64::from(self.fps.den);
        num.div_ceil(den).max(1)
    }

    fn progress_of(&self, k: u64, n: u64) -> f64 {
        if n <= 1 {
            return 1.0;
        }
        (k as f64 / (n - 1) as f64).clamp(0.0, 1.0)
    }
}

impl Iterator for TransitionClock {
    type Item = Tick;

    fn next(&mut self) -> Option<Tick> {
        if self.done {
            return None;
        }
        let k = self.next;
        let n = self.frame_count();
        self.next += 1;

        let terminal = k + 1 >= n;
        let progress = if terminal {
            self.done = true;
            1.0
        } else {
            self.progress_of(k, n)
        };

        Some(Tick {
            index: k,
            elapsed_ms: progress * f64::from(self.duration_ms),
            progress,
            terminal,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let remaining = self.frame_count().saturating_sub(self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl FusedIterator for TransitionClock {}

#[cfg(test)]
#[path = "../../tests/unit/render/clock.rs"]
mod tests;
