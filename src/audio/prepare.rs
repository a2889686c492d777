use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::audio::decode::{AudioPcm, MIX_SAMPLE_RATE, decode_audio_f32_stereo};
use crate::audio::trim::{trim_interleaved, write_f32le_file};
use crate::encode::encoder::AudioInputConfig;
use crate::foundation::error::{KarmaError, KarmaResult};

static NEXT_TEMP_ID: AtomicU64 = AtomicU64::new(0);

/// Optional background track: play `src` from `start_sec` to `end_sec`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AudioSpec {
    /// Audio file path.
    pub src: PathBuf,
    /// Interval start in seconds, `>= 0`.
    pub start_sec: f64,
    /// Interval end in seconds, `> start_sec`.
    pub end_sec: f64,
}

impl AudioSpec {
    /// Build a spec for `src` over `[start_sec, end_sec)`.
    pub fn new(src: impl Into<PathBuf>, start_sec: f64, end_sec: f64) -> Self {
        Self {
            src: src.into(),
            start_sec,
            end_sec,
        }
    }

    /// Length of the requested interval.
    pub fn duration_sec(&self) -> f64 {
        self.end_sec - self.start_sec
    }

    /// Reject an interval that would produce no audio.
    pub fn validate(&self) -> KarmaResult<()> {
        if !self.start_sec.is_finite() || self.start_sec < 0.0 {
            return Err(KarmaError::audio_decode("audio start_sec must be >= 0"));
        }
        if !self.end_sec.is_finite() || self.duration_sec() <= 0.0 {
            return Err(KarmaError::audio_decode(format!(
                "audio interval [{}, {}) is empty",
                self.start_sec, self.end_sec
            )));
        }
        Ok(())
    }
}

/// Trimmed background audio written to a scratch file, aligned so sample zero plays with the
/// first video frame.
///
/// The scratch file is deleted on [`PreparedAudio::release`] or drop.
#[derive(Debug)]
pub struct PreparedAudio {
    path: PathBuf,
    sample_rate: u32,
    channels: u16,
    duration_sec: f64,
    guard: TempFileGuard,
}

impl PreparedAudio {
    /// Raw PCM input description for the encoder.
    pub fn input_config(&self) -> AudioInputConfig {
        AudioInputConfig {
            path: self.path.clone(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }

    /// Location of the trimmed `f32le` file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Length of the trimmed track.
    pub fn duration_sec(&self) -> f64 {
        self.duration_sec
    }

    /// Delete the scratch file now.
    pub fn release(mut self) {
        self.guard.remove();
    }
}

/// Turns an [`AudioSpec`] into a staged track for one session.
pub trait AudioPreparer: Send + Sync {
    /// Decode and trim; failures are [`KarmaError::AudioDecode`].
    fn prepare(&self, spec: &AudioSpec) -> KarmaResult<PreparedAudio>;
}

/// Preparer decoding through the system `ffmpeg`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegAudioPreparer;

impl AudioPreparer for FfmpegAudioPreparer {
    fn prepare(&self, spec: &AudioSpec) -> KarmaResult<PreparedAudio> {
        prepare_audio(spec)
    }
}

/// Decode, trim and stage the track described by `spec`.
///
/// Any failure is a [`KarmaError::AudioDecode`]; the session continues without audio.
#[tracing::instrument(level = "debug", skip(spec), fields(src = %spec.src.display()))]
pub fn prepare_audio(spec: &AudioSpec) -> KarmaResult<PreparedAudio> {
    spec.validate()?;
    let pcm = decode_audio_f32_stereo(&spec.src, MIX_SAMPLE_RATE)?;
    prepare_from_pcm(&pcm, spec)
}

/// Trim already decoded `pcm` to `spec`'s interval and stage it.
pub fn prepare_from_pcm(pcm: &AudioPcm, spec: &AudioSpec) -> KarmaResult<PreparedAudio> {
    spec.validate()?;
    let trimmed = trim_interleaved(pcm, spec.start_sec, spec.end_sec)?;

    let path = std::env::temp_dir().join(format!(
        "karma_video_audio_{}_{}.f32le",
        std::process::id(),
        NEXT_TEMP_ID.fetch_add(1, Ordering::Relaxed)
    ));
    let guard = TempFileGuard(Some(path.clone()));
    write_f32le_file(&trimmed.interleaved_f32, &path)
        .map_err(|e| KarmaError::audio_decode(format!("stage trimmed audio: {e}")))?;

    tracing::debug!(
        frames = trimmed.frames(),
        duration_sec = trimmed.duration_sec(),
        "audio prepared"
    );
    Ok(PreparedAudio {
        path,
        sample_rate: trimmed.sample_rate,
        channels: trimmed.channels,
        duration_sec: trimmed.duration_sec(),
        guard,
    })
}

#[derive(Debug)]
struct TempFileGuard(Option<PathBuf>);

impl TempFileGuard {
    fn remove(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/prepare.rs"]
mod tests;
