use std::path::Path;

use crate::foundation::error::{KarmaError, KarmaResult};

/// Sample rate the background track is decoded to and encoded from.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Decoded interleaved floating-point PCM.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.interleaved_f32.len() / usize::from(self.channels)
    }

    /// Length in seconds.
    pub fn duration_sec(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Decode any audio file `ffmpeg` understands into stereo interleaved `f32` PCM.
///
/// Every failure, including a missing `ffmpeg` binary, is a [`KarmaError::AudioDecode`].
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> KarmaResult<AudioPcm> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| KarmaError::audio_decode(format!("failed to run ffmpeg: {e}")))?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        return Err(KarmaError::audio_decode(format!(
            "ffmpeg could not decode '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    let pcm = f32le_bytes_to_samples(&out.stdout)?;
    if pcm.is_empty() {
        return Err(KarmaError::audio_decode(format!(
            "'{}' has no audio stream",
            path.display()
        )));
    }

    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32: pcm,
    })
}

fn f32le_bytes_to_samples(bytes: &[u8]) -> KarmaResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(KarmaError::audio_decode(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
