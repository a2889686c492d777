use std::path::Path;

use anyhow::Context as _;

use crate::audio::decode::AudioPcm;
use crate::foundation::error::{KarmaError, KarmaResult};

/// Copy `[start_sec, end_sec)` of `pcm` into a fresh buffer starting at sample zero.
///
/// The interval is clipped to the source length. An empty interval, before or after clipping, is
/// a [`KarmaError::AudioDecode`] so the caller falls back to a silent export.
pub fn trim_interleaved(pcm: &AudioPcm, start_sec: f64, end_sec: f64) -> KarmaResult<AudioPcm> {
    if !start_sec.is_finite() || !end_sec.is_finite() || start_sec < 0.0 {
        return Err(KarmaError::audio_decode(format!(
            "invalid audio interval [{start_sec}, {end_sec})"
        )));
    }
    if end_sec - start_sec <= 0.0 {
        return Err(KarmaError::audio_decode(format!(
            "audio interval [{start_sec}, {end_sec}) is empty"
        )));
    }
    if pcm.channels == 0 || pcm.sample_rate == 0 {
        return Err(KarmaError::audio_decode("audio has no channels or sample rate"));
    }

    let rate = f64::from(pcm.sample_rate);
    let total = pcm.frames();
    let first = ((start_sec * rate).round() as usize).min(total);
    let last = ((end_sec * rate).round() as usize).min(total);
    if last <= first {
        return Err(KarmaError::audio_decode(format!(
            "audio interval [{start_sec}, {end_sec}) lies past the end of a {:.3}s track",
            pcm.duration_sec()
        )));
    }

    let ch = usize::from(pcm.channels);
    Ok(AudioPcm {
        sample_rate: pcm.sample_rate,
        channels: pcm.channels,
        interleaved_f32: pcm.interleaved_f32[first * ch..last * ch].to_vec(),
    })
}

/// Write interleaved `f32` PCM samples to a raw little-endian `.f32le` file.
pub fn write_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> KarmaResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create audio directory '{}'", parent.display())
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes)
        .with_context(|| format!("failed to write audio file '{}'", out_path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/audio/trim.rs"]
mod tests;
