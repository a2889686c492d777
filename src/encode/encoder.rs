use std::path::PathBuf;

use crate::encode::chunks::ChunkSender;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{KarmaError, KarmaResult};
use crate::render::frame::FrameRGBA;

/// Raw PCM audio input muxed alongside the video stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioInputConfig {
    /// Path to interleaved `f32le` PCM data.
    pub path: PathBuf,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
}

/// Stream parameters fixed when an encoder starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Capture rate.
    pub fps: Fps,
    /// Target video bitrate in bits per second.
    pub bitrate_bps: u64,
    /// Background track, already trimmed to start with the first frame.
    pub audio: Option<AudioInputConfig>,
}

impl EncoderConfig {
    /// Check the parameters every backend relies on.
    pub fn validate(&self) -> KarmaResult<()> {
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(KarmaError::validation("fps must be non-zero"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(KarmaError::validation(
                "encoder width/height must be non-zero",
            ));
        }
        if self.bitrate_bps == 0 {
            return Err(KarmaError::validation("encoder bitrate must be > 0"));
        }
        if let Some(audio) = self.audio.as_ref()
            && (audio.sample_rate == 0 || audio.channels == 0)
        {
            return Err(KarmaError::validation(
                "audio sample_rate and channels must be non-zero when audio is enabled",
            ));
        }
        Ok(())
    }
}

/// A streaming encoder.
///
/// Lifecycle: `begin` once, `push_frame` for each frame in strictly increasing index order, then
/// exactly one of `finish` or `abort`. Encoded output is emitted through the [`ChunkSender`]
/// handed to `begin`; the encoder drops it when it ends so the assembler can complete.
pub trait VideoEncoder: Send {
    /// Start the stream.
    fn begin(&mut self, cfg: EncoderConfig, chunks: ChunkSender) -> KarmaResult<()>;
    /// Encode one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> KarmaResult<()>;
    /// Flush every pending chunk and close the stream.
    fn finish(&mut self) -> KarmaResult<()>;
    /// Stop immediately, discarding buffered output. Must be safe to call in any state.
    fn abort(&mut self);
}

/// Creates one encoder per export session.
pub trait EncoderFactory: Send + Sync {
    /// Build a fresh, not yet started encoder.
    fn create(&self) -> KarmaResult<Box<dyn VideoEncoder>>;
}

impl<F> EncoderFactory for F
where
    F: Fn() -> KarmaResult<Box<dyn VideoEncoder>> + Send + Sync,
{
    fn create(&self) -> KarmaResult<Box<dyn VideoEncoder>> {
        self()
    }
}
