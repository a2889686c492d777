use std::sync::{Arc, Mutex, MutexGuard};

use crate::encode::chunks::ChunkSender;
use crate::encode::encoder::{EncoderConfig, VideoEncoder};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{KarmaError, KarmaResult};
use crate::render::frame::FrameRGBA;

/// Container header emitted by [`InMemoryEncoder`] on `begin`.
pub const MEMORY_HEADER: &[u8] = b"KVMEM1";

/// What an [`InMemoryEncoder`] has seen. Shared with the caller through [`EncoderRecorder`].
#[derive(Debug, Default)]
pub struct EncoderRecording {
    /// Configuration passed to `begin`.
    pub config: Option<EncoderConfig>,
    /// Frames in push order.
    pub frames: Vec<(FrameIndex, FrameRGBA)>,
    /// Whether `begin` succeeded.
    pub started: bool,
    /// Whether `finish` completed.
    pub finished: bool,
    /// Whether `abort` was called.
    pub aborted: bool,
}

/// Cloneable handle onto an [`InMemoryEncoder`]'s recording.
#[derive(Clone, Debug, Default)]
pub struct EncoderRecorder {
    inner: Arc<Mutex<EncoderRecording>>,
}

impl EncoderRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the recording for inspection.
    pub fn lock(&self) -> MutexGuard<'_, EncoderRecording> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Build an encoder that records into this handle.
    pub fn encoder(&self) -> InMemoryEncoder {
        InMemoryEncoder {
            recorder: self.clone(),
            chunks: None,
            last_idx: None,
        }
    }
}

/// Encoder that keeps every frame and emits one small chunk per frame.
///
/// Chunks are a header, one 8-byte little-endian frame index per frame, and a trailer carrying
/// the frame count, so the assembled payload is deterministic.
#[derive(Debug)]
pub struct InMemoryEncoder {
    recorder: EncoderRecorder,
    chunks: Option<ChunkSender>,
    last_idx: Option<FrameIndex>,
}

impl InMemoryEncoder {
    /// Create an encoder with a fresh recorder.
    pub fn new() -> Self {
        EncoderRecorder::new().encoder()
    }

    /// Handle onto this encoder's recording.
    pub fn recorder(&self) -> EncoderRecorder {
        self.recorder.clone()
    }
}

impl Default for InMemoryEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoEncoder for InMemoryEncoder {
    fn begin(&mut self, cfg: EncoderConfig, mut chunks: ChunkSender) -> KarmaResult<()> {
        cfg.validate()?;
        chunks.send(MEMORY_HEADER.to_vec())?;
        let mut rec = self.recorder.lock();
        rec.config = Some(cfg);
        rec.frames.clear();
        rec.started = true;
        drop(rec);
        self.chunks = Some(chunks);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> KarmaResult<()> {
        let chunks = self
            .chunks
            .as_mut()
            .ok_or_else(|| KarmaError::encoder("in-memory encoder not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(KarmaError::encoder(
                "in-memory encoder received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);
        chunks.send(idx.0.to_le_bytes().to_vec())?;
        self.recorder.lock().frames.push((idx, frame.clone()));
        Ok(())
    }

    fn finish(&mut self) -> KarmaResult<()> {
        let mut chunks = self
            .chunks
            .take()
            .ok_or_else(|| KarmaError::encoder("in-memory encoder not started"))?;
        let mut rec = self.recorder.lock();
        chunks.send((rec.frames.len() as u64).to_le_bytes().to_vec())?;
        rec.finished = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.chunks = None;
        self.recorder.lock().aborted = true;
    }
}
