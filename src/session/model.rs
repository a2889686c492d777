use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::assets::loader::ImageRef;
use crate::audio::prepare::AudioSpec;
use crate::encode::ffmpeg::ensure_parent_dir;
use crate::foundation::error::KarmaResult;
use crate::render::compositor::TransitionSpec;

/// Suggested filename for every export.
pub const EXPORT_FILENAME: &str = "karma-video.webm";
/// Mime type of the exported container.
pub const EXPORT_MIME_TYPE: &str = "video/webm";

/// One export request: ordered images, one transition shared by all of them, optional audio.
#[derive(Clone, Debug)]
pub struct ExportSession {
    /// Slides in playback order.
    pub images: Vec<ImageRef>,
    /// Effect and duration applied to every slide.
    pub transition: TransitionSpec,
    /// Background track.
    pub audio: Option<AudioSpec>,
}

impl ExportSession {
    /// Session without audio.
    pub fn new(images: Vec<ImageRef>, transition: TransitionSpec) -> Self {
        Self {
            images,
            transition,
            audio: None,
        }
    }

    /// Attach a background track.
    pub fn with_audio(mut self, audio: AudioSpec) -> Self {
        self.audio = Some(audio);
        self
    }
}

/// Monotonic identifier of a started session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a started session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Frames are being rendered and encoded.
    Recording,
    /// The encoder is flushing; cancellation is no longer observed.
    Finalizing,
    /// The result was published.
    Ready,
    /// A fatal error ended the session.
    Failed,
    /// A newer session tore this one down.
    Superseded,
}

impl SessionState {
    /// Whether no further transitions can happen.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Ready | SessionState::Failed | SessionState::Superseded
        )
    }
}

/// The finalized container and where to find it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportResult {
    /// Concatenated container bytes.
    pub payload: Vec<u8>,
    /// Always [`EXPORT_MIME_TYPE`].
    pub mime_type: &'static str,
    /// Always [`EXPORT_FILENAME`].
    pub filename: &'static str,
    /// Number of encoder chunks the payload was assembled from.
    pub chunk_count: usize,
    /// Frames rendered and encoded.
    pub frames: u64,
    /// Whether an audio track was muxed.
    pub has_audio: bool,
    /// Images skipped because they failed to load.
    pub skipped_images: Vec<String>,
    /// Published file, once written with [`ExportResult::save_to`].
    pub location: Option<PathBuf>,
}

impl ExportResult {
    /// Write the payload to `<dir>/karma-video.webm`, remember and return the path.
    pub fn save_to(&mut self, dir: impl AsRef<Path>) -> KarmaResult<PathBuf> {
        let path = dir.as_ref().join(self.filename);
        ensure_parent_dir(&path)?;
        std::fs::write(&path, &self.payload)
            .with_context(|| format!("failed to write export to '{}'", path.display()))?;
        self.location = Some(path.clone());
        Ok(path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/model.rs"]
mod tests;
