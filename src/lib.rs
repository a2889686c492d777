//! karma-video exports an ordered set of still images as an animated slideshow video.
//!
//! Each image is revealed by one transition effect from a closed catalog, rendered on the CPU
//! at a fixed capture rate and streamed into a WebM encoder together with an optional, trimmed
//! background track. The public API is session-oriented:
//!
//! - Describe an export with an [`ExportSession`] (or load an [`ExportJob`] from JSON)
//! - Start it on a [`SessionManager`], which keeps at most one export recording at a time
//! - Wait on the returned [`ExportHandle`] for the [`ExportResult`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

pub(crate) mod audio;
/// Export configuration, job files and logging.
pub mod config;
pub(crate) mod effects;
/// Streaming encoders and the chunk channel.
pub mod encode;
pub(crate) mod render;
pub(crate) mod session;
pub(crate) mod thumbnails;

pub use crate::foundation::core::{Affine, Canvas, Fps, FrameIndex, Point, Rect};
pub use crate::foundation::error::{KarmaError, KarmaResult};

pub use crate::assets::decode::{DecodedImage, decode_image};
pub use crate::assets::loader::{FsImageLoader, ImageLoader, ImageRef};
pub use crate::audio::decode::{AudioPcm, MIX_SAMPLE_RATE, decode_audio_f32_stereo};
pub use crate::audio::prepare::{
    AudioPreparer, AudioSpec, FfmpegAudioPreparer, PreparedAudio, prepare_audio, prepare_from_pcm,
};
pub use crate::audio::trim::trim_interleaved;
pub use crate::config::{BitratePreset, ExportConfig, ExportJob, LoggingConfig, init_logging};
pub use crate::effects::blur::blur_rgba8_premul_in_place;
pub use crate::effects::catalog::{Effect, EffectTransform};
pub use crate::encode::chunks::{
    AssembledContainer, ChunkAssembler, ChunkSender, EncodedChunk, chunk_channel,
};
pub use crate::encode::encoder::{AudioInputConfig, EncoderConfig, EncoderFactory, VideoEncoder};
pub use crate::encode::ffmpeg::{FfmpegWebmEncoder, FfmpegWebmOpts, is_ffmpeg_on_path};
pub use crate::encode::memory::{EncoderRecorder, InMemoryEncoder};
pub use crate::render::clock::{Tick, TransitionClock};
pub use crate::render::compositor::{
    PreparedSlide, RenderedFrame, SlideRenderer, TransitionPass, TransitionPhase, TransitionSpec,
};
pub use crate::render::fit::{FitMode, FitPolicy, Placement};
pub use crate::render::frame::FrameRGBA;
pub use crate::session::manager::{ExportHandle, SessionManager};
pub use crate::session::model::{
    EXPORT_FILENAME, EXPORT_MIME_TYPE, ExportResult, ExportSession, SessionId, SessionState,
};
pub use crate::session::sequence::{SequenceStats, run_sequence};
pub use crate::session::status::{ExportStatus, StatusObserver};
pub use crate::thumbnails::{RawImageFile, ThumbnailOpts, ThumbnailOutcome, prepare_thumbnails};
