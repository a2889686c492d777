//! Export configuration, JSON job files and logging setup.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::assets::loader::ImageRef;
use crate::audio::prepare::AudioSpec;
use crate::effects::catalog::Effect;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{KarmaError, KarmaResult};
use crate::render::compositor::TransitionSpec;
use crate::render::fit::FitPolicy;
use crate::session::model::ExportSession;

/// Environment variable overriding [`ExportConfig::channel_capacity`].
pub const CHANNEL_CAPACITY_ENV: &str = "KARMA_VIDEO_CHANNEL_CAPACITY";

/// Transition length used by job files that omit `duration_ms`.
pub const DEFAULT_DURATION_MS: u32 = 3000;

/// Target video bitrate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BitratePreset {
    /// 4 Mbps.
    #[default]
    Standard,
    /// 8 Mbps.
    High,
    /// Any positive rate in bits per second.
    Custom(u64),
}

impl BitratePreset {
    /// Rate in bits per second.
    pub fn bits_per_second(self) -> u64 {
        match self {
            BitratePreset::Standard => 4_000_000,
            BitratePreset::High => 8_000_000,
            BitratePreset::Custom(bps) => bps,
        }
    }
}

impl std::str::FromStr for BitratePreset {
    type Err = KarmaError;

    /// Accepts `4m`, `8m`, `standard`, `high`, or a number with an optional `k`/`m` suffix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "standard" | "4m" => return Ok(BitratePreset::Standard),
            "high" | "8m" => return Ok(BitratePreset::High),
            _ => {}
        }
        let (digits, scale) = if let Some(d) = s.strip_suffix('m') {
            (d, 1_000_000)
        } else if let Some(d) = s.strip_suffix('k') {
            (d, 1_000)
        } else {
            (s.as_str(), 1)
        };
        let n: u64 = digits
            .parse()
            .map_err(|_| KarmaError::validation(format!("invalid bitrate '{s}'")))?;
        match n.checked_mul(scale) {
            Some(bps) if bps > 0 => Ok(BitratePreset::Custom(bps)),
            _ => Err(KarmaError::validation(format!("invalid bitrate '{s}'"))),
        }
    }
}

/// Settings shared by every export started from one manager.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Output frame size.
    pub canvas: Canvas,
    /// Capture rate.
    pub fps: Fps,
    /// Video bitrate.
    pub bitrate: BitratePreset,
    /// Image placement policy.
    pub fit: FitPolicy,
    /// Fill behind each image (straight RGBA8).
    pub background_rgba: [u8; 4],
    /// Bounded capacity of the frame and chunk channels.
    pub channel_capacity: usize,
    /// When set, finalized exports are written to `<publish_dir>/karma-video.webm`.
    pub publish_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::HD,
            fps: Fps::DEFAULT,
            bitrate: BitratePreset::default(),
            fit: FitPolicy::default(),
            background_rgba: [0, 0, 0, 255],
            channel_capacity: 8,
            publish_dir: None,
        }
    }
}

impl ExportConfig {
    /// Check every field the encoder and compositor rely on.
    pub fn validate(&self) -> KarmaResult<()> {
        let Canvas { width, height } = self.canvas;
        if width == 0 || height == 0 {
            return Err(KarmaError::validation("canvas width/height must be non-zero"));
        }
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(KarmaError::validation(format!(
                "canvas {width}x{height} must have even sides"
            )));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(KarmaError::validation("fps must be > 0"));
        }
        if self.bitrate.bits_per_second() == 0 {
            return Err(KarmaError::validation("bitrate must be > 0"));
        }
        if self.channel_capacity == 0 {
            return Err(KarmaError::validation("channel_capacity must be > 0"));
        }
        self.fit.validate()
    }

    /// Apply `KARMA_VIDEO_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(cap) = std::env::var(CHANNEL_CAPACITY_ENV)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
        {
            self.channel_capacity = cap;
        }
        self
    }
}

/// A JSON export job: what to render and how.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExportJob {
    /// Image paths, in slide order. Relative paths resolve against the job file's directory.
    pub images: Vec<PathBuf>,
    /// Transition effect name.
    #[serde(default)]
    pub effect: Effect,
    /// Transition length per image.
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u32,
    /// Optional background track.
    #[serde(default)]
    pub audio: Option<AudioSpec>,
    /// Export settings.
    #[serde(default)]
    pub config: ExportConfig,
    #[serde(skip)]
    base_dir: PathBuf,
}

fn default_duration_ms() -> u32 {
    DEFAULT_DURATION_MS
}

impl ExportJob {
    /// Parse a job from a JSON reader; relative paths stay relative to the working directory.
    pub fn from_reader<R: std::io::Read>(r: R) -> KarmaResult<Self> {
        let mut job: ExportJob = serde_json::from_reader(r)
            .map_err(|e| KarmaError::serde(format!("parse export job JSON: {e}")))?;
        job.base_dir = PathBuf::from(".");
        Ok(job)
    }

    /// Parse a job from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> KarmaResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            KarmaError::validation(format!("open export job '{}': {e}", path.display()))
        })?;
        let mut job = Self::from_reader(BufReader::new(f))?;
        job.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        if let Some(audio) = job.audio.as_mut()
            && audio.src.is_relative()
        {
            audio.src = job.base_dir.join(&audio.src);
        }
        Ok(job)
    }

    /// Directory that relative image paths resolve against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Session described by this job.
    pub fn session(&self) -> ExportSession {
        ExportSession {
            images: self.images.iter().cloned().map(ImageRef::Path).collect(),
            transition: TransitionSpec::new(self.effect, self.duration_ms),
            audio: self.audio.clone(),
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. `info`, `karma_video=debug`).
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

/// Install the global `tracing` subscriber. Later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
