use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "karma-video", version)]
struct Cli {
    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export a slideshow job to WebM (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render one transition frame of one image as a PNG.
    Frame(FrameArgs),
    /// List the transition effect catalog.
    Effects,
    /// Write JPEG thumbnails for a batch of image files.
    Thumbs(ThumbsArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input export job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output WebM path. Defaults to `karma-video.webm` next to the job file.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Override the job's bitrate (`4m`, `8m`, `high`, `2500k`, ...).
    #[arg(long)]
    bitrate: Option<karma_video::BitratePreset>,

    /// Override the job's fit mode (`contain`, `cover`, `cover-with-margin`).
    #[arg(long)]
    fit: Option<karma_video::FitMode>,

    /// Override the job's transition effect.
    #[arg(long)]
    effect: Option<String>,

    /// Override the job's transition length in milliseconds.
    #[arg(long)]
    duration_ms: Option<u32>,

    /// Drop the job's audio track.
    #[arg(long, default_value_t = false)]
    no_audio: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Source image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Transition effect name.
    #[arg(long, default_value = "fade")]
    effect: String,

    /// Transition progress in `[0, 1]`.
    #[arg(long, default_value_t = 0.5)]
    progress: f64,

    /// Fit mode.
    #[arg(long, default_value = "cover")]
    fit: karma_video::FitMode,

    /// Available width; the frame is the largest 16:9 canvas inside the viewport.
    #[arg(long, default_value_t = 1280)]
    viewport_width: u32,

    /// Available height.
    #[arg(long, default_value_t = 720)]
    viewport_height: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ThumbsArgs {
    /// Maximum thumbnail width in pixels.
    #[arg(long, default_value_t = 320)]
    max_width: u32,

    /// JPEG quality (1-100).
    #[arg(long, default_value_t = 80)]
    quality: u8,

    /// Output directory.
    #[arg(long)]
    out_dir: PathBuf,

    /// Image files.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    karma_video::init_logging(&karma_video::LoggingConfig {
        level: cli.log_level,
        json: cli.json,
    });
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Effects => cmd_effects(),
        Command::Thumbs(args) => cmd_thumbs(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut job = karma_video::ExportJob::from_path(&args.in_path)?;
    if let Some(bitrate) = args.bitrate {
        job.config.bitrate = bitrate;
    }
    if let Some(fit) = args.fit {
        job.config.fit.mode = fit;
    }
    if let Some(effect) = args.effect.as_deref() {
        job.effect = karma_video::Effect::from_name(effect);
    }
    if let Some(duration_ms) = args.duration_ms {
        job.duration_ms = duration_ms;
    }
    if args.no_audio {
        job.audio = None;
    }
    let config = job.config.clone().with_env_overrides();

    let bg_rgba = config.background_rgba;
    let encoders = move || -> karma_video::KarmaResult<Box<dyn karma_video::VideoEncoder>> {
        Ok(Box::new(karma_video::FfmpegWebmEncoder::new(
            karma_video::FfmpegWebmOpts {
                bg_rgba,
                ..Default::default()
            },
        )))
    };
    let loader = karma_video::FsImageLoader::new(job.base_dir());
    let manager = karma_video::SessionManager::new(config, Arc::new(loader), Arc::new(encoders))?;

    let res = manager.start(job.session())?.wait()?;

    let out = args
        .out
        .unwrap_or_else(|| job.base_dir().join(karma_video::EXPORT_FILENAME));
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&out, &res.payload).with_context(|| format!("write '{}'", out.display()))?;

    for name in &res.skipped_images {
        eprintln!("skipped {name}");
    }
    eprintln!(
        "wrote {} ({} frames, {} bytes{})",
        out.display(),
        res.frames,
        res.payload.len(),
        if res.has_audio { ", with audio" } else { "" }
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(&args.in_path).with_context(|| format!("read '{}'", args.in_path.display()))?;
    let image = karma_video::decode_image(&bytes)?;

    let canvas =
        karma_video::Canvas::fit_aspect(args.viewport_width, args.viewport_height, 16, 9)?;
    let renderer = karma_video::SlideRenderer::new(
        canvas,
        karma_video::FitPolicy::new(args.fit),
        [0, 0, 0, 255],
    )?;
    let slide = renderer.prepare(&image)?;
    let effect = karma_video::Effect::from_name(&args.effect);
    let frame = renderer.render(&slide, effect, args.progress.clamp(0.0, 1.0))?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_effects() -> anyhow::Result<()> {
    for effect in karma_video::Effect::ALL {
        println!("{effect}");
    }
    Ok(())
}

fn cmd_thumbs(args: ThumbsArgs) -> anyhow::Result<()> {
    let opts = karma_video::ThumbnailOpts {
        max_width_px: args.max_width,
        quality: args.quality,
    };
    let files = args
        .files
        .iter()
        .map(|path| {
            let bytes =
                std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
            Ok(karma_video::RawImageFile {
                name: thumb_name(path),
                bytes,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let mut failed = 0usize;
    for outcome in karma_video::prepare_thumbnails(&files, opts)? {
        match outcome {
            karma_video::ThumbnailOutcome::Ready { name, encoded } => {
                let out = args.out_dir.join(name);
                std::fs::write(&out, encoded)
                    .with_context(|| format!("write '{}'", out.display()))?;
                eprintln!("wrote {}", out.display());
            }
            karma_video::ThumbnailOutcome::Failed { name, error } => {
                failed += 1;
                eprintln!("failed {name}: {error}");
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} thumbnails failed", files.len());
    }
    Ok(())
}

fn thumb_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_owned());
    format!("{stem}.jpg")
}
