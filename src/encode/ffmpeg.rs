use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::encode::chunks::ChunkSender;
use crate::encode::encoder::{EncoderConfig, VideoEncoder};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{KarmaError, KarmaResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::frame::FrameRGBA;

/// Bytes read from `ffmpeg` stdout per chunk.
const STDOUT_CHUNK_BYTES: usize = 64 * 1024;

/// Options for [`FfmpegWebmEncoder`].
#[derive(Clone, Debug)]
pub struct FfmpegWebmOpts {
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
    /// VP9 `-deadline` setting.
    pub deadline: String,
    /// VP9 `-cpu-used` speed setting.
    pub cpu_used: u8,
}

impl Default for FfmpegWebmOpts {
    fn default() -> Self {
        Self {
            bg_rgba: [0, 0, 0, 255],
            deadline: "realtime".to_owned(),
            cpu_used: 8,
        }
    }
}

/// VP9/Opus WebM encoder that streams raw frames into the system `ffmpeg` and forwards the muxed
/// container from its stdout as chunks.
pub struct FfmpegWebmEncoder {
    opts: FfmpegWebmOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    stdout_pump: Option<JoinHandle<KarmaResult<u64>>>,

    scratch: Vec<u8>,
    cfg: Option<EncoderConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegWebmEncoder {
    /// Create an encoder; `ffmpeg` is spawned on `begin`.
    pub fn new(opts: FfmpegWebmOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            stdout_pump: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    fn build_command(&self, cfg: &EncoderConfig) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // push_frame flattens every frame over the background before it reaches stdin.
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);

        let bitrate = cfg.bitrate_bps.to_string();
        let video_args = [
            "-c:v",
            "libvpx-vp9",
            "-b:v",
            bitrate.as_str(),
            "-pix_fmt",
            "yuv420p",
            "-deadline",
            self.opts.deadline.as_str(),
        ];

        if let Some(audio) = cfg.audio.as_ref() {
            cmd.args([
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate.to_string(),
                "-ac",
                &audio.channels.to_string(),
                "-i",
            ])
            .arg(&audio.path)
            .args(["-map", "0:v:0", "-map", "1:a:0"])
            .args(video_args)
            .args(["-cpu-used", &self.opts.cpu_used.to_string()])
            // Pad short tracks with silence and cut long ones: the video sets the length.
            .args(["-c:a", "libopus", "-af", "apad", "-shortest"]);
        } else {
            cmd.arg("-an")
                .args(video_args)
                .args(["-cpu-used", &self.opts.cpu_used.to_string()]);
        }
        cmd.args(["-f", "webm", "pipe:1"]);
        cmd
    }

    fn join_helpers(&mut self) -> (KarmaResult<u64>, Vec<u8>) {
        let pumped = match self.stdout_pump.take() {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(KarmaError::encoder("ffmpeg stdout thread panicked"))),
            None => Ok(0),
        };
        let stderr = match self.stderr_drain.take() {
            Some(handle) => handle.join().ok().and_then(|r| r.ok()).unwrap_or_default(),
            None => Vec::new(),
        };
        (pumped, stderr)
    }
}

impl VideoEncoder for FfmpegWebmEncoder {
    #[tracing::instrument(
        level = "debug",
        skip(self, cfg, chunks),
        fields(width = cfg.width, height = cfg.height, bitrate = cfg.bitrate_bps)
    )]
    fn begin(&mut self, cfg: EncoderConfig, chunks: ChunkSender) -> KarmaResult<()> {
        cfg.validate()?;
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(KarmaError::validation(
                "ffmpeg encoder width/height must be even (required for yuv420p output)",
            ));
        }
        if !is_ffmpeg_on_path() {
            return Err(KarmaError::encoder(
                "ffmpeg is required for WebM encoding, but was not found on PATH",
            ));
        }

        let mut child = self.build_command(&cfg).spawn().map_err(|e| {
            KarmaError::encoder(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| KarmaError::encoder("failed to open ffmpeg stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| KarmaError::encoder("failed to open ffmpeg stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| KarmaError::encoder("failed to open ffmpeg stderr"))?;

        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });
        let stdout_pump = std::thread::spawn(move || pump_stdout(stdout, chunks));

        self.scratch = vec![0u8; cfg.width as usize * cfg.height as usize * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.stdout_pump = Some(stdout_pump);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> KarmaResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| KarmaError::encoder("ffmpeg encoder not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(KarmaError::encoder(
                "ffmpeg encoder received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(KarmaError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(KarmaError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        flatten_over_bg_to_opaque_rgba8(
            &mut self.scratch,
            &frame.data,
            frame.premultiplied,
            self.opts.bg_rgba,
        )?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(KarmaError::encoder("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            KarmaError::encoder(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn finish(&mut self) -> KarmaResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| KarmaError::encoder("ffmpeg encoder not started"))?;

        let status = child
            .wait()
            .map_err(|e| KarmaError::encoder(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let (pumped, stderr_bytes) = self.join_helpers();
        self.cfg = None;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(KarmaError::encoder(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        let chunks = pumped?;
        tracing::debug!(chunks, "ffmpeg stream flushed");
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = self.join_helpers();
        self.cfg = None;
    }
}

impl Drop for FfmpegWebmEncoder {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

fn pump_stdout(
    mut stdout: std::process::ChildStdout,
    mut chunks: ChunkSender,
) -> KarmaResult<u64> {
    let mut buf = vec![0u8; STDOUT_CHUNK_BYTES];
    loop {
        let n = stdout
            .read(&mut buf)
            .map_err(|e| KarmaError::encoder(format!("failed to read ffmpeg output: {e}")))?;
        if n == 0 {
            break;
        }
        chunks.send(buf[..n].to_vec())?;
    }
    Ok(chunks.sent())
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // `-r` before `-i` sets the rawvideo input rate; rational rates pass through as num/den.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

fn flatten_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    src_is_premul: bool,
    bg_rgba: [u8; 4],
) -> KarmaResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(KarmaError::validation(
            "flatten expects equal-length rgba8 buffers",
        ));
    }

    let bg = [bg_rgba[0] as u16, bg_rgba[1] as u16, bg_rgba[2] as u16];
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = s[3] as u16;
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255u16 - a;
        for c in 0..3 {
            let fg = if src_is_premul {
                s[c] as u16
            } else {
                mul_div255_u16(s[c] as u16, a)
            };
            d[c] = (fg + mul_div255_u16(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> KarmaResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
