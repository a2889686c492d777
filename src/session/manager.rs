use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;

use crate::assets::loader::ImageLoader;
use crate::audio::prepare::{AudioPreparer, FfmpegAudioPreparer, PreparedAudio};
use crate::config::ExportConfig;
use crate::encode::chunks::{ChunkAssembler, chunk_channel};
use crate::encode::encoder::{EncoderConfig, EncoderFactory, VideoEncoder};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{KarmaError, KarmaResult};
use crate::render::compositor::SlideRenderer;
use crate::render::frame::FrameRGBA;
use crate::session::model::{
    EXPORT_FILENAME, EXPORT_MIME_TYPE, ExportResult, ExportSession, SessionId, SessionState,
};
use crate::session::sequence::{SequenceStats, run_sequence};
use crate::session::status::{ExportStatus, StatusObserver, StatusReporter};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cross-thread state of one started session.
#[derive(Debug)]
struct SessionControl {
    cancel: AtomicBool,
    state: Mutex<SessionState>,
    released: Mutex<bool>,
    released_cv: Condvar,
}

impl SessionControl {
    fn new() -> Self {
        Self {
            cancel: AtomicBool::new(false),
            state: Mutex::new(SessionState::Recording),
            released: Mutex::new(false),
            released_cv: Condvar::new(),
        }
    }

    fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    fn set_state(&self, next: SessionState) {
        *lock(&self.state) = next;
    }

    /// Ask a recording session to stop. Sessions already finalizing are left to finish.
    fn request_cancel(&self) -> bool {
        let state = lock(&self.state);
        if *state == SessionState::Recording {
            self.cancel.store(true, Ordering::Release);
            return true;
        }
        false
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Move from recording to finalizing unless a cancel got there first.
    fn begin_finalizing(&self) -> bool {
        let mut state = lock(&self.state);
        if self.cancel.load(Ordering::Acquire) {
            return false;
        }
        *state = SessionState::Finalizing;
        true
    }

    fn mark_released(&self) {
        *lock(&self.released) = true;
        self.released_cv.notify_all();
    }

    fn wait_released(&self) {
        let mut released = lock(&self.released);
        while !*released {
            released = self
                .released_cv
                .wait(released)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }
}

/// Signals teardown when the worker exits, including by panic.
struct ReleaseOnDrop(Arc<SessionControl>);

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        self.0.mark_released();
    }
}

struct ActiveSession {
    id: SessionId,
    control: Arc<SessionControl>,
}

/// Handle to a started export.
#[derive(Debug)]
pub struct ExportHandle {
    id: SessionId,
    control: Arc<SessionControl>,
    join: JoinHandle<KarmaResult<ExportResult>>,
}

impl ExportHandle {
    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.control.state()
    }

    /// Whether the worker has exited.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Block until the export resolves.
    ///
    /// Resolves to the published result, [`KarmaError::Superseded`] when a newer export replaced
    /// this one, or the fatal error that ended it.
    pub fn wait(self) -> KarmaResult<ExportResult> {
        self.join
            .join()
            .map_err(|_| KarmaError::encoder("export worker panicked"))?
    }
}

/// Starts exports and keeps at most one of them recording.
///
/// Starting a new export cancels the previous one if it is still recording and blocks until its
/// encoder and audio have been released. A previous export that is already finalizing runs to
/// completion first. Concurrent `start` calls are serialized.
///
/// Status observers run on worker threads and must not call back into the manager.
pub struct SessionManager {
    config: ExportConfig,
    loader: Arc<dyn ImageLoader>,
    encoders: Arc<dyn EncoderFactory>,
    audio: Arc<dyn AudioPreparer>,
    observer: Option<StatusObserver>,
    next_id: AtomicU64,
    active: Mutex<Option<ActiveSession>>,
}

impl SessionManager {
    /// Create a manager; `config` is validated once here.
    pub fn new(
        config: ExportConfig,
        loader: Arc<dyn ImageLoader>,
        encoders: Arc<dyn EncoderFactory>,
    ) -> KarmaResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            loader,
            encoders,
            audio: Arc::new(FfmpegAudioPreparer),
            observer: None,
            next_id: AtomicU64::new(1),
            active: Mutex::new(None),
        })
    }

    /// Report every status change to `observer`.
    pub fn with_observer(mut self, observer: StatusObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Replace the `ffmpeg` audio preparer.
    pub fn with_audio_preparer(mut self, audio: Arc<dyn AudioPreparer>) -> Self {
        self.audio = audio;
        self
    }

    /// Export settings.
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Id of the session that is still recording or finalizing, if any.
    pub fn active_id(&self) -> Option<SessionId> {
        lock(&self.active)
            .as_ref()
            .filter(|s| !s.control.state().is_terminal())
            .map(|s| s.id)
    }

    /// Start exporting `session` on a worker thread.
    ///
    /// Fails with [`KarmaError::EmptyInput`] for an empty image list before anything is acquired
    /// or any previous session is touched.
    pub fn start(&self, session: ExportSession) -> KarmaResult<ExportHandle> {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let reporter = StatusReporter::new(id, self.observer.clone());

        if session.images.is_empty() {
            let err = KarmaError::EmptyInput;
            reporter.emit(ExportStatus::Warning(err.to_string()));
            return Err(err);
        }
        session.transition.validate()?;

        let mut slot = lock(&self.active);
        if let Some(prev) = slot.take() {
            if prev.control.request_cancel() {
                tracing::info!(session = %prev.id, next = %id, "superseding active export");
            }
            prev.control.wait_released();
        }

        let control = Arc::new(SessionControl::new());
        let worker = ExportWorker {
            id,
            config: self.config.clone(),
            loader: Arc::clone(&self.loader),
            encoders: Arc::clone(&self.encoders),
            audio: Arc::clone(&self.audio),
            control: Arc::clone(&control),
            reporter: reporter.clone(),
            session,
        };

        reporter.emit(ExportStatus::Pending);
        let join = std::thread::Builder::new()
            .name(format!("karma-export-{}", id.0))
            .spawn(move || worker.run())
            .map_err(|e| KarmaError::Other(anyhow::anyhow!("spawn export worker: {e}")))?;

        *slot = Some(ActiveSession {
            id,
            control: Arc::clone(&control),
        });
        Ok(ExportHandle { id, control, join })
    }
}

struct FrameMsg {
    idx: FrameIndex,
    frame: FrameRGBA,
}

struct ExportWorker {
    id: SessionId,
    config: ExportConfig,
    loader: Arc<dyn ImageLoader>,
    encoders: Arc<dyn EncoderFactory>,
    audio: Arc<dyn AudioPreparer>,
    control: Arc<SessionControl>,
    reporter: StatusReporter,
    session: ExportSession,
}

impl ExportWorker {
    fn run(self) -> KarmaResult<ExportResult> {
        let _release = ReleaseOnDrop(Arc::clone(&self.control));
        let result = self.export();
        match &result {
            Ok(res) => {
                self.control.set_state(SessionState::Ready);
                self.reporter.emit(ExportStatus::Ready(res.clone()));
            }
            Err(KarmaError::Superseded) => {
                self.control.set_state(SessionState::Superseded);
                self.reporter.emit(ExportStatus::Superseded);
            }
            Err(e) => {
                self.control.set_state(SessionState::Failed);
                self.reporter.emit(ExportStatus::Error(e.to_string()));
            }
        }
        result
    }

    #[tracing::instrument(
        level = "info",
        skip(self),
        fields(
            session = %self.id,
            images = self.session.images.len(),
            effect = %self.session.transition.effect
        )
    )]
    fn export(&self) -> KarmaResult<ExportResult> {
        let renderer = SlideRenderer::new(
            self.config.canvas,
            self.config.fit,
            self.config.background_rgba,
        )?;
        let audio = self.prepare_audio();

        let mut encoder = self.encoders.create()?;
        let (chunk_tx, assembler) = chunk_channel(self.config.channel_capacity);
        let enc_cfg = EncoderConfig {
            width: self.config.canvas.width,
            height: self.config.canvas.height,
            fps: self.config.fps,
            bitrate_bps: self.config.bitrate.bits_per_second(),
            audio: audio.as_ref().map(PreparedAudio::input_config),
        };
        if let Err(e) = encoder.begin(enc_cfg, chunk_tx) {
            return Err(teardown(encoder, assembler, audio, e));
        }
        self.reporter.emit(ExportStatus::Exporting);

        let stats = match self.record(&renderer, encoder.as_mut()) {
            Ok(stats) => stats,
            Err(e) => return Err(teardown(encoder, assembler, audio, e)),
        };
        if stats.stopped || !self.control.begin_finalizing() {
            tracing::info!(frames = stats.frames, "export cancelled while recording");
            return Err(teardown(encoder, assembler, audio, KarmaError::Superseded));
        }
        if stats.frames == 0 {
            let e = KarmaError::load(format!(
                "none of the {} images could be loaded",
                stats.images_total
            ));
            return Err(teardown(encoder, assembler, audio, e));
        }

        if let Err(e) = encoder.finish() {
            return Err(teardown(encoder, assembler, audio, e));
        }
        drop(encoder);
        let container = assembler.finish()?;
        let has_audio = audio.is_some();
        if let Some(audio) = audio {
            audio.release();
        }

        let mut result = ExportResult {
            payload: container.payload,
            mime_type: EXPORT_MIME_TYPE,
            filename: EXPORT_FILENAME,
            chunk_count: container.chunk_count,
            frames: stats.frames,
            has_audio,
            skipped_images: stats.skipped,
            location: None,
        };
        if let Some(dir) = self.config.publish_dir.as_ref() {
            result.save_to(dir)?;
        }
        Ok(result)
    }

    fn prepare_audio(&self) -> Option<PreparedAudio> {
        let spec = self.session.audio.as_ref()?;
        match self.audio.prepare(spec) {
            Ok(prepared) => Some(prepared),
            Err(e) => {
                tracing::warn!(session = %self.id, "exporting without audio: {e}");
                None
            }
        }
    }

    /// Render the sequence while a scoped thread feeds frames to the encoder.
    fn record(
        &self,
        renderer: &SlideRenderer,
        encoder: &mut dyn VideoEncoder,
    ) -> KarmaResult<SequenceStats> {
        let cap = self.config.channel_capacity.max(1);
        std::thread::scope(|scope| -> KarmaResult<SequenceStats> {
            let (tx, rx) = mpsc::sync_channel::<FrameMsg>(cap);

            let enc = scope.spawn(move || -> KarmaResult<u64> {
                let mut pushed = 0u64;
                for msg in rx {
                    encoder.push_frame(msg.idx, &msg.frame)?;
                    pushed += 1;
                }
                Ok(pushed)
            });

            let control = &self.control;
            let produced = run_sequence(
                renderer,
                self.loader.as_ref(),
                &self.session.images,
                self.session.transition,
                self.config.fps,
                |idx, rendered| {
                    if control.is_cancelled() {
                        return Ok(ControlFlow::Break(()));
                    }
                    tx.send(FrameMsg {
                        idx,
                        frame: rendered.frame,
                    })
                    .map_err(|_| KarmaError::encoder("encoder thread is not accepting frames"))?;
                    Ok(ControlFlow::Continue(()))
                },
            );

            drop(tx);
            let pushed = enc
                .join()
                .map_err(|_| KarmaError::encoder("encoder thread panicked"))??;
            let stats = produced?;
            tracing::debug!(frames = stats.frames, pushed, "recording complete");
            Ok(stats)
        })
    }
}

/// Abort the encoder, drain the chunk channel and release audio, then hand back `err`.
fn teardown(
    mut encoder: Box<dyn VideoEncoder>,
    assembler: ChunkAssembler,
    audio: Option<PreparedAudio>,
    err: KarmaError,
) -> KarmaError {
    encoder.abort();
    drop(encoder);
    if let Ok(partial) = assembler.finish() {
        tracing::debug!(chunks = partial.chunk_count, "discarded partial output");
    }
    if let Some(audio) = audio {
        audio.release();
    }
    err
}

#[cfg(test)]
#[path = "../../tests/unit/session/manager.rs"]
mod tests;
