use super::*;
use crate::assets::decode::DecodedImage;
use crate::assets::loader::ImageRef;
use crate::audio::decode::AudioPcm;
use crate::audio::prepare::{AudioSpec, prepare_from_pcm};
use crate::effects::catalog::Effect;
use crate::encode::chunks::ChunkSender;
use crate::encode::memory::EncoderRecorder;
use crate::foundation::core::Canvas;
use crate::render::compositor::TransitionSpec;
use std::path::PathBuf;

struct Solid;

impl ImageLoader for Solid {
    fn load(&self, _image: &ImageRef) -> KarmaResult<DecodedImage> {
        DecodedImage::from_premul_rgba8(2, 2, [0, 255, 0, 255].repeat(4))
    }
}

struct Tone(Mutex<Vec<PathBuf>>);

impl AudioPreparer for Tone {
    fn prepare(&self, spec: &AudioSpec) -> KarmaResult<PreparedAudio> {
        let pcm = AudioPcm {
            sample_rate: 1000,
            channels: 2,
            interleaved_f32: vec![0.0; 2 * 10_000],
        };
        let prepared = prepare_from_pcm(&pcm, spec)?;
        lock(&self.0).push(prepared.path().to_path_buf());
        Ok(prepared)
    }
}

struct FailsOnThirdFrame(u32);

impl VideoEncoder for FailsOnThirdFrame {
    fn begin(&mut self, _cfg: EncoderConfig, _chunks: ChunkSender) -> KarmaResult<()> {
        Ok(())
    }
    fn push_frame(&mut self, _idx: FrameIndex, _frame: &FrameRGBA) -> KarmaResult<()> {
        self.0 += 1;
        if self.0 == 3 {
            return Err(KarmaError::encoder("disk full"));
        }
        Ok(())
    }
    fn finish(&mut self) -> KarmaResult<()> {
        Ok(())
    }
    fn abort(&mut self) {}
}

fn small_config() -> ExportConfig {
    ExportConfig {
        canvas: Canvas {
            width: 16,
            height: 8,
        },
        channel_capacity: 2,
        ..ExportConfig::default()
    }
}

fn session(n: usize, duration_ms: u32) -> ExportSession {
    ExportSession::new(
        (0..n).map(|i| ImageRef::from(format!("{i}.png").as_str())).collect(),
        TransitionSpec::new(Effect::Zoom, duration_ms),
    )
}

#[test]
fn finalizing_sessions_ignore_cancel() {
    let control = SessionControl::new();
    assert!(control.begin_finalizing());
    assert!(!control.request_cancel());
    assert!(!control.is_cancelled());

    let control = SessionControl::new();
    assert!(control.request_cancel());
    assert!(!control.begin_finalizing());
}

#[test]
fn audio_is_muxed_and_released_after_export() {
    let recorder = EncoderRecorder::new();
    let factory = {
        let recorder = recorder.clone();
        move || -> KarmaResult<Box<dyn VideoEncoder>> { Ok(Box::new(recorder.encoder())) }
    };
    let tone = Arc::new(Tone(Mutex::new(Vec::new())));
    let manager = SessionManager::new(small_config(), Arc::new(Solid), Arc::new(factory))
        .unwrap()
        .with_audio_preparer(tone.clone());

    let res = manager
        .start(session(1, 100).with_audio(AudioSpec::new("t.wav", 1.0, 3.0)))
        .unwrap()
        .wait()
        .unwrap();

    assert!(res.has_audio);
    let cfg = recorder.lock().config.clone().unwrap();
    let audio = cfg.audio.unwrap();
    assert_eq!(audio.sample_rate, 1000);
    for path in lock(&tone.0).iter() {
        assert!(!path.exists());
    }
}

#[test]
fn encoder_failure_is_fatal_and_reported() {
    let factory = || -> KarmaResult<Box<dyn VideoEncoder>> { Ok(Box::new(FailsOnThirdFrame(0))) };
    let seen = Arc::new(Mutex::new(Vec::new()));
    let observer: StatusObserver = {
        let seen = Arc::clone(&seen);
        Arc::new(move |_: SessionId, status: &ExportStatus| lock(&seen).push(status.clone()))
    };
    let manager = SessionManager::new(small_config(), Arc::new(Solid), Arc::new(factory))
        .unwrap()
        .with_observer(observer);

    let handle = manager.start(session(2, 500)).unwrap();
    let err = handle.wait().unwrap_err();
    assert!(matches!(err, KarmaError::Encoder(_)));
    assert!(err.is_fatal());
    assert_eq!(manager.active_id(), None);

    let seen = lock(&seen);
    assert_eq!(seen.first(), Some(&ExportStatus::Pending));
    assert!(matches!(seen.last(), Some(ExportStatus::Error(msg)) if msg.contains("disk full")));
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let mut cfg = small_config();
    cfg.canvas.width = 15;
    let factory = || -> KarmaResult<Box<dyn VideoEncoder>> { Ok(Box::new(FailsOnThirdFrame(0))) };
    assert!(SessionManager::new(cfg, Arc::new(Solid), Arc::new(factory)).is_err());
}
