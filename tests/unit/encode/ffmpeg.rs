use super::*;
use crate::encode::chunks::chunk_channel;
use crate::encode::encoder::AudioInputConfig;
use std::ffi::OsStr;

fn cfg(audio: Option<AudioInputConfig>) -> EncoderConfig {
    EncoderConfig {
        width: 64,
        height: 36,
        fps: Fps::DEFAULT,
        bitrate_bps: 4_000_000,
        audio,
    }
}

fn args(cmd: &Command) -> Vec<String> {
    cmd.get_args()
        .map(OsStr::to_string_lossy)
        .map(|s| s.into_owned())
        .collect()
}

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_over_bg_to_opaque_rgba8(&mut dst, &src, true, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_over_bg_to_opaque_rgba8(&mut dst, &src, true, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn flatten_half_alpha_over_black_keeps_premul_color() {
    let src = vec![128u8, 0, 0, 128];
    let mut dst = vec![0u8; 4];
    flatten_over_bg_to_opaque_rgba8(&mut dst, &src, true, [0, 0, 0, 255]).unwrap();
    assert_eq!(dst, vec![128, 0, 0, 255]);
}

#[test]
fn flatten_straight_alpha_multiplies_before_compositing() {
    // 50% white over black: straight 255 becomes 128, the premultiplied reading would give 255.
    let src = vec![255u8, 255, 255, 128];
    let mut straight = vec![0u8; 4];
    flatten_over_bg_to_opaque_rgba8(&mut straight, &src, false, [0, 0, 0, 255]).unwrap();
    assert_eq!(straight, vec![128, 128, 128, 255]);

    let mut premul = vec![0u8; 4];
    flatten_over_bg_to_opaque_rgba8(&mut premul, &src, true, [0, 0, 0, 255]).unwrap();
    assert_eq!(premul, vec![255, 255, 255, 255]);
}

#[test]
fn silent_command_writes_vp9_webm_to_stdout() {
    let enc = FfmpegWebmEncoder::new(FfmpegWebmOpts::default());
    let a = args(&enc.build_command(&cfg(None)));
    assert!(a.windows(2).any(|w| w == ["-c:v", "libvpx-vp9"]));
    assert!(a.windows(2).any(|w| w == ["-b:v", "4000000"]));
    assert!(a.windows(2).any(|w| w == ["-s", "64x36"]));
    assert!(a.contains(&"-an".to_owned()));
    assert!(!a.contains(&"libopus".to_owned()));
    assert_eq!(&a[a.len() - 3..], ["-f", "webm", "pipe:1"]);
}

#[test]
fn audio_command_maps_opus_and_lets_video_set_the_length() {
    let enc = FfmpegWebmEncoder::new(FfmpegWebmOpts::default());
    let audio = AudioInputConfig {
        path: "/tmp/a.f32le".into(),
        sample_rate: 48_000,
        channels: 2,
    };
    let a = args(&enc.build_command(&cfg(Some(audio))));
    assert!(a.windows(2).any(|w| w == ["-c:a", "libopus"]));
    assert!(a.windows(2).any(|w| w == ["-af", "apad"]));
    assert!(a.contains(&"-shortest".to_owned()));
    assert!(a.windows(2).any(|w| w == ["-i", "/tmp/a.f32le"]));
    assert!(!a.contains(&"-an".to_owned()));
}

#[test]
fn odd_canvas_is_rejected_before_spawning() {
    let mut enc = FfmpegWebmEncoder::new(FfmpegWebmOpts::default());
    let (tx, asm) = chunk_channel(2);
    let mut c = cfg(None);
    c.width = 63;
    let err = enc.begin(c, tx).unwrap_err();
    assert!(matches!(err, KarmaError::Validation(_)));
    assert_eq!(asm.finish().unwrap().chunk_count, 0);
}

#[test]
fn push_before_begin_is_an_encoder_error() {
    let mut enc = FfmpegWebmEncoder::new(FfmpegWebmOpts::default());
    let frame = FrameRGBA::transparent(crate::foundation::core::Canvas {
        width: 64,
        height: 36,
    });
    let err = enc.push_frame(FrameIndex(0), &frame).unwrap_err();
    assert!(matches!(err, KarmaError::Encoder(_)));
    enc.abort();
}
