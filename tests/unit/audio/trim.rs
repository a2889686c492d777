use super::*;

fn ramp(seconds: usize, rate: u32) -> AudioPcm {
    // Stereo: left counts frames, right is its negation.
    let frames = seconds * rate as usize;
    let mut interleaved_f32 = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        interleaved_f32.push(i as f32);
        interleaved_f32.push(-(i as f32));
    }
    AudioPcm {
        sample_rate: rate,
        channels: 2,
        interleaved_f32,
    }
}

#[test]
fn trimmed_buffer_starts_at_the_interval_start() {
    let pcm = ramp(5, 100);
    let out = trim_interleaved(&pcm, 2.0, 3.5).unwrap();
    assert_eq!(out.frames(), 150);
    assert_eq!(out.interleaved_f32[0], 200.0);
    assert_eq!(out.interleaved_f32[1], -200.0);
    assert_eq!(*out.interleaved_f32.last().unwrap(), -349.0);
}

#[test]
fn zero_length_interval_is_rejected() {
    let pcm = ramp(5, 100);
    let err = trim_interleaved(&pcm, 2.0, 2.0).unwrap_err();
    assert!(matches!(err, KarmaError::AudioDecode(_)));
    assert!(trim_interleaved(&pcm, 3.0, 1.0).is_err());
}

#[test]
fn interval_is_clipped_to_the_source() {
    let pcm = ramp(2, 100);
    let out = trim_interleaved(&pcm, 1.5, 10.0).unwrap();
    assert_eq!(out.frames(), 50);
    assert!(trim_interleaved(&pcm, 4.0, 6.0).is_err());
}

#[test]
fn negative_or_nan_bounds_are_rejected() {
    let pcm = ramp(1, 100);
    assert!(trim_interleaved(&pcm, -1.0, 0.5).is_err());
    assert!(trim_interleaved(&pcm, 0.0, f64::NAN).is_err());
}

#[test]
fn f32le_file_holds_four_bytes_per_sample() {
    let dir = std::env::temp_dir().join(format!("karma_trim_test_{}", std::process::id()));
    let path = dir.join("mix.f32le");
    write_f32le_file(&[0.5, -0.25, 1.0], &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 12);
    assert_eq!(&bytes[0..4], &0.5f32.to_le_bytes());
    let _ = std::fs::remove_dir_all(dir);
}
