use super::*;

fn tone(seconds: f64) -> AudioPcm {
    let frames = (seconds * f64::from(MIX_SAMPLE_RATE)) as usize;
    AudioPcm {
        sample_rate: MIX_SAMPLE_RATE,
        channels: 2,
        interleaved_f32: vec![0.1; frames * 2],
    }
}

#[test]
fn zero_length_interval_fails_before_decoding() {
    let spec = AudioSpec::new("/definitely/not/here.mp3", 2.0, 2.0);
    let err = prepare_audio(&spec).unwrap_err();
    assert!(matches!(err, KarmaError::AudioDecode(_)));
    assert!(err.to_string().contains("empty"));
}

#[test]
fn unreadable_source_is_an_audio_decode_error() {
    let spec = AudioSpec::new("/definitely/not/here.mp3", 0.0, 1.0);
    let err = prepare_audio(&spec).unwrap_err();
    assert!(matches!(err, KarmaError::AudioDecode(_)));
    assert!(!err.is_fatal());
}

#[test]
fn staged_file_matches_the_trimmed_length_and_is_released() {
    let spec = AudioSpec::new("unused.wav", 1.0, 1.5);
    let prepared = prepare_from_pcm(&tone(3.0), &spec).unwrap();
    let path = prepared.path().to_path_buf();

    let bytes = std::fs::metadata(&path).unwrap().len();
    assert_eq!(bytes, (MIX_SAMPLE_RATE as u64 / 2) * 2 * 4);
    assert!((prepared.duration_sec() - 0.5).abs() < 1e-9);

    let cfg = prepared.input_config();
    assert_eq!(cfg.sample_rate, MIX_SAMPLE_RATE);
    assert_eq!(cfg.channels, 2);

    prepared.release();
    assert!(!path.exists());
}

#[test]
fn dropping_prepared_audio_removes_the_file() {
    let spec = AudioSpec::new("unused.wav", 0.0, 0.25);
    let prepared = prepare_from_pcm(&tone(1.0), &spec).unwrap();
    let path = prepared.path().to_path_buf();
    assert!(path.exists());
    drop(prepared);
    assert!(!path.exists());
}
