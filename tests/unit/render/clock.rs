use super::*;

#[test]
fn one_second_at_60fps_is_sixty_ticks_from_zero_to_one() {
    let clock = TransitionClock::new(1000, Fps::new(60, 1).unwrap()).unwrap();
    assert_eq!(clock.frame_count(), 60);
    let ticks: Vec<Tick> = clock.collect();
    assert_eq!(ticks.len(), 60);

    let first = ticks[0];
    assert_eq!(first.index, 0);
    assert_eq!(first.progress, 0.0);
    assert_eq!(first.elapsed_ms, 0.0);
    assert!(!first.terminal);
    assert!((ticks[1].progress - 1.0 / 59.0).abs() < 1e-12);

    let last = ticks.last().unwrap();
    assert_eq!(last.progress, 1.0);
    assert!(last.terminal);
    assert!((last.elapsed_ms - 1000.0).abs() < 1e-9);
    assert_eq!(ticks.iter().filter(|t| t.terminal).count(), 1);
}

#[test]
fn progress_is_non_decreasing_and_in_range() {
    for (duration, fps) in [(1000, 60), (1001, 60), (333, 24), (5, 60)] {
        let clock = TransitionClock::new(duration, Fps::new(fps, 1).unwrap()).unwrap();
        let expected = clock.frame_count() as usize;
        let ticks: Vec<Tick> = clock.collect();
        assert_eq!(ticks.len(), expected);
        assert!(ticks.windows(2).all(|w| w[0].progress <= w[1].progress));
        assert!(ticks.iter().all(|t| (0.0..=1.0).contains(&t.progress)));
        assert_eq!(ticks.last().unwrap().progress, 1.0);
        if ticks.len() > 1 {
            assert_eq!(ticks[0].progress, 0.0);
        }
    }
}

#[test]
fn durations_shorter_than_a_frame_still_settle_once() {
    let ticks: Vec<Tick> = TransitionClock::new(1, Fps::new(60, 1).unwrap())
        .unwrap()
        .collect();
    assert_eq!(ticks.len(), 1);
    assert!(ticks[0].terminal);
    assert_eq!(ticks[0].progress, 1.0);
}

#[test]
fn clock_is_not_restartable() {
    let mut clock = TransitionClock::new(50, Fps::new(60, 1).unwrap()).unwrap();
    while clock.next().is_some() {}
    assert!(clock.next().is_none());
    assert_eq!(clock.size_hint(), (0, Some(0)));
}

#[test]
fn rational_fps_spans_the_full_range() {
    // 30000/1001 fps: 1s needs 30 frames (29.97 rounded up).
    let fps = Fps::new(30_000, 1001).unwrap();
    let clock = TransitionClock::new(1000, fps).unwrap();
    assert_eq!(clock.frame_count(), 30);
    let ticks: Vec<Tick> = clock.collect();
    assert_eq!(ticks.len(), 30);
    assert_eq!(ticks[0].progress, 0.0);
    assert_eq!(ticks[29].progress, 1.0);
    assert!((ticks[29].elapsed_ms - 1000.0).abs() < 1e-9);
}

#[test]
fn size_hint_counts_down_with_each_tick() {
    let mut clock = TransitionClock::new(100, Fps::DEFAULT).unwrap();
    assert_eq!(clock.size_hint(), (6, Some(6)));
    clock.next();
    assert_eq!(clock.size_hint(), (5, Some(5)));
}

#[test]
fn zero_duration_is_rejected() {
    assert!(TransitionClock::new(0, Fps::DEFAULT).is_err());
}
