use super::*;

#[test]
fn fps_validation_and_frame_duration() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(60, 0).is_err());
    let fps = Fps::new(60, 1).unwrap();
    assert!((fps.frame_duration_ms() - 1000.0 / 60.0).abs() < 1e-9);
    assert!((fps.frames_to_ms(120) - 2000.0).abs() < 1e-9);
}

#[test]
fn fit_aspect_letterboxes_wide_and_tall_viewports() {
    // Wider than 16:9: height-limited.
    let wide = Canvas::fit_aspect(2560, 1080, 16, 9).unwrap();
    assert_eq!(wide.height, 1080);
    assert_eq!(wide.width, 1920);

    // Taller than 16:9: width-limited, rounded down to even.
    let tall = Canvas::fit_aspect(1001, 2000, 16, 9).unwrap();
    assert_eq!(tall.width, 1000);
    assert_eq!(tall.height % 2, 0);
    assert!(tall.height <= 563);

    assert!(Canvas::fit_aspect(0, 10, 16, 9).is_err());
}

#[test]
fn canvas_center_and_len() {
    let c = Canvas {
        width: 8,
        height: 4,
    };
    assert_eq!(c.center(), Point::new(4.0, 2.0));
    assert_eq!(c.rgba8_len(), 8 * 4 * 4);
}

