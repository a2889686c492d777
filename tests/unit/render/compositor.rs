use super::*;
use crate::render::fit::FitMode;

const RED: [u8; 4] = [255, 0, 0, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

fn solid(width: u32, height: u32, rgba: [u8; 4]) -> DecodedImage {
    let data = rgba.repeat(width as usize * height as usize);
    DecodedImage::from_premul_rgba8(width, height, data).unwrap()
}

fn renderer(mode: FitMode) -> SlideRenderer {
    let canvas = Canvas {
        width: 64,
        height: 36,
    };
    SlideRenderer::new(canvas, FitPolicy::new(mode), BLACK).unwrap()
}

fn close(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= 2)
}

struct OneImage(DecodedImage);

impl ImageLoader for OneImage {
    fn load(&self, _image: &ImageRef) -> KarmaResult<DecodedImage> {
        Ok(self.0.clone())
    }
}

struct Broken;

impl ImageLoader for Broken {
    fn load(&self, image: &ImageRef) -> KarmaResult<DecodedImage> {
        Err(KarmaError::load(format!("cannot fetch {}", image.label())))
    }
}

#[test]
fn fade_starts_transparent_and_settles_on_the_image() {
    let r = renderer(FitMode::CoverFill);
    let slide = r.prepare(&solid(16, 9, RED)).unwrap();

    let first = r.render(&slide, Effect::Fade, 0.0).unwrap();
    assert!(first.data.iter().all(|b| *b == 0));

    let last = r.render(&slide, Effect::Fade, 1.0).unwrap();
    assert!(close(last.pixel(32, 18).unwrap(), RED));
}

#[test]
fn fade_alpha_grows_with_progress() {
    let r = renderer(FitMode::CoverFill);
    let slide = r.prepare(&solid(16, 9, RED)).unwrap();
    let alphas: Vec<f64> = [0.0, 0.25, 0.5, 0.75, 1.0]
        .iter()
        .map(|p| r.render(&slide, Effect::Fade, *p).unwrap().mean_alpha())
        .collect();
    assert!(alphas.windows(2).all(|w| w[0] < w[1]), "{alphas:?}");
}

#[test]
fn unknown_effect_draws_centered_without_transform() {
    let r = renderer(FitMode::ContainWithLetterbox);
    let slide = r.prepare(&solid(32, 32, RED)).unwrap();
    let effect = Effect::from_name("sparkle");
    assert_eq!(effect, Effect::None);

    let settled = r.render(&slide, Effect::None, 1.0).unwrap();
    for p in [0.0, 0.3, 0.5, 1.0] {
        let frame = r.render(&slide, effect, p).unwrap();
        assert_eq!(frame, settled);
    }

    assert!(close(settled.pixel(32, 18).unwrap(), RED));
    assert!(close(settled.pixel(2, 18).unwrap(), BLACK));
    assert!(close(settled.pixel(11, 18).unwrap(), [255, 255, 255, 255]));
    assert!(close(settled.pixel(61, 18).unwrap(), BLACK));
}

#[test]
fn slide_moves_the_image_right_at_start() {
    let r = renderer(FitMode::ContainWithLetterbox);
    let slide = r.prepare(&solid(32, 32, RED)).unwrap();
    let start = r.render(&slide, Effect::Slide, 0.0).unwrap();
    // 300px offset pushes the whole slide off a 64px canvas.
    assert!(start.pixel(32, 18).unwrap()[3] == 0);
}

#[test]
fn collapsed_scale_renders_an_empty_frame() {
    let r = renderer(FitMode::CoverFill);
    let slide = r.prepare(&solid(8, 8, RED)).unwrap();
    let frame = r.render(&slide, Effect::ScaleX, 0.0).unwrap();
    assert_eq!(frame.mean_alpha(), 0.0);
}

#[test]
fn blur_softens_edges_then_sharpens() {
    let r = renderer(FitMode::ContainWithLetterbox);
    let slide = r.prepare(&solid(32, 32, RED)).unwrap();
    let sharp = r.render(&slide, Effect::Blur, 1.0).unwrap();
    let blurred = r.render(&slide, Effect::Blur, 0.0).unwrap();
    assert_eq!(sharp, r.render(&slide, Effect::None, 1.0).unwrap());
    assert_ne!(sharp, blurred);
}

#[test]
fn pass_walks_loading_animating_done() {
    let r = renderer(FitMode::CoverFill);
    let loader = OneImage(solid(16, 9, RED));
    let mut pass = TransitionPass::new(
        &r,
        ImageRef::from("a.png"),
        TransitionSpec::new(Effect::Fade, 100),
        Fps::DEFAULT,
    );
    assert_eq!(pass.phase(), TransitionPhase::Loading);
    assert!(pass.next_frame().is_none());

    pass.load(&loader).unwrap();
    assert_eq!(pass.phase(), TransitionPhase::Animating);
    assert_eq!(pass.frame_count(), Some(6));

    let mut progress = Vec::new();
    while let Some(frame) = pass.next_frame() {
        progress.push(frame.unwrap().tick.progress);
    }
    assert_eq!(progress.len(), 6);
    assert_eq!(progress[0], 0.0);
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*progress.last().unwrap(), 1.0);
    assert_eq!(pass.phase(), TransitionPhase::Done);
    assert!(pass.next_frame().is_none());
}

#[test]
fn load_failure_keeps_the_pass_loading() {
    let r = renderer(FitMode::CoverFill);
    let mut pass = TransitionPass::new(
        &r,
        ImageRef::from("missing.png"),
        TransitionSpec::new(Effect::Zoom, 100),
        Fps::DEFAULT,
    );
    let err = pass.load(&Broken).unwrap_err();
    assert!(matches!(err, KarmaError::Load(_)));
    assert_eq!(pass.phase(), TransitionPhase::Loading);
    assert!(pass.next_frame().is_none());
}

#[test]
fn progress_at_clamps() {
    let spec = TransitionSpec::new(Effect::Fade, 1000);
    assert_eq!(spec.progress_at(-5.0), 0.0);
    assert_eq!(spec.progress_at(500.0), 0.5);
    assert_eq!(spec.progress_at(5000.0), 1.0);
    assert!(TransitionSpec::new(Effect::Fade, 0).validate().is_err());
}
