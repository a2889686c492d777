use super::*;

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn file(name: &str, bytes: Vec<u8>) -> RawImageFile {
    RawImageFile {
        name: name.to_owned(),
        bytes,
    }
}

#[test]
fn wide_images_shrink_to_max_width_keeping_aspect() {
    let out = thumbnail_jpeg(&png(400, 200), ThumbnailOpts::default()).unwrap();
    let decoded = image::load_from_memory(&out).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (320, 160));
}

#[test]
fn narrow_images_are_not_upscaled() {
    let out = thumbnail_jpeg(&png(100, 60), ThumbnailOpts::default()).unwrap();
    let decoded = image::load_from_memory(&out).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (100, 60));
}

#[test]
fn invalid_quality_is_rejected() {
    let opts = ThumbnailOpts {
        max_width_px: 10,
        quality: 0,
    };
    assert!(prepare_thumbnails(&[], opts).is_err());
}

#[test]
fn one_bad_file_does_not_stop_the_rest() {
    let files = vec![
        file("a.png", png(50, 50)),
        file("notes.txt", b"hello".to_vec()),
        file("c.png", png(640, 480)),
    ];
    let out = prepare_thumbnails(&files, ThumbnailOpts::default()).unwrap();
    let names: Vec<&str> = out.iter().map(ThumbnailOutcome::name).collect();
    assert_eq!(names, ["a.png", "notes.txt", "c.png"]);
    assert!(matches!(out[0], ThumbnailOutcome::Ready { .. }));
    assert!(matches!(&out[1], ThumbnailOutcome::Failed { error, .. } if error.starts_with("load error")));
    assert!(matches!(out[2], ThumbnailOutcome::Ready { .. }));
}
