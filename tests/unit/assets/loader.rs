use std::io::Cursor;

use super::*;

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn blob_refs_decode_in_memory() {
    let loader = FsImageLoader::default();
    let img = loader
        .load(&ImageRef::blob("a.png", png_bytes(3, 2)))
        .unwrap();
    assert_eq!((img.width, img.height), (3, 2));
}

#[test]
fn relative_and_file_url_paths_resolve_against_root() {
    let dir = std::env::temp_dir().join(format!("karma_loader_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("slide.png"), png_bytes(4, 4)).unwrap();

    let loader = FsImageLoader::new(&dir);
    assert_eq!(loader.load(&ImageRef::from("slide.png")).unwrap().width, 4);

    let url = format!("file://{}", dir.join("slide.png").display());
    assert_eq!(loader.load(&ImageRef::from(url.as_str())).unwrap().height, 4);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_remote_and_corrupt_images_are_load_errors() {
    let loader = FsImageLoader::new(std::env::temp_dir());
    for r in [
        ImageRef::from("karma-definitely-missing.png"),
        ImageRef::from("https://example.invalid/x.png"),
        ImageRef::blob("bad", b"nope".to_vec()),
    ] {
        let err = loader.load(&r).unwrap_err();
        assert!(matches!(err, KarmaError::Load(_)), "{r:?} -> {err}");
    }
}

#[test]
fn debug_output_hides_blob_bytes() {
    let r = ImageRef::blob("x", vec![1u8, 2, 3]);
    let s = format!("{r:?}");
    assert!(s.contains("len: 3"));
    assert_eq!(r.label(), "blob:x");
}
