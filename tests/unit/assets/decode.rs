use std::io::Cursor;

use super::*;

#[test]
fn decode_image_png_dimensions_and_premul() {
    let src_rgba = vec![100u8, 50u8, 200u8, 128u8];
    let img = image::RgbaImage::from_raw(1, 1, src_rgba).unwrap();

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let decoded = decode_image(&buf).unwrap();
    assert_eq!(decoded.width, 1);
    assert_eq!(decoded.height, 1);
    assert_eq!(
        decoded.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn garbage_bytes_are_a_load_error() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(matches!(err, KarmaError::Load(_)));
}

#[test]
fn zero_sized_bitmaps_are_rejected() {
    let err = DecodedImage::from_premul_rgba8(0, 4, Vec::new()).unwrap_err();
    assert!(matches!(err, KarmaError::Load(_)));

    let err = DecodedImage::from_premul_rgba8(2, 2, vec![0; 3]).unwrap_err();
    assert!(matches!(err, KarmaError::Load(_)));
}
