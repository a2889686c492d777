use super::*;

#[test]
fn zero_sigma_is_identity() {
    let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
    let mut buf = src.clone();
    blur_rgba8_premul_in_place(&mut buf, 1, 2, 0.0).unwrap();
    assert_eq!(buf, src);
}

#[test]
fn constant_image_is_identity() {
    let (w, h) = (4u32, 3u32);
    let px = [10u8, 20u8, 30u8, 40u8];
    let src = px.repeat((w * h) as usize);
    let mut buf = src.clone();
    blur_rgba8_premul_in_place(&mut buf, w, h, 1.5).unwrap();
    assert_eq!(buf, src);
}

#[test]
fn blur_spreads_energy_from_single_pixel() {
    let (w, h) = (7u32, 7u32);
    let mut buf = vec![0u8; (w * h * 4) as usize];
    let center = ((3 * w + 3) * 4) as usize;
    buf[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

    blur_rgba8_premul_in_place(&mut buf, w, h, 0.8).unwrap();

    let nonzero = buf.chunks_exact(4).filter(|px| px[3] != 0).count();
    assert!(nonzero > 1);

    let sum_a: u32 = buf.chunks_exact(4).map(|px| u32::from(px[3])).sum();
    assert!((sum_a as i32 - 255).abs() <= 6);
}

#[test]
fn size_mismatch_is_rejected() {
    let mut buf = vec![0u8; 12];
    assert!(blur_rgba8_premul_in_place(&mut buf, 2, 2, 3.0).is_err());
}
