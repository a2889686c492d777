use std::sync::Arc;

use crate::foundation::error::{KarmaError, KarmaResult};
use crate::foundation::math::mul_div255_u16;

/// A decoded bitmap ready to be drawn by the compositor.
///
/// Owned by one transition pass and dropped when that pass completes.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    /// Width in pixels (never zero).
    pub width: u32,
    /// Height in pixels (never zero).
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl DecodedImage {
    /// Wrap premultiplied RGBA8 pixels, rejecting empty or mis-sized buffers.
    pub fn from_premul_rgba8(width: u32, height: u32, rgba8_premul: Vec<u8>) -> KarmaResult<Self> {
        if width == 0 || height == 0 {
            return Err(KarmaError::load(format!(
                "decoded image has zero size ({width}x{height})"
            )));
        }
        if rgba8_premul.len() != width as usize * height as usize * 4 {
            return Err(KarmaError::load("decoded image byte length mismatch"));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
///
/// Any format supported by the `image` crate is accepted. Failures and zero-sized bitmaps are
/// reported as [`KarmaError::Load`].
pub fn decode_image(bytes: &[u8]) -> KarmaResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| KarmaError::load(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    DecodedImage::from_premul_rgba8(width, height, rgba8_premul)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        for c in &mut px[..3] {
            *c = mul_div255_u16(u16::from(*c), a) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
