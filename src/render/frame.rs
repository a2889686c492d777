use crate::foundation::core::Canvas;

/// One rendered output frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 pixels, row-major, tightly packed.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha. Compositor output always is.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// A fully transparent frame of the canvas size.
    pub fn transparent(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.rgba8_len()],
            premultiplied: true,
        }
    }

    /// Read the pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Mean alpha over all pixels, in `[0, 255]`.
    pub fn mean_alpha(&self) -> f64 {
        let n = (self.width as usize * self.height as usize).max(1);
        let sum: u64 = self.data.chunks_exact(4).map(|px| u64::from(px[3])).sum();
        sum as f64 / n as f64
    }
}
