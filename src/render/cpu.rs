use std::sync::Arc;

use crate::assets::decode::DecodedImage;
use crate::effects::blur::blur_rgba8_premul_in_place;
use crate::effects::catalog::EffectTransform;
use crate::foundation::core::{Affine, Canvas};
use crate::foundation::error::{KarmaError, KarmaResult};
use crate::render::fit::Placement;
use crate::render::frame::FrameRGBA;

const BORDER_RGBA: [u8; 4] = [255, 255, 255, 255];

/// A decoded image converted once into a `vello_cpu` paint for the length of one transition.
pub(crate) struct SlidePaint {
    image: vello_cpu::Image,
    width: f64,
    height: f64,
}

impl SlidePaint {
    pub(crate) fn from_decoded(img: &DecodedImage) -> KarmaResult<Self> {
        let pixmap =
            image_premul_bytes_to_pixmap(img.rgba8_premul.as_slice(), img.width, img.height)?;
        Ok(Self {
            image: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
            width: f64::from(img.width),
            height: f64::from(img.height),
        })
    }
}

/// CPU rasterizer drawing one slide per call onto a fresh transparent frame.
pub(crate) struct CpuRasterizer {
    canvas: Canvas,
    width: u16,
    height: u16,
    background_rgba: [u8; 4],
}

impl CpuRasterizer {
    pub(crate) fn new(canvas: Canvas, background_rgba: [u8; 4]) -> KarmaResult<Self> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| KarmaError::validation("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| KarmaError::validation("canvas height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(KarmaError::validation("canvas width/height must be non-zero"));
        }
        Ok(Self {
            canvas,
            width,
            height,
            background_rgba,
        })
    }

    /// Clear, then draw background, optional letterbox border and image, all under `fx`.
    pub(crate) fn draw(
        &self,
        paint: &SlidePaint,
        placement: &Placement,
        fx: &EffectTransform,
    ) -> KarmaResult<FrameRGBA> {
        // A collapsed transform or a fully transparent layer leaves the cleared frame.
        if fx.is_degenerate() || fx.opacity <= 0.0 {
            return Ok(FrameRGBA::transparent(self.canvas));
        }

        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(affine_to_cpu(fx.affine));

        let layered = fx.opacity < 1.0;
        if layered {
            ctx.push_opacity_layer(fx.opacity as f32);
        }

        let [r, g, b, a] = self.background_rgba;
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.fill_rect(&rect_to_cpu(self.canvas.rect()));

        if let Some(border) = placement.border_rect {
            let [r, g, b, a] = BORDER_RGBA;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_rect(&rect_to_cpu(border));
        }

        let dst = placement.image_rect;
        let image_to_frame = fx.affine
            * Affine::translate((dst.x0, dst.y0))
            * Affine::scale_non_uniform(dst.width() / paint.width, dst.height() / paint.height);
        ctx.set_transform(affine_to_cpu(image_to_frame));
        ctx.set_paint(paint.image.clone());
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            paint.width,
            paint.height,
        ));

        if layered {
            ctx.pop_layer();
        }
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.render_to_pixmap(&mut pixmap);
        let mut data = pixmap.data_as_u8_slice().to_vec();

        if fx.blur_px > 0.0 {
            blur_rgba8_premul_in_place(
                &mut data,
                self.canvas.width,
                self.canvas.height,
                fx.blur_px,
            )?;
        }

        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data,
            premultiplied: true,
        })
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: crate::foundation::core::Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> KarmaResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| KarmaError::load("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| KarmaError::load("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(KarmaError::load("decoded image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}
