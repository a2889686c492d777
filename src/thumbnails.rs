//! Gallery thumbnail preparation, independent of the export path.

use image::ImageEncoder as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use rayon::prelude::*;

use crate::foundation::error::{KarmaError, KarmaResult};

/// Thumbnail size and encoding settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ThumbnailOpts {
    /// Maximum output width; narrower images keep their size.
    pub max_width_px: u32,
    /// JPEG quality, `1..=100`.
    pub quality: u8,
}

impl Default for ThumbnailOpts {
    fn default() -> Self {
        Self {
            max_width_px: 320,
            quality: 80,
        }
    }
}

impl ThumbnailOpts {
    /// Reject a zero width or an out-of-range quality.
    pub fn validate(&self) -> KarmaResult<()> {
        if self.max_width_px == 0 {
            return Err(KarmaError::validation("thumbnail max_width_px must be > 0"));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(KarmaError::validation(
                "thumbnail quality must be within 1..=100",
            ));
        }
        Ok(())
    }
}

/// One raw image file handed in by the gallery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawImageFile {
    /// File name reported back with the outcome.
    pub name: String,
    /// Encoded file contents.
    pub bytes: Vec<u8>,
}

/// Result for one input file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    /// JPEG thumbnail bytes.
    Ready {
        /// Input file name.
        name: String,
        /// Encoded JPEG.
        encoded: Vec<u8>,
    },
    /// The file could not be decoded or encoded.
    Failed {
        /// Input file name.
        name: String,
        /// Error description.
        error: String,
    },
}

impl ThumbnailOutcome {
    /// Input file name.
    pub fn name(&self) -> &str {
        match self {
            ThumbnailOutcome::Ready { name, .. } | ThumbnailOutcome::Failed { name, .. } => name,
        }
    }
}

/// Downsize and JPEG-encode every file in parallel.
///
/// Outcomes come back in input order; a failure in one file never affects the others.
pub fn prepare_thumbnails(
    files: &[RawImageFile],
    opts: ThumbnailOpts,
) -> KarmaResult<Vec<ThumbnailOutcome>> {
    opts.validate()?;
    let outcomes: Vec<ThumbnailOutcome> = files
        .par_iter()
        .map(|file| match thumbnail_jpeg(&file.bytes, opts) {
            Ok(encoded) => ThumbnailOutcome::Ready {
                name: file.name.clone(),
                encoded,
            },
            Err(e) => {
                tracing::warn!(file = %file.name, "thumbnail failed: {e}");
                ThumbnailOutcome::Failed {
                    name: file.name.clone(),
                    error: e.to_string(),
                }
            }
        })
        .collect();

    let failed = outcomes
        .iter()
        .filter(|o| matches!(o, ThumbnailOutcome::Failed { .. }))
        .count();
    tracing::debug!(files = files.len(), failed, "thumbnails prepared");
    Ok(outcomes)
}

fn thumbnail_jpeg(bytes: &[u8], opts: ThumbnailOpts) -> KarmaResult<Vec<u8>> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| KarmaError::load(format!("decode image: {e}")))?;
    let mut rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    if w > opts.max_width_px {
        let nh = ((u64::from(h) * u64::from(opts.max_width_px)) / u64::from(w)).max(1) as u32;
        rgb = image::imageops::resize(&rgb, opts.max_width_px, nh, FilterType::Triangle);
    }

    let (w, h) = rgb.dimensions();
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, opts.quality)
        .write_image(rgb.as_raw(), w, h, image::ExtendedColorType::Rgb8)
        .map_err(|e| KarmaError::Other(anyhow::anyhow!("encode jpeg thumbnail: {e}")))?;
    Ok(encoded)
}

#[cfg(test)]
#[path = "../tests/unit/thumbnails.rs"]
mod tests;
