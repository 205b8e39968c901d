// THEORY:
// The `SectoralImageRenderer` is the last stage. It turns a cumulated grid into a
// picture: one column per sector, one row per intensity level, brightness equal to the
// fraction of the sector's pixels at or below that level.
//
// Two details of the output shape are part of its contract:
// - The image is 255 rows tall, covering levels 0..=254. Level 255 is always exactly
//   1.0 after normalization and is not drawn.
// - A sector with no pixels cannot be normalized. That is reported as
//   `EmptySector` instead of writing NaN or clamping it into range.

use crate::core_modules::histogram_grid::HistogramGrid;
use crate::core_modules::pixel::pixel::MAX_INTENSITY;
use crate::error::{HistogramError, Result};
use image::{GrayImage, ImageBuffer, Luma};
use tracing::debug;

/// Grayscale luminance in [0.0, 1.0]; `width = sector count`, `height = RENDERED_ROWS`.
pub type RenderedImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Intensity rows drawn per sector (levels 0..=254).
pub const RENDERED_ROWS: u32 = MAX_INTENSITY as u32;

/// Normalizes every cumulative row by its sector total.
pub fn render(grid: HistogramGrid) -> Result<RenderedImage> {
    let sector_count = grid.sector_count();
    let width = u32::try_from(sector_count).map_err(|_| HistogramError::InvalidSectorCount)?;
    if width == 0 {
        return Err(HistogramError::InvalidSectorCount);
    }

    if let Some(sector) = (0..sector_count).find(|&s| grid.sector_total(s) == 0) {
        return Err(HistogramError::EmptySector { sector });
    }

    let mut image = RenderedImage::new(width, RENDERED_ROWS);
    for sector in 0..sector_count {
        let total = grid.sector_total(sector) as f64;
        for level in 0..RENDERED_ROWS {
            let value = grid.count(sector, level as usize) as f64 / total;
            image.put_pixel(sector as u32, level, Luma([value as f32]));
        }
    }

    debug!(width, height = RENDERED_ROWS, "sector image rendered");
    Ok(image)
}

/// 8-bit copy of a rendered image for display or encoding.
pub fn to_gray8(image: &RenderedImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = image.get_pixel(x, y).0[0].clamp(0.0, 1.0);
        Luma([(value * 255.0).round() as u8])
    })
}
