// THEORY:
// Hosts usually show the source image scaled to fit a view, and the user picks the
// reference point by clicking on it. The `CoordinateMapper` converts such a
// display-space click into the integer pixel coordinate the engine works with, using
// only the displayed bounds and the natural image size:
//
//     image_x = floor(display_x / display_width  * image_width)
//     image_y = floor(display_y / display_height * image_height)
//
// Clicks outside the displayed bounds are mapped with the same formula and may land
// outside the image, which the engine accepts.

use crate::core_modules::sector_geometry::ReferenceCoordinate;
use crate::error::{HistogramError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    display_width: f64,
    display_height: f64,
    image_width: u32,
    image_height: u32,
}

impl CoordinateMapper {
    pub fn new(
        display_width: f64,
        display_height: f64,
        image_width: u32,
        image_height: u32,
    ) -> Result<Self> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(display_width) || !positive(display_height) {
            return Err(HistogramError::InvalidDisplayBounds {
                width: display_width,
                height: display_height,
            });
        }
        Ok(Self {
            display_width,
            display_height,
            image_width,
            image_height,
        })
    }

    pub fn map_to_image_space(&self, display_x: f64, display_y: f64) -> ReferenceCoordinate {
        let x = (display_x / self.display_width * self.image_width as f64).floor();
        let y = (display_y / self.display_height * self.image_height as f64).floor();
        ReferenceCoordinate::new(x as i64, y as i64)
    }
}
