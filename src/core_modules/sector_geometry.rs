// THEORY:
// The `sector_geometry` module owns the angular half of the histogram: given a
// reference point and a number of sectors, which sector does a pixel fall into?
//
// The angle is measured with `atan2(dy, dx) + PI`, which maps the plane onto
// [0, 2*PI]. Zero therefore points "west" of the reference point (negative x), the
// angle grows through north (negative y in image space), east and south, and the
// exact west direction comes back around as 2*PI. That single boundary value is
// wrapped to zero so every pixel lands in a valid sector.
//
// Sector indices come from `floor(degrees / 360 * sector_count)`. When 360 is not a
// multiple of the angle step the sector count is floored, and this formula spreads the
// leftover angle evenly over all sectors instead of widening the last one.

use crate::error::{HistogramError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const FULL_TURN_DEGREES: f64 = 360.0;

pub type SectorIndex = usize;

/// Upper bound on sectors (an angle step of 0.001 degrees). One grid row costs 2 KiB,
/// so this caps a request's grid at roughly 700 MiB.
pub const MAX_SECTOR_COUNT: usize = 360_000;

/// The origin of angular measurement, in image pixel space.
/// May lie outside the image; the angle is defined everywhere except the point itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceCoordinate {
    pub x: i64,
    pub y: i64,
}

impl ReferenceCoordinate {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl From<(i64, i64)> for ReferenceCoordinate {
    fn from((x, y): (i64, i64)) -> Self {
        Self::new(x, y)
    }
}

/// A validated angular step in degrees, `0 < step <= 360`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleStep {
    degrees: f64,
    sector_count: usize,
}

impl AngleStep {
    pub fn new(degrees: f64) -> Result<Self> {
        let invalid = HistogramError::InvalidAngleStep { angle_step: degrees };
        if !degrees.is_finite() || degrees <= 0.0 || degrees > FULL_TURN_DEGREES {
            return Err(invalid);
        }

        // The sector count becomes the grid height and the rendered image width.
        let sectors = (FULL_TURN_DEGREES / degrees).floor();
        if sectors < 1.0 || sectors > MAX_SECTOR_COUNT as f64 {
            return Err(invalid);
        }

        Ok(Self {
            degrees,
            sector_count: sectors as usize,
        })
    }

    pub fn degrees(&self) -> f64 {
        self.degrees
    }

    /// `floor(360 / step)`, always at least 1.
    pub fn sector_count(&self) -> usize {
        self.sector_count
    }
}

/// Assigns pixels to angular sectors around a fixed reference point.
#[derive(Debug, Clone, Copy)]
pub struct SectorGeometry {
    reference: ReferenceCoordinate,
    sector_count: usize,
}

impl SectorGeometry {
    pub fn new(reference: ReferenceCoordinate, sector_count: usize) -> Result<Self> {
        if sector_count == 0 {
            return Err(HistogramError::InvalidSectorCount);
        }
        Ok(Self {
            reference,
            sector_count,
        })
    }

    pub fn reference(&self) -> ReferenceCoordinate {
        self.reference
    }

    pub fn sector_count(&self) -> usize {
        self.sector_count
    }

    /// Angle of the pixel as seen from the reference point, in degrees [0, 360).
    pub fn angle_degrees(&self, x: u32, y: u32) -> f64 {
        // In f64: the reference may sit anywhere in i64 space.
        let dx = f64::from(x) - self.reference.x as f64;
        let dy = f64::from(y) - self.reference.y as f64;
        let theta = dy.atan2(dx) + PI;
        let degrees = theta * FULL_TURN_DEGREES / (2.0 * PI);
        if degrees >= FULL_TURN_DEGREES { 0.0 } else { degrees }
    }

    pub fn sector_of(&self, x: u32, y: u32) -> SectorIndex {
        let degrees = self.angle_degrees(x, y);
        let sector = (degrees / FULL_TURN_DEGREES * self.sector_count as f64).floor() as usize;
        // Rounding must never produce an index one past the end.
        sector.min(self.sector_count - 1)
    }
}
