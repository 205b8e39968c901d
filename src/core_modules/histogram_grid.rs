// THEORY:
// The `HistogramGrid` is the only shared mutable state in the engine. It holds one
// row of 256 counters per sector, one counter per intensity level, stored flat and
// sector-major so a row is a contiguous slice.
//
// Its lifecycle has three phases, and each phase gets a different kind of access:
// 1.  **Accumulation**: many workers hold `&HistogramGrid` (through an `Arc`) and only
//     ever call `increment`, a relaxed atomic add. Increments commute, so the final
//     counts do not depend on which worker got there first.
// 2.  **Cumulation**: after every worker has been joined, the grid is owned again by a
//     single caller, and `row_mut` hands out plain `&mut u64` cells through
//     `AtomicU64::get_mut`. No atomic traffic happens in this phase.
// 3.  **Rendering**: read-only.
//
// A grid is created per request and dropped after rendering; it is never reused.

use crate::core_modules::pixel::pixel::{INTENSITY_LEVELS, IntensityLevel, MAX_INTENSITY};
use crate::core_modules::sector_geometry::SectorIndex;
use crate::error::{HistogramError, Result};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct HistogramGrid {
    sector_count: usize,
    cells: Vec<AtomicU64>,
}

impl HistogramGrid {
    /// Creates a zeroed grid with `INTENSITY_LEVELS` counters per sector.
    ///
    /// Fails instead of aborting when the cells cannot be allocated.
    pub fn new(sector_count: usize) -> Result<Self> {
        let too_large = || HistogramError::GridAllocation { sector_count };
        let len = sector_count
            .checked_mul(INTENSITY_LEVELS)
            .ok_or_else(too_large)?;

        let mut cells = Vec::new();
        cells.try_reserve_exact(len).map_err(|_| too_large())?;
        cells.extend((0..len).map(|_| AtomicU64::new(0)));

        Ok(Self {
            sector_count,
            cells,
        })
    }

    pub fn sector_count(&self) -> usize {
        self.sector_count
    }

    #[inline]
    fn index(sector: SectorIndex, level: usize) -> usize {
        sector * INTENSITY_LEVELS + level
    }

    /// Adds one pixel to `(sector, level)`. Safe to call from many threads at once.
    #[inline]
    pub fn increment(&self, sector: SectorIndex, level: IntensityLevel) {
        self.cells[Self::index(sector, level as usize)].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, sector: SectorIndex, level: usize) -> u64 {
        self.cells[Self::index(sector, level)].load(Ordering::Relaxed)
    }

    /// A copy of one sector's 256 counters.
    pub fn row(&self, sector: SectorIndex) -> Vec<u64> {
        (0..INTENSITY_LEVELS)
            .map(|level| self.count(sector, level))
            .collect()
    }

    /// The last cell of a sector's row. After cumulation this is the number of pixels
    /// the sector received.
    pub fn sector_total(&self, sector: SectorIndex) -> u64 {
        self.count(sector, MAX_INTENSITY)
    }

    /// Sum of every cell. Before cumulation this equals the number of scanned pixels.
    pub fn total_count(&self) -> u64 {
        self.cells.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    /// Exclusive, non-atomic access to one sector's counters.
    pub fn row_mut(&mut self, sector: SectorIndex) -> impl Iterator<Item = &mut u64> {
        let start = Self::index(sector, 0);
        self.cells[start..start + INTENSITY_LEVELS]
            .iter_mut()
            .map(AtomicU64::get_mut)
    }
}

impl std::fmt::Debug for HistogramGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistogramGrid")
            .field("sector_count", &self.sector_count)
            .field("total_count", &self.total_count())
            .finish()
    }
}
