// THEORY:
// The cumulative transformer turns each sector's raw histogram into a discrete CDF:
// cell `j` becomes the number of the sector's pixels with intensity <= j. Rows are
// independent and each is a single left-to-right running sum, done in place on the
// grid the accumulator handed over. Afterwards every row is non-decreasing and its
// last cell is the sector's pixel count.

use crate::core_modules::histogram_grid::HistogramGrid;
use tracing::debug;

/// Replaces every sector row with its prefix sum.
pub fn cumulate(mut grid: HistogramGrid) -> HistogramGrid {
    for sector in 0..grid.sector_count() {
        let mut running = 0u64;
        for cell in grid.row_mut(sector) {
            running += *cell;
            *cell = running;
        }
    }
    debug!(sectors = grid.sector_count(), "cumulative histograms computed");
    grid
}
