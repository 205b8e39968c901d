// THEORY:
// The `HistogramAccumulator` is the only parallel stage of the engine. It scans every
// pixel of the source image, works out the pixel's intensity and its angular sector,
// and bumps the matching counter in a shared `HistogramGrid`.
//
// Key architectural principles:
// 1.  **Column Bands**: The image is split into contiguous bands of columns, one band
//     per worker. Bands are disjoint and together cover every column exactly once, so
//     every pixel is counted once. Within a band, columns are scanned top to bottom.
// 2.  **Blocking Workers**: Pixel scanning is pure CPU work, so each band runs on
//     tokio's blocking pool (`spawn_blocking`) instead of an async worker thread. The
//     pool size defaults to the number of logical cores.
// 3.  **Lock-Free Counting**: Workers never own the grid; they share it through an
//     `Arc` and only perform relaxed atomic increments. Two pixels in different bands
//     that hit the same (sector, intensity) cell is the normal case, not a corner case.
// 4.  **Single Barrier**: The caller awaits all workers together. Once the join
//     completes the workers' `Arc` clones are gone and the grid is unwrapped back into
//     exclusive ownership for the sequential stages that follow.
// 5.  **All or Nothing**: If any worker fails (unreadable pixel, panic) the request
//     fails and the grid is dropped. A shared abort flag tells the remaining workers
//     to stop at their next column.

use crate::core_modules::histogram_grid::HistogramGrid;
use crate::core_modules::pixel::pixel::PixelSource;
use crate::core_modules::sector_geometry::{ReferenceCoordinate, SectorGeometry};
use crate::error::{HistogramError, Result};
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Scans images into sector histograms using a pool of blocking workers.
#[derive(Debug, Clone)]
pub struct HistogramAccumulator {
    worker_count: usize,
}

impl HistogramAccumulator {
    pub fn new(worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(HistogramError::InvalidWorkerCount);
        }
        Ok(Self { worker_count })
    }

    /// One worker per logical core.
    pub fn with_available_cores() -> Self {
        Self {
            worker_count: num_cpus::get().max(1),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Counts every pixel of `image` into `grid[sector][intensity]`.
    ///
    /// On success, returns once every worker has finished; the counts do not depend on
    /// how the workers were scheduled. The first worker failure fails the call.
    pub async fn accumulate<I>(
        &self,
        image: Arc<I>,
        reference: ReferenceCoordinate,
        sector_count: usize,
    ) -> Result<HistogramGrid>
    where
        I: PixelSource + ?Sized + 'static,
    {
        let geometry = SectorGeometry::new(reference, sector_count)?;
        let grid = Arc::new(HistogramGrid::new(sector_count)?);
        let abort = Arc::new(AtomicBool::new(false));
        let bands = column_bands(image.width(), self.worker_count);

        debug!(
            width = image.width(),
            height = image.height(),
            sectors = sector_count,
            workers = bands.len(),
            "starting accumulation"
        );

        let workers = bands.into_iter().map(|band| {
            let image = Arc::clone(&image);
            let grid = Arc::clone(&grid);
            let abort = Arc::clone(&abort);
            let handle = tokio::task::spawn_blocking({
                let abort = Arc::clone(&abort);
                move || scan_band(image.as_ref(), &geometry, &grid, band, &abort)
            });

            async move {
                let outcome = handle
                    .await
                    .map_err(HistogramError::from)
                    .and_then(|outcome| outcome);
                if let Err(err) = &outcome {
                    warn!(error = %err, "accumulation worker failed");
                    abort.store(true, Ordering::Relaxed);
                }
                outcome
            }
        });

        futures::future::try_join_all(workers).await?;

        let grid = Arc::try_unwrap(grid).map_err(|_| HistogramError::AccumulationFailure {
            reason: "histogram grid still shared after all workers joined".to_string(),
        })?;
        debug!(pixels = grid.total_count(), "accumulation finished");
        Ok(grid)
    }
}

/// Scans the columns of one band into the shared grid.
fn scan_band<I>(
    image: &I,
    geometry: &SectorGeometry,
    grid: &HistogramGrid,
    columns: Range<u32>,
    abort: &AtomicBool,
) -> Result<()>
where
    I: PixelSource + ?Sized,
{
    let height = image.height();
    for x in columns {
        if abort.load(Ordering::Relaxed) {
            return Ok(());
        }
        for y in 0..height {
            let pixel = image
                .pixel(x, y)
                .ok_or_else(|| HistogramError::AccumulationFailure {
                    reason: format!("pixel ({x}, {y}) could not be read"),
                })?;
            grid.increment(geometry.sector_of(x, y), pixel.intensity());
        }
    }
    Ok(())
}

/// Splits `0..width` into at most `workers` contiguous, non-empty column ranges.
fn column_bands(width: u32, workers: usize) -> Vec<Range<u32>> {
    if width == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, width as usize) as u32;
    let band_width = width.div_ceil(workers);
    (0..width)
        .step_by(band_width as usize)
        .map(|start| start..(start + band_width).min(width))
        .collect()
}
