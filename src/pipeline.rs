// THEORY:
// The `pipeline` module is the top-level API of the engine. It wraps the three stages
// into a single call: validate parameters, accumulate in parallel, cumulate, render.
//
// Parameters are validated when the pipeline is built, so an invalid angle step is
// rejected before any pixel is read. Each `compute` call creates its own grid and
// hands it from stage to stage by value; nothing survives between requests, so one
// pipeline can serve any number of images and reference points.

use crate::core_modules::accumulator::HistogramAccumulator;
use crate::core_modules::cumulative::cumulate;
use crate::core_modules::pixel::pixel::PixelSource;
use crate::core_modules::renderer::render;
use crate::core_modules::sector_geometry::AngleStep;
use crate::error::{HistogramError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

// Re-export key data structures for the public API.
pub use crate::core_modules::renderer::RenderedImage;
pub use crate::core_modules::sector_geometry::ReferenceCoordinate;

pub const DEFAULT_ANGLE_STEP: f64 = 10.0;

/// Configuration for the SectorPipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    /// Width of one angular sector in degrees, `0 < angle_step <= 360`.
    pub angle_step: f64,
    /// Number of accumulation workers. `None` uses one per logical core.
    pub worker_count: Option<usize>,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            angle_step: DEFAULT_ANGLE_STEP,
            worker_count: None,
        }
    }
}

impl HistogramConfig {
    pub fn validate(&self) -> Result<()> {
        AngleStep::new(self.angle_step)?;
        if self.worker_count == Some(0) {
            return Err(HistogramError::InvalidWorkerCount);
        }
        Ok(())
    }
}

/// The output of one computation.
#[derive(Debug, Clone)]
pub struct SectorReport {
    /// Sectors as columns, intensity levels 0..=254 as rows.
    pub image: RenderedImage,
    pub sector_count: usize,
    pub reference: ReferenceCoordinate,
    pub elapsed: Duration,
}

pub struct SectorPipeline {
    config: HistogramConfig,
    angle_step: AngleStep,
    accumulator: HistogramAccumulator,
}

impl SectorPipeline {
    pub fn new(config: HistogramConfig) -> Result<Self> {
        config.validate()?;
        let angle_step = AngleStep::new(config.angle_step)?;
        let accumulator = match config.worker_count {
            Some(workers) => HistogramAccumulator::new(workers)?,
            None => HistogramAccumulator::with_available_cores(),
        };
        Ok(Self {
            config,
            angle_step,
            accumulator,
        })
    }

    pub fn config(&self) -> &HistogramConfig {
        &self.config
    }

    pub fn sector_count(&self) -> usize {
        self.angle_step.sector_count()
    }

    /// Runs accumulate -> cumulate -> render for one image and reference point.
    pub async fn compute<I>(&self, image: Arc<I>, reference: ReferenceCoordinate) -> Result<SectorReport>
    where
        I: PixelSource + ?Sized + 'static,
    {
        let started = Instant::now();
        let sector_count = self.sector_count();

        let grid = self
            .accumulator
            .accumulate(image, reference, sector_count)
            .await?;
        let grid = cumulate(grid);
        let image = render(grid)?;

        let elapsed = started.elapsed();
        info!(
            sectors = sector_count,
            x = reference.x,
            y = reference.y,
            elapsed_ms = elapsed.as_millis() as u64,
            "sector histogram computed"
        );

        Ok(SectorReport {
            image,
            sector_count,
            reference,
            elapsed,
        })
    }
}

/// One-shot helper: builds a default pipeline for `angle_step` and renders one image.
pub async fn compute_sector_histogram<I>(
    image: Arc<I>,
    reference: ReferenceCoordinate,
    angle_step: f64,
) -> Result<RenderedImage>
where
    I: PixelSource + ?Sized + 'static,
{
    let config = HistogramConfig {
        angle_step,
        ..HistogramConfig::default()
    };
    let report = SectorPipeline::new(config)?.compute(image, reference).await?;
    Ok(report.image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::{MAX_INTENSITY, Pixel};
    use crate::core_modules::renderer::RENDERED_ROWS;
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn gray_image(rows: &[&[u8]]) -> RgbaImage {
        RgbaImage::from_fn(rows[0].len() as u32, rows.len() as u32, |x, y| {
            let level = rows[y as usize][x as usize];
            Rgba([level, level, level, 255])
        })
    }

    fn textured_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([
                ((x * 13 + y * 3) % 256) as u8,
                ((x * 7 + y * 29) % 256) as u8,
                ((x + y * y) % 256) as u8,
                255,
            ])
        })
    }

    fn pipeline(angle_step: f64, workers: usize) -> SectorPipeline {
        SectorPipeline::new(HistogramConfig {
            angle_step,
            worker_count: Some(workers),
        })
        .unwrap()
    }

    /// Counts reads so tests can prove nothing was scanned.
    struct CountingRaster {
        reads: AtomicUsize,
    }

    impl PixelSource for CountingRaster {
        fn width(&self) -> u32 {
            8
        }

        fn height(&self) -> u32 {
            8
        }

        fn pixel(&self, _x: u32, _y: u32) -> Option<Pixel> {
            self.reads.fetch_add(1, Ordering::Relaxed);
            Some(Pixel::gray(0))
        }
    }

    #[tokio::test]
    async fn single_pixel_sectors_render_as_steps() {
        // Around the center of a 3x3 image with 45 degree sectors:
        //   [1, 2, 3]
        //   [0, 4, 4]
        //   [7, 6, 5]
        let image = gray_image(&[&[64, 128, 255], &[0, 200, 200], &[32, 100, 160]]);
        let report = pipeline(45.0, 2)
            .compute(Arc::new(image), ReferenceCoordinate::new(1, 1))
            .await
            .unwrap();

        assert_eq!(report.sector_count, 8);
        assert_eq!(report.image.dimensions(), (8, RENDERED_ROWS));

        let step_at = [0u32, 64, 128, 255, 200, 160, 100, 32];
        for (sector, &level) in step_at.iter().enumerate() {
            for row in 0..RENDERED_ROWS {
                let expected = if row >= level { 1.0 } else { 0.0 };
                assert_eq!(
                    report.image.get_pixel(sector as u32, row).0[0],
                    expected,
                    "sector {sector}, row {row}"
                );
            }
        }
    }

    #[tokio::test]
    async fn two_by_two_quarters_around_the_corner() {
        // Seen from its top-left pixel, a 2x2 image spans only two quarter turns:
        // the pixel itself and both eastern pixels sit at 180-225 degrees (sector 2),
        // the pixel below at 270 degrees (sector 3). Sectors 0 and 1 stay empty.
        let image = Arc::new(gray_image(&[&[0, 64], &[128, 255]]));
        let reference = ReferenceCoordinate::new(0, 0);

        let grid = HistogramAccumulator::new(2)
            .unwrap()
            .accumulate(Arc::clone(&image), reference, 4)
            .await
            .unwrap();
        assert_eq!(grid.row(0).iter().sum::<u64>(), 0);
        assert_eq!(grid.row(1).iter().sum::<u64>(), 0);
        for level in [0, 64, 255] {
            assert_eq!(grid.count(2, level), 1, "level {level}");
        }
        assert_eq!(grid.count(3, 128), 1);
        assert_eq!(grid.total_count(), 4);

        let result = pipeline(90.0, 2).compute(image, reference).await;
        match result {
            Err(HistogramError::EmptySector { sector }) => assert_eq!(sector, 0),
            other => panic!("expected EmptySector, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cumulated_grid_conserves_pixels_and_is_monotonic() {
        let image = Arc::new(textured_image(41, 29));
        let grid = HistogramAccumulator::new(5)
            .unwrap()
            .accumulate(image, ReferenceCoordinate::new(20, 14), 36)
            .await
            .unwrap();
        let grid = cumulate(grid);

        let total: u64 = (0..36).map(|s| grid.sector_total(s)).sum();
        assert_eq!(total, 41 * 29);
        for sector in 0..36 {
            let row = grid.row(sector);
            assert!(row.windows(2).all(|w| w[0] <= w[1]));
            assert_eq!(row[MAX_INTENSITY], grid.sector_total(sector));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn repeated_runs_are_bit_identical() {
        let image = Arc::new(textured_image(64, 48));
        let reference = ReferenceCoordinate::new(30, 20);

        let first = pipeline(15.0, 1)
            .compute(Arc::clone(&image), reference)
            .await
            .unwrap();
        for workers in [2, 7, 32] {
            let again = pipeline(15.0, workers)
                .compute(Arc::clone(&image), reference)
                .await
                .unwrap();
            let bits = |img: &RenderedImage| img.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
            assert_eq!(bits(&first.image), bits(&again.image), "workers = {workers}");
        }
    }

    #[tokio::test]
    async fn full_turn_renders_one_column() {
        let image = Arc::new(textured_image(10, 10));
        let report = pipeline(360.0, 3)
            .compute(image, ReferenceCoordinate::new(5, 5))
            .await
            .unwrap();
        assert_eq!(report.sector_count, 1);
        assert_eq!(report.image.dimensions(), (1, 255));
    }

    #[tokio::test]
    async fn image_on_one_side_leaves_sectors_empty() {
        // Every pixel is east of the reference, so the western sectors stay empty.
        let image = Arc::new(textured_image(10, 10));
        let result = pipeline(10.0, 2)
            .compute(image, ReferenceCoordinate::new(-5, 5))
            .await;
        match result {
            Err(HistogramError::EmptySector { sector }) => assert_eq!(sector, 0),
            other => panic!("expected EmptySector, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_angle_step_is_rejected_before_scanning() {
        let raster = Arc::new(CountingRaster {
            reads: AtomicUsize::new(0),
        });
        for bad in [0.0, -10.0, 361.0, 1e-5] {
            let result =
                compute_sector_histogram(Arc::clone(&raster), ReferenceCoordinate::new(0, 0), bad)
                    .await;
            assert!(matches!(result, Err(HistogramError::InvalidAngleStep { .. })));
        }
        assert_eq!(raster.reads.load(Ordering::Relaxed), 0);

        let image = compute_sector_histogram(raster.clone(), ReferenceCoordinate::new(4, 4), 180.0)
            .await
            .unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(raster.reads.load(Ordering::Relaxed), 64);
    }

    #[test]
    fn config_defaults_and_validation() {
        let config = HistogramConfig::default();
        assert_eq!(config.angle_step, DEFAULT_ANGLE_STEP);
        assert!(config.validate().is_ok());

        let no_workers = HistogramConfig {
            worker_count: Some(0),
            ..HistogramConfig::default()
        };
        assert!(matches!(
            no_workers.validate(),
            Err(HistogramError::InvalidWorkerCount)
        ));
        assert!(SectorPipeline::new(no_workers).is_err());
    }

    #[test]
    fn config_reads_partial_json() {
        let config: HistogramConfig = serde_json::from_str(r#"{ "angle_step": 45.0 }"#).unwrap();
        assert_eq!(config.angle_step, 45.0);
        assert_eq!(config.worker_count, None);

        let config: HistogramConfig = serde_json::from_str(r#"{ "worker_count": 3 }"#).unwrap();
        assert_eq!(config.angle_step, DEFAULT_ANGLE_STEP);
        assert_eq!(SectorPipeline::new(config).unwrap().sector_count(), 36);
    }
}
