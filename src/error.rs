use thiserror::Error;

pub type Result<T> = std::result::Result<T, HistogramError>;

/// Everything that can stop a computation from producing an image.
///
/// A request either yields a complete `RenderedImage` or one of these; partial grids
/// and partially rendered images are never surfaced.
#[derive(Debug, Error)]
pub enum HistogramError {
    /// The angle step must be finite, at most 360, and coarse enough to stay within
    /// `MAX_SECTOR_COUNT` sectors (0.001 degrees).
    #[error("invalid angle step {angle_step}: expected 0.001 <= step <= 360")]
    InvalidAngleStep { angle_step: f64 },

    /// A worker faulted while scanning pixels.
    #[error("histogram accumulation failed: {reason}")]
    AccumulationFailure { reason: String },

    /// A sector received no pixels, so its cumulative row cannot be normalized.
    #[error("sector {sector} contains no pixels")]
    EmptySector { sector: usize },

    #[error("sector count must be at least 1")]
    InvalidSectorCount,

    /// The counter grid for this many sectors could not be allocated.
    #[error("cannot allocate a histogram grid for {sector_count} sectors")]
    GridAllocation { sector_count: usize },

    #[error("display bounds {width}x{height} must both be positive")]
    InvalidDisplayBounds { width: f64, height: f64 },

    #[error("worker count must be at least 1")]
    InvalidWorkerCount,
}

impl From<tokio::task::JoinError> for HistogramError {
    fn from(err: tokio::task::JoinError) -> Self {
        HistogramError::AccumulationFailure {
            reason: format!("worker task did not complete: {err}"),
        }
    }
}
