// THEORY:
// This file is the main entry point for the `sectoral_histogram` library crate.
// It exposes the `SectorPipeline` and its configuration as the high-level interface,
// plus the individual stages for callers that want to inspect intermediate results.
//
// The engine answers one question about an image: seen from a reference point, how is
// brightness distributed in each direction? The plane around the point is cut into
// angular sectors, every pixel is counted into its sector's intensity histogram, each
// histogram becomes a cumulative distribution, and the distributions are drawn side by
// side as a grayscale map (one column per sector, one row per intensity level).
//
// The three stages live in `core_modules` and always run in the same order:
// accumulate (parallel) -> cumulate (sequential) -> render (sequential).

pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use crate::error::{HistogramError, Result};
pub use crate::pipeline::{HistogramConfig, SectorPipeline, SectorReport};
