pub mod accumulator;
pub mod coordinate_mapper;
pub mod cumulative;
pub mod histogram_grid;
pub mod pixel;
pub mod renderer;
pub mod sector_geometry;
pub mod utils;
