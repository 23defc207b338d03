//! Spatial data structures and coordinate conversion

pub mod coord;

pub use coord::{BlockLocation, BlockPos, CellCoord, Coordinate, Direction, DEFAULT_CELL_SIZE};
