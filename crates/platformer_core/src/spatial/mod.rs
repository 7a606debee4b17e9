//! Spatial partitioning
//!
//! A 2D uniform grid over the XY plane is the broad phase for every
//! collision query. Z is ignored: levels are assumed broadly planar, so a
//! tall column of geometry lands in the same buckets as a flat floor.

mod bounds;
mod grid;

pub use bounds::BoundingBox;
pub use grid::{CellCoord, Grid, GridAddressing, GridConfig};
