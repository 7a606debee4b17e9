//! Collision geometry
//!
//! - [`primitives`] - rays, planes, faces and triangles
//! - [`shape`] - model-space polygon soups
//! - [`solid`] - collidable objects with cached world-space geometry

pub mod primitives;
pub mod shape;
pub mod solid;

pub use primitives::{Face, Plane, Ray, Triangle};
pub use shape::SolidShape;
pub use solid::{Capabilities, DashResponse, DashTrigger, Solid, SolidFlags, SolidId};

/// Errors raised while building or editing collision geometry
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// The handle does not name a live solid
    #[error("Unknown solid: {0:?}")]
    UnknownSolid(SolidId),

    /// A polygon has fewer than three vertices or zero area
    #[error("Degenerate face at index {face}")]
    DegenerateFace {
        /// Index of the offending polygon
        face: usize,
    },
}
