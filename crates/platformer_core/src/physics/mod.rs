//! Collision geometry and queries
//!
//! Solids live in a [`CollisionWorld`], indexed by a 2D grid. The world
//! answers two kinds of questions for movement code: ray casts (ground,
//! ceiling, line of sight) and cylindrical wall probes (pushout from walls at
//! a given height).

pub mod collision;
mod collision_world;
mod query;

pub use collision::{
    Capabilities, DashResponse, DashTrigger, Face, Plane, Ray, Solid, SolidFlags, SolidId, SolidShape,
    Triangle, WorldError,
};
pub use collision_world::CollisionWorld;
pub use query::{RayHit, RayOptions, WallHit, WallHits, MAX_WALL_HITS};
