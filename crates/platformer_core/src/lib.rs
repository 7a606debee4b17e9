//! # Platformer Core
//!
//! Movement and collision core for a third-person 3D platformer. The world is
//! Z-up; distances are in world units and times in seconds.
//!
//! ## Features
//!
//! - **Collision World**: Solids built from convex faces, indexed by a 2D grid
//! - **Queries**: Ray casts and cylindrical wall probes with pushout
//! - **State Machines**: Callback-driven states with coroutine routines
//! - **Player Controller**: Running, jumping, dashing, climbing, flying and
//!   scripted sequences, extensible with custom states
//! - **Services**: Audio, effects and transitions behind a trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use platformer_core::prelude::*;
//!
//! fn main() -> Result<(), WorldError> {
//!     let mut world = CollisionWorld::default();
//!     let floor = SolidShape::cuboid(Vec3::new(-100.0, -100.0, -10.0), Vec3::new(100.0, 100.0, 0.0))?;
//!     world.add_solid(Solid::new(floor));
//!
//!     let mut stage = Stage::new(world);
//!     let mut player = Player::new(Vec3::new(0.0, 0.0, 10.0), PlayerTuning::default());
//!     for _ in 0..60 {
//!         stage.begin_frame(1.0 / 60.0);
//!         player.update(&mut stage);
//!         stage.end_frame();
//!         stage.events.dispatch();
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod events;
pub mod foundation;
pub mod fsm;
pub mod input;
pub mod physics;
pub mod player;
pub mod services;
pub mod spatial;
pub mod stage;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, ConfigFormat},
        events::{Event, EventArg, EventHandler, EventSystem, EventType},
        foundation::{
            math::{Vec2, Vec3},
            time::Time,
        },
        fsm::{Coroutine, Routine, StateId, StateMachine, StateOwner, Yield},
        input::{Button, Controls, ControlsConfig},
        physics::{
            Capabilities, CollisionWorld, DashResponse, RayHit, RayOptions, Solid, SolidFlags, SolidId,
            SolidShape, WallHit, WorldError,
        },
        player::{CameraOverride, CustomPlayerState, Player, PlayerState, PlayerTuning, RegistryError},
        services::{Effect, GameServices, NullServices, RecordingServices, Sound, Transition},
        spatial::{BoundingBox, Grid, GridConfig},
        stage::{Interactable, Stage},
    };
}
