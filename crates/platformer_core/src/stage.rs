//! Per-level context threaded through every player update
//!
//! Nothing in the movement core reaches for globals: the collision world,
//! input, notifications, side-effect services and level settings all live
//! here and are passed explicitly.

use crate::events::EventSystem;
use crate::foundation::math::constants::HALF_PI;
use crate::foundation::math::utils::{angle_to_vector, with_z};
use crate::foundation::math::{Vec2, Vec3};
use crate::foundation::time::Time;
use crate::input::Controls;
use crate::physics::CollisionWorld;
use crate::services::{GameServices, NullServices};

/// Something the player can talk to by pressing dash next to it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interactable {
    /// Identifier reported in `Interacted` notifications
    pub id: u32,
    /// World position
    pub position: Vec3,
    /// Horizontal reach
    pub radius: f32,
    /// Disabled interactables are ignored
    pub enabled: bool,
}

/// Level context
pub struct Stage {
    /// Solids and queries
    pub world: CollisionWorld,
    /// Input state
    pub controls: Controls,
    /// Notifications for external observers
    pub events: EventSystem,
    /// Audio, effects and scene transitions
    pub services: Box<dyn GameServices>,
    /// Simulated clock
    pub time: Time,
    /// NPCs and signs
    pub interactables: Vec<Interactable>,
    /// Falling below this height kills the player
    pub death_plane: f32,
    /// While set, the player stays in its cutscene state
    pub cutscene_freezes_player: bool,
    /// Camera heading in radians; `HALF_PI` looks down +Y
    pub camera_yaw: f32,
}

impl Stage {
    /// Create a stage around a collision world
    pub fn new(world: CollisionWorld) -> Self {
        Self {
            world,
            controls: Controls::default(),
            events: EventSystem::new(),
            services: Box::new(NullServices),
            time: Time::new(),
            interactables: Vec::new(),
            death_plane: -100.0,
            cutscene_freezes_player: false,
            camera_yaw: HALF_PI,
        }
    }

    /// Builder: replace the side-effect services
    #[must_use]
    pub fn with_services(mut self, services: impl GameServices + 'static) -> Self {
        self.services = Box::new(services);
        self
    }

    /// Builder: replace the input state
    #[must_use]
    pub fn with_controls(mut self, controls: Controls) -> Self {
        self.controls = controls;
        self
    }

    /// Services downcast to their concrete type
    pub fn services_as<T: 'static>(&self) -> Option<&T> {
        self.services.as_any().downcast_ref::<T>()
    }

    /// Advance the clock; call before feeding input and updating the player
    pub fn begin_frame(&mut self, delta: f32) {
        self.time.advance(delta);
        self.events.update_time(f64::from(self.time.total()));
    }

    /// Age input buffers and drop destroyed solids; call after the player update
    pub fn end_frame(&mut self) {
        self.controls.end_frame(self.time.delta());
        let removed = self.world.flush_destroyed();
        if removed > 0 {
            log::debug!("Removed {removed} destroyed solid(s)");
        }
    }

    /// Movement input rotated into world space by the camera heading
    pub fn relative_move_input(&self) -> Vec2 {
        let input = self.controls.move_value();
        if input == Vec2::zeros() {
            return input;
        }
        let forward = angle_to_vector(self.camera_yaw);
        let right = Vec2::new(forward.y, -forward.x);
        right * input.x + forward * input.y
    }

    /// Camera forward direction on the ground plane
    pub fn camera_forward(&self) -> Vec3 {
        with_z(angle_to_vector(self.camera_yaw), 0.0)
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(CollisionWorld::default())
    }
}
