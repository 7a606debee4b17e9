//! Fire-and-forget services supplied by the surrounding game
//!
//! Audio, particles and scene transitions live outside the movement core.
//! The player only ever asks for them through [`GameServices`]; nothing
//! comes back, so a headless host can plug in [`NullServices`] and tests can
//! inspect what was asked for with [`RecordingServices`].

use std::any::Any;

use crate::foundation::math::Vec3;

/// Sound cues the player can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    /// Regular jump
    Jump,
    /// Wall jump
    WallJump,
    /// Jump out of a dash
    DashJump,
    /// Jump out of a skid
    SkidJump,
    /// Dash start
    Dash,
    /// Touching ground
    Land,
    /// Skid start
    Skid,
    /// Grabbing a wall
    Climb,
    /// Hopping over a ledge
    ClimbHop,
    /// Feather pickup
    FeatherGet,
    /// Feather flight bumped into a wall
    FeatherBump,
    /// Spring launch
    Spring,
    /// Dash refill pickup
    DashRefill,
    /// Strawberry pickup
    StrawbGet,
    /// Strawberry appears
    StrawbReveal,
    /// Bubble travel
    Bubble,
    /// Entering a cassette
    Cassette,
    /// Death
    Death,
    /// Respawn
    Respawn,
    /// Footstep while running
    Footstep,
}

/// Particle effects the player can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Dust puff at the feet
    Dust,
    /// Afterimage trail while dashing
    DashTrail,
    /// Burst when a dash trigger breaks
    Debris,
    /// Burst on death
    DeathBurst,
    /// Sparkles around a pickup
    Sparkle,
}

/// Scene-level requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Reload the current level from the last checkpoint
    ReloadLevel,
    /// Enter the sub-level behind a cassette
    EnterCassette {
        /// Map to load
        map: String,
    },
}

/// Side-effect sink for the player
pub trait GameServices {
    /// Play a positional sound
    fn play_sound(&mut self, sound: Sound, position: Vec3);

    /// Spawn a particle effect
    fn spawn_effect(&mut self, effect: Effect, position: Vec3);

    /// Ask the scene manager for a transition
    fn request_transition(&mut self, transition: Transition);

    /// Downcast to Any for implementation-specific access (e.g., RecordingServices)
    fn as_any(&self) -> &dyn Any;
}

/// Services that do nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullServices;

impl GameServices for NullServices {
    fn play_sound(&mut self, _sound: Sound, _position: Vec3) {}

    fn spawn_effect(&mut self, _effect: Effect, _position: Vec3) {}

    fn request_transition(&mut self, transition: Transition) {
        log::info!("Transition requested without a scene manager: {transition:?}");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Services that remember every request
#[derive(Debug, Clone, Default)]
pub struct RecordingServices {
    /// Sounds played, in order
    pub sounds: Vec<(Sound, Vec3)>,
    /// Effects spawned, in order
    pub effects: Vec<(Effect, Vec3)>,
    /// Transitions requested, in order
    pub transitions: Vec<Transition>,
}

impl RecordingServices {
    /// How many times `sound` was played
    pub fn sound_count(&self, sound: Sound) -> usize {
        self.sounds.iter().filter(|(played, _)| *played == sound).count()
    }

    /// How many times `effect` was spawned
    pub fn effect_count(&self, effect: Effect) -> usize {
        self.effects.iter().filter(|(spawned, _)| *spawned == effect).count()
    }
}

impl GameServices for RecordingServices {
    fn play_sound(&mut self, sound: Sound, position: Vec3) {
        self.sounds.push((sound, position));
    }

    fn spawn_effect(&mut self, effect: Effect, position: Vec3) {
        self.effects.push((effect, position));
    }

    fn request_transition(&mut self, transition: Transition) {
        log::info!("Transition requested: {transition:?}");
        self.transitions.push(transition);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
