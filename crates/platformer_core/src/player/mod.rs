//! Player controller
//!
//! The player is a single [`StateMachine`] wired to one state per movement
//! mode. Every frame [`Player::update`] runs, in order:
//!
//! 1. timers and the ground check (landing, coyote time, platform riding,
//!    dash refills),
//! 2. the current state's update callback and routine,
//! 3. a sweep move of the velocity through the collision world, for states
//!    that move physically,
//! 4. hazard checks (death plane, spikes).
//!
//! States live under `states`; the shared physics (sweep, pop-out, jumps,
//! ground check) lives in `movement`.

mod movement;
mod registry;
mod states;
mod tuning;

#[cfg(test)]
mod tests;

use std::rc::Rc;

pub use registry::{CustomPlayerState, RegistryError, MAX_CUSTOM_STATES};
pub use tuning::{PlayerTuning, Tuning};

use registry::CustomStateRegistry;

use crate::events::{EventArg, EventType};
use crate::foundation::math::utils::{angle_to_vector, with_z};
use crate::foundation::math::{Vec2, Vec3};
use crate::fsm::{EventId, StateId, StateMachine, StateOwner};
use crate::physics::SolidId;
use crate::services::{Effect, Sound};
use crate::stage::Stage;

/// Built-in player states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerState {
    /// Running, jumping and falling
    Normal,
    /// Fixed-duration burst
    Dashing,
    /// Braking into a direction reversal
    Skidding,
    /// Moving along a wall
    Climbing,
    /// Strawberry pickup cutscene
    StrawbGet,
    /// Wind-up before feather flight
    FeatherStart,
    /// Timed flight
    Feather,
    /// Reappearing after death
    Respawn,
    /// Dead, waiting for the level reload
    Dead,
    /// Strawberry appearing cutscene
    StrawbReveal,
    /// Controlled by an external scripted sequence
    Cutscene,
    /// Carried along a curve by a bubble
    Bubble,
    /// Pulled into a cassette
    Cassette,
    /// Collision-free flying for debugging
    DebugFly,
}

impl PlayerState {
    /// Number of built-in states; custom states start at this id
    pub const COUNT: u32 = 14;

    /// Every built-in state in id order
    pub const ALL: [Self; Self::COUNT as usize] = [
        Self::Normal,
        Self::Dashing,
        Self::Skidding,
        Self::Climbing,
        Self::StrawbGet,
        Self::FeatherStart,
        Self::Feather,
        Self::Respawn,
        Self::Dead,
        Self::StrawbReveal,
        Self::Cutscene,
        Self::Bubble,
        Self::Cassette,
        Self::DebugFly,
    ];

    /// State machine id of this state
    pub const fn id(self) -> StateId {
        StateId(self as u32)
    }

    /// Built-in state for `id`, `None` for custom ids
    pub fn from_id(id: StateId) -> Option<Self> {
        Self::ALL.get(id.index()).copied()
    }

    /// Whether the frame's velocity is applied through a sweep move
    fn applies_velocity(self) -> bool {
        matches!(
            self,
            Self::Normal | Self::Dashing | Self::Skidding | Self::Climbing | Self::Feather | Self::Cutscene
        )
    }

    /// Whether hazards can kill the player in this state
    fn is_vulnerable(self) -> bool {
        !matches!(self, Self::Dead | Self::Respawn | Self::DebugFly | Self::Cassette | Self::Bubble)
    }
}

/// Discrete events delivered to the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerStateEvent {
    /// Touched ground after being airborne
    Land,
}

impl PlayerStateEvent {
    /// State machine id of this event
    pub const fn id(self) -> EventId {
        EventId(self as u32)
    }
}

/// Where an external camera should look while a cutscene runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraOverride {
    /// Camera position
    pub position: Vec3,
    /// Point the camera looks at
    pub look_at: Vec3,
}

/// Countdown timers, all in seconds and decremented every frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Timers {
    pub coyote: f32,
    pub hold_jump: f32,
    pub dash_cooldown: f32,
    pub dash_reset_cooldown: f32,
    pub no_move: f32,
    pub no_skid_jump: f32,
    pub climb_cooldown: f32,
    pub feather: f32,
    pub feather_wall_bump: f32,
    pub platform_velocity_storage: f32,
    pub ground_snap_cooldown: f32,
}

impl Timers {
    fn tick(&mut self, delta: f32) {
        for timer in [
            &mut self.coyote,
            &mut self.dash_cooldown,
            &mut self.dash_reset_cooldown,
            &mut self.no_move,
            &mut self.no_skid_jump,
            &mut self.climb_cooldown,
            &mut self.feather_wall_bump,
            &mut self.platform_velocity_storage,
            &mut self.ground_snap_cooldown,
        ] {
            if *timer > 0.0 {
                *timer = (*timer - delta).max(0.0);
            }
        }
    }
}

/// Corner turn in progress while climbing
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CornerLerp {
    pub from_position: Vec3,
    pub to_position: Vec3,
    pub from_facing: Vec2,
    pub to_facing: Vec2,
    pub elapsed: f32,
}

/// Pending scripted move for the bubble and cassette states
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScriptedTarget {
    pub position: Vec3,
    pub map: Option<String>,
}

/// Strawberry being collected or revealed
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct StrawbPickup {
    pub id: u32,
    pub position: Vec3,
}

/// The player character
pub struct Player {
    pub(crate) position: Vec3,
    pub(crate) velocity: Vec3,
    /// Visual facing, unit length on the ground plane
    pub(crate) facing: Vec2,
    /// Facing the controller steers toward
    pub(crate) target_facing: Vec2,
    pub(crate) fsm: StateMachine<Player, Stage>,
    pub(crate) tuning: Tuning,
    pub(crate) registry: CustomStateRegistry,
    pub(crate) timers: Timers,

    pub(crate) on_ground: bool,
    pub(crate) ground_normal: Vec3,
    pub(crate) ground_solid: Option<SolidId>,
    pub(crate) coyote_z: f32,
    pub(crate) hold_jump_speed: f32,
    pub(crate) auto_jump: bool,
    pub(crate) platform_velocity: Vec3,

    pub(crate) dashes: u32,
    pub(crate) climb_corner: Option<CornerLerp>,
    pub(crate) feather_z: f32,
    pub(crate) scripted_target: Option<ScriptedTarget>,
    pub(crate) strawb: Option<StrawbPickup>,
    pub(crate) camera_override: Option<CameraOverride>,
    pub(crate) reload_requested: bool,
    pub(crate) spawn_point: Vec3,
}

impl StateOwner<Stage> for Player {
    fn state_machine(&mut self) -> &mut StateMachine<Self, Stage> {
        &mut self.fsm
    }
}

impl Player {
    /// Create a player standing at `position`, facing +Y
    pub fn new(position: Vec3, tuning: PlayerTuning) -> Self {
        let mut fsm = StateMachine::with_capacity(PlayerState::COUNT as usize);
        states::register_builtin(&mut fsm);
        fsm.set_transition_hook(Self::on_transition);

        Self {
            position,
            velocity: Vec3::zeros(),
            facing: Vec2::new(0.0, 1.0),
            target_facing: Vec2::new(0.0, 1.0),
            fsm,
            dashes: tuning.max_dashes,
            tuning: Tuning::new(tuning),
            registry: CustomStateRegistry::default(),
            timers: Timers::default(),
            on_ground: false,
            ground_normal: Vec3::z(),
            ground_solid: None,
            coyote_z: position.z,
            hold_jump_speed: 0.0,
            auto_jump: false,
            platform_velocity: Vec3::zeros(),
            climb_corner: None,
            feather_z: position.z,
            scripted_target: None,
            strawb: None,
            camera_override: None,
            reload_requested: false,
            spawn_point: position,
        }
    }

    /// Advance the player by one frame of `stage.time.delta()` seconds
    pub fn update(&mut self, stage: &mut Stage) {
        let delta = stage.time.delta();
        if self.fsm.state().is_none() {
            self.set_state(stage, PlayerState::Normal);
        }

        if stage.controls.debug_fly.pressed() {
            stage.controls.debug_fly.consume_press();
            let next = if self.is_state(PlayerState::DebugFly) {
                PlayerState::Normal
            } else {
                PlayerState::DebugFly
            };
            self.set_state(stage, next);
        }

        self.timers.tick(delta);
        if self.player_state().map_or(true, PlayerState::applies_velocity) {
            self.update_ground(stage, delta);
        }

        StateMachine::update(self, stage, delta);

        let moves = self.player_state().map_or(true, PlayerState::applies_velocity);
        if moves {
            let displacement = self.velocity * delta;
            self.sweep_test_move(stage, displacement, true);
        }

        self.check_hazards(stage);
    }

    /// Switch to a built-in state
    pub fn set_state(&mut self, stage: &mut Stage, state: PlayerState) {
        StateMachine::set_state(self, stage, state.id());
    }

    /// Switch to an arbitrary state id, built-in or custom
    pub fn set_state_id(&mut self, stage: &mut Stage, id: StateId) {
        StateMachine::set_state(self, stage, id);
    }

    /// Current state id
    pub fn state(&self) -> Option<StateId> {
        self.fsm.state()
    }

    /// Current built-in state, `None` while in a custom state
    pub fn player_state(&self) -> Option<PlayerState> {
        self.fsm.state().and_then(PlayerState::from_id)
    }

    /// Whether the current state is `state`
    pub fn is_state(&self, state: PlayerState) -> bool {
        self.fsm.state() == Some(state.id())
    }

    /// Seconds spent in the current state
    pub fn state_time(&self) -> f32 {
        self.fsm.state_time()
    }

    /// World position of the feet
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Teleport without collision
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Current velocity
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Replace the velocity
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    /// Facing direction on the ground plane
    pub fn facing(&self) -> Vec2 {
        self.facing
    }

    /// Turn instantly to `direction`
    pub fn set_facing(&mut self, direction: Vec2) {
        let length = direction.norm();
        if length > f32::EPSILON {
            self.facing = direction / length;
            self.target_facing = self.facing;
        }
    }

    /// Facing given as an angle in radians
    pub fn set_facing_angle(&mut self, angle: f32) {
        self.set_facing(angle_to_vector(angle));
    }

    /// Whether the feet are on walkable ground
    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    /// Normal of the ground under the feet, +Z while airborne
    pub fn ground_normal(&self) -> Vec3 {
        self.ground_normal
    }

    /// Dashes left
    pub fn dashes(&self) -> u32 {
        self.dashes
    }

    /// Point used for wall and hazard tests at waist height
    pub fn waist_position(&self) -> Vec3 {
        self.position + Vec3::z() * self.tuning.current.waist_height
    }

    /// Point used for wall tests at head height
    pub fn head_position(&self) -> Vec3 {
        self.position + Vec3::z() * self.tuning.current.head_height
    }

    /// Camera placement requested by a running cutscene
    pub fn camera_override(&self) -> Option<CameraOverride> {
        self.camera_override
    }

    /// Where the player respawns after dying
    pub fn spawn_point(&self) -> Vec3 {
        self.spawn_point
    }

    /// Move the respawn point (checkpoints)
    pub fn set_spawn_point(&mut self, position: Vec3) {
        self.spawn_point = position;
    }

    /// Physics constants in effect
    pub fn tuning(&self) -> &PlayerTuning {
        &self.tuning.current
    }

    /// Physics constants, mutably; [`Player::reset_tuning`] restores them
    pub fn tuning_mut(&mut self) -> &mut PlayerTuning {
        &mut self.tuning.current
    }

    /// Restore every physics constant to its default
    pub fn reset_tuning(&mut self) {
        self.tuning.reset();
    }

    /// Register a custom state and return its id
    pub fn register_state<S: CustomPlayerState>(&mut self, state: S) -> Result<StateId, RegistryError> {
        let id = self.registry.register(Rc::new(state))?;
        states::register_custom(&mut self.fsm, id);
        log::debug!("Registered custom player state {} as {id:?}", std::any::type_name::<S>());
        Ok(id)
    }

    /// Number of registered custom states
    pub fn custom_state_count(&self) -> usize {
        self.registry.len()
    }

    /// Id of a registered custom state
    pub fn custom_state_id<S: CustomPlayerState>(&self) -> Option<StateId> {
        self.registry.id_of::<S>()
    }

    /// Switch to a registered custom state; returns false if it was never registered
    pub fn set_custom_state<S: CustomPlayerState>(&mut self, stage: &mut Stage) -> bool {
        match self.custom_state_id::<S>() {
            Some(id) => {
                self.set_state_id(stage, id);
                true
            }
            None => false,
        }
    }

    /// Whether the game may pause now
    pub fn is_able_to_pause(&self) -> bool {
        match self.fsm.state() {
            Some(id) => match PlayerState::from_id(id) {
                Some(state) => !matches!(
                    state,
                    PlayerState::Dead
                        | PlayerState::Respawn
                        | PlayerState::StrawbGet
                        | PlayerState::StrawbReveal
                        | PlayerState::Cassette
                ),
                None => self.registry.get(id).map_or(true, |custom| custom.is_able_to_pause()),
            },
            None => true,
        }
    }

    /// Whether pickups may be collected now
    pub fn is_able_to_pickup(&self) -> bool {
        match self.fsm.state() {
            Some(id) => match PlayerState::from_id(id) {
                Some(state) => !matches!(
                    state,
                    PlayerState::StrawbGet
                        | PlayerState::StrawbReveal
                        | PlayerState::Bubble
                        | PlayerState::Cassette
                        | PlayerState::Dead
                        | PlayerState::Respawn
                        | PlayerState::DebugFly
                ),
                None => self.registry.get(id).map_or(true, |custom| custom.is_able_to_pickup()),
            },
            None => true,
        }
    }

    /// Kill the player; ignored while already dead
    pub fn kill(&mut self, stage: &mut Stage) {
        if self.is_state(PlayerState::Dead) {
            return;
        }
        let position = self.position;
        stage
            .events
            .publish(EventType::Died)
            .set_arg("position", EventArg::Position(position));
        stage.services.play_sound(Sound::Death, position);
        stage.services.spawn_effect(Effect::DeathBurst, self.waist_position());
        self.set_state(stage, PlayerState::Dead);
    }

    /// Put the player back at the spawn point
    pub fn respawn(&mut self, stage: &mut Stage) {
        self.position = self.spawn_point;
        self.velocity = Vec3::zeros();
        self.timers = Timers::default();
        self.dashes = self.tuning.current.max_dashes;
        self.on_ground = false;
        self.platform_velocity = Vec3::zeros();
        self.set_state(stage, PlayerState::Respawn);
    }

    /// Hand control to an external sequence until `Stage::cutscene_freezes_player` clears
    pub fn enter_cutscene(&mut self, stage: &mut Stage) {
        self.set_state(stage, PlayerState::Cutscene);
    }

    /// Collect strawberry `id` lying at `position`
    pub fn strawb_get(&mut self, stage: &mut Stage, id: u32, position: Vec3) -> bool {
        if !self.is_able_to_pickup() {
            return false;
        }
        self.strawb = Some(StrawbPickup { id, position });
        self.set_state(stage, PlayerState::StrawbGet);
        true
    }

    /// Show strawberry `id` appearing at `position`
    pub fn strawb_reveal(&mut self, stage: &mut Stage, id: u32, position: Vec3) -> bool {
        if !self.is_able_to_pickup() {
            return false;
        }
        self.strawb = Some(StrawbPickup { id, position });
        self.set_state(stage, PlayerState::StrawbReveal);
        true
    }

    /// Start feather flight at the current height
    pub fn feather_get(&mut self, stage: &mut Stage) -> bool {
        if !self.is_able_to_pickup() {
            return false;
        }
        self.feather_z = self.position.z;
        self.dashes = self.dashes.max(self.tuning.current.max_dashes);
        stage.services.play_sound(Sound::FeatherGet, self.position);
        if self.is_state(PlayerState::Feather) {
            self.timers.feather = self.tuning.current.feather_duration;
        } else {
            self.set_state(stage, PlayerState::FeatherStart);
        }
        true
    }

    /// Refill dashes from a pickup; false when already full
    pub fn refill_dash(&mut self, stage: &mut Stage) -> bool {
        let max = self.tuning.current.max_dashes;
        if !self.is_able_to_pickup() || self.dashes >= max {
            return false;
        }
        self.dashes = max;
        stage.services.play_sound(Sound::DashRefill, self.position);
        true
    }

    /// Carry the player to `target` inside a bubble
    pub fn bubble_to(&mut self, stage: &mut Stage, target: Vec3) -> bool {
        if !self.is_able_to_pickup() {
            return false;
        }
        self.scripted_target = Some(ScriptedTarget {
            position: target,
            map: None,
        });
        self.set_state(stage, PlayerState::Bubble);
        true
    }

    /// Pull the player into a cassette at `position` leading to `map`
    pub fn enter_cassette(&mut self, stage: &mut Stage, position: Vec3, map: impl Into<String>) -> bool {
        if !self.is_able_to_pickup() {
            return false;
        }
        self.scripted_target = Some(ScriptedTarget {
            position,
            map: Some(map.into()),
        });
        self.set_state(stage, PlayerState::Cassette);
        true
    }

    /// Launch upward from a spring
    pub fn spring(&mut self, stage: &mut Stage) -> bool {
        if !self.is_able_to_pickup() {
            return false;
        }
        let tuning = self.tuning.current;
        if !self.is_state(PlayerState::Normal) {
            self.set_state(stage, PlayerState::Normal);
        }
        self.dashes = tuning.max_dashes;
        self.launch(
            stage,
            tuning.spring_jump_speed,
            tuning.spring_jump_speed,
            tuning.spring_jump_hold_time,
            "spring",
            Sound::Spring,
        );
        self.auto_jump = true;
        true
    }

    fn on_transition(&mut self, stage: &mut Stage, from: Option<StateId>, to: StateId) {
        log::debug!(
            "Player state {:?} -> {:?}",
            from.map(|id| self.state_name(id)),
            self.state_name(to)
        );
        let position = self.position;
        let event = stage.events.publish(EventType::StateChanged);
        event
            .set_arg("to", EventArg::State(to.0))
            .set_arg("position", EventArg::Position(position));
        if let Some(from) = from {
            event.set_arg("from", EventArg::State(from.0));
        }
    }

    fn state_name(&self, id: StateId) -> String {
        match PlayerState::from_id(id) {
            Some(state) => format!("{state:?}"),
            None => self
                .registry
                .get(id)
                .map_or_else(|| format!("{id:?}"), |custom| custom.name().to_string()),
        }
    }

    pub(crate) fn forward(&self) -> Vec3 {
        with_z(self.facing, 0.0)
    }
}
