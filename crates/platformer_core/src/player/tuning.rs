//! Player physics constants
//!
//! Every value has an immutable default and a mutable current copy, so
//! gameplay code (or a debug console) can bend the physics at runtime and
//! put it back with [`Tuning::reset`].

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::foundation::math::constants::TAU;

/// Movement constants, distances in world units and times in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    // Ground and air movement
    /// Horizontal acceleration toward the input direction
    pub acceleration: f32,
    /// Deceleration applied while above max speed in the input direction
    pub past_max_deccel: f32,
    /// Air acceleration multiplier at high vertical speed
    pub air_accel_mult_min: f32,
    /// Air acceleration multiplier near the jump apex
    pub air_accel_mult_max: f32,
    /// Top running speed
    pub max_speed: f32,
    /// Below this speed, velocity snaps toward the input instead of turning
    pub rotate_threshold: f32,
    /// Turn rate (radians per second) below max speed
    pub rotate_speed: f32,
    /// Turn rate (radians per second) above max speed
    pub rotate_speed_above_max: f32,
    /// Deceleration without input
    pub friction: f32,
    /// Friction multiplier while airborne
    pub air_friction_mult: f32,

    // Gravity and jumping
    /// Downward acceleration
    pub gravity: f32,
    /// Terminal fall speed (negative)
    pub max_fall: f32,
    /// Below this vertical speed, holding jump halves gravity
    pub half_grav_threshold: f32,
    /// Seconds a jump keeps its upward speed while jump is held
    pub jump_hold_time: f32,
    /// Jump launch speed
    pub jump_speed: f32,
    /// Horizontal boost added in the input direction on jump
    pub jump_xy_boost: f32,
    /// Grace period to jump after leaving ground
    pub coyote_time: f32,
    /// Horizontal speed of a wall jump
    pub wall_jump_xy_speed: f32,

    // Dash
    /// Dash speed
    pub dash_speed: f32,
    /// Fraction of dash speed kept when the dash ends
    pub dash_end_speed_mult: f32,
    /// Dash duration
    pub dash_time: f32,
    /// Delay after a dash starts before ground refills dashes
    pub dash_reset_cooldown: f32,
    /// Delay after a dash ends before the next one
    pub dash_cooldown: f32,
    /// Steering rate during a dash (radians per second)
    pub dash_rotate_speed: f32,

    // Dash jump
    /// Launch speed of a jump out of a grounded dash
    pub dash_jump_speed: f32,
    /// Upward speed held while jump is held after a dash jump
    pub dash_jump_hold_speed: f32,
    /// Hold time of a dash jump
    pub dash_jump_hold_time: f32,
    /// Horizontal boost of a dash jump
    pub dash_jump_xy_boost: f32,

    // Skid
    /// Input-versus-facing dot product below which running turns into a skid
    pub skid_dot_threshold: f32,
    /// Acceleration while still sliding the old way
    pub skidding_start_accel: f32,
    /// Acceleration once turned around
    pub skidding_accel: f32,
    /// Speed in the new direction that ends the skid
    pub end_skid_speed: f32,
    /// Launch speed of a skid jump
    pub skid_jump_speed: f32,
    /// Horizontal speed of a skid jump
    pub skid_jump_xy_speed: f32,
    /// Window at the start of a skid during which jumping is a regular jump
    pub skid_jump_lockout: f32,

    // Wall and climb
    /// Radius of the body's wall probes
    pub wall_pushout_dist: f32,
    /// Radius used to look for climbable walls
    pub climb_check_dist: f32,
    /// Climbing speed
    pub climb_speed: f32,
    /// Delay after letting go of a wall before grabbing again
    pub climb_cooldown: f32,
    /// Upward speed of a ledge hop
    pub climb_hop_up_speed: f32,
    /// Forward speed of a ledge hop
    pub climb_hop_forward_speed: f32,
    /// Input lockout after a ledge hop
    pub climb_hop_no_move_time: f32,
    /// Duration of the eased turn around a corner
    pub climb_corner_time: f32,

    // Spring
    /// Launch speed of a spring
    pub spring_jump_speed: f32,
    /// Hold time of a spring launch
    pub spring_jump_hold_time: f32,

    // Feather
    /// Wind-up before flight starts
    pub feather_start_time: f32,
    /// Cruise speed while flying
    pub feather_fly_speed: f32,
    /// Speed at the start of flight
    pub feather_start_fly_speed: f32,
    /// Steering rate while flying (radians per second)
    pub feather_turn_speed: f32,
    /// Acceleration toward cruise speed
    pub feather_accel: f32,
    /// Flight duration
    pub feather_duration: f32,
    /// Horizontal speed multiplier when flight ends
    pub feather_exit_xy_mult: f32,
    /// Upward speed when flight ends
    pub feather_exit_z_speed: f32,
    /// Cooldown between two wall bumps while flying
    pub feather_wall_bump_cooldown: f32,

    // Misc
    /// Dashes available after touching ground
    pub max_dashes: u32,
    /// Longest step of a sweep move
    pub sweep_step: f32,
    /// Body height
    pub height: f32,
    /// Height of the waist probe above the feet
    pub waist_height: f32,
    /// Height of the head probe above the feet
    pub head_height: f32,
    /// Extra reach of the ground check when snapping down slopes
    pub ground_snap_distance: f32,
    /// Seconds a moving platform's velocity is added to jumps after leaving it
    pub platform_velocity_storage_time: f32,
    /// Speed of the debug free-fly mode
    pub debug_fly_speed: f32,
    /// Seconds between the death animation and the level reload request
    pub death_reload_delay: f32,
    /// Seconds spent in the respawn state
    pub respawn_time: f32,
    /// Horizontal speed of bubble travel, sets its duration
    pub bubble_speed: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            acceleration: 500.0,
            past_max_deccel: 60.0,
            air_accel_mult_min: 0.5,
            air_accel_mult_max: 1.0,
            max_speed: 64.0,
            rotate_threshold: 64.0 * 0.2,
            rotate_speed: TAU * 1.5,
            rotate_speed_above_max: TAU * 0.6,
            friction: 800.0,
            air_friction_mult: 0.1,

            gravity: 600.0,
            max_fall: -120.0,
            half_grav_threshold: 100.0,
            jump_hold_time: 0.1,
            jump_speed: 90.0,
            jump_xy_boost: 10.0,
            coyote_time: 0.12,
            wall_jump_xy_speed: 64.0 * 1.3,

            dash_speed: 140.0,
            dash_end_speed_mult: 0.75,
            dash_time: 0.2,
            dash_reset_cooldown: 0.2,
            dash_cooldown: 0.1,
            dash_rotate_speed: TAU * 0.3,

            dash_jump_speed: 40.0,
            dash_jump_hold_speed: 20.0,
            dash_jump_hold_time: 0.3,
            dash_jump_xy_boost: 16.0,

            skid_dot_threshold: -0.7,
            skidding_start_accel: 300.0,
            skidding_accel: 500.0,
            end_skid_speed: 64.0 * 0.8,
            skid_jump_speed: 120.0,
            skid_jump_xy_speed: 64.0 * 1.4,
            skid_jump_lockout: 0.1,

            wall_pushout_dist: 3.0,
            climb_check_dist: 4.0,
            climb_speed: 40.0,
            climb_cooldown: 0.25,
            climb_hop_up_speed: 80.0,
            climb_hop_forward_speed: 40.0,
            climb_hop_no_move_time: 0.25,
            climb_corner_time: 0.2,

            spring_jump_speed: 160.0,
            spring_jump_hold_time: 0.3,

            feather_start_time: 0.4,
            feather_fly_speed: 100.0,
            feather_start_fly_speed: 140.0,
            feather_turn_speed: TAU * 0.75,
            feather_accel: 60.0,
            feather_duration: 2.2,
            feather_exit_xy_mult: 0.5,
            feather_exit_z_speed: 60.0,
            feather_wall_bump_cooldown: 0.5,

            max_dashes: 1,
            sweep_step: 2.0,
            height: 12.0,
            waist_height: 3.0,
            head_height: 10.0,
            ground_snap_distance: 4.0,
            platform_velocity_storage_time: 0.1,
            debug_fly_speed: 200.0,
            death_reload_delay: 1.0,
            respawn_time: 0.4,
            bubble_speed: 220.0,
        }
    }
}

impl Config for PlayerTuning {}

/// Default and current tuning
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tuning {
    defaults: PlayerTuning,
    /// Values in effect
    pub current: PlayerTuning,
}

impl Tuning {
    /// Use `defaults` both as the restore point and the current values
    pub fn new(defaults: PlayerTuning) -> Self {
        Self {
            defaults,
            current: defaults,
        }
    }

    /// Restore point
    pub fn defaults(&self) -> &PlayerTuning {
        &self.defaults
    }

    /// Put every current value back to its default
    pub fn reset(&mut self) {
        self.current = self.defaults;
    }

    /// Whether any value differs from its default
    pub fn is_modified(&self) -> bool {
        self.current != self.defaults
    }
}
