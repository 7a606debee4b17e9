//! Shared player physics
//!
//! Sweep moves, the pop-out resolver, the ground check, gravity and every
//! kind of jump. States call into these; none of them change state on their
//! own except where a collision demands it (dash bounces).

use super::{Player, PlayerState, PlayerStateEvent};
use crate::events::{EventArg, EventType};
use crate::foundation::math::utils::{
    approach, approach_vec2, clamped_map, rotate_toward, safe_normalize2, with_z, xy,
};
use crate::foundation::math::{Vec2, Vec3};
use crate::fsm::StateMachine;
use crate::physics::{Capabilities, RayOptions, SolidFlags, WallHit};
use crate::services::{Effect, Sound};
use crate::stage::Stage;

/// Height above the feet that ground rays start from
const GROUND_PROBE_LIFT: f32 = 5.0;
/// Ground check reach below the feet
const GROUND_CHECK_SLACK: f32 = 0.1;
/// Ceiling rays start this far below the top of the head and end at it
const CEILING_PROBE_DISTANCE: f32 = 5.0;
/// Floors steeper than this (normal Z below it) are walls
const MIN_GROUND_NORMAL_Z: f32 = 0.7;
/// Ground snapping stays off this long after any jump
const GROUND_SNAP_COOLDOWN: f32 = 0.1;
/// Gravity is halved near the apex while jump is held
const HALF_GRAVITY_MULT: f32 = 0.5;
/// Facing turn rate in radians per second
const FACING_TURN_SPEED: f32 = 4.0 * std::f32::consts::TAU;
/// Seconds between footsteps while running
const FOOTSTEP_INTERVAL: f32 = 0.25;
/// Minimum dot between facing and the direction to an NPC
const INTERACT_FACING_DOT: f32 = 0.5;

impl Player {
    /// Move by `delta` in steps no longer than `sweep_step`, popping out of
    /// geometry after each step
    ///
    /// Once a wall impact has been resolved the remaining steps only push
    /// out, so one sweep never bounces twice.
    pub(crate) fn sweep_test_move(&mut self, stage: &mut Stage, delta: Vec3, resolve_impact: bool) {
        let mut resolve = resolve_impact;
        let mut remaining = delta.norm();
        if remaining <= f32::EPSILON {
            self.pop_out(stage, resolve);
            return;
        }

        let direction = delta / remaining;
        let step = self.tuning.current.sweep_step.max(0.01);
        while remaining > 0.0 {
            let amount = remaining.min(step);
            remaining -= amount;
            self.position += direction * amount;
            if self.pop_out(stage, resolve) {
                resolve = false;
            }
        }
    }

    /// Push the body out of floors, ceilings and walls
    ///
    /// Returns true when a wall impact was resolved.
    pub(crate) fn pop_out(&mut self, stage: &mut Stage, resolve_impact: bool) -> bool {
        let down = stage.world.ray_cast(
            self.position + Vec3::z() * GROUND_PROBE_LIFT,
            -Vec3::z(),
            GROUND_PROBE_LIFT,
            RayOptions::default(),
        );
        if let Some(hit) = down {
            self.position.z = hit.point.z;
            if resolve_impact {
                self.velocity.z = self.velocity.z.max(0.0);
            }
        } else {
            let height = self.tuning.current.height.max(0.0);
            let lift = (height - CEILING_PROBE_DISTANCE).max(0.0);
            let start = self.position + Vec3::z() * lift;
            let hit = stage.world.ray_cast(start, Vec3::z(), height - lift, RayOptions::default());
            if let Some(hit) = hit {
                let head = self.position.z + height;
                self.position.z += (hit.point.z - head).min(0.0);
                if resolve_impact {
                    self.velocity.z = self.velocity.z.min(0.0);
                }
            }
        }

        let radius = self.tuning.current.wall_pushout_dist;
        for probe in [self.waist_position(), self.head_position()] {
            if let Some(hit) = stage.world.nearest_wall(probe, radius) {
                if resolve_impact {
                    self.resolve_wall_impact(stage, &hit);
                }
                self.position += hit.pushout;
                return true;
            }
        }
        false
    }

    fn resolve_wall_impact(&mut self, stage: &mut Stage, hit: &WallHit) {
        let normal = safe_normalize2(xy(hit.normal));

        if self.is_state(PlayerState::Feather) {
            if self.timers.feather_wall_bump <= 0.0 && !stage.controls.climb.down() {
                self.reflect_xy(normal);
                self.timers.feather_wall_bump = self.tuning.current.feather_wall_bump_cooldown;
                stage.services.play_sound(Sound::FeatherBump, hit.point);
                return;
            }
        } else if self.is_state(PlayerState::Dashing) {
            let velocity = self.velocity;
            let response = stage
                .world
                .solid_mut(hit.solid)
                .filter(|solid| solid.capabilities.contains(Capabilities::DASH_TRIGGER))
                .and_then(|solid| solid.handle_dash(velocity));

            if let Some(response) = response {
                log::debug!("Dash hit trigger {:?}: {response:?}", hit.solid);
                if response.destroy && stage.world.mark_destroying(hit.solid).is_ok() {
                    stage.services.spawn_effect(Effect::Debris, hit.point);
                }
                if response.bounce {
                    self.reflect_xy(normal);
                    self.set_state(stage, PlayerState::Normal);
                }
                return;
            }
        }

        let inward = xy(self.velocity).dot(&normal);
        if inward < 0.0 {
            self.velocity.x -= normal.x * inward;
            self.velocity.y -= normal.y * inward;
        }
    }

    fn reflect_xy(&mut self, normal: Vec2) {
        let velocity = xy(self.velocity);
        let reflected = velocity - normal * (2.0 * velocity.dot(&normal));
        self.velocity.x = reflected.x;
        self.velocity.y = reflected.y;
        let facing = safe_normalize2(reflected);
        if facing != Vec2::zeros() {
            self.facing = facing;
            self.target_facing = facing;
        }
    }

    /// Probe for ground and run landing, coyote, platform and refill bookkeeping
    pub(crate) fn update_ground(&mut self, stage: &mut Stage, delta: f32) {
        let was_on_ground = self.on_ground;
        let tuning = self.tuning.current;
        let snapping = was_on_ground
            && self.timers.ground_snap_cooldown <= 0.0
            && self.velocity.z <= 0.0
            && !self.is_state(PlayerState::Dashing);
        let reach = GROUND_PROBE_LIFT + GROUND_CHECK_SLACK + if snapping { tuning.ground_snap_distance } else { 0.0 };

        let hit = stage
            .world
            .ray_cast(self.position + Vec3::z() * GROUND_PROBE_LIFT, -Vec3::z(), reach, RayOptions::default())
            .filter(|hit| hit.normal.z >= MIN_GROUND_NORMAL_Z && self.velocity.z <= 0.0);

        match hit {
            Some(hit) => {
                if snapping {
                    self.position.z = hit.point.z;
                }
                self.on_ground = true;
                self.ground_normal = hit.normal;
                self.ground_solid = Some(hit.solid);
                self.timers.coyote = tuning.coyote_time;
                self.coyote_z = self.position.z;
            }
            None => {
                self.on_ground = false;
                self.ground_solid = None;
                self.ground_normal = Vec3::z();
            }
        }

        if self.on_ground && !was_on_ground {
            self.land(stage);
        }

        // Ride whatever moved under the feet
        let platform = self
            .ground_solid
            .and_then(|id| stage.world.solid(id))
            .filter(|solid| solid.capabilities.contains(Capabilities::RIDEABLE))
            .map(|solid| solid.velocity());
        match platform {
            Some(velocity) if velocity != Vec3::zeros() => {
                self.platform_velocity = velocity;
                self.timers.platform_velocity_storage = tuning.platform_velocity_storage_time;
                self.sweep_test_move(stage, velocity * delta, false);
            }
            _ => {
                if self.timers.platform_velocity_storage <= 0.0 {
                    self.platform_velocity = Vec3::zeros();
                }
            }
        }

        if self.on_ground
            && self.timers.dash_reset_cooldown <= 0.0
            && !self.is_state(PlayerState::Dashing)
            && self.dashes < tuning.max_dashes
        {
            self.dashes = tuning.max_dashes;
        }
    }

    fn land(&mut self, stage: &mut Stage) {
        let position = self.position;
        let velocity = self.velocity;
        stage
            .events
            .publish(EventType::Landed)
            .set_arg("position", EventArg::Position(position))
            .set_arg("velocity", EventArg::Velocity(velocity));
        stage.services.play_sound(Sound::Land, position);
        stage.services.spawn_effect(Effect::Dust, position);
        StateMachine::call_event(self, stage, PlayerStateEvent::Land.id());
    }

    /// Falling, with half gravity near the apex and the hold-jump sustain
    pub(crate) fn apply_gravity(&mut self, stage: &Stage, delta: f32) {
        let tuning = &self.tuning.current;
        let holding = self.auto_jump || stage.controls.jump.down();

        if self.timers.hold_jump > 0.0 && holding {
            self.velocity.z = self.velocity.z.max(self.hold_jump_speed);
            self.timers.hold_jump -= delta;
        } else {
            self.timers.hold_jump = 0.0;
            self.auto_jump = false;
        }

        if self.on_ground && self.velocity.z <= 0.0 {
            self.velocity.z = 0.0;
            return;
        }

        let mut gravity = tuning.gravity;
        if holding && self.velocity.z.abs() < tuning.half_grav_threshold {
            gravity *= HALF_GRAVITY_MULT;
        }
        self.velocity.z = approach(self.velocity.z, tuning.max_fall, gravity * delta);
    }

    /// Ground and air acceleration toward `input` (world space, length <= 1)
    pub(crate) fn apply_locomotion(&mut self, input: Vec2, delta: f32) {
        let tuning = &self.tuning.current;
        let mut velocity = xy(self.velocity);

        if input != Vec2::zeros() && self.timers.no_move <= 0.0 {
            let mult = if self.on_ground {
                1.0
            } else {
                clamped_map(
                    self.velocity.z.abs(),
                    0.0,
                    tuning.half_grav_threshold,
                    tuning.air_accel_mult_max,
                    tuning.air_accel_mult_min,
                )
            };
            let target = input * tuning.max_speed;
            let speed = velocity.norm();

            velocity = if speed > tuning.max_speed && velocity.dot(&input) > 0.0 {
                approach_vec2(velocity, target, tuning.past_max_deccel * mult * delta)
            } else if speed < tuning.rotate_threshold {
                approach_vec2(velocity, target, tuning.acceleration * mult * delta)
            } else {
                let turn = if speed > tuning.max_speed {
                    tuning.rotate_speed_above_max
                } else {
                    tuning.rotate_speed
                };
                rotate_toward(velocity, target, turn * mult * delta, tuning.acceleration * mult * delta)
            };
            self.target_facing = safe_normalize2(input);
        } else {
            let friction = if self.on_ground {
                tuning.friction
            } else {
                tuning.friction * tuning.air_friction_mult
            };
            velocity = approach_vec2(velocity, Vec2::zeros(), friction * delta);
        }

        self.velocity.x = velocity.x;
        self.velocity.y = velocity.y;
        self.turn_toward_target(delta);
    }

    pub(crate) fn turn_toward_target(&mut self, delta: f32) {
        if self.target_facing == Vec2::zeros() {
            return;
        }
        let turned = safe_normalize2(rotate_toward(self.facing, self.target_facing, FACING_TURN_SPEED * delta, 0.0));
        if turned != Vec2::zeros() {
            self.facing = turned;
        }
    }

    /// Footstep sound and dust while running
    pub(crate) fn footsteps(&self, stage: &mut Stage) {
        if self.on_ground && xy(self.velocity).norm() > 1.0 && stage.time.on_interval(FOOTSTEP_INTERVAL) {
            stage.services.play_sound(Sound::Footstep, self.position);
            stage.services.spawn_effect(Effect::Dust, self.position);
        }
    }

    pub(crate) fn launch(&mut self, stage: &mut Stage, speed: f32, hold_speed: f32, hold_time: f32, kind: &'static str, sound: Sound) {
        self.velocity.z = speed;
        self.hold_jump_speed = hold_speed;
        self.timers.hold_jump = hold_time;
        self.timers.coyote = 0.0;
        self.timers.ground_snap_cooldown = GROUND_SNAP_COOLDOWN;
        self.auto_jump = false;
        self.on_ground = false;

        if self.timers.platform_velocity_storage > 0.0 {
            let carried = self.platform_velocity;
            self.velocity.x += carried.x;
            self.velocity.y += carried.y;
            self.velocity.z += carried.z.max(0.0);
            self.timers.platform_velocity_storage = 0.0;
        }

        let position = self.position;
        let velocity = self.velocity;
        stage
            .events
            .publish(EventType::Jumped)
            .set_arg("kind", EventArg::Label(kind))
            .set_arg("position", EventArg::Position(position))
            .set_arg("velocity", EventArg::Velocity(velocity));
        stage.services.play_sound(sound, position);
        stage.services.spawn_effect(Effect::Dust, position);
        log::debug!("{kind} jump at {position:?}");
    }

    /// Regular jump from the ground or within coyote time
    pub(crate) fn jump(&mut self, stage: &mut Stage) {
        let tuning = self.tuning.current;
        self.position.z = self.coyote_z;
        let input = stage.relative_move_input();
        if input != Vec2::zeros() {
            let boost = safe_normalize2(input) * tuning.jump_xy_boost;
            self.velocity.x += boost.x;
            self.velocity.y += boost.y;
        }
        self.launch(stage, tuning.jump_speed, tuning.jump_speed, tuning.jump_hold_time, "normal", Sound::Jump);
    }

    /// Jump away from a wall whose normal is `normal`
    pub(crate) fn wall_jump(&mut self, stage: &mut Stage, normal: Vec3) {
        let tuning = self.tuning.current;
        let away = safe_normalize2(xy(normal));
        if away != Vec2::zeros() {
            self.facing = away;
            self.target_facing = away;
        }
        let velocity = self.facing * tuning.wall_jump_xy_speed;
        self.velocity.x = velocity.x;
        self.velocity.y = velocity.y;
        self.launch(stage, tuning.jump_speed, tuning.jump_speed, tuning.jump_hold_time, "wall", Sound::WallJump);
    }

    /// Jump out of a dash
    pub(crate) fn dash_jump(&mut self, stage: &mut Stage) {
        let tuning = self.tuning.current;
        self.position.z = self.coyote_z.max(self.position.z);
        let velocity = self.facing * (tuning.dash_speed * tuning.dash_end_speed_mult + tuning.dash_jump_xy_boost);
        self.velocity.x = velocity.x;
        self.velocity.y = velocity.y;
        self.launch(
            stage,
            tuning.dash_jump_speed,
            tuning.dash_jump_hold_speed,
            tuning.dash_jump_hold_time,
            "dash",
            Sound::DashJump,
        );
        self.set_state(stage, PlayerState::Normal);
    }

    /// Jump out of a skid, in the direction being skidded toward
    pub(crate) fn skid_jump(&mut self, stage: &mut Stage) {
        let tuning = self.tuning.current;
        let velocity = self.target_facing * tuning.skid_jump_xy_speed;
        self.facing = self.target_facing;
        self.velocity.x = velocity.x;
        self.velocity.y = velocity.y;
        self.launch(stage, tuning.skid_jump_speed, tuning.skid_jump_speed, tuning.jump_hold_time, "skid", Sound::SkidJump);
        self.set_state(stage, PlayerState::Normal);
    }

    /// Start a dash if one is available and dash was pressed
    pub(crate) fn try_dash(&mut self, stage: &mut Stage) -> bool {
        if self.dashes == 0 || self.timers.dash_cooldown > 0.0 || !stage.controls.dash.pressed() {
            return false;
        }
        stage.controls.dash.consume_press();
        self.dashes -= 1;
        self.set_state(stage, PlayerState::Dashing);
        true
    }

    /// Grab a climbable wall in front of the body
    pub(crate) fn try_climb(&mut self, stage: &mut Stage) -> bool {
        let tuning = self.tuning.current;
        let forward = self.forward();
        let Some(hit) = stage
            .world
            .wall_closest_to_normal(self.waist_position(), tuning.climb_check_dist, -forward)
        else {
            return false;
        };
        if !self.is_climbable(stage, &hit) || xy(hit.normal).dot(&self.facing) >= 0.0 {
            return false;
        }

        let normal = safe_normalize2(xy(hit.normal));
        self.facing = -normal;
        self.target_facing = self.facing;
        let snapped = hit.point + with_z(normal, 0.0) * tuning.wall_pushout_dist;
        self.position.x = snapped.x;
        self.position.y = snapped.y;
        self.set_state(stage, PlayerState::Climbing);
        true
    }

    pub(crate) fn is_climbable(&self, stage: &Stage, hit: &WallHit) -> bool {
        stage
            .world
            .solid(hit.solid)
            .is_some_and(|solid| solid.flags.contains(SolidFlags::CLIMBABLE))
    }

    /// Wall jump off a wall the body faces, if any
    pub(crate) fn try_wall_jump(&mut self, stage: &mut Stage) -> bool {
        let radius = self.tuning.current.climb_check_dist;
        let forward = self.forward();
        let Some(hit) = stage.world.wall_closest_to_normal(self.waist_position(), radius, -forward) else {
            return false;
        };
        if !self.is_climbable(stage, &hit) || xy(hit.normal).dot(&self.facing) >= 0.0 {
            return false;
        }
        self.wall_jump(stage, hit.normal);
        true
    }

    /// Talk to an interactable in reach; consumes the dash press
    pub(crate) fn try_interact(&mut self, stage: &mut Stage) -> bool {
        if !self.on_ground || !stage.controls.dash.pressed() {
            return false;
        }
        let position = xy(self.position);
        let facing = self.facing;
        let target = stage.interactables.iter().find(|npc| {
            let offset = xy(npc.position) - position;
            let distance = offset.norm();
            npc.enabled
                && distance <= npc.radius
                && (distance <= f32::EPSILON || facing.dot(&(offset / distance)) >= INTERACT_FACING_DOT)
        });
        let Some(npc) = target.copied() else {
            return false;
        };

        stage.controls.dash.consume_press();
        stage
            .events
            .publish(EventType::Interacted)
            .set_arg("id", EventArg::Id(npc.id))
            .set_arg("position", EventArg::Position(npc.position));
        log::debug!("Interacted with {}", npc.id);
        true
    }

    /// Kill the player when below the death plane or touching spikes
    pub(crate) fn check_hazards(&mut self, stage: &mut Stage) {
        let vulnerable = self.player_state().map_or(true, PlayerState::is_vulnerable);
        if !vulnerable {
            return;
        }
        if self.position.z < stage.death_plane {
            log::info!("Fell below the death plane at {:?}", self.position);
            self.kill(stage);
        } else if let Some(id) = stage.world.overlaps(self.waist_position(), Capabilities::SPIKES) {
            log::info!("Touched spikes {id:?}");
            self.kill(stage);
        }
    }
}
