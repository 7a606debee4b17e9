//! Timed flight
//!
//! Flight steers on the ground plane only; height homes toward the height the
//! feather was picked up at.

use crate::foundation::math::utils::{approach, rotate_toward, safe_normalize2, xy};
use crate::foundation::math::Vec2;
use crate::player::{Player, PlayerState};
use crate::stage::Stage;

/// Vertical speed per unit of height error
const Z_HOMING: f32 = 10.0;

pub(super) fn start_enter(player: &mut Player, _stage: &mut Stage) {
    player.timers.hold_jump = 0.0;
    player.auto_jump = false;
}

pub(super) fn start_update(player: &mut Player, stage: &mut Stage) {
    if player.fsm.state_time() >= player.tuning.current.feather_start_time {
        player.set_state(stage, PlayerState::Feather);
    }
}

pub(super) fn enter(player: &mut Player, _stage: &mut Stage) {
    let tuning = player.tuning.current;
    player.timers.feather = tuning.feather_duration;
    let velocity = player.facing * tuning.feather_start_fly_speed;
    player.velocity.x = velocity.x;
    player.velocity.y = velocity.y;
    player.velocity.z = 0.0;
}

pub(super) fn update(player: &mut Player, stage: &mut Stage) {
    let tuning = player.tuning.current;
    let delta = stage.time.delta();

    player.timers.feather -= delta;
    if player.timers.feather <= 0.0 {
        player.velocity.x *= tuning.feather_exit_xy_mult;
        player.velocity.y *= tuning.feather_exit_xy_mult;
        player.velocity.z = tuning.feather_exit_z_speed;
        player.set_state(stage, PlayerState::Normal);
        return;
    }

    if player.try_dash(stage) {
        return;
    }

    let planar = xy(player.velocity);
    let input = stage.relative_move_input();
    let mut direction = if input != Vec2::zeros() {
        safe_normalize2(rotate_toward(planar, input, tuning.feather_turn_speed * delta, 0.0))
    } else {
        safe_normalize2(planar)
    };
    if direction == Vec2::zeros() {
        direction = player.facing;
    }
    let speed = approach(planar.norm(), tuning.feather_fly_speed, tuning.feather_accel * delta);
    let planar = direction * speed;

    player.velocity.x = planar.x;
    player.velocity.y = planar.y;
    player.velocity.z = ((player.feather_z - player.position.z) * Z_HOMING)
        .clamp(-tuning.feather_fly_speed, tuning.feather_fly_speed);
    player.facing = direction;
    player.target_facing = direction;
}

pub(super) fn exit(player: &mut Player, _stage: &mut Stage) {
    player.timers.feather = 0.0;
}
