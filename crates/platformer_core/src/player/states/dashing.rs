//! Fixed-duration burst with mid-dash steering

use crate::events::{EventArg, EventType};
use crate::foundation::math::utils::{rotate_toward, safe_normalize2};
use crate::foundation::math::Vec2;
use crate::player::{Player, PlayerState};
use crate::services::{Effect, Sound};
use crate::stage::Stage;

/// Seconds between two afterimages
const TRAIL_INTERVAL: f32 = 0.05;
/// Delay before ground refills dashes once a dash is over
const EXIT_RESET_COOLDOWN: f32 = 0.2;

pub(super) fn enter(player: &mut Player, stage: &mut Stage) {
    let tuning = player.tuning.current;
    let input = stage.relative_move_input();
    if input != Vec2::zeros() {
        player.set_facing(input);
    }

    let velocity = player.facing * tuning.dash_speed;
    player.velocity.x = velocity.x;
    player.velocity.y = velocity.y;
    player.velocity.z = 0.0;
    player.timers.hold_jump = 0.0;
    player.timers.dash_reset_cooldown = tuning.dash_reset_cooldown;

    let position = player.position;
    stage
        .events
        .publish(EventType::Dashed)
        .set_arg("position", EventArg::Position(position))
        .set_arg("velocity", EventArg::Velocity(player.velocity));
    stage.services.play_sound(Sound::Dash, position);
    stage.services.spawn_effect(Effect::DashTrail, position);
}

pub(super) fn update(player: &mut Player, stage: &mut Stage) {
    let tuning = player.tuning.current;
    let delta = stage.time.delta();

    let input = stage.relative_move_input();
    if input != Vec2::zeros() {
        let steered = safe_normalize2(rotate_toward(player.facing, input, tuning.dash_rotate_speed * delta, 0.0));
        if steered != Vec2::zeros() {
            player.facing = steered;
            player.target_facing = steered;
        }
    }
    let velocity = player.facing * tuning.dash_speed;
    player.velocity.x = velocity.x;
    player.velocity.y = velocity.y;
    player.velocity.z = 0.0;

    if stage.time.on_interval(TRAIL_INTERVAL) {
        stage.services.spawn_effect(Effect::DashTrail, player.position);
    }

    if stage.controls.jump.pressed() && (player.on_ground || player.timers.coyote > 0.0) {
        stage.controls.jump.consume_press();
        player.dash_jump(stage);
        return;
    }

    if player.fsm.state_time() >= tuning.dash_time {
        player.velocity.x *= tuning.dash_end_speed_mult;
        player.velocity.y *= tuning.dash_end_speed_mult;
        player.set_state(stage, PlayerState::Normal);
    }
}

pub(super) fn exit(player: &mut Player, _stage: &mut Stage) {
    player.timers.dash_cooldown = player.tuning.current.dash_cooldown;
    player.timers.dash_reset_cooldown = EXIT_RESET_COOLDOWN;
}
