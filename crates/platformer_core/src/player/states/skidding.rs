//! Braking into a direction reversal

use crate::foundation::math::utils::{approach_vec2, safe_normalize2, xy};
use crate::foundation::math::Vec2;
use crate::player::{Player, PlayerState};
use crate::services::{Effect, Sound};
use crate::stage::Stage;

const DUST_INTERVAL: f32 = 0.1;

pub(super) fn enter(player: &mut Player, stage: &mut Stage) {
    player.timers.no_skid_jump = player.tuning.current.skid_jump_lockout;
    stage.services.play_sound(Sound::Skid, player.position);
}

pub(super) fn update(player: &mut Player, stage: &mut Stage) {
    let tuning = player.tuning.current;
    let delta = stage.time.delta();

    if stage.controls.jump.pressed() {
        stage.controls.jump.consume_press();
        if player.timers.no_skid_jump > 0.0 {
            // Too early for a skid jump: drop the backward motion and hop the new way
            let target = player.target_facing;
            let planar = target * xy(player.velocity).dot(&target).max(0.0);
            player.velocity.x = planar.x;
            player.velocity.y = planar.y;
            player.set_facing(target);
            player.jump(stage);
            player.set_state(stage, PlayerState::Normal);
        } else {
            player.skid_jump(stage);
        }
        return;
    }

    if player.try_dash(stage) {
        return;
    }

    let input = stage.relative_move_input();
    if input != Vec2::zeros() {
        player.target_facing = safe_normalize2(input);
    }
    let target = player.target_facing;

    let planar = xy(player.velocity);
    let accel = if planar.dot(&target) < 0.0 {
        tuning.skidding_start_accel
    } else {
        tuning.skidding_accel
    };
    let planar = approach_vec2(planar, target * tuning.max_speed, accel * delta);
    player.velocity.x = planar.x;
    player.velocity.y = planar.y;
    player.apply_gravity(stage, delta);

    if stage.time.on_interval(DUST_INTERVAL) {
        stage.services.spawn_effect(Effect::Dust, player.position);
    }

    if !player.on_ground || input == Vec2::zeros() || planar.dot(&target) >= tuning.end_skid_speed {
        player.set_facing(target);
        player.set_state(stage, PlayerState::Normal);
    }
}
