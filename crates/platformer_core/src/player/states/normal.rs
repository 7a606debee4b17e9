//! Running, jumping and falling

use crate::foundation::math::utils::{safe_normalize2, xy};
use crate::foundation::math::Vec2;
use crate::player::{Player, PlayerState};
use crate::stage::Stage;

pub(super) fn update(player: &mut Player, stage: &mut Stage) {
    let delta = stage.time.delta();

    if player.try_interact(stage) {
        player.apply_locomotion(Vec2::zeros(), delta);
        player.apply_gravity(stage, delta);
        return;
    }

    if stage.controls.jump.pressed() {
        if player.timers.coyote > 0.0 {
            stage.controls.jump.consume_press();
            player.jump(stage);
        } else if player.try_wall_jump(stage) {
            stage.controls.jump.consume_press();
        }
    }

    if player.try_dash(stage) {
        return;
    }

    if stage.controls.climb.down() && player.timers.climb_cooldown <= 0.0 && player.try_climb(stage) {
        return;
    }

    let input = stage.relative_move_input();
    let tuning = player.tuning.current;
    let planar = xy(player.velocity);
    if player.on_ground
        && input != Vec2::zeros()
        && planar.norm() > tuning.end_skid_speed
        && safe_normalize2(input).dot(&safe_normalize2(planar)) < tuning.skid_dot_threshold
    {
        player.target_facing = safe_normalize2(input);
        player.set_state(stage, PlayerState::Skidding);
        return;
    }

    player.apply_locomotion(input, delta);
    player.apply_gravity(stage, delta);
    player.footsteps(stage);
}

/// Touching down ends any jump sustain
pub(super) fn land(player: &mut Player, _stage: &mut Stage) {
    player.timers.hold_jump = 0.0;
    player.auto_jump = false;
}
