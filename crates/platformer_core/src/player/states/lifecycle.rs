//! Death, respawn and externally driven cutscenes

use crate::events::{EventArg, EventType};
use crate::foundation::math::utils::{approach_vec2, xy};
use crate::foundation::math::{Vec2, Vec3};
use crate::player::{Player, PlayerState};
use crate::services::{Sound, Transition};
use crate::stage::Stage;

pub(super) fn dead_enter(player: &mut Player, _stage: &mut Stage) {
    player.velocity = Vec3::zeros();
    player.reload_requested = false;
    player.camera_override = None;
}

pub(super) fn dead_update(player: &mut Player, stage: &mut Stage) {
    if !player.reload_requested && player.fsm.state_time() >= player.tuning.current.death_reload_delay {
        player.reload_requested = true;
        log::info!("Requesting level reload");
        stage.services.request_transition(Transition::ReloadLevel);
    }
}

pub(super) fn respawn_enter(player: &mut Player, stage: &mut Stage) {
    let position = player.position;
    stage
        .events
        .publish(EventType::Respawned)
        .set_arg("position", EventArg::Position(position));
    stage.services.play_sound(Sound::Respawn, position);
}

pub(super) fn respawn_update(player: &mut Player, stage: &mut Stage) {
    if player.fsm.state_time() >= player.tuning.current.respawn_time {
        player.set_state(stage, PlayerState::Normal);
    }
}

pub(super) fn cutscene_enter(player: &mut Player, _stage: &mut Stage) {
    player.timers.hold_jump = 0.0;
    player.auto_jump = false;
}

pub(super) fn cutscene_update(player: &mut Player, stage: &mut Stage) {
    let delta = stage.time.delta();
    let friction = player.tuning.current.friction;
    let planar = approach_vec2(xy(player.velocity), Vec2::zeros(), friction * delta);
    player.velocity.x = planar.x;
    player.velocity.y = planar.y;
    player.apply_gravity(stage, delta);

    if !stage.cutscene_freezes_player {
        player.set_state(stage, PlayerState::Normal);
    }
}
