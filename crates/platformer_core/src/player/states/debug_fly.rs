//! Collision-free flying for level inspection

use crate::foundation::math::utils::with_z;
use crate::foundation::math::{Vec2, Vec3};
use crate::player::Player;
use crate::stage::Stage;

pub(super) fn enter(player: &mut Player, _stage: &mut Stage) {
    player.velocity = Vec3::zeros();
    log::info!("Debug fly enabled at {:?}", player.position);
}

pub(super) fn update(player: &mut Player, stage: &mut Stage) {
    let delta = stage.time.delta();
    let input = stage.relative_move_input();
    let mut vertical = 0.0;
    if stage.controls.jump.down() {
        vertical += 1.0;
    }
    if stage.controls.climb.down() {
        vertical -= 1.0;
    }

    let speed = player.tuning.current.debug_fly_speed;
    player.position += with_z(input, vertical) * speed * delta;
    if input != Vec2::zeros() {
        player.set_facing(input);
    }
}
