//! Frame-stepped player scenarios against small hand-built levels

mod movement;
mod states;

use crate::foundation::logging;
use crate::foundation::math::Vec3;
use crate::physics::{CollisionWorld, Solid, SolidShape};
use crate::player::{Player, PlayerTuning};
use crate::services::RecordingServices;
use crate::stage::Stage;

pub(super) const DT: f32 = 1.0 / 60.0;

pub(super) fn cuboid(min: Vec3, max: Vec3) -> Solid {
    Solid::new(SolidShape::cuboid(min, max).unwrap())
}

/// Slab whose top face is the plane z = 0
pub(super) fn floor() -> Solid {
    cuboid(Vec3::new(-200.0, -200.0, -10.0), Vec3::new(200.0, 200.0, 0.0))
}

pub(super) fn stage_with(solids: Vec<Solid>) -> Stage {
    logging::init_for_tests();
    let mut world = CollisionWorld::default();
    for solid in solids {
        world.add_solid(solid);
    }
    Stage::new(world).with_services(RecordingServices::default())
}

pub(super) fn player_at(position: Vec3) -> Player {
    Player::new(position, PlayerTuning::default())
}

pub(super) fn step(player: &mut Player, stage: &mut Stage) {
    stage.begin_frame(DT);
    player.update(stage);
    stage.end_frame();
}

pub(super) fn run(player: &mut Player, stage: &mut Stage, frames: usize) {
    for _ in 0..frames {
        step(player, stage);
    }
}

/// Step until `done` holds, at most `max_frames` times; returns the frames used
pub(super) fn run_until(
    player: &mut Player,
    stage: &mut Stage,
    max_frames: usize,
    mut done: impl FnMut(&Player) -> bool,
) -> Option<usize> {
    for frame in 1..=max_frames {
        step(player, stage);
        if done(player) {
            return Some(frame);
        }
    }
    None
}

pub(super) fn recorded(stage: &Stage) -> &RecordingServices {
    stage.services_as::<RecordingServices>().unwrap()
}
