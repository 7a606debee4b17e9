//! Moving along a wall
//!
//! Movement happens in a frame local to the wall: `right` runs along it and
//! `up` climbs it, both derived from the wall normal (the reverse of the
//! facing). Corners are handled by turning onto the next wall with a short
//! eased blend of position and facing:
//!
//! - inner corners: a ray sideways finds a wall facing back at us,
//! - outer corners: diagonal probes from past the edge find the wall that
//!   wraps around it.
//!
//! Pushing up once the wall ends below the waist hops onto the ledge.

use crate::foundation::math::constants::HALF_PI;
use crate::foundation::math::ease::cube_out;
use crate::foundation::math::utils::{safe_normalize2, safe_normalize3, with_z, xy};
use crate::foundation::math::{Vec2, Vec3};
use crate::physics::{Capabilities, RayOptions, SolidFlags, SolidId, WallHit};
use crate::player::{CornerLerp, Player, PlayerState};
use crate::services::Sound;
use crate::stage::Stage;

/// Upper bound on outer-corner probes, keeps degenerate geometry from looping
const MAX_CORNER_PROBES: usize = 10;
/// Minimum alignment between the current and the next wall's normal
const WALL_ALIGNMENT_DOT: f32 = 0.7;
/// How squarely the body must face a wall's surface, rather than its edge
const FACE_ON_DOT: f32 = 0.95;

pub(super) fn enter(player: &mut Player, stage: &mut Stage) {
    player.velocity = Vec3::zeros();
    player.climb_corner = None;
    player.timers.hold_jump = 0.0;
    player.auto_jump = false;
    stage.services.play_sound(Sound::Climb, player.waist_position());
}

pub(super) fn exit(player: &mut Player, _stage: &mut Stage) {
    player.timers.climb_cooldown = player.tuning.current.climb_cooldown;
    player.climb_corner = None;
}

pub(super) fn update(player: &mut Player, stage: &mut Stage) {
    let tuning = player.tuning.current;
    let delta = stage.time.delta();

    if advance_corner(player, delta) {
        return;
    }

    if !stage.controls.climb.down() {
        player.set_state(stage, PlayerState::Normal);
        return;
    }

    let forward = player.forward();
    let normal = -forward;

    if stage.controls.jump.pressed() {
        stage.controls.jump.consume_press();
        player.wall_jump(stage, normal);
        player.set_state(stage, PlayerState::Normal);
        return;
    }

    let input = stage.controls.move_value();
    if player.on_ground && input.y < 0.0 {
        player.set_state(stage, PlayerState::Normal);
        return;
    }

    let right = forward.cross(&Vec3::z());
    let up = normal.cross(&right);
    let mut movement = right * input.x + up * input.y;
    if movement != Vec3::zeros() {
        let ahead = player.waist_position() + safe_normalize3(movement) * tuning.climb_check_dist;
        if stage.world.overlaps(ahead, Capabilities::SPIKES).is_some() {
            movement = Vec3::zeros();
        }
    }
    player.velocity = movement * tuning.climb_speed;

    if input.x != 0.0 && movement != Vec3::zeros() && try_inner_corner(player, stage, right * input.x.signum()) {
        return;
    }

    let next_waist = player.waist_position() + player.velocity * delta;
    let ahead = wall_ahead(player, stage, next_waist, normal);
    if input.y > 0.0 && ahead.is_none() {
        ledge_hop(player, stage);
        return;
    }

    match ahead {
        Some(hit) => {
            // Follow walls that lean away or toward us
            let wall_normal = safe_normalize2(xy(hit.normal));
            let gap = xy(next_waist - hit.point).dot(&wall_normal) - tuning.wall_pushout_dist;
            player.position.x -= wall_normal.x * gap;
            player.position.y -= wall_normal.y * gap;
            player.facing = -wall_normal;
            player.target_facing = player.facing;
        }
        None if input.x != 0.0 => {
            let side = right * input.x.signum();
            if !try_outer_corner(player, stage, side) {
                player.velocity = Vec3::zeros();
            }
        }
        None => {
            log::debug!("Lost the wall while climbing at {:?}", player.position);
            player.set_state(stage, PlayerState::Normal);
        }
    }
}

fn is_climbable(stage: &Stage, id: SolidId) -> bool {
    stage
        .world
        .solid(id)
        .is_some_and(|solid| solid.flags.contains(SolidFlags::CLIMBABLE))
}

/// Climbable wall facing roughly along `normal` with `point` in front of it, not past its edge
fn wall_ahead(player: &Player, stage: &Stage, point: Vec3, normal: Vec3) -> Option<WallHit> {
    stage
        .world
        .wall_closest_to_normal(point, player.tuning.current.climb_check_dist, normal)
        .filter(|hit| {
            let offset = safe_normalize2(xy(point - hit.point));
            hit.normal.dot(&normal) > WALL_ALIGNMENT_DOT
                && offset.dot(&safe_normalize2(xy(hit.normal))) > FACE_ON_DOT
                && is_climbable(stage, hit.solid)
        })
}

fn try_inner_corner(player: &mut Player, stage: &mut Stage, side: Vec3) -> bool {
    let reach = player.tuning.current.climb_check_dist;
    let hit = stage
        .world
        .ray_cast(player.waist_position(), side, reach, RayOptions::default())
        .filter(|hit| hit.normal.dot(&side) < -WALL_ALIGNMENT_DOT && is_climbable(stage, hit.solid));
    match hit {
        Some(hit) => {
            start_corner(player, hit.point, hit.normal);
            true
        }
        None => false,
    }
}

fn try_outer_corner(player: &mut Player, stage: &mut Stage, side: Vec3) -> bool {
    let reach = player.tuning.current.climb_check_dist;
    let forward = player.forward();
    let origin = player.waist_position() + side * reach;

    for probe in 0..MAX_CORNER_PROBES {
        let angle = (probe + 1) as f32 / MAX_CORNER_PROBES as f32 * HALF_PI;
        let direction = forward * angle.cos() - side * angle.sin();
        let hit = stage
            .world
            .ray_cast(origin, direction, reach * 2.0, RayOptions::default())
            .filter(|hit| hit.normal.dot(&side) > WALL_ALIGNMENT_DOT && is_climbable(stage, hit.solid));
        if let Some(hit) = hit {
            start_corner(player, hit.point, hit.normal);
            return true;
        }
    }
    false
}

fn start_corner(player: &mut Player, point: Vec3, normal: Vec3) {
    let wall_normal = safe_normalize2(xy(normal));
    let target = point + with_z(wall_normal, 0.0) * player.tuning.current.wall_pushout_dist;
    player.climb_corner = Some(CornerLerp {
        from_position: player.position,
        to_position: Vec3::new(target.x, target.y, player.position.z),
        from_facing: player.facing,
        to_facing: -wall_normal,
        elapsed: 0.0,
    });
    player.velocity = Vec3::zeros();
}

fn advance_corner(player: &mut Player, delta: f32) -> bool {
    let Some(mut corner) = player.climb_corner else {
        return false;
    };
    let duration = player.tuning.current.climb_corner_time;
    corner.elapsed += delta;
    let t = if duration <= 0.0 {
        1.0
    } else {
        (corner.elapsed / duration).min(1.0)
    };
    let eased = cube_out(t);

    player.position = corner.from_position.lerp(&corner.to_position, eased);
    let facing = safe_normalize2(corner.from_facing.lerp(&corner.to_facing, eased));
    if facing != Vec2::zeros() {
        player.facing = facing;
        player.target_facing = facing;
    }
    player.velocity = Vec3::zeros();
    player.climb_corner = (t < 1.0).then_some(corner);
    true
}

fn ledge_hop(player: &mut Player, stage: &mut Stage) {
    let tuning = player.tuning.current;
    let forward = player.facing * tuning.climb_hop_forward_speed;
    player.velocity = with_z(forward, tuning.climb_hop_up_speed);
    player.timers.no_move = tuning.climb_hop_no_move_time;
    stage.services.play_sound(Sound::ClimbHop, player.position);
    player.set_state(stage, PlayerState::Normal);
}
