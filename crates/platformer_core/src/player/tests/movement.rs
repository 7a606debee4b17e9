//! Jumps, dashes, sweeps and hazards

use std::cell::Cell;
use std::rc::Rc;

use approx::assert_relative_eq;

use super::{cuboid, floor, player_at, recorded, run, run_until, stage_with, step, DT};
use crate::events::{EventArg, EventType};
use crate::foundation::math::{Vec2, Vec3};
use crate::physics::{Capabilities, DashResponse, SolidFlags};
use crate::player::PlayerState;
use crate::services::{Effect, Sound, Transition};

#[test]
fn test_lands_on_floor_and_reports_it() {
    let mut stage = stage_with(vec![floor()]);
    let mut player = player_at(Vec3::new(0.0, 0.0, 20.0));

    let frames = run_until(&mut player, &mut stage, 120, |p| p.on_ground());
    assert!(frames.is_some());
    assert_relative_eq!(player.position().z, 0.0, epsilon = 1e-3);
    assert!(stage.events.has_pending(EventType::Landed));
    assert_eq!(recorded(&stage).sound_count(Sound::Land), 1);
    assert_eq!(player.player_state(), Some(PlayerState::Normal));
}

#[test]
fn test_dash_contract() {
    let mut stage = stage_with(vec![floor()]);
    let mut player = player_at(Vec3::zeros());
    step(&mut player, &mut stage);
    assert!(player.on_ground());
    assert_eq!(player.dashes(), 1);

    stage.controls.dash.press();
    step(&mut player, &mut stage);
    assert_eq!(player.player_state(), Some(PlayerState::Dashing));
    assert_eq!(player.dashes(), 0);
    assert!(stage.events.has_pending(EventType::Dashed));
    assert_relative_eq!(player.velocity().y, player.tuning().dash_speed, epsilon = 1e-3);

    let ended = run_until(&mut player, &mut stage, 60, |p| p.player_state() == Some(PlayerState::Normal));
    assert!(ended.is_some());

    // Cooldown still running: the press is rejected and nothing is spent
    stage.controls.dash.release();
    stage.controls.dash.press();
    step(&mut player, &mut stage);
    assert_eq!(player.player_state(), Some(PlayerState::Normal));
    assert_eq!(player.dashes(), 0);
    stage.controls.dash.consume_press();
    stage.controls.dash.release();

    // Ground contact refills once the reset cooldown runs out
    run(&mut player, &mut stage, 30);
    assert_eq!(player.dashes(), 1);
    stage.controls.dash.press();
    step(&mut player, &mut stage);
    assert_eq!(player.player_state(), Some(PlayerState::Dashing));
}

#[test]
fn test_dash_not_refilled_in_air() {
    let mut stage = stage_with(vec![]);
    let mut player = player_at(Vec3::new(0.0, 0.0, 50.0));
    step(&mut player, &mut stage);
    stage.controls.dash.press();
    step(&mut player, &mut stage);
    assert_eq!(player.player_state(), Some(PlayerState::Dashing));

    run(&mut player, &mut stage, 40);
    assert_eq!(player.player_state(), Some(PlayerState::Normal));
    assert_eq!(player.dashes(), 0);
    assert!(player.refill_dash(&mut stage));
    assert_eq!(player.dashes(), 1);
    assert!(!player.refill_dash(&mut stage));
    assert_eq!(recorded(&stage).sound_count(Sound::DashRefill), 1);
}

fn walk_off_ledge() -> (crate::player::Player, crate::stage::Stage) {
    let ledge = cuboid(Vec3::new(-100.0, -100.0, -10.0), Vec3::new(0.0, 100.0, 0.0));
    let mut stage = stage_with(vec![ledge]);
    let mut player = player_at(Vec3::new(-2.0, 0.0, 0.0));
    stage.controls.set_move(Vec2::new(1.0, 0.0));
    step(&mut player, &mut stage);
    assert!(player.on_ground());

    let left = run_until(&mut player, &mut stage, 120, |p| !p.on_ground());
    assert!(left.is_some());
    stage.controls.set_move(Vec2::zeros());
    stage.events.clear();
    (player, stage)
}

#[test]
fn test_jump_within_coyote_time_succeeds() {
    let (mut player, mut stage) = walk_off_ledge();
    run(&mut player, &mut stage, 2);

    stage.controls.jump.press();
    step(&mut player, &mut stage);
    assert!(player.velocity().z > 0.0);
    assert!(stage.events.has_pending(EventType::Jumped));
    assert_eq!(recorded(&stage).sound_count(Sound::Jump), 1);
}

#[test]
fn test_jump_after_coyote_time_fails() {
    let (mut player, mut stage) = walk_off_ledge();
    run(&mut player, &mut stage, 12);

    stage.controls.jump.press();
    step(&mut player, &mut stage);
    assert!(player.velocity().z < 0.0);
    assert!(!stage.events.has_pending(EventType::Jumped));
}

#[test]
fn test_holding_jump_keeps_upward_speed() {
    let jump_for = |hold: bool| {
        let mut stage = stage_with(vec![floor()]);
        let mut player = player_at(Vec3::zeros());
        step(&mut player, &mut stage);
        stage.controls.jump.press();
        if !hold {
            stage.controls.jump.release();
        }
        run(&mut player, &mut stage, 6);
        player.velocity().z
    };

    let held = jump_for(true);
    let released = jump_for(false);
    assert!(held > released + 20.0, "held {held}, released {released}");
}

#[test]
fn test_sweep_resolves_one_impact_per_sweep() {
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    let block = cuboid(Vec3::new(-50.0, 10.0, 0.0), Vec3::new(50.0, 20.0, 30.0))
        .with_capabilities(Capabilities::DASH_TRIGGER)
        .with_dash_trigger(move |_: Vec3| {
            counter.set(counter.get() + 1);
            DashResponse::default()
        });
    let mut stage = stage_with(vec![floor(), block]);
    let mut player = player_at(Vec3::new(0.0, 2.0, 0.0));
    step(&mut player, &mut stage);
    player.set_state(&mut stage, PlayerState::Dashing);

    // Five steps of two units; the last three all touch the block
    player.sweep_test_move(&mut stage, Vec3::new(0.0, 10.0, 0.0), true);
    assert_eq!(hits.get(), 1);
    assert_relative_eq!(player.position().y, 7.0, epsilon = 1e-3);

    player.sweep_test_move(&mut stage, Vec3::new(0.0, 4.0, 0.0), true);
    assert_eq!(hits.get(), 2);
}

#[test]
fn test_wall_impact_removes_inward_velocity() {
    let wall = cuboid(Vec3::new(-50.0, 10.0, 0.0), Vec3::new(50.0, 20.0, 30.0));
    let mut stage = stage_with(vec![floor(), wall]);
    let mut player = player_at(Vec3::new(0.0, 5.0, 0.0));
    step(&mut player, &mut stage);
    player.set_velocity(Vec3::new(30.0, 60.0, 0.0));

    player.sweep_test_move(&mut stage, Vec3::new(0.0, 4.0, 0.0), true);
    assert_relative_eq!(player.velocity().y, 0.0, epsilon = 1e-4);
    assert_relative_eq!(player.velocity().x, 30.0, epsilon = 1e-4);
    assert!(player.position().y <= 7.0 + 1e-3);
}

#[test]
fn test_dash_trigger_bounce_and_destroy() {
    let seen = Rc::new(Cell::new(Vec3::zeros()));
    let recorder = Rc::clone(&seen);
    let block = cuboid(Vec3::new(-50.0, 10.0, 0.0), Vec3::new(50.0, 20.0, 30.0))
        .with_capabilities(Capabilities::DASH_TRIGGER)
        .with_dash_trigger(move |velocity: Vec3| {
            recorder.set(velocity);
            DashResponse {
                bounce: true,
                destroy: true,
            }
        });
    let mut stage = stage_with(vec![floor(), block]);
    let mut player = player_at(Vec3::new(0.0, 4.0, 0.0));
    step(&mut player, &mut stage);

    stage.controls.dash.press();
    let bounced = run_until(&mut player, &mut stage, 30, |p| p.player_state() == Some(PlayerState::Normal));
    assert!(bounced.is_some());
    assert!(player.velocity().y < 0.0);
    // The trigger is handed the dash velocity, not a position
    assert_relative_eq!(seen.get(), Vec3::new(0.0, player.tuning().dash_speed, 0.0), epsilon = 1e-3);
    assert_eq!(recorded(&stage).effect_count(Effect::Debris), 1);
    // Destroyed solids are flushed at the end of the frame
    assert_eq!(stage.world.len(), 1);
}

#[test]
fn test_death_plane_kills_and_requests_one_reload() {
    let mut stage = stage_with(vec![]);
    stage.death_plane = -50.0;
    let mut player = player_at(Vec3::new(0.0, 0.0, -45.0));

    let died = run_until(&mut player, &mut stage, 60, |p| p.player_state() == Some(PlayerState::Dead));
    assert!(died.is_some());
    assert!(stage.events.has_pending(EventType::Died));
    assert!(!player.is_able_to_pause());

    run(&mut player, &mut stage, 150);
    let reloads = recorded(&stage)
        .transitions
        .iter()
        .filter(|t| **t == Transition::ReloadLevel)
        .count();
    assert_eq!(reloads, 1);

    player.respawn(&mut stage);
    assert_eq!(player.player_state(), Some(PlayerState::Respawn));
    assert_eq!(player.position(), player.spawn_point());
    let back = run_until(&mut player, &mut stage, 60, |p| p.player_state() == Some(PlayerState::Normal));
    assert!(back.is_some());
    assert!(stage.events.has_pending(EventType::Respawned));
}

#[test]
fn test_spikes_kill_without_being_solid() {
    let spikes = cuboid(Vec3::new(-5.0, -5.0, 0.0), Vec3::new(5.0, 5.0, 6.0))
        .with_flags(SolidFlags::empty())
        .with_capabilities(Capabilities::SPIKES);
    let mut stage = stage_with(vec![floor(), spikes]);
    let mut player = player_at(Vec3::zeros());

    step(&mut player, &mut stage);
    assert_eq!(player.player_state(), Some(PlayerState::Dead));
    assert_eq!(recorded(&stage).sound_count(Sound::Death), 1);

    // Already dead: no second death
    step(&mut player, &mut stage);
    assert_eq!(recorded(&stage).sound_count(Sound::Death), 1);
}

#[test]
fn test_rides_moving_platform() {
    let platform = cuboid(Vec3::new(-50.0, -50.0, -2.0), Vec3::new(50.0, 50.0, 0.0))
        .with_capabilities(Capabilities::RIDEABLE);
    let mut stage = stage_with(vec![]);
    let id = stage.world.add_solid(platform);
    let mut player = player_at(Vec3::zeros());
    step(&mut player, &mut stage);

    for _ in 0..30 {
        stage.world.move_by(id, Vec3::new(1.0, 0.0, 0.0), DT).unwrap();
        step(&mut player, &mut stage);
    }
    assert_relative_eq!(player.position().x, 30.0, epsilon = 0.5);
    assert!(player.on_ground());
}

#[test]
fn test_state_changes_are_published() {
    let mut stage = stage_with(vec![floor()]);
    let mut player = player_at(Vec3::zeros());
    step(&mut player, &mut stage);
    stage.events.clear();

    stage.controls.dash.press();
    step(&mut player, &mut stage);
    let change = stage
        .events
        .pending()
        .iter()
        .find(|event| event.event_type == EventType::StateChanged)
        .unwrap();
    assert_eq!(change.get_state("from"), Some(PlayerState::Normal.id().0));
    assert_eq!(change.get_state("to"), Some(PlayerState::Dashing.id().0));
    assert!(matches!(change.get_arg("position"), Some(EventArg::Position(_))));
}

#[test]
fn test_tuning_changes_and_reset() {
    let mut player = player_at(Vec3::zeros());
    player.tuning_mut().max_dashes = 2;
    assert_eq!(player.tuning().max_dashes, 2);
    player.reset_tuning();
    assert_eq!(player.tuning().max_dashes, 1);
}

#[test]
fn test_ceiling_above_short_body_is_left_alone() {
    let ceiling = cuboid(Vec3::new(-50.0, -50.0, 11.0), Vec3::new(50.0, 50.0, 20.0));
    let mut stage = stage_with(vec![ceiling]);
    let mut player = player_at(Vec3::zeros());
    player.tuning_mut().height = 8.0;
    player.set_velocity(Vec3::new(0.0, 0.0, 30.0));

    player.pop_out(&mut stage, true);
    assert_relative_eq!(player.position().z, 0.0, epsilon = 1e-5);
    assert_relative_eq!(player.velocity().z, 30.0, epsilon = 1e-5);
}

#[test]
fn test_low_ceiling_pushes_head_down() {
    let ceiling = cuboid(Vec3::new(-50.0, -50.0, 6.0), Vec3::new(50.0, 50.0, 20.0));
    let mut stage = stage_with(vec![ceiling]);
    let mut player = player_at(Vec3::zeros());
    player.tuning_mut().height = 8.0;
    player.set_velocity(Vec3::new(0.0, 0.0, 30.0));

    player.pop_out(&mut stage, true);
    assert_relative_eq!(player.position().z, -2.0, epsilon = 1e-4);
    assert_relative_eq!(player.velocity().z, 0.0, epsilon = 1e-5);
}
