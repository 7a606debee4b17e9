//! Pickups, scripted sequences and custom states

use std::cell::Cell;
use std::rc::Rc;

use approx::assert_relative_eq;

use super::{cuboid, floor, player_at, recorded, run, run_until, stage_with, step};
use crate::events::EventType;
use crate::foundation::math::{Vec2, Vec3};
use crate::fsm::StateId;
use crate::player::{CustomPlayerState, Player, PlayerState, RegistryError};
use crate::services::{Sound, Transition};
use crate::stage::{Interactable, Stage};

fn standing() -> (Player, Stage) {
    let mut stage = stage_with(vec![floor()]);
    let mut player = player_at(Vec3::zeros());
    step(&mut player, &mut stage);
    assert!(player.on_ground());
    (player, stage)
}

#[test]
fn test_feather_flight_times_out_to_normal() {
    let mut stage = stage_with(vec![]);
    let mut player = player_at(Vec3::new(0.0, 0.0, 50.0));
    step(&mut player, &mut stage);
    let pickup_z = player.position().z;

    assert!(player.feather_get(&mut stage));
    assert_eq!(player.player_state(), Some(PlayerState::FeatherStart));
    assert_eq!(recorded(&stage).sound_count(Sound::FeatherGet), 1);

    let mut flew = false;
    let mut drift: f32 = 0.0;
    let landed = run_until(&mut player, &mut stage, 240, |p| {
        if p.is_state(PlayerState::Feather) {
            flew = true;
            drift = drift.max((p.position().z - pickup_z).abs());
        }
        p.is_state(PlayerState::Normal)
    });
    assert!(landed.is_some());
    assert!(flew);
    assert!(drift < 1.0, "drifted {drift}");
    assert!(player.velocity().z > 0.0);
}

struct Hover {
    updates: Rc<Cell<u32>>,
    exits: Rc<Cell<u32>>,
}

impl CustomPlayerState for Hover {
    fn update(&self, player: &mut Player, _stage: &mut Stage) {
        self.updates.set(self.updates.get() + 1);
        player.set_velocity(Vec3::zeros());
    }

    fn exit(&self, _player: &mut Player, _stage: &mut Stage) {
        self.exits.set(self.exits.get() + 1);
    }

    fn is_able_to_pickup(&self) -> bool {
        false
    }
}

struct Unregistered;
impl CustomPlayerState for Unregistered {}

#[test]
fn test_custom_state_lifecycle() {
    let (mut player, mut stage) = standing();
    let updates = Rc::new(Cell::new(0));
    let exits = Rc::new(Cell::new(0));

    let id = player
        .register_state(Hover {
            updates: Rc::clone(&updates),
            exits: Rc::clone(&exits),
        })
        .unwrap();
    assert_eq!(id, StateId(PlayerState::COUNT));
    assert_eq!(player.custom_state_id::<Hover>(), Some(id));
    assert_eq!(player.custom_state_count(), 1);

    assert!(player.set_custom_state::<Hover>(&mut stage));
    assert!(!player.set_custom_state::<Unregistered>(&mut stage));
    assert_eq!(player.state(), Some(id));
    assert_eq!(player.player_state(), None);

    run(&mut player, &mut stage, 3);
    assert_eq!(updates.get(), 3);
    assert!(player.is_able_to_pause());
    assert!(!player.strawb_get(&mut stage, 1, Vec3::zeros()));
    assert_eq!(player.state(), Some(id));

    player.set_state(&mut stage, PlayerState::Normal);
    assert_eq!(exits.get(), 1);

    let again = player.register_state(Hover {
        updates: Rc::new(Cell::new(0)),
        exits: Rc::new(Cell::new(0)),
    });
    assert!(matches!(again, Err(RegistryError::StateAlreadyRegistered(_))));
    assert_eq!(player.custom_state_count(), 1);
}

#[test]
fn test_dash_talks_to_nearby_npc_instead_of_dashing() {
    let (mut player, mut stage) = standing();
    stage.interactables.push(Interactable {
        id: 9,
        position: Vec3::new(0.0, 5.0, 0.0),
        radius: 10.0,
        enabled: true,
    });

    stage.controls.dash.press();
    step(&mut player, &mut stage);
    assert_eq!(player.player_state(), Some(PlayerState::Normal));
    assert_eq!(player.dashes(), 1);
    let talk = stage
        .events
        .pending()
        .iter()
        .find(|event| event.event_type == EventType::Interacted)
        .unwrap();
    assert_eq!(talk.get_id(), Some(9));
}

#[test]
fn test_disabled_npc_is_ignored() {
    let (mut player, mut stage) = standing();
    stage.interactables.push(Interactable {
        id: 9,
        position: Vec3::new(0.0, 5.0, 0.0),
        radius: 10.0,
        enabled: false,
    });

    stage.controls.dash.press();
    step(&mut player, &mut stage);
    assert_eq!(player.player_state(), Some(PlayerState::Dashing));
    assert!(!stage.events.has_pending(EventType::Interacted));
}

#[test]
fn test_bubble_carries_player_to_target() {
    let (mut player, mut stage) = standing();
    player.dashes = 0;
    let target = Vec3::new(0.0, 100.0, 0.0);

    assert!(player.bubble_to(&mut stage, target));
    assert_eq!(player.player_state(), Some(PlayerState::Bubble));
    assert!(!player.bubble_to(&mut stage, Vec3::zeros()));

    let arrived = run_until(&mut player, &mut stage, 120, |p| p.is_state(PlayerState::Normal));
    assert!(arrived.is_some());
    assert_relative_eq!(player.position(), target, epsilon = 1e-2);
    assert_eq!(player.dashes(), 1);
    assert_eq!(recorded(&stage).sound_count(Sound::Bubble), 1);
}

#[test]
fn test_cassette_requests_map_once() {
    let (mut player, mut stage) = standing();
    assert!(player.enter_cassette(&mut stage, Vec3::new(0.0, 50.0, 0.0), "b-side"));
    assert!(!player.is_able_to_pause());

    run(&mut player, &mut stage, 120);
    let expected = Transition::EnterCassette {
        map: "b-side".to_string(),
    };
    assert_eq!(recorded(&stage).transitions, vec![expected]);
    assert_eq!(player.player_state(), Some(PlayerState::Cassette));
}

#[test]
fn test_strawberry_pickup_frames_camera_then_returns() {
    let (mut player, mut stage) = standing();
    assert!(player.strawb_get(&mut stage, 3, Vec3::new(0.0, 5.0, 4.0)));
    let collected = stage
        .events
        .pending()
        .iter()
        .find(|event| event.event_type == EventType::StrawbCollected)
        .unwrap();
    assert_eq!(collected.get_id(), Some(3));
    assert!(!player.is_able_to_pause());

    step(&mut player, &mut stage);
    assert!(player.camera_override().is_some());

    let done = run_until(&mut player, &mut stage, 120, |p| p.is_state(PlayerState::Normal));
    assert!(done.is_some());
    assert!(player.camera_override().is_none());
    assert_eq!(recorded(&stage).sound_count(Sound::StrawbGet), 1);
}

#[test]
fn test_debug_fly_toggles_and_ignores_gravity() {
    let (mut player, mut stage) = standing();
    stage.controls.debug_fly.press();
    step(&mut player, &mut stage);
    assert_eq!(player.player_state(), Some(PlayerState::DebugFly));
    assert!(!player.is_able_to_pickup());

    stage.controls.debug_fly.release();
    stage.controls.jump.press();
    stage.controls.set_move(Vec2::new(0.0, 1.0));
    run(&mut player, &mut stage, 10);
    assert!(player.position().z > 30.0);
    assert!(player.position().y > 30.0);

    stage.controls.jump.release();
    stage.controls.set_move(Vec2::zeros());
    let height = player.position().z;
    run(&mut player, &mut stage, 10);
    assert_relative_eq!(player.position().z, height, epsilon = 1e-4);

    stage.controls.debug_fly.press();
    step(&mut player, &mut stage);
    assert_eq!(player.player_state(), Some(PlayerState::Normal));
}

#[test]
fn test_cutscene_holds_until_released() {
    let (mut player, mut stage) = standing();
    stage.cutscene_freezes_player = true;
    player.enter_cutscene(&mut stage);

    stage.controls.jump.press();
    run(&mut player, &mut stage, 10);
    assert_eq!(player.player_state(), Some(PlayerState::Cutscene));
    assert!(player.on_ground());
    assert!(!stage.events.has_pending(EventType::Jumped));

    stage.controls.jump.release();
    stage.cutscene_freezes_player = false;
    step(&mut player, &mut stage);
    assert_eq!(player.player_state(), Some(PlayerState::Normal));
}

/// Feathered player at z = 50 flying north toward a wall at y = 30
fn feather_toward_wall() -> (Player, Stage) {
    let wall = cuboid(Vec3::new(-100.0, 30.0, 0.0), Vec3::new(100.0, 40.0, 100.0));
    let mut stage = stage_with(vec![wall]);
    let mut player = player_at(Vec3::new(0.0, 0.0, 50.0));
    step(&mut player, &mut stage);
    assert!(player.feather_get(&mut stage));
    (player, stage)
}

#[test]
fn test_feather_bumps_off_walls() {
    let (mut player, mut stage) = feather_toward_wall();

    let bumped = run_until(&mut player, &mut stage, 120, |p| p.velocity().y < 0.0);
    assert!(bumped.is_some());
    assert_eq!(player.player_state(), Some(PlayerState::Feather));
    assert!(player.velocity().y < -90.0);
    assert!(player.velocity().x.abs() < 1e-3);
    assert!(player.timers.feather_wall_bump > 0.0);
    assert_eq!(recorded(&stage).sound_count(Sound::FeatherBump), 1);

    run(&mut player, &mut stage, 10);
    assert_eq!(recorded(&stage).sound_count(Sound::FeatherBump), 1);
}

#[test]
fn test_feather_holding_climb_slides_instead_of_bumping() {
    let (mut player, mut stage) = feather_toward_wall();
    stage.controls.climb.press();

    let mut lowest_vy: f32 = 0.0;
    run_until(&mut player, &mut stage, 60, |p| {
        lowest_vy = lowest_vy.min(p.velocity().y);
        false
    });
    assert_eq!(player.player_state(), Some(PlayerState::Feather));
    assert_eq!(recorded(&stage).sound_count(Sound::FeatherBump), 0);
    assert!(lowest_vy >= 0.0);
    assert!(player.position().y < 27.5);
    assert_relative_eq!(player.timers.feather_wall_bump, 0.0);
}
