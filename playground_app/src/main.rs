//! Headless playground
//!
//! Builds a small level, drives the player with a scripted input timeline
//! and logs every notification the player publishes. Pass a `.toml` or `.ron`
//! tuning file as the first argument to try different physics constants.

use platformer_core::foundation::logging;
use platformer_core::foundation::time::Stopwatch;
use platformer_core::prelude::*;

const FRAME_TIME: f32 = 1.0 / 60.0;
const FRAMES: u32 = 900;

/// Custom state: stand still for a moment, then carry on
struct Wave;

impl CustomPlayerState for Wave {
    fn enter(&self, player: &mut Player, _stage: &mut Stage) {
        player.set_velocity(Vec3::zeros());
        log::info!("Waving at {:?}", player.position());
    }

    fn update(&self, player: &mut Player, stage: &mut Stage) {
        if player.state_time() >= 0.5 {
            player.set_state(stage, PlayerState::Normal);
        }
    }

    fn name(&self) -> &str {
        "Wave"
    }
}

fn build_world() -> Result<(CollisionWorld, SolidId), WorldError> {
    let mut world = CollisionWorld::default();
    world.add_solid(Solid::new(SolidShape::cuboid(
        Vec3::new(-300.0, -100.0, -20.0),
        Vec3::new(300.0, 400.0, 0.0),
    )?));

    // Climbable tower straight ahead
    world.add_solid(
        Solid::new(SolidShape::cuboid(Vec3::new(-30.0, 200.0, 0.0), Vec3::new(30.0, 240.0, 60.0))?)
            .with_flags(SolidFlags::COLLIDABLE | SolidFlags::CLIMBABLE),
    );

    // Breakable block in the dash path
    world.add_solid(
        Solid::new(SolidShape::cuboid(Vec3::new(-20.0, 120.0, 0.0), Vec3::new(20.0, 130.0, 20.0))?)
            .with_capabilities(Capabilities::DASH_TRIGGER)
            .with_dash_trigger(|velocity: Vec3| {
                log::info!("Block broken by a dash moving at {:.1}", velocity.norm());
                DashResponse {
                    bounce: false,
                    destroy: true,
                }
            }),
    );

    // Spikes off to the side
    world.add_solid(
        Solid::new(SolidShape::cuboid(Vec3::new(100.0, -20.0, 0.0), Vec3::new(140.0, 20.0, 4.0))?)
            .with_flags(SolidFlags::empty())
            .with_capabilities(Capabilities::SPIKES),
    );

    let platform = world.add_solid(
        Solid::new(SolidShape::cuboid(Vec3::new(-200.0, -40.0, 30.0), Vec3::new(-160.0, 0.0, 34.0))?)
            .with_capabilities(Capabilities::RIDEABLE),
    );
    Ok((world, platform))
}

fn register_loggers(events: &mut EventSystem) {
    for event_type in [
        EventType::Jumped,
        EventType::Landed,
        EventType::Dashed,
        EventType::Died,
        EventType::Respawned,
        EventType::Interacted,
        EventType::StrawbCollected,
    ] {
        events.register_handler(
            event_type,
            Box::new(|event: &Event| {
                log::info!("[{:>6.2}s] {:?} {:?}", event.timestamp, event.event_type, event.get_position());
                false
            }),
        );
    }
    events.register_handler(
        EventType::StateChanged,
        Box::new(|event: &Event| {
            log::debug!("State {:?} -> {:?}", event.get_state("from"), event.get_state("to"));
            false
        }),
    );
}

/// Input and triggers for `frame`
fn script(frame: u32, player: &mut Player, stage: &mut Stage) {
    match frame {
        30 => stage.controls.set_move(Vec2::new(0.0, 1.0)),
        60 => stage.controls.jump.press(),
        75 => stage.controls.jump.release(),
        100 => stage.controls.dash.press(),
        110 => stage.controls.dash.release(),
        150 => stage.controls.climb.press(),
        330 => stage.controls.climb.release(),
        360 => stage.controls.set_move(Vec2::zeros()),
        380 => {
            player.set_custom_state::<Wave>(stage);
        }
        430 => {
            player.feather_get(stage);
        }
        600 => {
            player.strawb_get(stage, 1, player.position() + Vec3::new(0.0, 4.0, 4.0));
        }
        700 => stage.controls.set_move(Vec2::new(1.0, 0.0)),
        _ => {}
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let tuning = match std::env::args().nth(1) {
        Some(path) => PlayerTuning::load_or_default(path)?,
        None => PlayerTuning::default(),
    };

    let (world, platform) = build_world()?;
    let mut stage = Stage::new(world).with_services(RecordingServices::default());
    stage.interactables.push(Interactable {
        id: 1,
        position: Vec3::new(-40.0, 0.0, 0.0),
        radius: 12.0,
        enabled: true,
    });
    register_loggers(&mut stage.events);

    let mut player = Player::new(Vec3::new(0.0, 0.0, 10.0), tuning);
    player.register_state(Wave)?;

    let mut stopwatch = Stopwatch::start_new();
    let mut handled_transitions = 0;
    for frame in 0..FRAMES {
        stage.begin_frame(FRAME_TIME);
        script(frame, &mut player, &mut stage);

        let sway = if stage.time.total() % 4.0 < 2.0 { 20.0 } else { -20.0 };
        stage.world.move_by(platform, Vec3::new(sway * FRAME_TIME, 0.0, 0.0), FRAME_TIME)?;

        player.update(&mut stage);
        stage.end_frame();
        stage.events.dispatch();

        let transitions = stage
            .services_as::<RecordingServices>()
            .map(|services| services.transitions[handled_transitions..].to_vec())
            .unwrap_or_default();
        handled_transitions += transitions.len();
        for transition in transitions {
            match transition {
                Transition::ReloadLevel => player.respawn(&mut stage),
                Transition::EnterCassette { map } => log::info!("Would load cassette map {map}"),
            }
        }

        if frame % 60 == 0 {
            log::debug!(
                "frame {frame}: {:?} at {:?}",
                player.player_state(),
                player.position()
            );
        }
    }

    stopwatch.stop();
    if let Some(services) = stage.services_as::<RecordingServices>() {
        log::info!(
            "Simulated {FRAMES} frames in {:?}: {} sounds, {} effects, {} transitions",
            stopwatch.elapsed(),
            services.sounds.len(),
            services.effects.len(),
            services.transitions.len()
        );
    }
    Ok(())
}
