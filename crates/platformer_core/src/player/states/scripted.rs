//! Choreographed states driven by routines
//!
//! Strawberry pickups frame the player with a camera override; bubbles and
//! cassettes carry the player along a quadratic curve. Each script is a small
//! step machine resumed by the state's routine.

use crate::events::{EventArg, EventType};
use crate::foundation::math::ease::sine_in_out;
use crate::foundation::math::utils::bezier;
use crate::foundation::math::Vec3;
use crate::fsm::{BoxedCoroutine, Coroutine, Yield};
use crate::player::{CameraOverride, Player, PlayerState};
use crate::services::{Effect, Sound, Transition};
use crate::stage::Stage;

/// Seconds the collected strawberry is shown
const STRAWB_GET_HOLD: f32 = 1.2;
/// Seconds before a revealed strawberry appears
const STRAWB_REVEAL_LEAD: f32 = 0.6;
/// Seconds the revealed strawberry is shown
const STRAWB_REVEAL_HOLD: f32 = 0.8;
/// Seconds inside a cassette before the transition request
const CASSETTE_HOLD: f32 = 0.5;
/// Height of the curve's control point above the midpoint
const CURVE_LIFT: f32 = 40.0;
/// Shortest curve travel
const MIN_TRAVEL_TIME: f32 = 0.1;

pub(super) fn clear_camera(player: &mut Player, _stage: &mut Stage) {
    player.camera_override = None;
    player.strawb = None;
}

pub(super) fn clear_target(player: &mut Player, _stage: &mut Stage) {
    player.scripted_target = None;
}

fn back_to_normal() -> Option<BoxedCoroutine<Player, Stage>> {
    Some(Box::new(|player: &mut Player, stage: &mut Stage| {
        log::warn!("Scripted state entered without a target");
        player.set_state(stage, PlayerState::Normal);
        Yield::Done
    }))
}

/// Moves the player along a curve over a fixed duration
struct CurveMove {
    from: Vec3,
    control: Vec3,
    to: Vec3,
    duration: f32,
    elapsed: f32,
    started: bool,
}

impl CurveMove {
    fn new(from: Vec3, to: Vec3, speed: f32) -> Self {
        let control = (from + to) * 0.5 + Vec3::z() * CURVE_LIFT;
        let duration = if speed > 0.0 {
            ((to - from).norm() / speed).max(MIN_TRAVEL_TIME)
        } else {
            MIN_TRAVEL_TIME
        };
        Self {
            from,
            control,
            to,
            duration,
            elapsed: 0.0,
            started: false,
        }
    }
}

impl Coroutine<Player, Stage> for CurveMove {
    fn resume(&mut self, player: &mut Player, stage: &mut Stage) -> Yield<Player, Stage> {
        if self.started {
            self.elapsed += stage.time.delta();
        }
        self.started = true;

        let t = (self.elapsed / self.duration).min(1.0);
        player.position = bezier(self.from, self.control, self.to, sine_in_out(t));
        player.velocity = Vec3::zeros();
        if t >= 1.0 {
            Yield::Done
        } else {
            Yield::Frame
        }
    }
}

pub(super) fn strawb_get_enter(player: &mut Player, stage: &mut Stage) {
    player.velocity = Vec3::zeros();
    let Some(strawb) = player.strawb else {
        return;
    };
    stage
        .events
        .publish(EventType::StrawbCollected)
        .set_arg("id", EventArg::Id(strawb.id))
        .set_arg("position", EventArg::Position(strawb.position));
    stage.services.play_sound(Sound::StrawbGet, strawb.position);
}

struct StrawbGetScript {
    step: u8,
}

impl Coroutine<Player, Stage> for StrawbGetScript {
    fn resume(&mut self, player: &mut Player, stage: &mut Stage) -> Yield<Player, Stage> {
        self.step += 1;
        match self.step {
            1 => {
                let waist = player.waist_position();
                player.camera_override = Some(CameraOverride {
                    position: waist + player.forward() * 40.0 + Vec3::z() * 12.0,
                    look_at: waist + Vec3::z() * 4.0,
                });
                if let Some(strawb) = player.strawb {
                    stage.services.spawn_effect(Effect::Sparkle, strawb.position);
                }
                Yield::Wait(STRAWB_GET_HOLD)
            }
            _ => {
                player.set_state(stage, PlayerState::Normal);
                Yield::Done
            }
        }
    }
}

pub(super) fn strawb_get_routine(player: &mut Player, _stage: &mut Stage) -> Option<BoxedCoroutine<Player, Stage>> {
    if player.strawb.is_none() {
        return back_to_normal();
    }
    Some(Box::new(StrawbGetScript { step: 0 }))
}

pub(super) fn strawb_reveal_enter(player: &mut Player, _stage: &mut Stage) {
    player.velocity = Vec3::zeros();
}

struct StrawbRevealScript {
    step: u8,
}

impl Coroutine<Player, Stage> for StrawbRevealScript {
    fn resume(&mut self, player: &mut Player, stage: &mut Stage) -> Yield<Player, Stage> {
        let Some(strawb) = player.strawb else {
            player.set_state(stage, PlayerState::Normal);
            return Yield::Done;
        };

        self.step += 1;
        match self.step {
            1 => {
                player.camera_override = Some(CameraOverride {
                    position: player.waist_position() - player.forward() * 30.0 + Vec3::z() * 20.0,
                    look_at: strawb.position,
                });
                Yield::Wait(STRAWB_REVEAL_LEAD)
            }
            2 => {
                stage.services.play_sound(Sound::StrawbReveal, strawb.position);
                stage.services.spawn_effect(Effect::Sparkle, strawb.position);
                Yield::Wait(STRAWB_REVEAL_HOLD)
            }
            _ => {
                player.set_state(stage, PlayerState::Normal);
                Yield::Done
            }
        }
    }
}

pub(super) fn strawb_reveal_routine(player: &mut Player, _stage: &mut Stage) -> Option<BoxedCoroutine<Player, Stage>> {
    if player.strawb.is_none() {
        return back_to_normal();
    }
    Some(Box::new(StrawbRevealScript { step: 0 }))
}

pub(super) fn bubble_enter(player: &mut Player, stage: &mut Stage) {
    player.velocity = Vec3::zeros();
    stage.services.play_sound(Sound::Bubble, player.position);
}

pub(super) fn bubble_routine(player: &mut Player, _stage: &mut Stage) -> Option<BoxedCoroutine<Player, Stage>> {
    let Some(target) = player.scripted_target.as_ref().map(|target| target.position) else {
        return back_to_normal();
    };
    let mut travel = Some(CurveMove::new(player.position, target, player.tuning.current.bubble_speed));

    Some(Box::new(move |player: &mut Player, stage: &mut Stage| match travel.take() {
        Some(travel) => Yield::run(travel),
        None => {
            player.dashes = player.tuning.current.max_dashes;
            player.set_state(stage, PlayerState::Normal);
            Yield::Done
        }
    }))
}

pub(super) fn cassette_enter(player: &mut Player, stage: &mut Stage) {
    player.velocity = Vec3::zeros();
    stage.services.play_sound(Sound::Cassette, player.position);
}

struct CassetteScript {
    travel: Option<CurveMove>,
    map: String,
    waited: bool,
}

impl Coroutine<Player, Stage> for CassetteScript {
    fn resume(&mut self, _player: &mut Player, stage: &mut Stage) -> Yield<Player, Stage> {
        if let Some(travel) = self.travel.take() {
            return Yield::run(travel);
        }
        if !self.waited {
            self.waited = true;
            return Yield::Wait(CASSETTE_HOLD);
        }
        log::info!("Entering cassette map {}", self.map);
        stage.services.request_transition(Transition::EnterCassette {
            map: std::mem::take(&mut self.map),
        });
        Yield::Done
    }
}

pub(super) fn cassette_routine(player: &mut Player, _stage: &mut Stage) -> Option<BoxedCoroutine<Player, Stage>> {
    let Some(target) = player.scripted_target.clone() else {
        return back_to_normal();
    };
    let speed = player.tuning.current.bubble_speed;
    Some(Box::new(CassetteScript {
        travel: Some(CurveMove::new(player.position, target.position, speed)),
        map: target.map.unwrap_or_default(),
        waited: false,
    }))
}
