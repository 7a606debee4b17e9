//! Built-in player states
//!
//! Each submodule holds the enter/update/exit callbacks (and routine
//! factories, for the scripted states) of one or two related states.
//! [`register_builtin`] wires them into the player's state machine.

mod climbing;
mod dashing;
mod debug_fly;
mod feather;
mod lifecycle;
mod normal;
mod scripted;
mod skidding;

use super::registry::{custom_enter, custom_exit, custom_routine, custom_update};
use super::{Player, PlayerState, PlayerStateEvent};
use crate::fsm::{StateCallbacks, StateId, StateMachine};
use crate::stage::Stage;

type Callbacks = StateCallbacks<Player, Stage>;

pub(crate) fn register_builtin(fsm: &mut StateMachine<Player, Stage>) {
    let table: [(PlayerState, Callbacks); PlayerState::COUNT as usize] = [
        (PlayerState::Normal, Callbacks::default().on_update(normal::update)),
        (
            PlayerState::Dashing,
            Callbacks::default()
                .on_enter(dashing::enter)
                .on_update(dashing::update)
                .on_exit(dashing::exit),
        ),
        (
            PlayerState::Skidding,
            Callbacks::default().on_enter(skidding::enter).on_update(skidding::update),
        ),
        (
            PlayerState::Climbing,
            Callbacks::default()
                .on_enter(climbing::enter)
                .on_update(climbing::update)
                .on_exit(climbing::exit),
        ),
        (
            PlayerState::StrawbGet,
            Callbacks::default()
                .on_enter(scripted::strawb_get_enter)
                .on_exit(scripted::clear_camera)
                .with_routine(scripted::strawb_get_routine),
        ),
        (
            PlayerState::FeatherStart,
            Callbacks::default()
                .on_enter(feather::start_enter)
                .on_update(feather::start_update),
        ),
        (
            PlayerState::Feather,
            Callbacks::default()
                .on_enter(feather::enter)
                .on_update(feather::update)
                .on_exit(feather::exit),
        ),
        (
            PlayerState::Respawn,
            Callbacks::default()
                .on_enter(lifecycle::respawn_enter)
                .on_update(lifecycle::respawn_update),
        ),
        (
            PlayerState::Dead,
            Callbacks::default().on_enter(lifecycle::dead_enter).on_update(lifecycle::dead_update),
        ),
        (
            PlayerState::StrawbReveal,
            Callbacks::default()
                .on_enter(scripted::strawb_reveal_enter)
                .on_exit(scripted::clear_camera)
                .with_routine(scripted::strawb_reveal_routine),
        ),
        (
            PlayerState::Cutscene,
            Callbacks::default()
                .on_enter(lifecycle::cutscene_enter)
                .on_update(lifecycle::cutscene_update),
        ),
        (
            PlayerState::Bubble,
            Callbacks::default()
                .on_enter(scripted::bubble_enter)
                .on_exit(scripted::clear_target)
                .with_routine(scripted::bubble_routine),
        ),
        (
            PlayerState::Cassette,
            Callbacks::default()
                .on_enter(scripted::cassette_enter)
                .on_exit(scripted::clear_target)
                .with_routine(scripted::cassette_routine),
        ),
        (
            PlayerState::DebugFly,
            Callbacks::default().on_enter(debug_fly::enter).on_update(debug_fly::update),
        ),
    ];

    for (state, callbacks) in table {
        fsm.init_state(state.id(), callbacks);
    }
    fsm.init_state_event(PlayerState::Normal.id(), PlayerStateEvent::Land.id(), normal::land);
}

pub(crate) fn register_custom(fsm: &mut StateMachine<Player, Stage>, id: StateId) {
    fsm.init_state(
        id,
        Callbacks::default()
            .on_enter(custom_enter)
            .on_update(custom_update)
            .on_exit(custom_exit)
            .with_routine(custom_routine),
    );
}
