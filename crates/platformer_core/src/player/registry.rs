//! Side table of custom player states
//!
//! Custom states take ids past the built-in range. The machine only stores
//! function pointers, so every custom id is wired to the same set of thunks
//! that look the current state's implementation up here.

use std::any::TypeId;
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use super::{Player, PlayerState};
use crate::fsm::{BoxedCoroutine, StateId};
use crate::stage::Stage;

/// Most custom states one player can hold
pub const MAX_CUSTOM_STATES: usize = 64;

/// Behavior of a state added by external code
///
/// Every callback is optional; a state that only overrides `update` is a
/// valid state.
pub trait CustomPlayerState: 'static {
    /// Runs every frame while active
    fn update(&self, _player: &mut Player, _stage: &mut Stage) {}

    /// Runs when the state is entered
    fn enter(&self, _player: &mut Player, _stage: &mut Stage) {}

    /// Runs when the state is left
    fn exit(&self, _player: &mut Player, _stage: &mut Stage) {}

    /// Coroutine started on entry
    fn routine(&self, _player: &mut Player, _stage: &mut Stage) -> Option<BoxedCoroutine<Player, Stage>> {
        None
    }

    /// Whether the game may pause while in this state
    fn is_able_to_pause(&self) -> bool {
        true
    }

    /// Whether pickups may be collected while in this state
    fn is_able_to_pickup(&self) -> bool {
        true
    }

    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Errors from [`Player::register_state`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The same state type was registered twice
    #[error("State {0} is already registered")]
    StateAlreadyRegistered(&'static str),

    /// No ids left
    #[error("No more than {MAX_CUSTOM_STATES} custom states can be registered")]
    IdSpaceExhausted,
}

#[derive(Default)]
pub(crate) struct CustomStateRegistry {
    states: Vec<Rc<dyn CustomPlayerState>>,
    ids: HashMap<TypeId, StateId>,
}

impl CustomStateRegistry {
    pub fn register<S: CustomPlayerState>(&mut self, state: Rc<S>) -> Result<StateId, RegistryError> {
        let key = TypeId::of::<S>();
        if self.ids.contains_key(&key) {
            return Err(RegistryError::StateAlreadyRegistered(std::any::type_name::<S>()));
        }
        if self.states.len() >= MAX_CUSTOM_STATES {
            return Err(RegistryError::IdSpaceExhausted);
        }

        let id = StateId(PlayerState::COUNT + self.states.len() as u32);
        self.states.push(state);
        self.ids.insert(key, id);
        Ok(id)
    }

    pub fn id_of<S: CustomPlayerState>(&self) -> Option<StateId> {
        self.ids.get(&TypeId::of::<S>()).copied()
    }

    pub fn get(&self, id: StateId) -> Option<Rc<dyn CustomPlayerState>> {
        let index = id.0.checked_sub(PlayerState::COUNT)? as usize;
        self.states.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }
}

fn current(player: &Player) -> Option<Rc<dyn CustomPlayerState>> {
    player.fsm.state().and_then(|id| player.registry.get(id))
}

pub(crate) fn custom_update(player: &mut Player, stage: &mut Stage) {
    if let Some(state) = current(player) {
        state.update(player, stage);
    }
}

pub(crate) fn custom_enter(player: &mut Player, stage: &mut Stage) {
    if let Some(state) = current(player) {
        state.enter(player, stage);
    }
}

pub(crate) fn custom_exit(player: &mut Player, stage: &mut Stage) {
    if let Some(state) = current(player) {
        state.exit(player, stage);
    }
}

pub(crate) fn custom_routine(player: &mut Player, stage: &mut Stage) -> Option<BoxedCoroutine<Player, Stage>> {
    current(player).and_then(|state| state.routine(player, stage))
}
