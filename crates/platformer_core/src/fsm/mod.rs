//! State machines and coroutines
//!
//! [`StateMachine`] drives enum-style states through enter/update/exit
//! callbacks and gives each state an optional [`Routine`], the cooperative
//! coroutine runner used for multi-frame choreography.

mod routine;
mod state_machine;

pub use routine::{BoxedCoroutine, Coroutine, Routine, RoutineAccess, WaitFor, Yield};
pub use state_machine::{
    EventId, RoutineFactory, StateCallback, StateCallbacks, StateId, StateMachine, StateOwner,
    TransitionHook, MAX_EVENT_ID, MAX_STATE_ID,
};
