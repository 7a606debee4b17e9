//! Generic state machine with enter/update/exit callbacks and per-state routines
//!
//! States are identified by [`StateId`], a plain integer. Enums map onto it
//! with an explicit conversion, and the id space is open: registering a
//! state past the current range grows the tables, so external code can add
//! states after the built-in ones.
//!
//! Callbacks are plain function pointers over the machine's owner `O` and a
//! context `C` threaded through every call. The machine lives inside its
//! owner; transitions and updates are associated functions that reach it
//! through [`StateOwner`].

use super::routine::{BoxedCoroutine, Routine};

/// Exclusive upper bound on state ids; the tables are dense, indexed by id
pub const MAX_STATE_ID: u32 = 1024;

/// Exclusive upper bound on event ids
pub const MAX_EVENT_ID: u32 = 256;

/// Integer state identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u32);

impl StateId {
    /// Table index of this id
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Integer identifier of a discrete event delivered through [`StateMachine::call_event`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u32);

/// Update, enter, exit or event callback
pub type StateCallback<O, C> = fn(&mut O, &mut C);

/// Builds the coroutine a state runs while active, if any
pub type RoutineFactory<O, C> = fn(&mut O, &mut C) -> Option<BoxedCoroutine<O, C>>;

/// Called after every transition with the previous and new state
pub type TransitionHook<O, C> = fn(&mut O, &mut C, Option<StateId>, StateId);

/// Callbacks registered for one state
pub struct StateCallbacks<O, C> {
    /// Runs every frame while the state is active
    pub update: Option<StateCallback<O, C>>,
    /// Runs when the state is entered
    pub enter: Option<StateCallback<O, C>>,
    /// Runs when the state is left
    pub exit: Option<StateCallback<O, C>>,
    /// Starts a coroutine when the state is entered
    pub routine: Option<RoutineFactory<O, C>>,
}

impl<O, C> Default for StateCallbacks<O, C> {
    fn default() -> Self {
        Self {
            update: None,
            enter: None,
            exit: None,
            routine: None,
        }
    }
}

impl<O, C> Clone for StateCallbacks<O, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O, C> Copy for StateCallbacks<O, C> {}

impl<O, C> StateCallbacks<O, C> {
    /// Builder: set the update callback
    #[must_use]
    pub fn on_update(mut self, callback: StateCallback<O, C>) -> Self {
        self.update = Some(callback);
        self
    }

    /// Builder: set the enter callback
    #[must_use]
    pub fn on_enter(mut self, callback: StateCallback<O, C>) -> Self {
        self.enter = Some(callback);
        self
    }

    /// Builder: set the exit callback
    #[must_use]
    pub fn on_exit(mut self, callback: StateCallback<O, C>) -> Self {
        self.exit = Some(callback);
        self
    }

    /// Builder: set the routine factory
    #[must_use]
    pub fn with_routine(mut self, factory: RoutineFactory<O, C>) -> Self {
        self.routine = Some(factory);
        self
    }
}

/// Access to the state machine embedded in an owner
pub trait StateOwner<C>: Sized {
    /// The owner's state machine
    fn state_machine(&mut self) -> &mut StateMachine<Self, C>;
}

/// State machine over owner `O` with context `C`
pub struct StateMachine<O, C> {
    states: Vec<StateCallbacks<O, C>>,
    events: Vec<Vec<Option<StateCallback<O, C>>>>,
    state: Option<StateId>,
    previous: Option<StateId>,
    state_time: f32,
    transitions: u64,
    on_transition: Option<TransitionHook<O, C>>,
    routine: Routine<O, C>,
}

impl<O, C> Default for StateMachine<O, C> {
    fn default() -> Self {
        Self {
            states: Vec::new(),
            events: Vec::new(),
            state: None,
            previous: None,
            state_time: 0.0,
            transitions: 0,
            on_transition: None,
            routine: Routine::new(),
        }
    }
}

impl<O, C> StateMachine<O, C> {
    /// Create a machine with room for `capacity` states and no current state
    pub fn with_capacity(capacity: usize) -> Self {
        let mut machine = Self::default();
        machine.states.resize_with(capacity, StateCallbacks::default);
        machine
    }

    /// Register callbacks for `id`, growing the id space as needed
    ///
    /// Ids at or above [`MAX_STATE_ID`] are rejected with a warning and
    /// `false` is returned.
    pub fn init_state(&mut self, id: StateId, callbacks: StateCallbacks<O, C>) -> bool {
        if id.0 >= MAX_STATE_ID {
            log::warn!("Ignoring state {id:?}: ids must be below {MAX_STATE_ID}");
            return false;
        }
        if self.states.len() <= id.index() {
            self.states.resize_with(id.index() + 1, StateCallbacks::default);
        }
        self.states[id.index()] = callbacks;
        true
    }

    /// Register the handler of `event` while in state `id`; same id limits as [`Self::init_state`]
    pub fn init_state_event(&mut self, id: StateId, event: EventId, action: StateCallback<O, C>) -> bool {
        if id.0 >= MAX_STATE_ID || event.0 >= MAX_EVENT_ID {
            log::warn!("Ignoring handler of {event:?} in {id:?}: ids out of range");
            return false;
        }
        if self.events.len() <= id.index() {
            self.events.resize_with(id.index() + 1, Vec::new);
        }
        let row = &mut self.events[id.index()];
        let column = event.0 as usize;
        if row.len() <= column {
            row.resize(column + 1, None);
        }
        row[column] = Some(action);
        true
    }

    /// Install the hook invoked after every transition
    pub fn set_transition_hook(&mut self, hook: TransitionHook<O, C>) {
        self.on_transition = Some(hook);
    }

    /// Current state
    pub fn state(&self) -> Option<StateId> {
        self.state
    }

    /// State before the most recent transition
    pub fn previous_state(&self) -> Option<StateId> {
        self.previous
    }

    /// Seconds spent in the current state
    pub fn state_time(&self) -> f32 {
        self.state_time
    }

    /// Number of ids with a table slot
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Whether `id` has any callback registered
    pub fn has_state(&self, id: StateId) -> bool {
        self.states.get(id.index()).is_some_and(|callbacks| {
            callbacks.update.is_some()
                || callbacks.enter.is_some()
                || callbacks.exit.is_some()
                || callbacks.routine.is_some()
        })
    }

    /// The state routine
    pub fn routine(&self) -> &Routine<O, C> {
        &self.routine
    }

    /// The state routine, mutably
    pub fn routine_mut(&mut self) -> &mut Routine<O, C> {
        &mut self.routine
    }

    fn callbacks(&self, id: StateId) -> StateCallbacks<O, C> {
        self.states.get(id.index()).copied().unwrap_or_default()
    }
}

fn machine_routine<O: StateOwner<C>, C>(owner: &mut O) -> &mut Routine<O, C> {
    owner.state_machine().routine_mut()
}

impl<O: StateOwner<C>, C> StateMachine<O, C> {
    /// Transition to `id`
    ///
    /// Clears the running routine, calls the old state's exit, switches,
    /// calls the new state's enter, invokes the transition hook, then starts
    /// the new state's routine with its first step run immediately. Setting
    /// the current state again re-enters it.
    pub fn set_state(owner: &mut O, ctx: &mut C, id: StateId) {
        let machine = owner.state_machine();
        let previous = machine.state;
        machine.routine.clear();
        machine.transitions = machine.transitions.wrapping_add(1);
        let generation = machine.transitions;
        let exit = previous.and_then(|state| machine.callbacks(state).exit);
        let next = machine.callbacks(id);

        if let Some(exit) = exit {
            exit(owner, ctx);
            if owner.state_machine().transitions != generation {
                // The exit callback already moved the machine elsewhere
                return;
            }
        }

        let machine = owner.state_machine();
        machine.previous = previous;
        machine.state = Some(id);
        machine.state_time = 0.0;
        let hook = machine.on_transition;
        log::trace!("State {previous:?} -> {id:?}");

        if let Some(enter) = next.enter {
            enter(owner, ctx);
        }
        if owner.state_machine().transitions != generation {
            return;
        }

        if let Some(hook) = hook {
            hook(owner, ctx, previous, id);
        }

        if let Some(factory) = next.routine {
            if owner.state_machine().transitions != generation {
                return;
            }
            if let Some(coroutine) = factory(owner, ctx) {
                Routine::run(owner, ctx, machine_routine::<O, C>, coroutine);
            }
        }
    }

    /// Run the current state's update, then step its routine once
    pub fn update(owner: &mut O, ctx: &mut C, delta: f32) {
        let machine = owner.state_machine();
        machine.state_time += delta;
        let update = machine.state.and_then(|state| machine.callbacks(state).update);

        if let Some(update) = update {
            update(owner, ctx);
        }
        Routine::update(owner, ctx, machine_routine::<O, C>, delta);
    }

    /// Deliver `event` to the current state; unregistered pairs are ignored
    pub fn call_event(owner: &mut O, ctx: &mut C, event: EventId) {
        let machine = owner.state_machine();
        let handler = machine.state.and_then(|state| {
            machine
                .events
                .get(state.index())
                .and_then(|row| row.get(event.0 as usize).copied().flatten())
        });
        if let Some(handler) = handler {
            handler(owner, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::Yield;

    const A: StateId = StateId(0);
    const B: StateId = StateId(1);
    const EXTRA: StateId = StateId(40);
    const PING: EventId = EventId(3);

    #[derive(Default)]
    struct Counters {
        trace: Vec<String>,
        pings: u32,
    }

    struct Machine {
        fsm: StateMachine<Machine, Counters>,
    }

    impl StateOwner<Counters> for Machine {
        fn state_machine(&mut self) -> &mut StateMachine<Self, Counters> {
            &mut self.fsm
        }
    }

    fn enter_a(_: &mut Machine, c: &mut Counters) {
        c.trace.push("enter A".into());
    }
    fn exit_a(_: &mut Machine, c: &mut Counters) {
        c.trace.push("exit A".into());
    }
    fn update_a(_: &mut Machine, c: &mut Counters) {
        c.trace.push("update A".into());
    }
    fn enter_b(_: &mut Machine, c: &mut Counters) {
        c.trace.push("enter B".into());
    }
    fn exit_b(_: &mut Machine, c: &mut Counters) {
        c.trace.push("exit B".into());
    }
    fn ping(_: &mut Machine, c: &mut Counters) {
        c.pings += 1;
    }
    fn routine_b(_: &mut Machine, _: &mut Counters) -> Option<BoxedCoroutine<Machine, Counters>> {
        let mut step = 0;
        Some(Box::new(move |_: &mut Machine, c: &mut Counters| {
            step += 1;
            c.trace.push(format!("routine B {step}"));
            if step < 2 {
                Yield::Frame
            } else {
                Yield::Done
            }
        }))
    }
    fn hook(_: &mut Machine, c: &mut Counters, from: Option<StateId>, to: StateId) {
        c.trace.push(format!("hook {from:?} -> {to:?}"));
    }

    fn machine() -> Machine {
        let mut fsm = StateMachine::with_capacity(2);
        fsm.init_state(A, StateCallbacks::default().on_enter(enter_a).on_exit(exit_a).on_update(update_a));
        fsm.init_state(B, StateCallbacks::default().on_enter(enter_b).on_exit(exit_b).with_routine(routine_b));
        fsm.init_state_event(A, PING, ping);
        Machine { fsm }
    }

    #[test]
    fn test_exit_runs_before_enter() {
        let mut m = machine();
        let mut c = Counters::default();
        StateMachine::set_state(&mut m, &mut c, A);
        assert_eq!(c.trace, vec!["enter A"]);

        StateMachine::set_state(&mut m, &mut c, B);
        assert_eq!(c.trace, vec!["enter A", "exit A", "enter B", "routine B 1"]);
        assert_eq!(m.fsm.previous_state(), Some(A));
        assert_eq!(m.fsm.state(), Some(B));
    }

    #[test]
    fn test_update_then_routine_step() {
        let mut m = machine();
        let mut c = Counters::default();
        StateMachine::set_state(&mut m, &mut c, B);
        StateMachine::update(&mut m, &mut c, 0.1);
        assert_eq!(c.trace, vec!["enter B", "routine B 1", "routine B 2"]);
        assert!(!m.fsm.routine().is_running());

        StateMachine::set_state(&mut m, &mut c, A);
        StateMachine::update(&mut m, &mut c, 0.25);
        assert_eq!(c.trace.last().map(String::as_str), Some("update A"));
        assert!((m.fsm.state_time() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_transition_clears_routine() {
        let mut m = machine();
        let mut c = Counters::default();
        StateMachine::set_state(&mut m, &mut c, B);
        assert!(m.fsm.routine().is_running());
        StateMachine::set_state(&mut m, &mut c, A);
        assert!(!m.fsm.routine().is_running());
    }

    #[test]
    fn test_events_dispatch_per_state() {
        let mut m = machine();
        let mut c = Counters::default();
        StateMachine::call_event(&mut m, &mut c, PING);
        StateMachine::set_state(&mut m, &mut c, B);
        StateMachine::call_event(&mut m, &mut c, PING);
        assert_eq!(c.pings, 0);
        StateMachine::set_state(&mut m, &mut c, A);
        StateMachine::call_event(&mut m, &mut c, PING);
        StateMachine::call_event(&mut m, &mut c, EventId(99));
        assert_eq!(c.pings, 1);
    }

    #[test]
    fn test_open_id_space_and_hook() {
        let mut m = machine();
        let mut c = Counters::default();
        m.fsm.init_state(EXTRA, StateCallbacks::default().on_enter(enter_a));
        m.fsm.set_transition_hook(hook);
        assert_eq!(m.fsm.state_count(), 41);
        assert!(m.fsm.has_state(EXTRA));
        assert!(!m.fsm.has_state(StateId(20)));

        StateMachine::set_state(&mut m, &mut c, EXTRA);
        assert_eq!(c.trace, vec!["enter A".to_string(), "hook None -> StateId(40)".to_string()]);
    }

    #[test]
    fn test_out_of_range_ids_are_rejected() {
        let mut m = machine();
        let before = m.fsm.state_count();
        assert!(!m.fsm.init_state(StateId(u32::MAX), StateCallbacks::default()));
        assert!(!m.fsm.init_state(StateId(MAX_STATE_ID), StateCallbacks::default()));
        assert!(!m.fsm.init_state_event(A, EventId(u32::MAX), ping));
        assert!(!m.fsm.init_state_event(StateId(u32::MAX), PING, ping));
        assert_eq!(m.fsm.state_count(), before);

        assert!(m.fsm.init_state(StateId(MAX_STATE_ID - 1), StateCallbacks::default()));
        assert_eq!(m.fsm.state_count(), MAX_STATE_ID as usize);
    }

    #[test]
    fn test_reentering_same_state() {
        let mut m = machine();
        let mut c = Counters::default();
        StateMachine::set_state(&mut m, &mut c, A);
        StateMachine::set_state(&mut m, &mut c, A);
        assert_eq!(c.trace, vec!["enter A", "exit A", "enter A"]);
    }
}
