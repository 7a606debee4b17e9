//! Gameplay notifications
//!
//! The player publishes what happened during a frame (state changes, jumps,
//! landings, deaths, ...) as [`Event`]s. External observers such as audio
//! glue, telemetry or mod hooks register an [`EventHandler`] per event type.
//!
//! - Key-value arguments (no order dependency)
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Only handlers registered for a type are notified
//! - Events queue up during the frame; the host calls [`EventSystem::dispatch`]

use std::collections::HashMap;

use crate::foundation::math::Vec3;

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// The player's state machine changed state
    StateChanged,
    /// The player jumped (any kind of jump)
    Jumped,
    /// The player touched ground after being airborne
    Landed,
    /// A dash started
    Dashed,
    /// The player died
    Died,
    /// The player respawned
    Respawned,
    /// The player interacted with an NPC or sign
    Interacted,
    /// A strawberry was collected
    StrawbCollected,
}

/// Typed event argument
#[derive(Debug, Clone, PartialEq)]
pub enum EventArg {
    /// Raw state id
    State(u32),
    /// World position
    Position(Vec3),
    /// Velocity
    Velocity(Vec3),
    /// Identifier of an interactable or pickup
    Id(u32),
    /// Free-form label
    Label(&'static str),
}

/// Event with type and key-value arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Type of event
    pub event_type: EventType,
    /// Simulation time the event was raised at (seconds)
    pub timestamp: f64,
    args: HashMap<&'static str, EventArg>,
}

impl Event {
    /// Create a new event with the given type and timestamp
    pub fn new(event_type: EventType, timestamp: f64) -> Self {
        Self {
            event_type,
            timestamp,
            args: HashMap::new(),
        }
    }

    /// Add an argument to the event (builder pattern)
    #[must_use]
    pub fn with_arg(mut self, key: &'static str, value: EventArg) -> Self {
        self.args.insert(key, value);
        self
    }

    /// Add an argument in place
    pub fn set_arg(&mut self, key: &'static str, value: EventArg) -> &mut Self {
        self.args.insert(key, value);
        self
    }

    /// Get an argument by key
    pub fn get_arg(&self, key: &str) -> Option<&EventArg> {
        self.args.get(key)
    }

    /// Get a state argument if present
    pub fn get_state(&self, key: &str) -> Option<u32> {
        match self.get_arg(key) {
            Some(EventArg::State(state)) => Some(*state),
            _ => None,
        }
    }

    /// Get the `position` argument if present
    pub fn get_position(&self) -> Option<Vec3> {
        match self.get_arg("position") {
            Some(EventArg::Position(position)) => Some(*position),
            _ => None,
        }
    }

    /// Get the `id` argument if present
    pub fn get_id(&self) -> Option<u32> {
        match self.get_arg("id") {
            Some(EventArg::Id(id)) => Some(*id),
            _ => None,
        }
    }
}

/// Event handler trait
/// Returns true if event was consumed (stops forwarding)
pub trait EventHandler {
    /// Handle an event, return true if consumed
    fn on_event(&mut self, event: &Event) -> bool;
}

impl<F: FnMut(&Event) -> bool> EventHandler for F {
    fn on_event(&mut self, event: &Event) -> bool {
        self(event)
    }
}

/// Event queue with per-type handler registration
#[derive(Default)]
pub struct EventSystem {
    queue: Vec<Event>,
    handlers: HashMap<EventType, Vec<Box<dyn EventHandler>>>,
    current_time: f64,
}

impl EventSystem {
    /// Create a new empty event system
    pub fn new() -> Self {
        Self::default()
    }

    /// Update current time (seconds since start)
    pub fn update_time(&mut self, time: f64) {
        self.current_time = time;
    }

    /// Current time used to stamp new events
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Register a handler for a specific event type
    pub fn register_handler(&mut self, event_type: EventType, handler: Box<dyn EventHandler>) {
        self.handlers.entry(event_type).or_default().push(handler);
    }

    /// Queue an event for this frame's dispatch
    pub fn send(&mut self, event: Event) {
        self.queue.push(event);
    }

    /// Queue an event of `event_type` stamped with the current time
    pub fn publish(&mut self, event_type: EventType) -> &mut Event {
        self.queue.push(Event::new(event_type, self.current_time));
        let last = self.queue.len() - 1;
        &mut self.queue[last]
    }

    /// Events waiting for dispatch
    pub fn pending(&self) -> &[Event] {
        &self.queue
    }

    /// Whether an event of `event_type` is waiting for dispatch
    pub fn has_pending(&self, event_type: EventType) -> bool {
        self.queue.iter().any(|event| event.event_type == event_type)
    }

    /// Deliver all queued events, in order
    pub fn dispatch(&mut self) {
        let queued = std::mem::take(&mut self.queue);
        for event in &queued {
            if let Some(handlers) = self.handlers.get_mut(&event.event_type) {
                for handler in handlers.iter_mut() {
                    if handler.on_event(event) {
                        break;
                    }
                }
            }
        }
    }

    /// Drop queued events without delivering them
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
