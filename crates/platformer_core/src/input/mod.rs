//! Player input state
//!
//! The host writes device state into [`Controls`] before the player update
//! and calls [`Controls::end_frame`] after it. Buttons keep a short press
//! buffer so a press slightly before it becomes usable (a jump just before
//! landing) still counts, and presses can be consumed so one press triggers
//! one action.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::foundation::math::Vec2;

/// Input tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Seconds a press stays usable after it happened
    pub press_buffer: f32,
    /// Stick magnitude below which movement is ignored
    pub deadzone: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            press_buffer: 0.1,
            deadzone: 0.15,
        }
    }
}

impl Config for ControlsConfig {}

/// Digital button with buffered, consumable presses
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Button {
    down: bool,
    released: bool,
    buffer: f32,
    buffer_time: f32,
}

impl Button {
    /// Create a button with the given press buffer
    pub fn new(buffer_time: f32) -> Self {
        Self {
            buffer_time,
            ..Self::default()
        }
    }

    /// Feed the device state for this frame
    pub fn set(&mut self, down: bool) {
        if down {
            self.press();
        } else {
            self.release();
        }
    }

    /// Register a press; holding does not re-trigger
    pub fn press(&mut self) {
        if !self.down {
            self.down = true;
            self.buffer = self.buffer_time.max(f32::EPSILON);
        }
    }

    /// Register a release
    pub fn release(&mut self) {
        if self.down {
            self.down = false;
            self.released = true;
        }
    }

    /// Whether an unconsumed press is within its buffer window
    pub fn pressed(&self) -> bool {
        self.buffer > 0.0
    }

    /// Whether the button is held
    pub fn down(&self) -> bool {
        self.down
    }

    /// Whether the button was released this frame
    pub fn released(&self) -> bool {
        self.released
    }

    /// Use up the current press so it triggers nothing else
    pub fn consume_press(&mut self) {
        self.buffer = 0.0;
    }

    /// Age the press buffer by `delta` seconds and clear per-frame edges
    pub fn end_frame(&mut self, delta: f32) {
        self.released = false;
        if self.buffer > 0.0 {
            self.buffer -= delta;
        }
    }
}

/// All player inputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Controls {
    move_value: Vec2,
    /// Jump button
    pub jump: Button,
    /// Dash button (also used to talk to NPCs)
    pub dash: Button,
    /// Climb / grab button
    pub climb: Button,
    /// Toggles the free-fly debug mode
    pub debug_fly: Button,
    /// Pause button
    pub pause: Button,
    config: ControlsConfig,
}

impl Default for Controls {
    fn default() -> Self {
        Self::new(ControlsConfig::default())
    }
}

impl Controls {
    /// Create idle controls
    pub fn new(config: ControlsConfig) -> Self {
        let button = Button::new(config.press_buffer);
        Self {
            move_value: Vec2::zeros(),
            jump: button,
            dash: button,
            climb: button,
            debug_fly: button,
            pause: button,
            config,
        }
    }

    /// Set the movement stick; magnitude is clamped to one and the deadzone applied
    pub fn set_move(&mut self, value: Vec2) {
        let length = value.norm();
        self.move_value = if length <= self.config.deadzone {
            Vec2::zeros()
        } else if length > 1.0 {
            value / length
        } else {
            value
        };
    }

    /// Movement stick in screen space (+Y is forward)
    pub fn move_value(&self) -> Vec2 {
        self.move_value
    }

    /// Input configuration
    pub fn config(&self) -> &ControlsConfig {
        &self.config
    }

    /// Age every button by `delta` seconds
    pub fn end_frame(&mut self, delta: f32) {
        for button in [
            &mut self.jump,
            &mut self.dash,
            &mut self.climb,
            &mut self.debug_fly,
            &mut self.pause,
        ] {
            button.end_frame(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_is_buffered_then_expires() {
        let mut button = Button::new(0.1);
        button.press();
        assert!(button.pressed());
        button.end_frame(0.05);
        assert!(button.pressed());
        button.end_frame(0.06);
        assert!(!button.pressed());
        assert!(button.down());
    }

    #[test]
    fn test_consume_and_hold_does_not_retrigger() {
        let mut button = Button::new(0.1);
        button.set(true);
        button.consume_press();
        assert!(!button.pressed());
        button.set(true);
        assert!(!button.pressed());
        button.set(false);
        assert!(button.released());
        button.end_frame(0.016);
        assert!(!button.released());
        button.set(true);
        assert!(button.pressed());
    }

    #[test]
    fn test_zero_buffer_still_registers_for_one_frame() {
        let mut button = Button::new(0.0);
        button.press();
        assert!(button.pressed());
        button.end_frame(0.016);
        assert!(!button.pressed());
    }

    #[test]
    fn test_move_deadzone_and_clamp() {
        let mut controls = Controls::default();
        controls.set_move(Vec2::new(0.1, 0.0));
        assert_eq!(controls.move_value(), Vec2::zeros());
        controls.set_move(Vec2::new(3.0, 4.0));
        assert!((controls.move_value().norm() - 1.0).abs() < 1e-6);
    }
}
