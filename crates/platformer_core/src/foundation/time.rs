//! Simulation time
//!
//! The core is frame-stepped: every update receives a delta in seconds and
//! the stage keeps a [`Time`] that accumulates it. Wall-clock measurement is
//! only needed by hosts that drive the loop, see [`Stopwatch`].

use std::time::{Duration, Instant};

/// Simulated clock advanced once per frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Time {
    delta: f32,
    previous_total: f32,
    total: f32,
    frame_count: u64,
}

impl Time {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one frame of `delta` seconds
    pub fn advance(&mut self, delta: f32) {
        self.delta = delta.max(0.0);
        self.previous_total = self.total;
        self.total += self.delta;
        self.frame_count += 1;
    }

    /// Seconds covered by the current frame
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Total simulated seconds
    pub fn total(&self) -> f32 {
        self.total
    }

    /// Number of frames advanced so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// True on the frame where the total time crossed a multiple of `interval`
    pub fn on_interval(&self, interval: f32) -> bool {
        if interval <= 0.0 {
            return false;
        }
        (self.previous_total / interval).floor() != (self.total / interval).floor()
    }
}

/// Simple stopwatch for measuring elapsed wall-clock time
#[derive(Debug, Default)]
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Stopwatch {
    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            elapsed: Duration::ZERO,
        }
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Elapsed time including a running segment
    pub fn elapsed(&self) -> Duration {
        self.elapsed + self.start_time.map_or(Duration::ZERO, |start| start.elapsed())
    }
}
