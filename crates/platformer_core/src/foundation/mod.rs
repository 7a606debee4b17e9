//! Foundation utilities: math, simulated time and logging

pub mod logging;
pub mod math;
pub mod time;

pub use math::{Mat4, Point3, Quat, Transform, Vec2, Vec3};
pub use time::{Stopwatch, Time};
