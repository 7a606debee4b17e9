//! Math utilities and types
//!
//! Provides the vector aliases used across the crate plus the scalar and
//! vector helpers the movement code leans on (approach, rotate toward,
//! easing). The world is Z-up: X/Y span the ground plane.

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform rotated around the Z axis
    pub fn from_position_yaw(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_axis_angle(&Vec3::z_axis(), yaw),
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * self.scale.component_mul(&point)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;
}

/// Math utility functions
pub mod utils {
    use super::{Vec2, Vec3};

    /// Move `value` toward `target` by at most `max_delta`
    pub fn approach(value: f32, target: f32, max_delta: f32) -> f32 {
        if value < target {
            (value + max_delta).min(target)
        } else {
            (value - max_delta).max(target)
        }
    }

    /// Move a 2D vector toward `target` by at most `max_delta` in length
    pub fn approach_vec2(value: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
        let diff = target - value;
        let distance = diff.norm();
        if distance <= max_delta || distance <= f32::EPSILON {
            target
        } else {
            value + diff / distance * max_delta
        }
    }

    /// Move a 3D vector toward `target` by at most `max_delta` in length
    pub fn approach_vec3(value: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
        let diff = target - value;
        let distance = diff.norm();
        if distance <= max_delta || distance <= f32::EPSILON {
            target
        } else {
            value + diff / distance * max_delta
        }
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Map `value` from `[min, max]` onto `[new_min, new_max]`, clamping the input range
    pub fn clamped_map(value: f32, min: f32, max: f32, new_min: f32, new_max: f32) -> f32 {
        if (max - min).abs() <= f32::EPSILON {
            return new_min;
        }
        let t = ((value - min) / (max - min)).clamp(0.0, 1.0);
        lerp(new_min, new_max, t)
    }

    /// Unit vector for an angle (radians) in the XY plane
    pub fn angle_to_vector(angle: f32) -> Vec2 {
        Vec2::new(angle.cos(), angle.sin())
    }

    /// Angle (radians) of a vector in the XY plane
    pub fn vector_to_angle(v: Vec2) -> f32 {
        v.y.atan2(v.x)
    }

    /// Shortest signed difference between two angles, in `(-PI, PI]`
    pub fn angle_diff(from: f32, to: f32) -> f32 {
        let tau = super::constants::TAU;
        let mut diff = (to - from) % tau;
        if diff > super::constants::PI {
            diff -= tau;
        } else if diff <= -super::constants::PI {
            diff += tau;
        }
        diff
    }

    /// Rotate `from` toward `to`, turning at most `max_angle` radians and
    /// changing length by at most `max_mag_delta`
    pub fn rotate_toward(from: Vec2, to: Vec2, max_angle: f32, max_mag_delta: f32) -> Vec2 {
        let from_len = from.norm();
        let to_len = to.norm();
        if to_len <= f32::EPSILON {
            return from;
        }
        if from_len <= f32::EPSILON {
            return to.normalize() * approach(0.0, to_len, max_mag_delta.max(0.0));
        }

        let from_angle = vector_to_angle(from);
        let diff = angle_diff(from_angle, vector_to_angle(to));
        let angle = from_angle + diff.clamp(-max_angle, max_angle);
        let length = if max_mag_delta > 0.0 {
            approach(from_len, to_len, max_mag_delta)
        } else {
            from_len
        };
        angle_to_vector(angle) * length
    }

    /// Quadratic bezier through `a`, control point `b`, ending at `c`
    pub fn bezier(a: Vec3, b: Vec3, c: Vec3, t: f32) -> Vec3 {
        let ab = a.lerp(&b, t);
        let bc = b.lerp(&c, t);
        ab.lerp(&bc, t)
    }

    /// XY components of a vector
    pub fn xy(v: Vec3) -> Vec2 {
        Vec2::new(v.x, v.y)
    }

    /// Extend a 2D vector with a Z component
    pub fn with_z(v: Vec2, z: f32) -> Vec3 {
        Vec3::new(v.x, v.y, z)
    }

    /// Normalized vector, or zero for a (near) zero input
    pub fn safe_normalize2(v: Vec2) -> Vec2 {
        let len = v.norm();
        if len <= f32::EPSILON {
            Vec2::zeros()
        } else {
            v / len
        }
    }

    /// Normalized vector, or zero for a (near) zero input
    pub fn safe_normalize3(v: Vec3) -> Vec3 {
        let len = v.norm();
        if len <= f32::EPSILON {
            Vec3::zeros()
        } else {
            v / len
        }
    }
}

/// Easing curves over `t` in `[0, 1]`
pub mod ease {
    use super::constants::PI;

    /// Sine ease in/out
    pub fn sine_in_out(t: f32) -> f32 {
        -((PI * t).cos() - 1.0) / 2.0
    }

    /// Cubic ease out
    pub fn cube_out(t: f32) -> f32 {
        let inv = 1.0 - t;
        1.0 - inv * inv * inv
    }

    /// Cubic ease in/out
    pub fn cube_in_out(t: f32) -> f32 {
        if t < 0.5 {
            4.0 * t * t * t
        } else {
            let f = -2.0 * t + 2.0;
            1.0 - f * f * f / 2.0
        }
    }
}
