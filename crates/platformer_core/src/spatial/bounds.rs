//! Axis-aligned bounding boxes

use crate::foundation::math::{Transform, Vec3};

/// Axis-aligned bounding box in world or local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: Vec3::zeros(),
            max: Vec3::zeros(),
        }
    }
}

impl BoundingBox {
    /// Create a box from two corners, reordering components as needed
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Smallest box containing every point, or `None` for an empty set
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for point in iter {
            bounds.min = bounds.min.inf(point);
            bounds.max = bounds.max.sup(point);
        }
        Some(bounds)
    }

    /// Box centered on `center` extending `half` in each direction
    pub fn from_center(center: Vec3, half: Vec3) -> Self {
        Self::new(center - half, center + half)
    }

    /// Box grown by `amount` on every side
    #[must_use]
    pub fn inflate(&self, amount: f32) -> Self {
        let grow = Vec3::repeat(amount);
        Self {
            min: self.min - grow,
            max: self.max + grow,
        }
    }

    /// Box moved by `offset`
    #[must_use]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Smallest box containing both boxes
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// World-space bounds of this local box under `transform`
    #[must_use]
    pub fn transformed(&self, transform: &Transform) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ]
        .map(|corner| transform.transform_point(corner));
        // Eight corners, never empty
        Self::from_points(corners.iter()).unwrap_or(*self)
    }

    /// Whether two boxes overlap (touching counts)
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Whether `point` lies inside the box (boundary inclusive)
    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Extent along each axis
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants, Quat};
    use approx::assert_relative_eq;

    #[test]
    fn test_new_orders_corners() {
        let b = BoundingBox::new(Vec3::new(1.0, -1.0, 5.0), Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(b.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 5.0));
    }

    #[test]
    fn test_intersects_and_contains() {
        let a = BoundingBox::new(Vec3::zeros(), Vec3::repeat(2.0));
        let b = BoundingBox::new(Vec3::repeat(2.0), Vec3::repeat(3.0));
        let c = BoundingBox::new(Vec3::repeat(2.5), Vec3::repeat(3.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains(Vec3::new(1.0, 1.0, 1.0)));
        assert!(!a.contains(Vec3::new(1.0, 1.0, 2.5)));
    }

    #[test]
    fn test_transformed_rotates_extents() {
        let local = BoundingBox::new(Vec3::new(0.0, -1.0, 0.0), Vec3::new(4.0, 1.0, 1.0));
        let transform = Transform {
            position: Vec3::new(10.0, 0.0, 0.0),
            rotation: Quat::from_axis_angle(&Vec3::z_axis(), constants::HALF_PI),
            scale: Vec3::repeat(1.0),
        };
        let world = local.transformed(&transform);
        assert_relative_eq!(world.min, Vec3::new(9.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(world.max, Vec3::new(11.0, 4.0, 1.0), epsilon = 1e-5);
    }
}
