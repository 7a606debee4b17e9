//! Model-space collision shapes for solids
//!
//! A shape is a polygon soup of convex faces sharing one vertex array. It is
//! authored once (by a level loader or the builders below) and never
//! modified; solids transform it into world space whenever they move.

use super::primitives::{Face, Plane};
use super::WorldError;
use crate::foundation::math::Vec3;
use crate::spatial::BoundingBox;

/// Collision shape stored in MODEL SPACE
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolidShape {
    /// Shared vertex array, faces index into it
    pub vertices: Vec<Vec3>,
    /// Convex faces
    pub faces: Vec<Face>,
    /// Bounds of `vertices`
    pub bounds: BoundingBox,
}

impl SolidShape {
    /// Shape with no faces; contributes nothing to queries
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a shape from convex polygons, each wound counter-clockwise seen from outside
    pub fn from_polygons<P: AsRef<[Vec3]>>(polygons: &[P]) -> Result<Self, WorldError> {
        let mut vertices = Vec::new();
        let mut faces = Vec::with_capacity(polygons.len());

        for (index, polygon) in polygons.iter().enumerate() {
            let polygon = polygon.as_ref();
            let plane = Plane::from_polygon(polygon).ok_or(WorldError::DegenerateFace { face: index })?;
            faces.push(Face {
                plane,
                vertex_start: vertices.len(),
                vertex_count: polygon.len(),
            });
            vertices.extend_from_slice(polygon);
        }

        let bounds = BoundingBox::from_points(vertices.iter()).unwrap_or_default();
        Ok(Self {
            vertices,
            faces,
            bounds,
        })
    }

    /// Axis-aligned box between two corners with outward-facing faces
    pub fn cuboid(a: Vec3, b: Vec3) -> Result<Self, WorldError> {
        let min = a.inf(&b);
        let max = a.sup(&b);
        let corner = |x: bool, y: bool, z: bool| {
            Vec3::new(
                if x { max.x } else { min.x },
                if y { max.y } else { min.y },
                if z { max.z } else { min.z },
            )
        };

        let polygons = [
            // -Z, +Z
            [corner(false, false, false), corner(false, true, false), corner(true, true, false), corner(true, false, false)],
            [corner(false, false, true), corner(true, false, true), corner(true, true, true), corner(false, true, true)],
            // -X, +X
            [corner(false, false, false), corner(false, false, true), corner(false, true, true), corner(false, true, false)],
            [corner(true, false, false), corner(true, true, false), corner(true, true, true), corner(true, false, true)],
            // -Y, +Y
            [corner(false, false, false), corner(true, false, false), corner(true, false, true), corner(false, false, true)],
            [corner(false, true, false), corner(false, true, true), corner(true, true, true), corner(true, true, false)],
        ];
        Self::from_polygons(&polygons)
    }

    /// Number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}
