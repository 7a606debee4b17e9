//! Collidable solids
//!
//! A solid owns a model-space [`SolidShape`] plus a world-space copy of its
//! vertices, faces and bounds. The copy is rebuilt exactly when the transform
//! changes, through [`Solid::set_transform`]; the collision world pairs that
//! with re-indexing the solid in the broad-phase grid.

use bitflags::bitflags;
use slotmap::new_key_type;

use super::primitives::{Face, Plane};
use super::shape::SolidShape;
use crate::foundation::math::{Transform, Vec3};
use crate::spatial::BoundingBox;

new_key_type! {
    /// Handle to a solid inside a collision world
    pub struct SolidId;
}

bitflags! {
    /// Collision behavior of a solid
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SolidFlags: u32 {
        /// Takes part in ray casts and wall probes
        const COLLIDABLE = 1 << 0;
        /// Skipped by queries that ask to ignore transparent geometry
        const TRANSPARENT = 1 << 1;
        /// Being torn down, skipped by every query
        const DESTROYING = 1 << 2;
        /// Walls of this solid can be climbed
        const CLIMBABLE = 1 << 3;
    }
}

bitflags! {
    /// Optional gameplay roles a solid can play
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        /// Reacts when the player dashes into it
        const DASH_TRIGGER = 1 << 0;
        /// Kills the player on contact
        const SPIKES = 1 << 1;
        /// Carries the player standing on it
        const RIDEABLE = 1 << 2;
    }
}

impl Default for SolidFlags {
    fn default() -> Self {
        Self::COLLIDABLE | Self::CLIMBABLE
    }
}

/// What a dash trigger asks of the player after being hit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashResponse {
    /// Reflect the player off the impact
    pub bounce: bool,
    /// Queue the solid for removal
    pub destroy: bool,
}

/// Behavior of solids that react to being dashed into (breakable blocks, switches)
pub trait DashTrigger {
    /// Called once when a dashing player hits the solid with `velocity`
    fn handle_dash(&mut self, velocity: Vec3) -> DashResponse;
}

impl<F> DashTrigger for F
where
    F: FnMut(Vec3) -> DashResponse,
{
    fn handle_dash(&mut self, velocity: Vec3) -> DashResponse {
        self(velocity)
    }
}

/// A collidable object with cached world-space geometry
pub struct Solid {
    shape: SolidShape,
    transform: Transform,
    world_vertices: Vec<Vec3>,
    world_faces: Vec<Face>,
    world_bounds: BoundingBox,
    /// Collision behavior
    pub flags: SolidFlags,
    /// Gameplay roles
    pub capabilities: Capabilities,
    /// Solids carried along when this one moves
    pub(crate) attachers: Vec<SolidId>,
    pub(crate) parent: Option<SolidId>,
    pub(crate) dash_trigger: Option<Box<dyn DashTrigger>>,
    /// Displacement per second from the last move, used by riders
    pub(crate) velocity: Vec3,
}

impl std::fmt::Debug for Solid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solid")
            .field("transform", &self.transform)
            .field("world_bounds", &self.world_bounds)
            .field("flags", &self.flags)
            .field("capabilities", &self.capabilities)
            .field("faces", &self.world_faces.len())
            .field("attachers", &self.attachers)
            .finish_non_exhaustive()
    }
}

impl Solid {
    /// Create a solid at the origin
    pub fn new(shape: SolidShape) -> Self {
        let mut solid = Self {
            shape,
            transform: Transform::default(),
            world_vertices: Vec::new(),
            world_faces: Vec::new(),
            world_bounds: BoundingBox::default(),
            flags: SolidFlags::default(),
            capabilities: Capabilities::empty(),
            attachers: Vec::new(),
            parent: None,
            dash_trigger: None,
            velocity: Vec3::zeros(),
        };
        solid.rebuild_world_geometry();
        solid
    }

    /// Builder: place the solid
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.set_transform(transform);
        self
    }

    /// Builder: replace collision flags
    #[must_use]
    pub fn with_flags(mut self, flags: SolidFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Builder: add gameplay roles
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities |= capabilities;
        self
    }

    /// Builder: attach a dash handler, also granting [`Capabilities::DASH_TRIGGER`]
    #[must_use]
    pub fn with_dash_trigger(mut self, trigger: impl DashTrigger + 'static) -> Self {
        self.dash_trigger = Some(Box::new(trigger));
        self.capabilities |= Capabilities::DASH_TRIGGER;
        self
    }

    /// Current transform
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Replace the transform and rebuild the world-space caches
    ///
    /// Returns the world bounds from before the change so the owning world
    /// can re-index the solid.
    pub(crate) fn set_transform(&mut self, transform: Transform) -> BoundingBox {
        let previous = self.world_bounds;
        self.transform = transform;
        self.rebuild_world_geometry();
        previous
    }

    /// Model-space shape
    pub fn shape(&self) -> &SolidShape {
        &self.shape
    }

    /// World-space vertex array
    pub fn vertices(&self) -> &[Vec3] {
        &self.world_vertices
    }

    /// World-space faces
    pub fn faces(&self) -> &[Face] {
        &self.world_faces
    }

    /// World-space bounds
    pub fn bounds(&self) -> BoundingBox {
        self.world_bounds
    }

    /// Solids attached to this one
    pub fn attachers(&self) -> &[SolidId] {
        &self.attachers
    }

    /// Solid this one is attached to
    pub fn parent(&self) -> Option<SolidId> {
        self.parent
    }

    /// Velocity from the most recent move
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Whether queries consider this solid at all
    pub fn is_queryable(&self, ignore_transparent: bool) -> bool {
        self.flags.contains(SolidFlags::COLLIDABLE)
            && !self.flags.contains(SolidFlags::DESTROYING)
            && !(ignore_transparent && self.flags.contains(SolidFlags::TRANSPARENT))
    }

    /// Forward a dash impact to the handler, if any
    pub fn handle_dash(&mut self, velocity: Vec3) -> Option<DashResponse> {
        self.dash_trigger.as_mut().map(|trigger| trigger.handle_dash(velocity))
    }

    fn rebuild_world_geometry(&mut self) {
        let transform = self.transform;
        self.world_vertices.clear();
        self.world_vertices
            .extend(self.shape.vertices.iter().map(|v| transform.transform_point(*v)));

        self.world_faces.clear();
        for face in &self.shape.faces {
            let run = face.vertices(&self.world_vertices);
            let plane = Plane::from_polygon(run).unwrap_or_else(|| {
                // Collapsed by scale; keep the rotated normal so the face stays addressable
                let normal = transform.rotation * face.plane.normal;
                Plane::from_point_normal(run.first().copied().unwrap_or(transform.position), normal)
            });
            self.world_faces.push(Face { plane, ..*face });
        }

        self.world_bounds = if self.shape.vertices.is_empty() {
            BoundingBox::new(transform.position, transform.position)
        } else {
            self.shape.bounds.transformed(&transform)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_world_geometry_follows_transform() {
        let shape = SolidShape::cuboid(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 2.0)).unwrap();
        let mut solid = Solid::new(shape);
        let before = solid.bounds();

        let previous = solid.set_transform(Transform::from_position(Vec3::new(10.0, 0.0, 5.0)));
        assert_eq!(previous, before);
        assert_relative_eq!(solid.bounds().min, Vec3::new(9.0, -1.0, 5.0), epsilon = 1e-5);

        let top = solid.faces()[1].plane;
        assert_relative_eq!(top.normal, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-5);
        assert_relative_eq!(top.distance, 7.0, epsilon = 1e-5);
        assert_relative_eq!(solid.vertices()[0], Vec3::new(9.0, -1.0, 5.0), epsilon = 1e-5);
    }

    #[test]
    fn test_queryable_flags() {
        let solid = Solid::new(SolidShape::empty()).with_flags(SolidFlags::COLLIDABLE | SolidFlags::TRANSPARENT);
        assert!(solid.is_queryable(false));
        assert!(!solid.is_queryable(true));

        let destroying = Solid::new(SolidShape::empty()).with_flags(SolidFlags::COLLIDABLE | SolidFlags::DESTROYING);
        assert!(!destroying.is_queryable(false));
    }

    #[test]
    fn test_dash_trigger_closure() {
        let mut hits = 0;
        let mut solid = Solid::new(SolidShape::empty()).with_dash_trigger(move |_velocity: Vec3| {
            hits += 1;
            DashResponse {
                bounce: hits == 1,
                destroy: false,
            }
        });
        assert!(solid.capabilities.contains(Capabilities::DASH_TRIGGER));
        assert_eq!(solid.handle_dash(Vec3::x()).map(|r| r.bounce), Some(true));
        assert_eq!(solid.handle_dash(Vec3::x()).map(|r| r.bounce), Some(false));
    }
}
