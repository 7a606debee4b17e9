//! Collision world: the arena of solids plus their broad-phase index
//!
//! Every transform change goes through this type so that the grid always
//! matches the solids' world bounds: the old bounds are removed and the new
//! ones inserted in the same call that rebuilds the geometry.

use slotmap::SlotMap;

use super::collision::{Capabilities, Solid, SolidFlags, SolidId, WorldError};
use crate::foundation::math::{Transform, Vec3};
use crate::spatial::{BoundingBox, Grid, GridConfig};

/// Owner of every solid in a level
pub struct CollisionWorld {
    solids: SlotMap<SolidId, Solid>,
    grid: Grid<SolidId>,
    destroy_queue: Vec<SolidId>,
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl CollisionWorld {
    /// Create an empty world
    pub fn new(grid_config: GridConfig) -> Self {
        Self {
            solids: SlotMap::with_key(),
            grid: Grid::new(grid_config),
            destroy_queue: Vec::new(),
        }
    }

    /// Add a solid and index it
    pub fn add_solid(&mut self, solid: Solid) -> SolidId {
        let bounds = solid.bounds();
        let id = self.solids.insert(solid);
        self.grid.insert(id, &bounds);
        log::trace!("Added solid {id:?} with bounds {bounds:?}");
        id
    }

    /// Remove a solid, detaching it from its parent and releasing its attachers
    pub fn remove_solid(&mut self, id: SolidId) -> Result<Solid, WorldError> {
        if !self.solids.contains_key(id) {
            return Err(WorldError::UnknownSolid(id));
        }
        self.detach(id)?;

        let mut solid = self.solids.remove(id).ok_or(WorldError::UnknownSolid(id))?;
        for child in solid.attachers.drain(..) {
            if let Some(child) = self.solids.get_mut(child) {
                child.parent = None;
            }
        }
        self.grid.remove(id, &solid.bounds());
        self.destroy_queue.retain(|queued| *queued != id);
        log::trace!("Removed solid {id:?}");
        Ok(solid)
    }

    /// Borrow a solid
    pub fn solid(&self, id: SolidId) -> Option<&Solid> {
        self.solids.get(id)
    }

    /// Mutably borrow a solid; geometry can only change through the world
    pub fn solid_mut(&mut self, id: SolidId) -> Option<&mut Solid> {
        self.solids.get_mut(id)
    }

    /// Iterate all solids
    pub fn solids(&self) -> impl Iterator<Item = (SolidId, &Solid)> {
        self.solids.iter()
    }

    /// Number of solids
    pub fn len(&self) -> usize {
        self.solids.len()
    }

    /// Whether the world has no solids
    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }

    /// Broad-phase index
    pub fn grid(&self) -> &Grid<SolidId> {
        &self.grid
    }

    /// Candidate solids whose grid cells overlap `bounds`
    pub fn candidates(&self, bounds: &BoundingBox) -> Vec<SolidId> {
        self.grid.query(bounds)
    }

    /// Replace a solid's transform; attachers follow its translation
    pub fn set_transform(&mut self, id: SolidId, transform: Transform) -> Result<(), WorldError> {
        let solid = self.solids.get(id).ok_or(WorldError::UnknownSolid(id))?;
        let delta = transform.position - solid.transform().position;
        self.apply_transform(id, transform);
        self.translate_attachers(id, delta);
        Ok(())
    }

    /// Move a solid and everything attached to it by `delta`
    pub fn translate(&mut self, id: SolidId, delta: Vec3) -> Result<(), WorldError> {
        let solid = self.solids.get(id).ok_or(WorldError::UnknownSolid(id))?;
        let mut transform = *solid.transform();
        transform.position += delta;
        self.apply_transform(id, transform);
        self.translate_attachers(id, delta);
        Ok(())
    }

    /// Move a solid over `delta_time` seconds, recording its velocity for riders
    pub fn move_by(&mut self, id: SolidId, delta: Vec3, delta_time: f32) -> Result<(), WorldError> {
        self.translate(id, delta)?;
        if let Some(solid) = self.solids.get_mut(id) {
            solid.velocity = if delta_time > 0.0 { delta / delta_time } else { Vec3::zeros() };
        }
        Ok(())
    }

    /// Rigidly attach `child` to `parent`
    ///
    /// # Panics
    ///
    /// Attaching a solid that already has a parent, or to itself, is a programming error.
    pub fn attach(&mut self, parent: SolidId, child: SolidId) -> Result<(), WorldError> {
        assert_ne!(parent, child, "a solid cannot be attached to itself");
        let child_solid = self.solids.get(child).ok_or(WorldError::UnknownSolid(child))?;
        assert!(
            child_solid.parent.is_none(),
            "solid {child:?} is already attached to {:?}",
            child_solid.parent
        );
        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            assert_ne!(current, child, "attaching {child:?} to {parent:?} would form a cycle");
            ancestor = self.solids.get(current).and_then(Solid::parent);
        }

        let parent_solid = self.solids.get_mut(parent).ok_or(WorldError::UnknownSolid(parent))?;
        parent_solid.attachers.push(child);
        if let Some(child_solid) = self.solids.get_mut(child) {
            child_solid.parent = Some(parent);
        }
        Ok(())
    }

    /// Release `child` from its parent, if it has one
    pub fn detach(&mut self, child: SolidId) -> Result<(), WorldError> {
        let child_solid = self.solids.get_mut(child).ok_or(WorldError::UnknownSolid(child))?;
        if let Some(parent) = child_solid.parent.take() {
            if let Some(parent_solid) = self.solids.get_mut(parent) {
                parent_solid.attachers.retain(|id| *id != child);
            }
        }
        Ok(())
    }

    /// Flag a solid as being destroyed; queries skip it until it is flushed
    pub fn mark_destroying(&mut self, id: SolidId) -> Result<(), WorldError> {
        let solid = self.solids.get_mut(id).ok_or(WorldError::UnknownSolid(id))?;
        if !solid.flags.contains(SolidFlags::DESTROYING) {
            solid.flags.insert(SolidFlags::DESTROYING);
            self.destroy_queue.push(id);
            log::debug!("Solid {id:?} marked for destruction");
        }
        Ok(())
    }

    /// Remove every solid marked for destruction, returning how many were removed
    pub fn flush_destroyed(&mut self) -> usize {
        let queue = std::mem::take(&mut self.destroy_queue);
        queue
            .into_iter()
            .filter(|id| self.remove_solid(*id).is_ok())
            .count()
    }

    /// First solid with `capability` whose bounds contain `point`
    ///
    /// Collidability is not required, so hazards can be non-solid volumes.
    pub fn overlaps(&self, point: Vec3, capability: Capabilities) -> Option<SolidId> {
        let probe = BoundingBox::new(point, point);
        self.grid.query(&probe).into_iter().find(|id| {
            self.solids.get(*id).is_some_and(|solid| {
                solid.capabilities.contains(capability)
                    && !solid.flags.contains(SolidFlags::DESTROYING)
                    && solid.bounds().contains(point)
            })
        })
    }

    fn apply_transform(&mut self, id: SolidId, transform: Transform) {
        let Some(solid) = self.solids.get_mut(id) else {
            return;
        };
        let previous = solid.set_transform(transform);
        let current = solid.bounds();
        self.grid.remove(id, &previous);
        self.grid.insert(id, &current);
    }

    fn translate_attachers(&mut self, id: SolidId, delta: Vec3) {
        if delta == Vec3::zeros() {
            return;
        }
        let mut pending: Vec<SolidId> = self
            .solids
            .get(id)
            .map(|solid| solid.attachers.clone())
            .unwrap_or_default();
        while let Some(child) = pending.pop() {
            let Some(solid) = self.solids.get(child) else {
                continue;
            };
            let mut transform = *solid.transform();
            transform.position += delta;
            pending.extend_from_slice(&solid.attachers);
            self.apply_transform(child, transform);
        }
    }
}
