//! Ray casts and cylindrical wall probes against the collision world
//!
//! Both queries follow the same shape: a loose box around the probe goes to
//! the grid for candidates, candidates that are not collidable (or are being
//! destroyed) are skipped, and the exact test runs over each face's triangle
//! fan.

use arrayvec::ArrayVec;

use super::collision::primitives::{closest_point_on_segment_2d, Ray};
use super::collision::SolidId;
use super::collision_world::CollisionWorld;
use crate::foundation::math::utils::{safe_normalize2, with_z, xy};
use crate::foundation::math::Vec3;
use crate::spatial::BoundingBox;

/// Most wall contacts a single probe reports
pub const MAX_WALL_HITS: usize = 8;

/// Faces whose normal Z exceeds this are floors or ceilings, not walls
const MAX_WALL_NORMAL_Z: f32 = 0.999;

/// Filters for [`CollisionWorld::ray_cast`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RayOptions {
    /// Skip faces facing away from the ray
    pub ignore_backfaces: bool,
    /// Skip solids flagged transparent
    pub ignore_transparent: bool,
}

impl Default for RayOptions {
    fn default() -> Self {
        Self {
            ignore_backfaces: true,
            ignore_transparent: false,
        }
    }
}

/// Closest ray intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space hit point
    pub point: Vec3,
    /// Normal of the face that was hit
    pub normal: Vec3,
    /// Distance from the ray origin
    pub distance: f32,
    /// Solid owning the face
    pub solid: SolidId,
    /// Faces crossed within range, including the closest one
    pub intersections: u32,
}

impl RayHit {
    /// Odd intersection parity: the ray started inside closed geometry
    ///
    /// Only meaningful when back faces were included in the cast.
    pub fn started_inside(&self) -> bool {
        self.intersections % 2 == 1
    }
}

/// One wall touched by a probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallHit {
    /// Horizontal correction that moves the probe out of the wall
    pub pushout: Vec3,
    /// Closest point on the wall at probe height
    pub point: Vec3,
    /// Wall face normal
    pub normal: Vec3,
    /// Solid owning the wall
    pub solid: SolidId,
}

/// Up to [`MAX_WALL_HITS`] wall contacts
pub type WallHits = ArrayVec<WallHit, MAX_WALL_HITS>;

impl CollisionWorld {
    /// Cast a ray of `max_distance` along `direction` and return the closest hit
    pub fn ray_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        options: RayOptions,
    ) -> Option<RayHit> {
        let Some(ray) = Ray::new(origin, direction) else {
            log::warn!("Ray cast from {origin:?} has a zero-length direction");
            return None;
        };
        if max_distance <= 0.0 {
            return None;
        }

        let reach = BoundingBox::new(origin, ray.point_at(max_distance)).inflate(1.0);
        let mut closest: Option<RayHit> = None;
        let mut intersections = 0;

        for id in self.candidates(&reach) {
            let Some(solid) = self.solid(id) else {
                continue;
            };
            if !solid.is_queryable(options.ignore_transparent) || !solid.bounds().intersects(&reach) {
                continue;
            }

            let vertices = solid.vertices();
            for face in solid.faces() {
                let normal = face.plane.normal;
                if options.ignore_backfaces && normal.dot(&ray.direction) >= 0.0 {
                    continue;
                }
                if face.plane.ray_distance(&ray).is_some_and(|t| t > max_distance) {
                    continue;
                }

                // Fan triangles share edges; one hit per face
                let hit = face
                    .triangles(vertices)
                    .find_map(|triangle| triangle.intersect_ray(&ray))
                    .filter(|distance| *distance <= max_distance);
                let Some(distance) = hit else {
                    continue;
                };

                intersections += 1;
                if closest.map_or(true, |best| distance < best.distance) {
                    closest = Some(RayHit {
                        point: ray.point_at(distance),
                        normal,
                        distance,
                        solid: id,
                        intersections: 0,
                    });
                }
            }
        }

        closest.map(|hit| RayHit { intersections, ..hit })
    }

    /// Probe a horizontal circle of `radius` around `point` for walls
    pub fn wall_check(&self, point: Vec3, radius: f32) -> WallHits {
        let mut hits = WallHits::new();
        if radius <= 0.0 {
            return hits;
        }

        let reach = BoundingBox::new(
            point - Vec3::new(radius, radius, 0.0),
            point + Vec3::new(radius, radius, 0.0),
        );
        let center = xy(point);

        for id in self.candidates(&reach) {
            let Some(solid) = self.solid(id) else {
                continue;
            };
            if !solid.is_queryable(false) || !solid.bounds().inflate(0.01).intersects(&reach) {
                continue;
            }

            let vertices = solid.vertices();
            for face in solid.faces() {
                let plane = face.plane;
                if plane.normal.z.abs() >= MAX_WALL_NORMAL_Z {
                    continue;
                }
                let distance_from_plane = plane.signed_distance(point);
                if !(0.0..=radius).contains(&distance_from_plane) {
                    continue;
                }

                let mut best: Option<WallHit> = None;
                for triangle in face.triangles(vertices) {
                    let Some((a, b)) = triangle.slice_horizontal(point.z) else {
                        continue;
                    };
                    let closest = closest_point_on_segment_2d(xy(a), xy(b), center);
                    let offset = center - closest;
                    let distance = offset.norm();
                    if distance > radius {
                        continue;
                    }

                    let direction = if distance > f32::EPSILON {
                        offset / distance
                    } else {
                        safe_normalize2(xy(plane.normal))
                    };
                    let pushout = with_z(direction * (radius - distance), 0.0);
                    if best.map_or(true, |hit| pushout.norm_squared() > hit.pushout.norm_squared()) {
                        best = Some(WallHit {
                            pushout,
                            point: with_z(closest, point.z),
                            normal: plane.normal,
                            solid: id,
                        });
                    }
                }

                if let Some(hit) = best {
                    hits.push(hit);
                    if hits.is_full() {
                        return hits;
                    }
                }
            }
        }

        hits
    }

    /// Deepest wall contact around `point`
    pub fn nearest_wall(&self, point: Vec3, radius: f32) -> Option<WallHit> {
        self.wall_check(point, radius)
            .into_iter()
            .max_by(|a, b| a.pushout.norm_squared().total_cmp(&b.pushout.norm_squared()))
    }

    /// Wall contact whose normal best matches `preferred`
    pub fn wall_closest_to_normal(&self, point: Vec3, radius: f32, preferred: Vec3) -> Option<WallHit> {
        self.wall_check(point, radius)
            .into_iter()
            .max_by(|a, b| a.normal.dot(&preferred).total_cmp(&b.normal.dot(&preferred)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::{Solid, SolidFlags, SolidShape};
    use approx::assert_relative_eq;

    fn floor_quad(z: f32) -> Solid {
        let quad = [
            Vec3::new(-5.0, -5.0, z),
            Vec3::new(5.0, -5.0, z),
            Vec3::new(5.0, 5.0, z),
            Vec3::new(-5.0, 5.0, z),
        ];
        Solid::new(SolidShape::from_polygons(&[quad]).unwrap())
    }

    fn block(min: Vec3, max: Vec3) -> Solid {
        Solid::new(SolidShape::cuboid(min, max).unwrap())
    }

    #[test]
    fn test_ray_hits_floor_quad() {
        let mut world = CollisionWorld::default();
        let floor = world.add_solid(floor_quad(0.0));

        let hit = world
            .ray_cast(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0), 20.0, RayOptions::default())
            .unwrap();
        assert_relative_eq!(hit.point, Vec3::zeros(), epsilon = 1e-5);
        assert_relative_eq!(hit.normal, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-5);
        assert_relative_eq!(hit.distance, 10.0, epsilon = 1e-5);
        assert_eq!(hit.solid, floor);
        assert_eq!(hit.intersections, 1);
    }

    #[test]
    fn test_ray_closest_hit_wins() {
        let mut world = CollisionWorld::default();
        let _low = world.add_solid(floor_quad(0.0));
        let high = world.add_solid(floor_quad(4.0));

        let hit = world
            .ray_cast(Vec3::new(1.0, 1.0, 10.0), Vec3::new(0.0, 0.0, -1.0), 20.0, RayOptions::default())
            .unwrap();
        assert_eq!(hit.solid, high);
        assert_relative_eq!(hit.distance, 6.0, epsilon = 1e-5);
        assert_eq!(hit.intersections, 2);
    }

    #[test]
    fn test_ray_respects_range_and_backfaces() {
        let mut world = CollisionWorld::default();
        world.add_solid(floor_quad(0.0));

        let origin = Vec3::new(0.0, 0.0, 10.0);
        assert!(world.ray_cast(origin, Vec3::new(0.0, 0.0, -1.0), 5.0, RayOptions::default()).is_none());

        let below = Vec3::new(0.0, 0.0, -3.0);
        let up = Vec3::new(0.0, 0.0, 1.0);
        assert!(world.ray_cast(below, up, 5.0, RayOptions::default()).is_none());
        let options = RayOptions {
            ignore_backfaces: false,
            ..RayOptions::default()
        };
        assert!(world.ray_cast(below, up, 5.0, options).is_some());
    }

    #[test]
    fn test_ray_skips_transparent_when_asked() {
        let mut world = CollisionWorld::default();
        world.add_solid(floor_quad(0.0).with_flags(SolidFlags::COLLIDABLE | SolidFlags::TRANSPARENT));
        let origin = Vec3::new(0.0, 0.0, 10.0);
        let down = Vec3::new(0.0, 0.0, -1.0);

        assert!(world.ray_cast(origin, down, 20.0, RayOptions::default()).is_some());
        let options = RayOptions {
            ignore_transparent: true,
            ..RayOptions::default()
        };
        assert!(world.ray_cast(origin, down, 20.0, options).is_none());
    }

    #[test]
    fn test_ray_parity_detects_start_inside() {
        let mut world = CollisionWorld::default();
        world.add_solid(block(Vec3::repeat(-2.0), Vec3::repeat(2.0)));
        let options = RayOptions {
            ignore_backfaces: false,
            ignore_transparent: false,
        };

        let inside = world.ray_cast(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), 10.0, options).unwrap();
        assert!(inside.started_inside());

        let outside = world
            .ray_cast(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 20.0, options)
            .unwrap();
        assert!(!outside.started_inside());
        assert_relative_eq!(outside.distance, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_direction_and_empty_world() {
        let mut world = CollisionWorld::default();
        assert!(world.ray_cast(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0), 10.0, RayOptions::default()).is_none());
        world.add_solid(Solid::new(SolidShape::empty()));
        world.add_solid(floor_quad(0.0));
        assert!(world.ray_cast(Vec3::new(0.0, 0.0, 5.0), Vec3::zeros(), 10.0, RayOptions::default()).is_none());
    }

    #[test]
    fn test_wall_check_pushout() {
        let mut world = CollisionWorld::default();
        // Wall face at x = 2 facing -X
        let wall = world.add_solid(block(Vec3::new(2.0, -10.0, 0.0), Vec3::new(4.0, 10.0, 20.0)));

        let hits = world.wall_check(Vec3::new(0.0, 0.0, 5.0), 3.0);
        assert_eq!(hits.len(), 1);
        let hit = hits[0];
        assert_eq!(hit.solid, wall);
        assert_relative_eq!(hit.pushout, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(hit.normal, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(hit.point, Vec3::new(2.0, 0.0, 5.0), epsilon = 1e-5);

        assert!(world.wall_check(Vec3::new(-2.0, 0.0, 5.0), 3.0).is_empty());
        assert!(world.wall_check(Vec3::new(0.0, 0.0, 25.0), 3.0).is_empty());
    }

    #[test]
    fn test_nearest_and_closest_to_normal() {
        let mut world = CollisionWorld::default();
        let east = world.add_solid(block(Vec3::new(1.0, -10.0, 0.0), Vec3::new(3.0, 10.0, 20.0)));
        let north = world.add_solid(block(Vec3::new(-10.0, 2.5, 0.0), Vec3::new(10.0, 4.0, 20.0)));
        let point = Vec3::new(0.0, 0.0, 5.0);

        assert_eq!(world.wall_check(point, 3.0).len(), 2);
        assert_eq!(world.nearest_wall(point, 3.0).unwrap().solid, east);
        let facing_south = world.wall_closest_to_normal(point, 3.0, Vec3::new(0.0, -1.0, 0.0)).unwrap();
        assert_eq!(facing_south.solid, north);
    }

    #[test]
    fn test_wall_check_caps_results() {
        let mut world = CollisionWorld::default();
        for _ in 0..10 {
            world.add_solid(block(Vec3::new(1.0, -5.0, 0.0), Vec3::new(2.0, 5.0, 10.0)));
        }
        assert_eq!(world.wall_check(Vec3::new(0.0, 0.0, 5.0), 3.0).len(), MAX_WALL_HITS);
    }

    #[test]
    fn test_floors_are_not_walls() {
        let mut world = CollisionWorld::default();
        world.add_solid(floor_quad(0.0));
        assert!(world.wall_check(Vec3::new(0.0, 0.0, 0.5), 3.0).is_empty());
    }
}
