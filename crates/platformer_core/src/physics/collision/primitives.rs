//! Geometric primitives for narrow-phase collision tests

use crate::foundation::math::{Vec2, Vec3};

/// Tolerance shared by the intersection routines
pub const EPSILON: f32 = 1e-6;

/// Ray for ray casting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin point
    pub origin: Vec3,
    /// Ray direction (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray, or `None` when `direction` has no length
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let length = direction.norm();
        if length <= EPSILON {
            return None;
        }
        Some(Self {
            origin,
            direction: direction / length,
        })
    }

    /// Get point along ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Infinite plane `normal . p = distance`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal
    pub normal: Vec3,
    /// Signed distance of the plane from the origin along `normal`
    pub distance: f32,
}

impl Plane {
    /// Plane through `point` with the given unit normal
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        Self {
            normal,
            distance: normal.dot(&point),
        }
    }

    /// Plane of a convex polygon using Newell's method, `None` for zero area
    ///
    /// Winding is counter-clockwise when viewed from the front.
    pub fn from_polygon(vertices: &[Vec3]) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }

        let mut normal = Vec3::zeros();
        let mut centroid = Vec3::zeros();
        for (i, current) in vertices.iter().enumerate() {
            let next = vertices[(i + 1) % vertices.len()];
            normal.x += (current.y - next.y) * (current.z + next.z);
            normal.y += (current.z - next.z) * (current.x + next.x);
            normal.z += (current.x - next.x) * (current.y + next.y);
            centroid += current;
        }

        let length = normal.norm();
        if length <= EPSILON {
            return None;
        }
        let normal = normal / length;
        let centroid = centroid / vertices.len() as f32;
        Some(Self::from_point_normal(centroid, normal))
    }

    /// Signed distance from `point` to the plane, positive on the front side
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) - self.distance
    }

    /// Distance along `ray` to the plane, negative when behind the origin
    pub fn ray_distance(&self, ray: &Ray) -> Option<f32> {
        let denom = self.normal.dot(&ray.direction);
        if denom.abs() <= EPSILON {
            return None;
        }
        Some((self.distance - self.normal.dot(&ray.origin)) / denom)
    }
}

/// One convex polygon of a solid's shape
///
/// The polygon's vertices are the run `vertex_start..vertex_start + vertex_count`
/// of the owning solid's vertex array, and are tested as a triangle fan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Supporting plane
    pub plane: Plane,
    /// First vertex of the polygon
    pub vertex_start: usize,
    /// Number of polygon vertices
    pub vertex_count: usize,
}

impl Face {
    /// Triangles of the fan `(v0, v[i], v[i + 1])` over `vertices`
    pub fn triangles<'a>(&self, vertices: &'a [Vec3]) -> impl Iterator<Item = Triangle> + 'a {
        let start = self.vertex_start;
        let end = (start + self.vertex_count).min(vertices.len());
        let run = vertices.get(start..end).unwrap_or(&[]);
        (1..run.len().saturating_sub(1)).map(move |i| Triangle::new(run[0], run[i], run[i + 1]))
    }

    /// Polygon vertices of this face
    pub fn vertices<'a>(&self, vertices: &'a [Vec3]) -> &'a [Vec3] {
        let end = (self.vertex_start + self.vertex_count).min(vertices.len());
        vertices.get(self.vertex_start..end).unwrap_or(&[])
    }
}

/// Triangle primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Create a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Ray-triangle intersection using the Möller–Trumbore algorithm
    ///
    /// Returns the distance along the ray; hits behind the origin are rejected.
    /// Both sides of the triangle are accepted, back-face culling is up to the caller.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(&edge2);
        let a = edge1.dot(&h);
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * ray.direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(&q);
        (t >= 0.0).then_some(t)
    }

    /// Segment where the horizontal plane `z = height` cuts this triangle
    ///
    /// A triangle touching the plane at a single vertex yields a zero-length
    /// segment. Triangles lying in the plane are reported as `None`.
    pub fn slice_horizontal(&self, height: f32) -> Option<(Vec3, Vec3)> {
        let corners = [self.v0, self.v1, self.v2];
        let mut points: [Vec3; 3] = [Vec3::zeros(); 3];
        let mut count = 0;

        let mut push = |point: Vec3, count: &mut usize| {
            if points[..*count].iter().any(|p| (p - point).norm_squared() <= EPSILON) {
                return;
            }
            if *count < points.len() {
                points[*count] = point;
                *count += 1;
            }
        };

        let on_plane = corners.iter().filter(|c| (c.z - height).abs() <= EPSILON).count();
        if on_plane == 3 {
            return None;
        }

        for i in 0..3 {
            let a = corners[i];
            let b = corners[(i + 1) % 3];
            let da = a.z - height;
            let db = b.z - height;
            if da.abs() <= EPSILON {
                push(a, &mut count);
            } else if da * db < 0.0 {
                let t = da / (da - db);
                push(a + (b - a) * t, &mut count);
            }
        }

        match count {
            0 => None,
            1 => Some((points[0], points[0])),
            _ => Some((points[0], points[1])),
        }
    }
}

/// Closest point on the XY segment `a..b` to `point`
pub fn closest_point_on_segment_2d(a: Vec2, b: Vec2, point: Vec2) -> Vec2 {
    let ab = b - a;
    let length_sq = ab.norm_squared();
    if length_sq <= EPSILON {
        return a;
    }
    let t = ((point - a).dot(&ab) / length_sq).clamp(0.0, 1.0);
    a + ab * t
}
