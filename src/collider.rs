//! Collision shapes and narrow-phase tests.
//!
//! [`Collider`] is a world-space shape used for intersection queries.
//! [`ColliderShape`] is the body-local description attached to a rigid body
//! and centred on its position; [`ColliderShape::at`] places it in the world.
//!
//! Touching shapes count as intersecting. [`Collider::contact`] reports a
//! contact exactly when [`Collider::intersects`] is true, with a penetration
//! of zero for touching shapes.

use crate::constants::NORMALIZE_EPSILON;
use crate::real::Real;
use crate::vector::Vector3;

/// Sphere in world space. A negative radius is clamped to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereCollider {
    center: Vector3,
    radius: Real,
}

impl SphereCollider {
    pub fn new(center: Vector3, radius: Real) -> Self {
        Self {
            center,
            radius: radius.max(Real::ZERO),
        }
    }

    pub fn center(&self) -> Vector3 {
        self.center
    }

    pub fn radius(&self) -> Real {
        self.radius
    }
}

/// Axis-aligned box in world space.
///
/// The constructor sorts the corners per axis, so `min <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AabbCollider {
    min: Vector3,
    max: Vector3,
}

impl AabbCollider {
    pub fn new(a: Vector3, b: Vector3) -> Self {
        Self {
            min: Vector3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Vector3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    pub fn from_center_half_extents(center: Vector3, half_extents: Vector3) -> Self {
        let half = half_extents.map(Real::abs);
        Self::new(center - half, center + half)
    }

    pub fn min(&self) -> Vector3 {
        self.min
    }

    pub fn max(&self) -> Vector3 {
        self.max
    }

    pub fn center(&self) -> Vector3 {
        (self.min + self.max) * Real::HALF
    }

    pub fn half_extents(&self) -> Vector3 {
        (self.max - self.min) * Real::HALF
    }

    /// Point of the box closest to `p` (`p` itself when inside).
    pub fn closest_point(&self, p: Vector3) -> Vector3 {
        Vector3::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
            p.z.clamp(self.min.z, self.max.z),
        )
    }

    pub fn contains_point(&self, p: Vector3) -> bool {
        self.closest_point(p) == p
    }
}

/// A world-space collision shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collider {
    Sphere(SphereCollider),
    Aabb(AabbCollider),
}

/// Geometry of a contact between two shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactGeometry {
    /// Unit normal pointing from the first shape toward the second.
    pub normal: Vector3,
    /// Overlap depth along the normal, zero when the shapes just touch.
    pub penetration: Real,
    /// World-space point where the impulse is applied.
    pub point: Vector3,
}

impl Collider {
    pub fn center(&self) -> Vector3 {
        match self {
            Collider::Sphere(s) => s.center(),
            Collider::Aabb(b) => b.center(),
        }
    }

    pub fn intersects(&self, other: &Collider) -> bool {
        match (self, other) {
            (Collider::Sphere(a), Collider::Sphere(b)) => {
                let radius_sum = a.radius + b.radius;
                (b.center - a.center).length_squared() <= radius_sum * radius_sum
            }
            (Collider::Aabb(a), Collider::Aabb(b)) => {
                (0..3).all(|axis| a.max[axis] >= b.min[axis] && a.min[axis] <= b.max[axis])
            }
            (Collider::Sphere(s), Collider::Aabb(b)) | (Collider::Aabb(b), Collider::Sphere(s)) => {
                let closest = b.closest_point(s.center);
                (s.center - closest).length_squared() <= s.radius * s.radius
            }
        }
    }

    /// Contact between `self` and `other`, `None` if they do not intersect.
    ///
    /// Coincident centres have no defined separation direction; the normal
    /// falls back to +Y instead of failing.
    pub fn contact(&self, other: &Collider) -> Option<ContactGeometry> {
        match (self, other) {
            (Collider::Sphere(a), Collider::Sphere(b)) => contact_sphere_sphere(a, b),
            (Collider::Aabb(a), Collider::Aabb(b)) => contact_aabb_aabb(a, b),
            (Collider::Sphere(s), Collider::Aabb(b)) => contact_sphere_aabb(s, b),
            (Collider::Aabb(b), Collider::Sphere(s)) => {
                contact_sphere_aabb(s, b).map(|c| ContactGeometry {
                    normal: -c.normal,
                    ..c
                })
            }
        }
    }
}

impl From<SphereCollider> for Collider {
    fn from(s: SphereCollider) -> Self {
        Collider::Sphere(s)
    }
}

impl From<AabbCollider> for Collider {
    fn from(b: AabbCollider) -> Self {
        Collider::Aabb(b)
    }
}

/// A collision shape in body-local space, centred on the body position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Sphere { radius: Real },
    Box { half_extents: Vector3 },
}

impl ColliderShape {
    /// World-space collider for a body at `position`.
    pub fn at(&self, position: Vector3) -> Collider {
        match *self {
            ColliderShape::Sphere { radius } => SphereCollider::new(position, radius).into(),
            ColliderShape::Box { half_extents } => {
                AabbCollider::from_center_half_extents(position, half_extents).into()
            }
        }
    }
}

fn contact_sphere_sphere(a: &SphereCollider, b: &SphereCollider) -> Option<ContactGeometry> {
    let diff = b.center - a.center;
    let dist_sq = diff.length_squared();
    let radius_sum = a.radius + b.radius;
    if dist_sq > radius_sum * radius_sum {
        return None;
    }

    let (normal, dist) = if dist_sq > NORMALIZE_EPSILON {
        let dist = dist_sq.sqrt();
        (diff / dist, dist)
    } else {
        (Vector3::Y, Real::ZERO)
    };
    let penetration = (radius_sum - dist).max(Real::ZERO);

    Some(ContactGeometry {
        normal,
        penetration,
        point: a.center + normal * (a.radius - penetration * Real::HALF),
    })
}

/// Separating-axis test; the normal is the axis of least overlap.
///
/// Overlap is measured on the corners themselves, so it is non-negative on
/// every axis exactly when [`Collider::intersects`] holds.
fn contact_aabb_aabb(a: &AabbCollider, b: &AabbCollider) -> Option<ContactGeometry> {
    let lo = Vector3::new(a.min.x.max(b.min.x), a.min.y.max(b.min.y), a.min.z.max(b.min.z));
    let hi = Vector3::new(a.max.x.min(b.max.x), a.max.y.min(b.max.y), a.max.z.min(b.max.z));

    let mut best_axis = 0;
    let mut best_overlap = Real::ZERO;
    for axis in 0..3 {
        let overlap = hi[axis] - lo[axis];
        if overlap < Real::ZERO {
            return None;
        }
        if axis == 0 || overlap < best_overlap {
            best_axis = axis;
            best_overlap = overlap;
        }
    }

    let diff = b.center() - a.center();
    let mut normal = Vector3::ZERO;
    normal[best_axis] = if diff[best_axis] >= Real::ZERO {
        Real::ONE
    } else {
        -Real::ONE
    };

    // Centre of the overlap region.
    Some(ContactGeometry {
        normal,
        penetration: best_overlap,
        point: (lo + hi) * Real::HALF,
    })
}

/// Normal points from the sphere toward the box.
fn contact_sphere_aabb(s: &SphereCollider, b: &AabbCollider) -> Option<ContactGeometry> {
    let closest = b.closest_point(s.center);
    let diff = s.center - closest;
    let dist_sq = diff.length_squared();
    if dist_sq > s.radius * s.radius {
        return None;
    }

    if dist_sq > NORMALIZE_EPSILON {
        let dist = dist_sq.sqrt();
        return Some(ContactGeometry {
            normal: -(diff / dist),
            penetration: (s.radius - dist).max(Real::ZERO),
            point: closest,
        });
    }

    // Centre inside the box (or on its surface): leave through the nearest face.
    let faces = [
        (b.max.x - s.center.x, Vector3::X),
        (s.center.x - b.min.x, -Vector3::X),
        (b.max.y - s.center.y, Vector3::Y),
        (s.center.y - b.min.y, -Vector3::Y),
        (b.max.z - s.center.z, Vector3::Z),
        (s.center.z - b.min.z, -Vector3::Z),
    ];
    let mut nearest = faces[0];
    for face in &faces[1..] {
        if face.0 < nearest.0 {
            nearest = *face;
        }
    }
    let (depth, outward) = nearest;

    Some(ContactGeometry {
        normal: -outward,
        penetration: s.radius + depth,
        point: s.center + outward * depth,
    })
}
