//! Collision extension points of [`PhysicsWorld`](crate::world::PhysicsWorld).
//!
//! After integrating, the world hands the live bodies to its
//! [`CollisionPipeline`] twice: once to detect contacts, once to resolve them.
//! [`NoCollisions`] is the default and does nothing.
//! [`ImpulseCollisionPipeline`] tests every pair of bodies that carry a
//! collider and answers each approaching contact with a restitution impulse.

use log::warn;

use crate::body::RigidBodyDynamics;
use crate::real::Real;
use crate::vector::Vector3;
use crate::world::WorldError;

/// Contact between two bodies found during detection.
///
/// Indices refer to the body slice passed to the pipeline for the current step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub body_a: usize,
    pub body_b: usize,
    /// Unit normal pointing from body A toward body B.
    pub normal: Vector3,
    /// Overlap depth, zero for touching bodies.
    pub penetration: Real,
    /// World-space contact point.
    pub point: Vector3,
}

/// Broad phase, narrow phase and response, run once per step after
/// integration.
pub trait CollisionPipeline {
    /// Find contacts among `bodies`. Results are kept by the pipeline until
    /// [`CollisionPipeline::resolve_collisions`].
    fn detect_collisions(&mut self, bodies: &[&mut dyn RigidBodyDynamics]);

    /// Apply the response for the contacts found by the last detection.
    fn resolve_collisions(
        &mut self,
        bodies: &mut [&mut dyn RigidBodyDynamics],
    ) -> Result<(), WorldError>;

    /// Drop any per-step state. Called by [`PhysicsWorld::bang`](crate::world::PhysicsWorld::bang).
    fn reset(&mut self) {}
}

/// Pipeline that never reports a contact.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCollisions;

impl CollisionPipeline for NoCollisions {
    fn detect_collisions(&mut self, _bodies: &[&mut dyn RigidBodyDynamics]) {}

    fn resolve_collisions(
        &mut self,
        _bodies: &mut [&mut dyn RigidBodyDynamics],
    ) -> Result<(), WorldError> {
        Ok(())
    }
}

/// All-pairs collision detection with impulse response.
///
/// For each contact the bodies are first pushed apart along the normal in
/// proportion to their inverse masses, then, if they are approaching, the
/// impulse
///
/// `J = -(1 + e) (v_rel · n) / (1/m_a + 1/m_b) · n`
///
/// with `e = min(e_a, e_b)` is applied at the contact point through
/// [`RigidBodyDynamics::apply_impulse_at_point`].
///
/// `C` is the contact capacity per step. For `N` bodies the worst case is
/// `N*(N-1)/2`. Contacts beyond the capacity are dropped with a warning.
#[derive(Debug, Clone, Default)]
pub struct ImpulseCollisionPipeline<const C: usize = 64> {
    contacts: heapless::Vec<Contact, C>,
    dropped: usize,
}

impl<const C: usize> ImpulseCollisionPipeline<C> {
    pub fn new() -> Self {
        Self {
            contacts: heapless::Vec::new(),
            dropped: 0,
        }
    }

    /// Contacts found by the last detection pass.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Contacts that did not fit into the buffer during the last detection.
    pub fn dropped_contacts(&self) -> usize {
        self.dropped
    }

    pub const fn capacity(&self) -> usize {
        C
    }
}

impl<const C: usize> CollisionPipeline for ImpulseCollisionPipeline<C> {
    fn detect_collisions(&mut self, bodies: &[&mut dyn RigidBodyDynamics]) {
        self.contacts.clear();
        self.dropped = 0;

        for (i, body_a) in bodies.iter().enumerate() {
            let Some(collider_a) = body_a.collider() else {
                continue;
            };

            for (j, body_b) in bodies.iter().enumerate().skip(i + 1) {
                if body_a.is_static() && body_b.is_static() {
                    continue;
                }
                let Some(collider_b) = body_b.collider() else {
                    continue;
                };

                if let Some(geometry) = collider_a.contact(&collider_b) {
                    let contact = Contact {
                        body_a: i,
                        body_b: j,
                        normal: geometry.normal,
                        penetration: geometry.penetration,
                        point: geometry.point,
                    };
                    if self.contacts.push(contact).is_err() {
                        self.dropped += 1;
                    }
                }
            }
        }

        if self.dropped > 0 {
            warn!(
                "contact buffer full ({} slots), dropped {} contacts this step",
                C, self.dropped
            );
        }
    }

    fn resolve_collisions(
        &mut self,
        bodies: &mut [&mut dyn RigidBodyDynamics],
    ) -> Result<(), WorldError> {
        for contact in &self.contacts {
            let (a, b) = (contact.body_a, contact.body_b);
            let inv_mass_a = bodies[a].inverse_mass();
            let inv_mass_b = bodies[b].inverse_mass();
            let inv_mass_sum = inv_mass_a + inv_mass_b;
            if inv_mass_sum.is_zero() {
                continue;
            }

            // Positional correction.
            let correction = contact.normal * (contact.penetration / inv_mass_sum);
            if !contact.penetration.is_zero() {
                let pa = bodies[a].position() - correction * inv_mass_a;
                let pb = bodies[b].position() + correction * inv_mass_b;
                bodies[a]
                    .set_position(pa)
                    .map_err(|source| WorldError::Body { index: a, source })?;
                bodies[b]
                    .set_position(pb)
                    .map_err(|source| WorldError::Body { index: b, source })?;
            }

            let relative_velocity = bodies[b].velocity() - bodies[a].velocity();
            let velocity_along_normal = relative_velocity.dot(contact.normal);
            if velocity_along_normal >= Real::ZERO {
                continue;
            }

            let restitution = bodies[a].restitution().min(bodies[b].restitution());
            let magnitude = -(Real::ONE + restitution) * velocity_along_normal / inv_mass_sum;
            let impulse = contact.normal * magnitude;

            let offset_a = contact.point - bodies[a].position();
            let offset_b = contact.point - bodies[b].position();
            bodies[a].apply_impulse_at_point(-impulse, offset_a);
            bodies[b].apply_impulse_at_point(impulse, offset_b);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.contacts.clear();
        self.dropped = 0;
    }
}
