//! Rigid body state and the dynamics contract the world steps through.
//!
//! A [`RigidBody`] owns its mass properties, pose, velocities and per-step
//! force/torque accumulators. Every mutation is validated first and either
//! applied in full or rejected with a [`BodyError`], leaving the body as it
//! was.
//!
//! Two inputs degrade silently instead of failing: a singular inertia tensor
//! yields a zero inverse (the body stops responding to torque), and a force or
//! torque with a non-finite component is dropped.
//!
//! # Example
//! ```
//! use rigid_dynamics::{RigidBody, RigidBodyDynamics, Real, Vector3};
//!
//! let mut ball = RigidBody::dynamic(Real::lit(2.0))?
//!     .with_position(Vector3::lit(0.0, 10.0, 0.0))
//!     .with_sphere_inertia(Real::lit(0.5));
//! ball.apply_impulse(Vector3::lit(4.0, 0.0, 0.0));
//! assert_eq!(ball.velocity(), Vector3::lit(2.0, 0.0, 0.0));
//! # Ok::<(), rigid_dynamics::BodyError>(())
//! ```

use thiserror::Error;

use crate::collider::{Collider, ColliderShape};
use crate::matrix::{Matrix3, Matrix4};
use crate::real::Real;
use crate::vector::Vector3;

/// Reasons a body rejects a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BodyError {
    #[error("mass must be strictly positive and finite, got {mass}")]
    InvalidMass { mass: f64 },
    #[error("position has a non-finite component")]
    InvalidPosition,
    #[error("velocity has a non-finite component")]
    InvalidVelocity,
    #[error("orientation has a non-finite component")]
    InvalidOrientation,
    #[error("inertia tensor has a non-finite component")]
    InvalidInertia,
}

/// Read-only snapshot of where a body is, handed to rendering code once per
/// frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3,
    pub orientation: Matrix3,
}

impl Pose {
    /// Model matrix placing local geometry at this pose.
    pub fn to_model_matrix(&self) -> Matrix4 {
        Matrix4::from_rotation_translation(&self.orientation, self.position)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vector3::ZERO,
            orientation: Matrix3::IDENTITY,
        }
    }
}

/// Everything the world needs from a body, in one contract.
///
/// The world holds bodies as `dyn RigidBodyDynamics` and never inspects the
/// concrete type.
pub trait RigidBodyDynamics {
    fn mass(&self) -> Real;
    /// Zero for a static body.
    fn inverse_mass(&self) -> Real;
    fn set_mass(&mut self, mass: Real) -> Result<(), BodyError>;

    fn inertia_tensor(&self) -> Matrix3;
    fn inverse_inertia_tensor(&self) -> Matrix3;
    fn set_inertia_tensor(&mut self, tensor: Matrix3) -> Result<(), BodyError>;

    fn position(&self) -> Vector3;
    fn set_position(&mut self, position: Vector3) -> Result<(), BodyError>;

    fn orientation(&self) -> Matrix3;
    fn set_orientation(&mut self, orientation: Matrix3) -> Result<(), BodyError>;

    fn velocity(&self) -> Vector3;
    fn set_velocity(&mut self, velocity: Vector3) -> Result<(), BodyError>;

    fn angular_velocity(&self) -> Vector3;
    fn set_angular_velocity(&mut self, angular_velocity: Vector3) -> Result<(), BodyError>;

    fn force_accumulator(&self) -> Vector3;
    fn torque_accumulator(&self) -> Vector3;

    /// Accumulators and velocities follow [`Real`] arithmetic: a sum that
    /// overflows panics.
    fn apply_force(&mut self, force: Vector3);
    fn apply_torque(&mut self, torque: Vector3);
    fn apply_impulse(&mut self, impulse: Vector3);
    /// Linear impulse plus the angular impulse `r × j`, with `r` measured from
    /// the centre of mass.
    fn apply_impulse_at_point(&mut self, impulse: Vector3, offset: Vector3);
    fn clear_accumulators(&mut self);

    fn restitution(&self) -> Real {
        Real::HALF
    }

    fn collider_shape(&self) -> Option<ColliderShape> {
        None
    }

    /// The body's shape placed at its current position.
    fn collider(&self) -> Option<Collider> {
        self.collider_shape().map(|shape| shape.at(self.position()))
    }

    fn pose(&self) -> Pose {
        Pose {
            position: self.position(),
            orientation: self.orientation(),
        }
    }

    fn is_static(&self) -> bool {
        self.inverse_mass().is_zero()
    }
}

/// Inertia tensor of a solid sphere: `I = (2/5) m r²` on every axis.
pub fn solid_sphere_inertia(mass: Real, radius: Real) -> Matrix3 {
    let i = Real::lit(0.4) * mass * radius * radius;
    Matrix3::from_diagonal(Vector3::new(i, i, i))
}

/// Inertia tensor of a solid box with the given half-extents.
pub fn solid_box_inertia(mass: Real, half_extents: Vector3) -> Matrix3 {
    let full = half_extents * Real::TWO;
    let (x2, y2, z2) = (full.x * full.x, full.y * full.y, full.z * full.z);
    let k = mass / Real::lit(12.0);
    Matrix3::from_diagonal(Vector3::new(k * (y2 + z2), k * (x2 + z2), k * (x2 + y2)))
}

/// A single rigid body.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    mass: Real,
    inverse_mass: Real,
    inertia_tensor: Matrix3,
    inverse_inertia_tensor: Matrix3,

    position: Vector3,
    orientation: Matrix3,
    velocity: Vector3,
    /// Radians per second.
    angular_velocity: Vector3,

    force_accumulator: Vector3,
    torque_accumulator: Vector3,

    restitution: Real,
    collider: Option<ColliderShape>,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidBody {
    /// A body at the origin with zero mass and zero inertia. It is static until
    /// [`RigidBodyDynamics::set_mass`] succeeds.
    pub fn new() -> Self {
        Self {
            mass: Real::ZERO,
            inverse_mass: Real::ZERO,
            inertia_tensor: Matrix3::ZERO,
            inverse_inertia_tensor: Matrix3::ZERO,
            position: Vector3::ZERO,
            orientation: Matrix3::IDENTITY,
            velocity: Vector3::ZERO,
            angular_velocity: Vector3::ZERO,
            force_accumulator: Vector3::ZERO,
            torque_accumulator: Vector3::ZERO,
            restitution: Real::HALF,
            collider: None,
        }
    }

    /// A dynamic body of the given mass (kg), with the inertia of a unit
    /// solid sphere of that mass.
    pub fn dynamic(mass: Real) -> Result<Self, BodyError> {
        let mut body = Self::new();
        body.set_mass(mass)?;
        body.set_inertia_tensor(solid_sphere_inertia(mass, Real::ONE))?;
        Ok(body)
    }

    /// An immovable body. Forces and gravity never reach it.
    pub fn new_static() -> Self {
        Self::new()
    }

    pub fn with_position(mut self, position: Vector3) -> Self {
        self.position = position;
        self
    }

    pub fn with_velocity(mut self, velocity: Vector3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: Vector3) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_orientation(mut self, orientation: Matrix3) -> Self {
        self.orientation = orientation;
        self
    }

    /// Bounciness, clamped into `[0, 1]`.
    pub fn with_restitution(mut self, restitution: Real) -> Self {
        self.restitution = restitution.clamp(Real::ZERO, Real::ONE);
        self
    }

    pub fn with_collider(mut self, collider: ColliderShape) -> Self {
        self.collider = Some(collider);
        self
    }

    pub fn with_inertia_tensor(mut self, tensor: Matrix3) -> Self {
        self.store_inertia(tensor);
        self
    }

    /// Inertia of a solid sphere of `radius` using the current mass.
    pub fn with_sphere_inertia(self, radius: Real) -> Self {
        let tensor = solid_sphere_inertia(self.mass, radius);
        self.with_inertia_tensor(tensor)
    }

    /// Inertia of a solid box with `half_extents` using the current mass.
    pub fn with_box_inertia(self, half_extents: Vector3) -> Self {
        let tensor = solid_box_inertia(self.mass, half_extents);
        self.with_inertia_tensor(tensor)
    }

    pub fn set_restitution(&mut self, restitution: Real) {
        self.restitution = restitution.clamp(Real::ZERO, Real::ONE);
    }

    pub fn set_collider(&mut self, collider: Option<ColliderShape>) {
        self.collider = collider;
    }

    /// [`RigidBodyDynamics::set_mass`] for an unchecked `f64`.
    pub fn set_mass_f64(&mut self, mass: f64) -> Result<(), BodyError> {
        let mass = Real::new(mass).map_err(|_| BodyError::InvalidMass { mass })?;
        self.set_mass(mass)
    }

    pub fn set_position_f64(&mut self, position: [f64; 3]) -> Result<(), BodyError> {
        let position = Vector3::from_array(position).map_err(|_| BodyError::InvalidPosition)?;
        self.set_position(position)
    }

    pub fn set_velocity_f64(&mut self, velocity: [f64; 3]) -> Result<(), BodyError> {
        let velocity = Vector3::from_array(velocity).map_err(|_| BodyError::InvalidVelocity)?;
        self.set_velocity(velocity)
    }

    pub fn set_angular_velocity_f64(&mut self, angular_velocity: [f64; 3]) -> Result<(), BodyError> {
        let angular_velocity =
            Vector3::from_array(angular_velocity).map_err(|_| BodyError::InvalidVelocity)?;
        self.set_angular_velocity(angular_velocity)
    }

    pub fn set_orientation_f64(&mut self, row_major: [f64; 9]) -> Result<(), BodyError> {
        let orientation =
            Matrix3::from_row_major(&row_major).map_err(|_| BodyError::InvalidOrientation)?;
        self.set_orientation(orientation)
    }

    pub fn set_inertia_tensor_f64(&mut self, row_major: [f64; 9]) -> Result<(), BodyError> {
        let tensor = Matrix3::from_row_major(&row_major).map_err(|_| BodyError::InvalidInertia)?;
        self.set_inertia_tensor(tensor)
    }

    /// Accumulate a force given as raw components. Dropped if any component
    /// is not finite.
    pub fn apply_force_f64(&mut self, force: [f64; 3]) {
        if let Ok(force) = Vector3::from_array(force) {
            self.apply_force(force);
        }
    }

    /// Accumulate a torque given as raw components. Dropped if any component
    /// is not finite.
    pub fn apply_torque_f64(&mut self, torque: [f64; 3]) {
        if let Ok(torque) = Vector3::from_array(torque) {
            self.apply_torque(torque);
        }
    }

    pub fn speed(&self) -> Real {
        self.velocity.length()
    }

    /// Linear plus rotational kinetic energy: `½mv² + ½ωᵀIω`.
    pub fn kinetic_energy(&self) -> Real {
        let linear = Real::HALF * self.mass * self.velocity.length_squared();
        let rotational =
            Real::HALF * self.angular_velocity.dot(self.inertia_tensor * self.angular_velocity);
        linear + rotational
    }

    pub fn momentum(&self) -> Vector3 {
        self.velocity * self.mass
    }

    fn store_inertia(&mut self, tensor: Matrix3) {
        self.inertia_tensor = tensor;
        self.inverse_inertia_tensor = tensor.inverse_or_zero();
    }
}

impl RigidBodyDynamics for RigidBody {
    fn mass(&self) -> Real {
        self.mass
    }

    fn inverse_mass(&self) -> Real {
        self.inverse_mass
    }

    fn set_mass(&mut self, mass: Real) -> Result<(), BodyError> {
        if mass <= Real::ZERO {
            return Err(BodyError::InvalidMass { mass: mass.value() });
        }
        // 1/m overflows for subnormal masses.
        let inverse_mass = mass
            .checked_recip()
            .map_err(|_| BodyError::InvalidMass { mass: mass.value() })?;
        self.mass = mass;
        self.inverse_mass = inverse_mass;
        Ok(())
    }

    fn inertia_tensor(&self) -> Matrix3 {
        self.inertia_tensor
    }

    fn inverse_inertia_tensor(&self) -> Matrix3 {
        self.inverse_inertia_tensor
    }

    fn set_inertia_tensor(&mut self, tensor: Matrix3) -> Result<(), BodyError> {
        if !tensor.rows().iter().flatten().all(|v| v.value().is_finite()) {
            return Err(BodyError::InvalidInertia);
        }
        self.store_inertia(tensor);
        Ok(())
    }

    fn position(&self) -> Vector3 {
        self.position
    }

    fn set_position(&mut self, position: Vector3) -> Result<(), BodyError> {
        if !position.is_finite() {
            return Err(BodyError::InvalidPosition);
        }
        self.position = position;
        Ok(())
    }

    fn orientation(&self) -> Matrix3 {
        self.orientation
    }

    fn set_orientation(&mut self, orientation: Matrix3) -> Result<(), BodyError> {
        if !orientation.rows().iter().flatten().all(|v| v.value().is_finite()) {
            return Err(BodyError::InvalidOrientation);
        }
        self.orientation = orientation;
        Ok(())
    }

    fn velocity(&self) -> Vector3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vector3) -> Result<(), BodyError> {
        if !velocity.is_finite() {
            return Err(BodyError::InvalidVelocity);
        }
        self.velocity = velocity;
        Ok(())
    }

    fn angular_velocity(&self) -> Vector3 {
        self.angular_velocity
    }

    fn set_angular_velocity(&mut self, angular_velocity: Vector3) -> Result<(), BodyError> {
        if !angular_velocity.is_finite() {
            return Err(BodyError::InvalidVelocity);
        }
        self.angular_velocity = angular_velocity;
        Ok(())
    }

    fn force_accumulator(&self) -> Vector3 {
        self.force_accumulator
    }

    fn torque_accumulator(&self) -> Vector3 {
        self.torque_accumulator
    }

    #[inline]
    fn apply_force(&mut self, force: Vector3) {
        self.force_accumulator += force;
    }

    #[inline]
    fn apply_torque(&mut self, torque: Vector3) {
        self.torque_accumulator += torque;
    }

    #[inline]
    fn apply_impulse(&mut self, impulse: Vector3) {
        self.velocity += impulse * self.inverse_mass;
    }

    fn apply_impulse_at_point(&mut self, impulse: Vector3, offset: Vector3) {
        self.apply_impulse(impulse);
        self.angular_velocity += self.inverse_inertia_tensor * offset.cross(impulse);
    }

    fn clear_accumulators(&mut self) {
        self.force_accumulator = Vector3::ZERO;
        self.torque_accumulator = Vector3::ZERO;
    }

    fn restitution(&self) -> Real {
        self.restitution
    }

    fn collider_shape(&self) -> Option<ColliderShape> {
        self.collider
    }
}
