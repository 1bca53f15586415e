//! Rigid-body dynamics core.
//!
//! All arithmetic runs on [`Real`], a finite `f64`. Non-finite values are
//! rejected at every boundary, so NaN and infinity never enter the
//! simulation state. On top of that sit small fixed-size vectors and matrices,
//! a validated [`RigidBody`], and a [`PhysicsWorld`] that steps registered
//! bodies with semi-implicit Euler integration.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use rigid_dynamics::prelude::*;
//!
//! let ball = Rc::new(RefCell::new(
//!     RigidBody::dynamic(Real::ONE)?.with_position(Vector3::lit(0.0, 10.0, 0.0)),
//! ));
//! let mut world = PhysicsWorld::new();
//! world.add_body(&ball)?;
//! for _ in 0..100 {
//!     world.simulate(Real::lit(0.01))?;
//! }
//! assert!(ball.borrow().position().y < Real::lit(10.0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod body;
pub mod clock;
pub mod collider;
pub mod constants;
pub mod interop;
pub mod matrix;
pub mod pipeline;
pub mod real;
pub mod vector;
pub mod world;

pub use body::{solid_box_inertia, solid_sphere_inertia, BodyError, Pose, RigidBody, RigidBodyDynamics};
pub use clock::FixedStepClock;
pub use collider::{AabbCollider, Collider, ColliderShape, ContactGeometry, SphereCollider};
pub use matrix::{Matrix3, Matrix4};
pub use pipeline::{CollisionPipeline, Contact, ImpulseCollisionPipeline, NoCollisions};
pub use real::{Real, RealError};
pub use vector::{Vector2, Vector3, Vector4};
pub use world::{BodyHandle, BodyRef, PhysicsWorld, WorldConfig, WorldError};

/// The types most simulations need.
pub mod prelude {
    pub use crate::body::{RigidBody, RigidBodyDynamics};
    pub use crate::clock::FixedStepClock;
    pub use crate::collider::ColliderShape;
    pub use crate::matrix::{Matrix3, Matrix4};
    pub use crate::pipeline::ImpulseCollisionPipeline;
    pub use crate::real::Real;
    pub use crate::vector::{Vector2, Vector3, Vector4};
    pub use crate::world::{PhysicsWorld, WorldConfig};
}
