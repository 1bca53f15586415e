//! The physics world: registration, stepping and the simulation clock.
//!
//! A [`PhysicsWorld`] never owns a body. Callers create bodies as
//! `Rc<RefCell<_>>` and register them; the world keeps a [`Weak`] reference to
//! each. A body dropped while still registered is skipped and pruned with a
//! warning on the next step.
//!
//! # Example
//! ```
//! use std::{cell::RefCell, rc::Rc};
//! use rigid_dynamics::{PhysicsWorld, Real, RigidBody, RigidBodyDynamics, Vector3};
//!
//! let ball = Rc::new(RefCell::new(
//!     RigidBody::dynamic(Real::ONE)?.with_position(Vector3::lit(0.0, 10.0, 0.0)),
//! ));
//!
//! let mut world = PhysicsWorld::new();
//! world.add_body(&ball)?;
//! for _ in 0..60 {
//!     world.simulate(Real::lit(1.0 / 60.0))?;
//! }
//! assert!(ball.borrow().position().y < Real::lit(10.0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::cell::RefCell;
use std::num::NonZeroU32;
use std::rc::{Rc, Weak};

use log::{debug, trace, warn};
use thiserror::Error;

use crate::body::{BodyError, RigidBodyDynamics};
use crate::constants::G;
use crate::matrix::Matrix3;
use crate::pipeline::{CollisionPipeline, NoCollisions};
use crate::real::Real;
use crate::vector::Vector3;

/// Shared handle to a body, as held by its creator.
pub type BodyHandle = Rc<RefCell<dyn RigidBodyDynamics>>;

/// Non-owning reference the world keeps for each registered body.
pub type BodyRef = Weak<RefCell<dyn RigidBodyDynamics>>;

/// Reasons a world operation is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WorldError {
    #[error("body reference is null or the body has been dropped")]
    NullBody,
    #[error("body is already registered")]
    DuplicateBody,
    #[error("body is not registered with this world")]
    BodyNotRegistered,
    #[error("time step must be strictly positive, got {dt}")]
    InvalidTimeStep { dt: f64 },
    #[error("max time step must be strictly positive, got {max_time_step}")]
    InvalidMaxTimeStep { max_time_step: f64 },
    #[error("max angular speed must not be negative, got {max_angular_speed}")]
    InvalidMaxAngularSpeed { max_angular_speed: f64 },
    #[error("body {index} is borrowed elsewhere during the step")]
    BodyBorrowed { index: usize },
    #[error("body {index} rejected its update: {source}")]
    Body {
        index: usize,
        #[source]
        source: BodyError,
    },
}

/// Stepping parameters.
///
/// Fields are only reachable through validating builders, so every config a
/// world holds has a strictly positive step limit and a non-negative angular
/// speed limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldConfig {
    gravity: Vector3,
    max_time_step: Real,
    max_angular_speed: Real,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vector3::new(Real::ZERO, -G, Real::ZERO),
            max_time_step: Real::lit(0.05),
            max_angular_speed: Real::lit(100.0),
        }
    }
}

impl WorldConfig {
    pub fn with_gravity(mut self, gravity: Vector3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Longer steps are clamped to `max_time_step` (s). Must be strictly
    /// positive.
    pub fn with_max_time_step(mut self, max_time_step: Real) -> Result<Self, WorldError> {
        if max_time_step <= Real::ZERO {
            warn!("rejected max time step {max_time_step}");
            return Err(WorldError::InvalidMaxTimeStep {
                max_time_step: max_time_step.value(),
            });
        }
        self.max_time_step = max_time_step;
        Ok(self)
    }

    /// Per-axis limit on angular velocity (rad/s). Must not be negative.
    pub fn with_max_angular_speed(mut self, max_angular_speed: Real) -> Result<Self, WorldError> {
        if max_angular_speed < Real::ZERO {
            warn!("rejected max angular speed {max_angular_speed}");
            return Err(WorldError::InvalidMaxAngularSpeed {
                max_angular_speed: max_angular_speed.value(),
            });
        }
        self.max_angular_speed = max_angular_speed;
        Ok(self)
    }

    /// Acceleration applied to every dynamic body (m/s²).
    pub fn gravity(&self) -> Vector3 {
        self.gravity
    }

    pub fn max_time_step(&self) -> Real {
        self.max_time_step
    }

    pub fn max_angular_speed(&self) -> Real {
        self.max_angular_speed
    }
}

/// Advances registered bodies through time.
///
/// Each [`PhysicsWorld::simulate`] call runs, in order: time-step validation
/// and clamping, gravity, semi-implicit Euler integration, collision detection
/// and resolution through `P`, and the clock update.
pub struct PhysicsWorld<P: CollisionPipeline = NoCollisions> {
    bodies: Vec<BodyRef>,
    config: WorldConfig,
    pipeline: P,
    simulation_time: Real,
    // Kahan compensation term for `simulation_time`.
    time_compensation: Real,
    step_count: u64,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// A world with default gravity and no collision handling.
    pub fn new() -> Self {
        Self::with_pipeline(WorldConfig::default(), NoCollisions)
    }

    pub fn with_config(config: WorldConfig) -> Self {
        Self::with_pipeline(config, NoCollisions)
    }
}

impl<P: CollisionPipeline> PhysicsWorld<P> {
    pub fn with_pipeline(config: WorldConfig, pipeline: P) -> Self {
        Self {
            bodies: Vec::new(),
            config,
            pipeline,
            simulation_time: Real::ZERO,
            time_compensation: Real::ZERO,
            step_count: 0,
        }
    }

    /// Reset to the freshly constructed state: clock at zero, no bodies.
    /// Configuration is kept.
    pub fn bang(&mut self) {
        debug!("resetting world with {} registered bodies", self.bodies.len());
        self.bodies.clear();
        self.pipeline.reset();
        self.simulation_time = Real::ZERO;
        self.time_compensation = Real::ZERO;
        self.step_count = 0;
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: WorldConfig) {
        self.config = config;
    }

    pub fn set_gravity(&mut self, gravity: Vector3) {
        self.config.gravity = gravity;
    }

    pub fn gravity(&self) -> Vector3 {
        self.config.gravity
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut P {
        &mut self.pipeline
    }

    /// Seconds simulated since construction or the last [`PhysicsWorld::bang`].
    pub fn simulation_time(&self) -> Real {
        self.simulation_time
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Register a body.
    ///
    /// Fails with [`WorldError::NullBody`] if the reference does not point to
    /// a live body and with [`WorldError::DuplicateBody`] if it is already
    /// registered.
    pub fn add_rigid_body(&mut self, body: BodyRef) -> Result<(), WorldError> {
        if body.strong_count() == 0 {
            return Err(WorldError::NullBody);
        }
        if self.bodies.iter().any(|b| Weak::ptr_eq(b, &body)) {
            return Err(WorldError::DuplicateBody);
        }
        self.bodies.push(body);
        debug!("registered body, {} now in world", self.bodies.len());
        Ok(())
    }

    /// Unregister a body. The body itself is left untouched.
    pub fn remove_rigid_body(&mut self, body: BodyRef) -> Result<(), WorldError> {
        if body.strong_count() == 0 {
            return Err(WorldError::NullBody);
        }
        let index = self
            .bodies
            .iter()
            .position(|b| Weak::ptr_eq(b, &body))
            .ok_or(WorldError::BodyNotRegistered)?;
        self.bodies.remove(index);
        debug!("unregistered body {index}, {} left", self.bodies.len());
        Ok(())
    }

    /// [`PhysicsWorld::add_rigid_body`] for a concrete body handle.
    pub fn add_body<B: RigidBodyDynamics + 'static>(
        &mut self,
        body: &Rc<RefCell<B>>,
    ) -> Result<(), WorldError> {
        let body = Rc::downgrade(body) as BodyRef;
        self.add_rigid_body(body)
    }

    /// [`PhysicsWorld::remove_rigid_body`] for a concrete body handle.
    pub fn remove_body<B: RigidBodyDynamics + 'static>(
        &mut self,
        body: &Rc<RefCell<B>>,
    ) -> Result<(), WorldError> {
        let body = Rc::downgrade(body) as BodyRef;
        self.remove_rigid_body(body)
    }

    pub fn contains<B: RigidBodyDynamics + 'static>(&self, body: &Rc<RefCell<B>>) -> bool {
        let body = Rc::downgrade(body) as BodyRef;
        self.bodies.iter().any(|b| Weak::ptr_eq(b, &body))
    }

    /// Number of registered bodies that are still alive.
    pub fn body_count(&self) -> usize {
        self.bodies.iter().filter(|b| b.strong_count() > 0).count()
    }

    /// Live registered bodies in registration order.
    pub fn bodies(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.bodies.iter().filter_map(Weak::upgrade)
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// A non-positive `dt` is rejected with [`WorldError::InvalidTimeStep`]
    /// and leaves the world and its bodies untouched. A `dt` above
    /// [`WorldConfig::max_time_step`] is clamped to it. Every body is borrowed
    /// mutably for the duration of the step; if one is already borrowed the
    /// step fails with [`WorldError::BodyBorrowed`] before anything changes.
    pub fn simulate(&mut self, dt: Real) -> Result<(), WorldError> {
        if dt <= Real::ZERO {
            warn!("rejected time step {dt}");
            return Err(WorldError::InvalidTimeStep { dt: dt.value() });
        }
        let dt = if dt > self.config.max_time_step {
            debug!("clamping time step {dt} to {}", self.config.max_time_step);
            self.config.max_time_step
        } else {
            dt
        };

        self.prune_dropped();

        let handles: Vec<BodyHandle> = self.bodies.iter().filter_map(Weak::upgrade).collect();
        let mut guards = Vec::with_capacity(handles.len());
        for (index, handle) in handles.iter().enumerate() {
            let guard = handle
                .try_borrow_mut()
                .map_err(|_| WorldError::BodyBorrowed { index })?;
            guards.push(guard);
        }
        let mut bodies: Vec<&mut dyn RigidBodyDynamics> = Vec::with_capacity(guards.len());
        for guard in guards.iter_mut() {
            bodies.push(&mut **guard);
        }

        self.apply_global_forces(&mut bodies);
        self.integrate_bodies(&mut bodies, dt)?;
        self.pipeline.detect_collisions(&bodies);
        self.pipeline.resolve_collisions(&mut bodies)?;
        self.advance_clock(dt);

        trace!(
            "step {} dt={} t={} bodies={}",
            self.step_count,
            dt,
            self.simulation_time,
            bodies.len()
        );
        Ok(())
    }

    /// Advance by `dt` split into `substeps` equal steps.
    pub fn simulate_substeps(&mut self, dt: Real, substeps: NonZeroU32) -> Result<(), WorldError> {
        let sub_dt = dt / Real::from(substeps.get());
        for _ in 0..substeps.get() {
            self.simulate(sub_dt)?;
        }
        Ok(())
    }

    fn prune_dropped(&mut self) {
        let before = self.bodies.len();
        self.bodies.retain(|b| b.strong_count() > 0);
        let dropped = before - self.bodies.len();
        if dropped > 0 {
            warn!("pruned {dropped} bodies dropped while registered");
        }
    }

    fn apply_global_forces(&self, bodies: &mut [&mut dyn RigidBodyDynamics]) {
        let gravity = self.config.gravity;
        for body in bodies.iter_mut().filter(|b| !b.is_static()) {
            let force = gravity * body.mass();
            body.apply_force(force);
        }
    }

    fn integrate_bodies(
        &self,
        bodies: &mut [&mut dyn RigidBodyDynamics],
        dt: Real,
    ) -> Result<(), WorldError> {
        let max_angular_speed = self.config.max_angular_speed;
        for (index, body) in bodies.iter_mut().enumerate() {
            if body.is_static() {
                continue;
            }
            integrate(&mut **body, dt, max_angular_speed)
                .map_err(|source| WorldError::Body { index, source })?;
        }
        Ok(())
    }

    fn advance_clock(&mut self, dt: Real) {
        let y = dt - self.time_compensation;
        let t = self.simulation_time + y;
        self.time_compensation = (t - self.simulation_time) - y;
        self.simulation_time = t;
        self.step_count += 1;
    }
}

/// One semi-implicit Euler step for a dynamic body.
///
/// Velocity is updated from the accumulated force before it is used to move
/// the position. Orientation is advanced by `exp(skew(ω)·dt)` and
/// re-orthonormalized. The accumulators are cleared at the end.
fn integrate(
    body: &mut dyn RigidBodyDynamics,
    dt: Real,
    max_angular_speed: Real,
) -> Result<(), BodyError> {
    let acceleration = body.force_accumulator() * body.inverse_mass();
    let velocity = body.velocity() + acceleration * dt;
    let position = body.position() + velocity * dt;

    let angular_acceleration = body.inverse_inertia_tensor() * body.torque_accumulator();
    let angular_velocity = (body.angular_velocity() + angular_acceleration * dt)
        .map(|w| w.clamp_symmetric(max_angular_speed));

    let delta = Matrix3::exp(&Matrix3::skew(angular_velocity * dt));
    let orientation = (body.orientation() * delta).orthonormalized();

    body.set_velocity(velocity)?;
    body.set_position(position)?;
    body.set_angular_velocity(angular_velocity)?;
    body.set_orientation(orientation)?;
    body.clear_accumulators();
    Ok(())
}
