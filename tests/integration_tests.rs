//! Integration tests for rigid-dynamics
//! These tests drive whole simulations through the public API

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use rigid_dynamics::constants::G;
use rigid_dynamics::{
    BodyError, BodyHandle, ColliderShape, FixedStepClock, ImpulseCollisionPipeline, Matrix3,
    PhysicsWorld, Real, RigidBody, RigidBodyDynamics, Vector3, WorldConfig, WorldError,
};

fn shared(body: RigidBody) -> Rc<RefCell<RigidBody>> {
    Rc::new(RefCell::new(body))
}

fn drop_from(height: f64) -> Rc<RefCell<RigidBody>> {
    shared(
        RigidBody::dynamic(Real::ONE)
            .unwrap()
            .with_position(Vector3::lit(0.0, height, 0.0)),
    )
}

fn mechanical_energy(body: &RigidBody, height0: f64) -> f64 {
    let potential = body.mass().value() * G.value() * (body.position().y.value() - height0);
    body.kinetic_energy().value() + potential
}

#[test]
fn test_free_fall_matches_discrete_solution() {
    let ball = drop_from(100.0);
    let mut world = PhysicsWorld::new();
    world.add_body(&ball).unwrap();

    let dt = 0.01;
    let steps = 200u32;
    for _ in 0..steps {
        world.simulate(Real::lit(dt)).unwrap();
    }

    let t = dt * f64::from(steps);
    let n = f64::from(steps);
    let ball = ball.borrow();

    // Velocity is exact for constant acceleration.
    assert_abs_diff_eq!(ball.velocity().y.value(), -G.value() * t, epsilon = 1e-2);

    // Semi-implicit Euler: y_n = y_0 - g dt² n(n+1)/2.
    let discrete = 100.0 - G.value() * dt * dt * n * (n + 1.0) / 2.0;
    assert_abs_diff_eq!(ball.position().y.value(), discrete, epsilon = 1e-9);

    // Stays within the method's first-order bias of the analytic curve.
    let analytic = 100.0 - 0.5 * G.value() * t * t;
    let bias = 0.5 * G.value() * dt * t;
    assert!((ball.position().y.value() - analytic).abs() <= bias + 1e-2);
    assert_eq!(ball.position().x, Real::ZERO);
    assert_eq!(ball.position().z, Real::ZERO);
}

#[test]
fn test_free_fall_converges_with_small_steps() {
    let ball = drop_from(100.0);
    let mut world = PhysicsWorld::new();
    world.add_body(&ball).unwrap();

    for _ in 0..20_000 {
        world.simulate(Real::lit(1e-4)).unwrap();
    }

    let ball = ball.borrow();
    let analytic = 100.0 - 0.5 * G.value() * 2.0 * 2.0;
    assert_abs_diff_eq!(ball.position().y.value(), analytic, epsilon = 1e-2);
    assert_abs_diff_eq!(mechanical_energy(&ball, 100.0), 0.0, epsilon = 1e-2);
    assert_abs_diff_eq!(world.simulation_time().value(), 2.0, epsilon = 1e-9);
}

#[test]
fn test_orientation_stays_orthonormal_while_spinning() {
    let top = shared(
        RigidBody::dynamic(Real::ONE)
            .unwrap()
            .with_angular_velocity(Vector3::lit(0.0, 5.0, 0.5)),
    );
    let mut world = PhysicsWorld::new();
    world.add_body(&top).unwrap();

    for _ in 0..400 {
        world.simulate(Real::lit(0.005)).unwrap();
        let orientation = top.borrow().orientation();
        assert!(orientation.is_orthonormal(Real::lit(5e-3)));
    }

    let orientation = top.borrow().orientation();
    assert_abs_diff_eq!(orientation.determinant().value(), 1.0, epsilon = 1e-9);
    assert!(orientation != Matrix3::IDENTITY);
}

#[test]
fn test_torque_free_spin_conserves_energy() {
    let top = shared(
        RigidBody::dynamic(Real::lit(3.0))
            .unwrap()
            .with_sphere_inertia(Real::HALF)
            .with_velocity(Vector3::lit(1.0, 0.0, -2.0))
            .with_angular_velocity(Vector3::lit(0.3, 2.0, -1.0)),
    );
    let mut world = PhysicsWorld::with_config(WorldConfig::default().with_gravity(Vector3::ZERO));
    world.add_body(&top).unwrap();

    let before = top.borrow().kinetic_energy();
    for _ in 0..1000 {
        world.simulate(Real::lit(0.01)).unwrap();
    }
    let after = top.borrow().kinetic_energy();
    assert_abs_diff_eq!(before.value(), after.value(), epsilon = 1e-12);
    assert_abs_diff_eq!(top.borrow().position().x.value(), 10.0, epsilon = 1e-9);
}

fn run_scene() -> Vec<([u64; 3], [u64; 3])> {
    let bodies: Vec<_> = (0..4)
        .map(|i| {
            let i = f64::from(i);
            shared(
                RigidBody::dynamic(Real::lit(1.0 + i))
                    .unwrap()
                    .with_position(Vector3::lit(i, 2.0 * i, -i))
                    .with_velocity(Vector3::lit(0.5 * i, 1.0, 0.0))
                    .with_angular_velocity(Vector3::lit(i, 1.0, 0.25)),
            )
        })
        .collect();

    let mut world = PhysicsWorld::new();
    for body in &bodies {
        world.add_body(body).unwrap();
    }
    for step in 0..512u32 {
        if step % 16 == 0 {
            bodies[1]
                .borrow_mut()
                .apply_torque(Vector3::lit(0.0, 0.0, 0.5));
        }
        world.simulate(Real::lit(0.008)).unwrap();
    }

    bodies
        .iter()
        .map(|b| {
            let b = b.borrow();
            (
                b.position().to_f64_array().map(f64::to_bits),
                b.velocity().to_f64_array().map(f64::to_bits),
            )
        })
        .collect()
}

#[test]
fn test_simulation_is_deterministic() {
    assert_eq!(run_scene(), run_scene());
}

#[test]
fn test_mass_validation() {
    let mut body = RigidBody::dynamic(Real::lit(2.0)).unwrap();

    assert_eq!(
        body.set_mass(Real::ZERO),
        Err(BodyError::InvalidMass { mass: 0.0 })
    );
    assert_eq!(
        body.set_mass(Real::lit(-1.0)),
        Err(BodyError::InvalidMass { mass: -1.0 })
    );
    assert!(body.set_mass_f64(f64::NAN).is_err());
    assert!(body.set_mass_f64(f64::INFINITY).is_err());
    assert_eq!(body.mass(), Real::lit(2.0));
    assert_eq!(body.inverse_mass(), Real::HALF);

    assert!(RigidBody::dynamic(Real::ZERO).is_err());
}

#[test]
fn test_rejected_mutation_leaves_body_unchanged() {
    let mut body = RigidBody::dynamic(Real::ONE)
        .unwrap()
        .with_position(Vector3::lit(1.0, 2.0, 3.0));
    let before = body.clone();

    assert_eq!(
        body.set_position_f64([0.0, f64::NAN, 0.0]),
        Err(BodyError::InvalidPosition)
    );
    assert_eq!(
        body.set_velocity_f64([f64::INFINITY, 0.0, 0.0]),
        Err(BodyError::InvalidVelocity)
    );
    body.apply_force_f64([f64::NAN, 1.0, 0.0]);
    assert_eq!(body, before);
}

#[test]
fn test_registration_round_trip() {
    let a = drop_from(1.0);
    let b = drop_from(2.0);
    let mut world = PhysicsWorld::new();

    world.add_body(&a).unwrap();
    world.add_body(&b).unwrap();
    assert_eq!(world.add_body(&a), Err(WorldError::DuplicateBody));
    assert_eq!(world.body_count(), 2);

    world.remove_body(&a).unwrap();
    assert_eq!(world.remove_body(&a), Err(WorldError::BodyNotRegistered));
    assert!(!world.contains(&a));
    assert!(world.contains(&b));

    world.add_body(&a).unwrap();
    assert_eq!(world.body_count(), 2);
}

#[test]
fn test_trait_object_handles() {
    let handle: BodyHandle = Rc::new(RefCell::new(RigidBody::dynamic(Real::ONE).unwrap()));
    let mut world = PhysicsWorld::new();
    world.add_rigid_body(Rc::downgrade(&handle)).unwrap();
    world.simulate(Real::lit(0.01)).unwrap();

    assert!(handle.borrow().velocity().y < Real::ZERO);
    assert_eq!(world.bodies().count(), 1);
}

#[test]
fn test_dropped_body_is_pruned() {
    let kept = drop_from(1.0);
    let mut world = PhysicsWorld::new();
    world.add_body(&kept).unwrap();
    {
        let temporary = drop_from(5.0);
        world.add_body(&temporary).unwrap();
        assert_eq!(world.body_count(), 2);
    }
    assert_eq!(world.body_count(), 1);
    world.simulate(Real::lit(0.01)).unwrap();
    assert_eq!(world.bodies().count(), 1);
}

#[test]
fn test_invalid_time_step_is_rejected() {
    let ball = drop_from(10.0);
    let mut world = PhysicsWorld::new();
    world.add_body(&ball).unwrap();

    assert_eq!(
        world.simulate(Real::ZERO),
        Err(WorldError::InvalidTimeStep { dt: 0.0 })
    );
    assert!(world.simulate(Real::lit(-0.1)).is_err());
    assert_eq!(world.step_count(), 0);
    assert_eq!(world.simulation_time(), Real::ZERO);
    assert_eq!(ball.borrow().position().y, Real::lit(10.0));
}

#[test]
fn test_large_time_step_is_clamped() {
    let ball = drop_from(10.0);
    let mut world = PhysicsWorld::new();
    world.add_body(&ball).unwrap();

    world.simulate(Real::lit(1.0)).unwrap();
    assert_eq!(world.simulation_time(), Real::lit(0.05));
    assert_abs_diff_eq!(
        ball.borrow().velocity().y.value(),
        -G.value() * 0.05,
        epsilon = 1e-12
    );
}

#[test]
fn test_static_body_is_untouched() {
    let floor = shared(
        RigidBody::new_static()
            .with_position(Vector3::lit(0.0, -1.0, 0.0))
            .with_velocity(Vector3::lit(1.0, 0.0, 0.0)),
    );
    let mut world = PhysicsWorld::new();
    world.add_body(&floor).unwrap();

    for _ in 0..50 {
        world.simulate(Real::lit(0.02)).unwrap();
    }
    let floor = floor.borrow();
    assert_eq!(floor.position(), Vector3::lit(0.0, -1.0, 0.0));
    assert!(floor.is_static());
}

#[test]
fn test_collisions_conserve_momentum() {
    let sphere = ColliderShape::Sphere { radius: Real::HALF };
    let light = shared(
        RigidBody::dynamic(Real::ONE)
            .unwrap()
            .with_position(Vector3::lit(-2.0, 0.0, 0.0))
            .with_velocity(Vector3::lit(3.0, 0.0, 0.0))
            .with_restitution(Real::lit(0.8))
            .with_collider(sphere),
    );
    let heavy = shared(
        RigidBody::dynamic(Real::lit(3.0))
            .unwrap()
            .with_position(Vector3::lit(2.0, 0.0, 0.0))
            .with_velocity(Vector3::lit(-1.0, 0.0, 0.0))
            .with_restitution(Real::lit(0.8))
            .with_collider(sphere),
    );

    let mut world = PhysicsWorld::with_pipeline(
        WorldConfig::default().with_gravity(Vector3::ZERO),
        ImpulseCollisionPipeline::<8>::new(),
    );
    world.add_body(&light).unwrap();
    world.add_body(&heavy).unwrap();

    let momentum = |a: &RigidBody, b: &RigidBody| (a.momentum() + b.momentum()).x.value();
    let before = momentum(&light.borrow(), &heavy.borrow());

    let mut collided = false;
    for _ in 0..200 {
        world.simulate(Real::lit(0.01)).unwrap();
        collided |= !world.pipeline().contacts().is_empty();
    }

    let (light, heavy) = (light.borrow(), heavy.borrow());
    assert!(collided);
    assert_abs_diff_eq!(momentum(&light, &heavy), before, epsilon = 1e-9);
    assert!(light.velocity().x < Real::ZERO);
    assert!(light.position().x < heavy.position().x);
}

#[test]
fn test_fixed_step_clock_drives_world() {
    let ball = drop_from(50.0);
    let mut world = PhysicsWorld::new();
    world.add_body(&ball).unwrap();

    let mut clock = FixedStepClock::new(Duration::from_millis(10));
    for _ in 0..143 {
        clock.tick(Duration::from_millis(7));
        while clock.consume_fixed_step() {
            world.simulate(clock.fixed_step_seconds()).unwrap();
        }
    }

    // 143 * 7 ms = 1.001 s
    assert_eq!(clock.tick_count(), 100);
    assert_eq!(world.step_count(), 100);
    assert_eq!(clock.accumulated(), Duration::from_millis(1));
    assert_abs_diff_eq!(world.simulation_time().value(), 1.0, epsilon = 1e-12);
}
