//! Newton's Cradle demo
//!
//! A row of touching, perfectly elastic spheres in zero gravity. The leftmost
//! ball is launched into the row; momentum travels through the chain and the
//! rightmost ball leaves with it. Runs headless from a fixed-step clock and
//! prints the velocities a few times per simulated second.
//!
//! Run with: cargo run --example newtons_cradle

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use rigid_dynamics::prelude::*;

const BALLS: usize = 5;
const RADIUS: f64 = 0.5;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = WorldConfig::default().with_gravity(Vector3::ZERO);
    let mut world = PhysicsWorld::with_pipeline(config, ImpulseCollisionPipeline::<16>::new());

    let mut balls = Vec::with_capacity(BALLS);
    for i in 0..BALLS {
        let x = 2.0 * RADIUS * i as f64;
        let ball = RigidBody::dynamic(Real::ONE)?
            .with_position(Vector3::lit(x, 0.0, 0.0))
            .with_sphere_inertia(Real::lit(RADIUS))
            .with_restitution(Real::ONE)
            .with_collider(ColliderShape::Sphere {
                radius: Real::lit(RADIUS),
            });
        let ball = Rc::new(RefCell::new(ball));
        world.add_body(&ball)?;
        balls.push(ball);
    }

    // Pull the first ball back and let it go.
    {
        let mut first = balls[0].borrow_mut();
        first.set_position(Vector3::lit(-1.0, 0.0, 0.0))?;
        first.set_velocity(Vector3::lit(2.0, 0.0, 0.0))?;
    }

    let mut clock = FixedStepClock::new(Duration::from_millis(5));
    let frame = Duration::from_millis(16);
    for frame_index in 0..120 {
        clock.tick(frame);
        while clock.consume_fixed_step() {
            world.simulate(clock.fixed_step_seconds())?;
        }
        if frame_index % 15 == 0 {
            print_row(&world, &balls);
        }
    }

    let total: f64 = balls
        .iter()
        .map(|b| b.borrow().momentum().x.value())
        .sum();
    println!(
        "t={:.3}s steps={} total momentum={total:.6}",
        world.simulation_time().value(),
        world.step_count()
    );
    Ok(())
}

fn print_row(
    world: &PhysicsWorld<ImpulseCollisionPipeline<16>>,
    balls: &[Rc<RefCell<RigidBody>>],
) {
    let velocities: Vec<String> = balls
        .iter()
        .map(|b| format!("{:+.2}", b.borrow().velocity().x.value()))
        .collect();
    println!(
        "t={:.3}s contacts={} v=[{}]",
        world.simulation_time().value(),
        world.pipeline().contacts().len(),
        velocities.join(", ")
    );
}
