//! Fixed-step accumulator for driving [`PhysicsWorld::simulate`](crate::world::PhysicsWorld::simulate)
//! from a variable-rate frame loop.
//!
//! Each frame adds the elapsed wall-clock time to the accumulator
//! ([`FixedStepClock::begin_frame`]); the loop then runs one physics step per
//! whole fixed step available ([`FixedStepClock::consume_fixed_step`]). Time
//! is kept as [`Duration`], so the accounting itself never drifts.
//!
//! ```
//! use std::time::Duration;
//! use rigid_dynamics::FixedStepClock;
//!
//! let mut clock = FixedStepClock::new(Duration::from_millis(10));
//! clock.tick(Duration::from_millis(25));
//! let mut steps = 0;
//! while clock.consume_fixed_step() {
//!     steps += 1;
//! }
//! assert_eq!(steps, 2);
//! assert_eq!(clock.accumulated(), Duration::from_millis(5));
//! ```

use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use crate::real::Real;

#[derive(Debug, Clone)]
pub struct FixedStepClock {
    fixed_step: Duration,
    accumulated: Duration,
    tick_count: u64,
    start: Instant,
    last_frame: Instant,
}

impl Default for FixedStepClock {
    /// 60 steps per second.
    fn default() -> Self {
        Self::new(Duration::from_secs(1) / 60)
    }
}

impl FixedStepClock {
    /// A clock consuming time in increments of `fixed_step`. A zero step never
    /// consumes anything.
    pub fn new(fixed_step: Duration) -> Self {
        let now = Instant::now();
        Self {
            fixed_step,
            accumulated: Duration::ZERO,
            tick_count: 0,
            start: now,
            last_frame: now,
        }
    }

    pub fn from_tick_rate(ticks_per_second: NonZeroU32) -> Self {
        Self::new(Duration::from_secs(1) / ticks_per_second.get())
    }

    pub fn fixed_step(&self) -> Duration {
        self.fixed_step
    }

    /// The fixed step in seconds, ready to pass to `simulate`.
    pub fn fixed_step_seconds(&self) -> Real {
        Real::new(self.fixed_step.as_secs_f64()).unwrap_or(Real::ZERO)
    }

    /// Steps per second, zero for a zero step.
    pub fn tick_rate(&self) -> f64 {
        if self.fixed_step.is_zero() {
            0.0
        } else {
            1.0 / self.fixed_step.as_secs_f64()
        }
    }

    /// Add the wall-clock time since the previous frame to the accumulator
    /// and return it.
    pub fn begin_frame(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.tick(delta);
        delta
    }

    /// Add `delta` to the accumulator without touching the wall clock.
    pub fn tick(&mut self, delta: Duration) {
        self.accumulated = self.accumulated.saturating_add(delta);
    }

    /// Take one fixed step out of the accumulator. Returns `false`, consuming
    /// nothing, if less than a full step is available.
    pub fn consume_fixed_step(&mut self) -> bool {
        if self.fixed_step.is_zero() || self.accumulated < self.fixed_step {
            return false;
        }
        self.accumulated -= self.fixed_step;
        self.tick_count += 1;
        true
    }

    /// Time waiting in the accumulator.
    pub fn accumulated(&self) -> Duration {
        self.accumulated
    }

    /// Fraction of a fixed step left in the accumulator, for interpolating
    /// rendered poses between steps.
    pub fn overstep_fraction(&self) -> f64 {
        if self.fixed_step.is_zero() {
            0.0
        } else {
            self.accumulated.as_secs_f64() / self.fixed_step.as_secs_f64()
        }
    }

    pub fn reset_accumulator(&mut self) {
        self.accumulated = Duration::ZERO;
    }

    /// Fixed steps consumed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Wall-clock time since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumes_whole_steps_only() {
        let mut clock = FixedStepClock::new(Duration::from_millis(10));
        clock.tick(Duration::from_millis(9));
        assert!(!clock.consume_fixed_step());
        assert_eq!(clock.accumulated(), Duration::from_millis(9));

        clock.tick(Duration::from_millis(1));
        assert!(clock.consume_fixed_step());
        assert!(!clock.consume_fixed_step());
        assert_eq!(clock.accumulated(), Duration::ZERO);
        assert_eq!(clock.tick_count(), 1);
    }

    #[test]
    fn test_remainder_carries_over() {
        let mut clock = FixedStepClock::new(Duration::from_millis(10));
        let mut steps = 0;
        for _ in 0..3 {
            clock.tick(Duration::from_millis(7));
            while clock.consume_fixed_step() {
                steps += 1;
            }
        }
        assert_eq!(steps, 2);
        assert_eq!(clock.accumulated(), Duration::from_millis(1));
        assert!((clock.overstep_fraction() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_zero_step_never_consumes() {
        let mut clock = FixedStepClock::new(Duration::ZERO);
        clock.tick(Duration::from_secs(1));
        assert!(!clock.consume_fixed_step());
        assert_eq!(clock.tick_rate(), 0.0);
        assert_eq!(clock.overstep_fraction(), 0.0);
    }

    #[test]
    fn test_reset_accumulator() {
        let mut clock = FixedStepClock::default();
        clock.tick(Duration::from_secs(2));
        clock.reset_accumulator();
        assert_eq!(clock.accumulated(), Duration::ZERO);
        assert!(!clock.consume_fixed_step());
    }

    #[test]
    fn test_tick_rate() {
        let clock = FixedStepClock::from_tick_rate(NonZeroU32::new(100).unwrap());
        assert_eq!(clock.fixed_step(), Duration::from_millis(10));
        assert!((clock.tick_rate() - 100.0).abs() < 1e-9);
        assert_eq!(clock.fixed_step_seconds().value(), 0.01);
    }

    #[test]
    fn test_begin_frame_accumulates_wall_time() {
        let mut clock = FixedStepClock::new(Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(3));
        let delta = clock.begin_frame();
        assert!(delta >= Duration::from_millis(3));
        assert_eq!(clock.accumulated(), delta);
        assert!(clock.elapsed() >= delta);
    }

    #[test]
    fn test_independent_clocks() {
        let mut a = FixedStepClock::new(Duration::from_millis(10));
        let b = FixedStepClock::new(Duration::from_millis(10));
        a.tick(Duration::from_millis(50));
        assert_eq!(b.accumulated(), Duration::ZERO);
    }
}
