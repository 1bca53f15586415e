//! Mathematical and physical constants in SI units.

use crate::real::Real;

pub const PI: Real = Real::lit(core::f64::consts::PI);
pub const TAU: Real = Real::lit(core::f64::consts::TAU);
pub const HALF_PI: Real = Real::lit(core::f64::consts::FRAC_PI_2);

pub const DEG_TO_RAD: Real = Real::lit(core::f64::consts::PI / 180.0);
pub const RAD_TO_DEG: Real = Real::lit(180.0 / core::f64::consts::PI);

/// Standard gravitational acceleration at the Earth's surface (m/s²).
pub const G: Real = Real::lit(9.80665);

/// Squared length at or below which a vector is treated as having no
/// direction. Shared by vector normalization and matrix orthonormalization.
pub const NORMALIZE_EPSILON: Real = Real::lit(1e-12);
