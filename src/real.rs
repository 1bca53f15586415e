//! Finite-only scalar.
//!
//! [`Real`] wraps an `f64` that is guaranteed to be finite. Building one from a
//! NaN or an infinity fails with [`RealError::InvalidValue`]. The arithmetic
//! operators re-check every result and panic, at the caller's location, on the
//! first non-finite value.
//!
//! Use the `checked_*` methods wherever a non-finite result is an expected,
//! recoverable outcome (validating user input, inverting a matrix that may be
//! singular).

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use thiserror::Error;

/// Failure produced when a value cannot be represented as a [`Real`].
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum RealError {
    /// The value (or the result of an operation) is NaN or infinite.
    #[error("value {value} is not finite")]
    InvalidValue {
        /// The rejected raw value.
        value: f64,
    },
    /// The divisor of a division was exactly zero.
    #[error("division by zero")]
    DivisionByZero,
}

/// A finite double-precision scalar.
///
/// Comparisons behave exactly like the native `f64` comparisons. Since the
/// value can never be NaN, the partial ordering is total in practice.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Real(f64);

#[track_caller]
fn expect_finite(value: f64, op: &'static str) -> Real {
    match Real::new(value) {
        Ok(real) => real,
        Err(err) => panic!("non-finite result from `{op}`: {err}"),
    }
}

impl Real {
    pub const ZERO: Self = Self(0.0);
    pub const ONE: Self = Self(1.0);
    pub const HALF: Self = Self(0.5);
    pub const TWO: Self = Self(2.0);
    /// Machine epsilon of the underlying `f64`.
    pub const EPSILON: Self = Self(f64::EPSILON);

    /// Wrap `value`, rejecting NaN and infinities.
    pub fn new(value: f64) -> Result<Self, RealError> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(RealError::InvalidValue { value })
        }
    }

    /// Wrap a literal.
    ///
    /// # Panics
    /// Panics if `value` is not finite. In a `const` item this is a compile
    /// error.
    pub const fn lit(value: f64) -> Self {
        assert!(value.is_finite(), "Real::lit requires a finite value");
        Self(value)
    }

    /// The wrapped `f64`.
    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, RealError> {
        Self::new(self.0 + rhs.0)
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, RealError> {
        Self::new(self.0 - rhs.0)
    }

    pub fn checked_mul(self, rhs: Self) -> Result<Self, RealError> {
        Self::new(self.0 * rhs.0)
    }

    /// Divide, failing with [`RealError::DivisionByZero`] when `rhs` is exactly
    /// zero and with [`RealError::InvalidValue`] when the quotient overflows.
    pub fn checked_div(self, rhs: Self) -> Result<Self, RealError> {
        if rhs.0 == 0.0 {
            return Err(RealError::DivisionByZero);
        }
        Self::new(self.0 / rhs.0)
    }

    /// `1 / self`, see [`Real::checked_div`].
    pub fn checked_recip(self) -> Result<Self, RealError> {
        Self::ONE.checked_div(self)
    }

    /// Square root, failing for negative inputs.
    pub fn checked_sqrt(self) -> Result<Self, RealError> {
        Self::new(self.0.sqrt())
    }

    #[inline]
    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// # Panics
    /// Panics if `self` is negative.
    #[track_caller]
    pub fn sqrt(self) -> Self {
        expect_finite(self.0.sqrt(), "sqrt")
    }

    #[inline]
    pub fn sin(self) -> Self {
        Self(self.0.sin())
    }

    #[inline]
    pub fn cos(self) -> Self {
        Self(self.0.cos())
    }

    #[track_caller]
    pub fn tan(self) -> Self {
        expect_finite(self.0.tan(), "tan")
    }

    /// # Panics
    /// Panics if `self` is outside `[-1, 1]`.
    #[track_caller]
    pub fn acos(self) -> Self {
        expect_finite(self.0.acos(), "acos")
    }

    #[inline]
    pub fn atan2(self, other: Self) -> Self {
        Self(self.0.atan2(other.0))
    }

    #[track_caller]
    pub fn powi(self, n: i32) -> Self {
        expect_finite(self.0.powi(n), "powi")
    }

    /// `-1`, `0` or `1` following the sign of the value. Zero maps to zero.
    pub fn signum(self) -> Self {
        if self.0 > 0.0 {
            Self::ONE
        } else if self.0 < 0.0 {
            -Self::ONE
        } else {
            Self::ZERO
        }
    }

    #[inline]
    pub fn min(self, other: Self) -> Self {
        if other < self {
            other
        } else {
            self
        }
    }

    #[inline]
    pub fn max(self, other: Self) -> Self {
        if other > self {
            other
        } else {
            self
        }
    }

    /// Clamp into `[lo, hi]`. `lo` wins if the bounds are inverted.
    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        self.min(hi).max(lo)
    }

    /// Clamp into `[-limit, limit]`.
    pub fn clamp_symmetric(self, limit: Self) -> Self {
        if self > limit {
            limit
        } else if self < -limit {
            -limit
        } else {
            self
        }
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<f64> for Real {
    type Error = RealError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<i32> for Real {
    fn from(value: i32) -> Self {
        Self(f64::from(value))
    }
}

impl From<u32> for Real {
    fn from(value: u32) -> Self {
        Self(f64::from(value))
    }
}

impl From<Real> for f64 {
    fn from(value: Real) -> Self {
        value.0
    }
}

impl Add for Real {
    type Output = Self;

    #[track_caller]
    fn add(self, rhs: Self) -> Self {
        expect_finite(self.0 + rhs.0, "add")
    }
}

impl Sub for Real {
    type Output = Self;

    #[track_caller]
    fn sub(self, rhs: Self) -> Self {
        expect_finite(self.0 - rhs.0, "sub")
    }
}

impl Mul for Real {
    type Output = Self;

    #[track_caller]
    fn mul(self, rhs: Self) -> Self {
        expect_finite(self.0 * rhs.0, "mul")
    }
}

impl Div for Real {
    type Output = Self;

    #[track_caller]
    fn div(self, rhs: Self) -> Self {
        match self.checked_div(rhs) {
            Ok(quotient) => quotient,
            Err(err) => panic!("`div` failed: {err}"),
        }
    }
}

impl Neg for Real {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl AddAssign for Real {
    #[track_caller]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Real {
    #[track_caller]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for Real {
    #[track_caller]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl DivAssign for Real {
    #[track_caller]
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl Sum for Real {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}
