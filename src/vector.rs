//! 2D, 3D and 4D vectors over [`Real`].
//!
//! All three share one implementation of the componentwise arithmetic, dot
//! product, length and normalization, generated by `impl_vector!`. Ordering is
//! lexicographic on the components (x first).
//!
//! # Normalization
//! A vector whose squared length is at or below [`NORMALIZE_EPSILON`] has no
//! usable direction. [`Vector3::try_normalize`] reports that as `None`,
//! [`Vector3::normalized`] returns the input unchanged, and
//! [`Vector3::normalize_or`] substitutes the caller's fallback. Matrix
//! orthonormalization uses the same predicate.

use core::fmt;
use core::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::constants::NORMALIZE_EPSILON;
use crate::real::{Real, RealError};

macro_rules! impl_vector {
    ($name:ident, $n:literal, { $($field:ident => $idx:literal),+ }) => {
        impl $name {
            pub const ZERO: Self = Self { $($field: Real::ZERO),+ };

            /// Build from raw components, rejecting non-finite values.
            pub fn from_array(values: [f64; $n]) -> Result<Self, RealError> {
                Ok(Self { $($field: Real::new(values[$idx])?),+ })
            }

            pub fn to_array(self) -> [Real; $n] {
                [$(self.$field),+]
            }

            pub fn to_f64_array(self) -> [f64; $n] {
                [$(self.$field.value()),+]
            }

            pub fn dot(self, rhs: Self) -> Real {
                Real::ZERO $(+ self.$field * rhs.$field)+
            }

            pub fn length_squared(self) -> Real {
                self.dot(self)
            }

            pub fn length(self) -> Real {
                self.length_squared().sqrt()
            }

            /// Unit vector in the same direction, or `None` when the vector is
            /// too short to have one.
            pub fn try_normalize(self) -> Option<Self> {
                let length_squared = self.length_squared();
                if length_squared <= NORMALIZE_EPSILON {
                    return None;
                }
                let length = length_squared.sqrt();
                Some(Self { $($field: self.$field / length),+ })
            }

            /// Unit vector in the same direction. Degenerate vectors are
            /// returned unchanged.
            pub fn normalized(self) -> Self {
                self.try_normalize().unwrap_or(self)
            }

            pub fn normalize_or(self, fallback: Self) -> Self {
                self.try_normalize().unwrap_or(fallback)
            }

            pub fn component_mul(self, rhs: Self) -> Self {
                Self { $($field: self.$field * rhs.$field),+ }
            }

            /// # Panics
            /// Panics if a component of `rhs` is zero.
            #[track_caller]
            pub fn component_div(self, rhs: Self) -> Self {
                Self { $($field: self.$field / rhs.$field),+ }
            }

            pub fn map(self, f: impl Fn(Real) -> Real) -> Self {
                Self { $($field: f(self.$field)),+ }
            }

            /// Angle in radians between the two vectors, zero if either has
            /// no length.
            pub fn angle_between(self, rhs: Self) -> Real {
                let denominator = self.length() * rhs.length();
                if denominator.is_zero() {
                    return Real::ZERO;
                }
                (self.dot(rhs) / denominator).clamp(-Real::ONE, Real::ONE).acos()
            }

            pub fn is_finite(&self) -> bool {
                true $(&& self.$field.value().is_finite())+
            }
        }

        impl TryFrom<[f64; $n]> for $name {
            type Error = RealError;

            fn try_from(values: [f64; $n]) -> Result<Self, Self::Error> {
                Self::from_array(values)
            }
        }

        impl From<[Real; $n]> for $name {
            fn from(values: [Real; $n]) -> Self {
                Self { $($field: values[$idx]),+ }
            }
        }

        impl From<$name> for [Real; $n] {
            fn from(value: $name) -> Self {
                value.to_array()
            }
        }

        impl Index<usize> for $name {
            type Output = Real;

            fn index(&self, index: usize) -> &Real {
                match index {
                    $($idx => &self.$field,)+
                    _ => panic!("{} index {index} out of range", stringify!($name)),
                }
            }
        }

        impl IndexMut<usize> for $name {
            fn index_mut(&mut self, index: usize) -> &mut Real {
                match index {
                    $($idx => &mut self.$field,)+
                    _ => panic!("{} index {index} out of range", stringify!($name)),
                }
            }
        }

        impl Add for $name {
            type Output = Self;

            #[track_caller]
            fn add(self, rhs: Self) -> Self {
                Self { $($field: self.$field + rhs.$field),+ }
            }
        }

        impl Sub for $name {
            type Output = Self;

            #[track_caller]
            fn sub(self, rhs: Self) -> Self {
                Self { $($field: self.$field - rhs.$field),+ }
            }
        }

        impl Neg for $name {
            type Output = Self;

            fn neg(self) -> Self {
                Self { $($field: -self.$field),+ }
            }
        }

        impl Mul<Real> for $name {
            type Output = Self;

            #[track_caller]
            fn mul(self, rhs: Real) -> Self {
                Self { $($field: self.$field * rhs),+ }
            }
        }

        impl Mul<$name> for Real {
            type Output = $name;

            #[track_caller]
            fn mul(self, rhs: $name) -> $name {
                rhs * self
            }
        }

        impl Div<Real> for $name {
            type Output = Self;

            #[track_caller]
            fn div(self, rhs: Real) -> Self {
                Self { $($field: self.$field / rhs),+ }
            }
        }

        impl AddAssign for $name {
            #[track_caller]
            fn add_assign(&mut self, rhs: Self) {
                *self = *self + rhs;
            }
        }

        impl SubAssign for $name {
            #[track_caller]
            fn sub_assign(&mut self, rhs: Self) {
                *self = *self - rhs;
            }
        }

        impl MulAssign<Real> for $name {
            #[track_caller]
            fn mul_assign(&mut self, rhs: Real) {
                *self = *self * rhs;
            }
        }

        impl DivAssign<Real> for $name {
            #[track_caller]
            fn div_assign(&mut self, rhs: Real) {
                *self = *self / rhs;
            }
        }
    };
}

/// Two-component vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Vector2 {
    pub x: Real,
    pub y: Real,
}

/// Three-component vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Vector3 {
    pub x: Real,
    pub y: Real,
    pub z: Real,
}

/// Four-component vector, used for homogeneous coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Vector4 {
    pub x: Real,
    pub y: Real,
    pub z: Real,
    pub w: Real,
}

impl_vector!(Vector2, 2, { x => 0, y => 1 });
impl_vector!(Vector3, 3, { x => 0, y => 1, z => 2 });
impl_vector!(Vector4, 4, { x => 0, y => 1, z => 2, w => 3 });

impl Vector2 {
    pub const X: Self = Self { x: Real::ONE, y: Real::ZERO };
    pub const Y: Self = Self { x: Real::ZERO, y: Real::ONE };

    pub const fn new(x: Real, y: Real) -> Self {
        Self { x, y }
    }

    /// The z component of the 3D cross product of the two vectors.
    pub fn cross(self, rhs: Self) -> Real {
        self.x * rhs.y - self.y * rhs.x
    }

    /// Counter-clockwise perpendicular.
    pub fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }
}

impl Vector3 {
    pub const X: Self = Self { x: Real::ONE, y: Real::ZERO, z: Real::ZERO };
    pub const Y: Self = Self { x: Real::ZERO, y: Real::ONE, z: Real::ZERO };
    pub const Z: Self = Self { x: Real::ZERO, y: Real::ZERO, z: Real::ONE };

    pub const fn new(x: Real, y: Real, z: Real) -> Self {
        Self { x, y, z }
    }

    /// Build from literals.
    ///
    /// # Panics
    /// Panics if any component is not finite.
    pub const fn lit(x: f64, y: f64, z: f64) -> Self {
        Self::new(Real::lit(x), Real::lit(y), Real::lit(z))
    }

    pub fn cross(self, rhs: Self) -> Self {
        Self {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    /// A unit vector orthogonal to `self`, built from the basis axis `self`
    /// is least aligned with.
    pub fn any_orthonormal(self) -> Self {
        let ax = self.x.abs();
        let ay = self.y.abs();
        let az = self.z.abs();
        let axis = if ax <= ay && ax <= az {
            Self::X
        } else if ay <= az {
            Self::Y
        } else {
            Self::Z
        };
        let unit = self.normalize_or(Self::ZERO);
        (axis - unit * unit.dot(axis)).normalize_or(axis)
    }

    pub fn extend(self, w: Real) -> Vector4 {
        Vector4::new(self.x, self.y, self.z, w)
    }
}

impl Vector4 {
    pub const fn new(x: Real, y: Real, z: Real, w: Real) -> Self {
        Self { x, y, z, w }
    }

    pub fn truncate(self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl fmt::Display for Vector4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.z, self.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn v3(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::lit(x, y, z)
    }

    #[test]
    fn test_from_array_rejects_nan() {
        assert!(Vector3::from_array([0.0, f64::NAN, 1.0]).is_err());
        assert!(Vector2::try_from([f64::INFINITY, 0.0]).is_err());
        assert_eq!(Vector3::from_array([1.0, 2.0, 3.0]).unwrap(), v3(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_dot_and_cross() {
        let a = v3(1.0, 0.0, 0.0);
        let b = v3(0.0, 1.0, 0.0);
        assert_eq!(a.dot(b), Real::ZERO);
        assert_eq!(a.cross(b), Vector3::Z);
        assert_eq!(b.cross(a), -Vector3::Z);
        assert_eq!(v3(1.0, 2.0, 3.0).dot(v3(4.0, 5.0, 6.0)).value(), 32.0);
    }

    #[test]
    fn test_length() {
        let v = v3(3.0, 4.0, 0.0);
        assert_eq!(v.length_squared().value(), 25.0);
        assert_eq!(v.length().value(), 5.0);
    }

    #[test]
    fn test_normalize() {
        let n = v3(0.0, 3.0, 4.0).normalized();
        assert_abs_diff_eq!(n.length().value(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(n.y.value(), 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(n.z.value(), 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_degenerate_policy() {
        let tiny = v3(1e-9, 0.0, 0.0);
        assert!(tiny.try_normalize().is_none());
        assert_eq!(tiny.normalized(), tiny);
        assert_eq!(Vector3::ZERO.normalized(), Vector3::ZERO);
        assert_eq!(Vector3::ZERO.normalize_or(Vector3::Y), Vector3::Y);
    }

    #[test]
    fn test_componentwise_ops() {
        let a = v3(1.0, 2.0, 3.0);
        let b = v3(2.0, 4.0, 6.0);
        assert_eq!(a + a, b);
        assert_eq!(b - a, a);
        assert_eq!(a * Real::TWO, b);
        assert_eq!(Real::TWO * a, b);
        assert_eq!(b / Real::TWO, a);
        assert_eq!(a.component_mul(b), v3(2.0, 8.0, 18.0));
        assert_eq!(b.component_div(a), v3(2.0, 2.0, 2.0));

        let mut c = a;
        c += a;
        c -= a;
        c *= Real::TWO;
        assert_eq!(c, b);
    }

    #[test]
    fn test_indexing() {
        let mut v = Vector4::new(Real::ONE, Real::TWO, Real::lit(3.0), Real::lit(4.0));
        assert_eq!(v[3].value(), 4.0);
        v[0] = Real::lit(9.0);
        assert_eq!(v.x.value(), 9.0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_index_out_of_range() {
        let v = Vector2::ZERO;
        let _ = v[2];
    }

    #[test]
    fn test_lexicographic_ordering() {
        assert!(v3(1.0, 5.0, 5.0) < v3(2.0, 0.0, 0.0));
        assert!(v3(1.0, 1.0, 5.0) < v3(1.0, 2.0, 0.0));
        assert!(v3(1.0, 1.0, 1.0) <= v3(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_vector2_cross_is_scalar() {
        let a = Vector2::X;
        let b = Vector2::Y;
        assert_eq!(a.cross(b), Real::ONE);
        assert_eq!(a.perp(), b);
    }

    #[test]
    fn test_angle_between() {
        let angle = Vector3::X.angle_between(Vector3::Y);
        assert_abs_diff_eq!(angle.value(), core::f64::consts::FRAC_PI_2, epsilon = 1e-12);
        assert_eq!(Vector3::ZERO.angle_between(Vector3::X), Real::ZERO);
    }

    #[test]
    fn test_any_orthonormal() {
        for v in [v3(1.0, 0.0, 0.0), v3(0.3, -2.0, 0.1), v3(0.0, 0.0, 5.0)] {
            let o = v.any_orthonormal();
            assert_abs_diff_eq!(o.length().value(), 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(o.dot(v).value(), 0.0, epsilon = 1e-12);
        }
    }
}
