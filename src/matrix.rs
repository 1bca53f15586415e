//! Row-major 3x3 and 4x4 matrices over [`Real`].
//!
//! [`Matrix3`] carries the rotation machinery the integrator needs: the
//! skew-symmetric cross-product matrix of a vector, its exponential map
//! (Rodrigues), and Gram-Schmidt re-orthonormalization. [`Matrix4`] builds the
//! affine model matrices handed to a renderer.
//!
//! Inversion is computed on the raw `f64` values and validated at the end, so a
//! singular or badly conditioned matrix yields `None` instead of panicking in
//! the middle of the elimination.

use core::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::real::{Real, RealError};
use crate::vector::{Vector3, Vector4};

macro_rules! impl_elementwise {
    ($name:ident, $n:literal) => {
        impl $name {
            pub const ZERO: Self = Self { m: [[Real::ZERO; $n]; $n] };

            pub const fn from_rows(m: [[Real; $n]; $n]) -> Self {
                Self { m }
            }

            pub const fn rows(&self) -> &[[Real; $n]; $n] {
                &self.m
            }

            /// Build from `N*N` values in row-major order, rejecting non-finite
            /// entries.
            pub fn from_row_major(values: &[f64]) -> Result<Self, RealError> {
                let mut out = Self::ZERO;
                for (i, value) in values.iter().take($n * $n).enumerate() {
                    out.m[i / $n][i % $n] = Real::new(*value)?;
                }
                Ok(out)
            }

            pub fn to_row_major(&self) -> [f64; $n * $n] {
                let mut out = [0.0; $n * $n];
                for (i, slot) in out.iter_mut().enumerate() {
                    *slot = self.m[i / $n][i % $n].value();
                }
                out
            }

            #[inline]
            pub fn get(&self, row: usize, col: usize) -> Real {
                self.m[row][col]
            }

            #[inline]
            pub fn set(&mut self, row: usize, col: usize, value: Real) {
                self.m[row][col] = value;
            }

            pub fn transpose(&self) -> Self {
                let mut out = Self::ZERO;
                for r in 0..$n {
                    for c in 0..$n {
                        out.m[c][r] = self.m[r][c];
                    }
                }
                out
            }

            pub fn trace(&self) -> Real {
                (0..$n).map(|i| self.m[i][i]).sum()
            }

            /// Largest absolute entry.
            pub fn max_abs(&self) -> Real {
                self.m
                    .iter()
                    .flatten()
                    .fold(Real::ZERO, |acc, v| acc.max(v.abs()))
            }

            pub fn is_zero(&self) -> bool {
                self.m.iter().flatten().all(|v| v.is_zero())
            }

            fn zip_with(&self, rhs: &Self, f: impl Fn(Real, Real) -> Real) -> Self {
                let mut out = Self::ZERO;
                for r in 0..$n {
                    for c in 0..$n {
                        out.m[r][c] = f(self.m[r][c], rhs.m[r][c]);
                    }
                }
                out
            }

            fn map(&self, f: impl Fn(Real) -> Real) -> Self {
                let mut out = Self::ZERO;
                for r in 0..$n {
                    for c in 0..$n {
                        out.m[r][c] = f(self.m[r][c]);
                    }
                }
                out
            }

            fn matmul(&self, rhs: &Self) -> Self {
                let mut out = Self::ZERO;
                for r in 0..$n {
                    for c in 0..$n {
                        let mut acc = Real::ZERO;
                        for k in 0..$n {
                            acc += self.m[r][k] * rhs.m[k][c];
                        }
                        out.m[r][c] = acc;
                    }
                }
                out
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::IDENTITY
            }
        }

        impl From<[[Real; $n]; $n]> for $name {
            fn from(m: [[Real; $n]; $n]) -> Self {
                Self { m }
            }
        }

        impl Index<(usize, usize)> for $name {
            type Output = Real;

            fn index(&self, (row, col): (usize, usize)) -> &Real {
                &self.m[row][col]
            }
        }

        impl IndexMut<(usize, usize)> for $name {
            fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Real {
                &mut self.m[row][col]
            }
        }

        impl Add for $name {
            type Output = Self;

            #[track_caller]
            fn add(self, rhs: Self) -> Self {
                self.zip_with(&rhs, |a, b| a + b)
            }
        }

        impl Sub for $name {
            type Output = Self;

            #[track_caller]
            fn sub(self, rhs: Self) -> Self {
                self.zip_with(&rhs, |a, b| a - b)
            }
        }

        impl Neg for $name {
            type Output = Self;

            fn neg(self) -> Self {
                self.map(|a| -a)
            }
        }

        impl Mul for $name {
            type Output = Self;

            #[track_caller]
            fn mul(self, rhs: Self) -> Self {
                self.matmul(&rhs)
            }
        }

        impl Mul<Real> for $name {
            type Output = Self;

            #[track_caller]
            fn mul(self, rhs: Real) -> Self {
                self.map(|a| a * rhs)
            }
        }

        impl Div<Real> for $name {
            type Output = Self;

            #[track_caller]
            fn div(self, rhs: Real) -> Self {
                self.map(|a| a / rhs)
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

        impl MulAssign for $name {
            #[track_caller]
            fn mul_assign(&mut self, rhs: Self) {
                *self = *self * rhs;
            }
        }

        impl MulAssign<Real> for $name {
            #[track_caller]
            fn mul_assign(&mut self, rhs: Real) {
                *self = *self * rhs;
            }
        }
    };
}

/// 3x3 matrix stored row-major.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix3 {
    m: [[Real; 3]; 3],
}

/// 4x4 matrix stored row-major. Points are column vectors, so the translation
/// lives in the last column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix4 {
    m: [[Real; 4]; 4],
}

impl_elementwise!(Matrix3, 3);
impl_elementwise!(Matrix4, 4);

impl Matrix3 {
    pub const IDENTITY: Self = Self {
        m: [
            [Real::ONE, Real::ZERO, Real::ZERO],
            [Real::ZERO, Real::ONE, Real::ZERO],
            [Real::ZERO, Real::ZERO, Real::ONE],
        ],
    };

    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        m00: Real,
        m01: Real,
        m02: Real,
        m10: Real,
        m11: Real,
        m12: Real,
        m20: Real,
        m21: Real,
        m22: Real,
    ) -> Self {
        Self {
            m: [[m00, m01, m02], [m10, m11, m12], [m20, m21, m22]],
        }
    }

    pub fn from_columns(c0: Vector3, c1: Vector3, c2: Vector3) -> Self {
        Self::new(c0.x, c1.x, c2.x, c0.y, c1.y, c2.y, c0.z, c1.z, c2.z)
    }

    pub fn from_diagonal(d: Vector3) -> Self {
        let mut out = Self::ZERO;
        out.m[0][0] = d.x;
        out.m[1][1] = d.y;
        out.m[2][2] = d.z;
        out
    }

    pub fn row(&self, i: usize) -> Vector3 {
        Vector3::new(self.m[i][0], self.m[i][1], self.m[i][2])
    }

    pub fn column(&self, i: usize) -> Vector3 {
        Vector3::new(self.m[0][i], self.m[1][i], self.m[2][i])
    }

    pub fn set_row(&mut self, i: usize, v: Vector3) {
        self.m[i] = [v.x, v.y, v.z];
    }

    pub fn set_column(&mut self, i: usize, v: Vector3) {
        self.m[0][i] = v.x;
        self.m[1][i] = v.y;
        self.m[2][i] = v.z;
    }

    pub fn determinant(&self) -> Real {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Closed-form cofactor inverse.
    ///
    /// Returns `None` when the determinant is zero relative to the magnitude
    /// of the entries, or when any entry of the inverse would not be finite.
    pub fn try_inverse(&self) -> Option<Self> {
        let m = self.to_row_major();
        let scale = self.max_abs().value();
        if scale == 0.0 {
            return None;
        }

        let c00 = m[4] * m[8] - m[5] * m[7];
        let c01 = m[5] * m[6] - m[3] * m[8];
        let c02 = m[3] * m[7] - m[4] * m[6];
        let det = m[0] * c00 + m[1] * c01 + m[2] * c02;
        if !det.is_finite() || det.abs() <= f64::EPSILON * scale * scale * scale {
            return None;
        }

        let inv_det = 1.0 / det;
        let raw = [
            c00 * inv_det,
            (m[2] * m[7] - m[1] * m[8]) * inv_det,
            (m[1] * m[5] - m[2] * m[4]) * inv_det,
            c01 * inv_det,
            (m[0] * m[8] - m[2] * m[6]) * inv_det,
            (m[2] * m[3] - m[0] * m[5]) * inv_det,
            c02 * inv_det,
            (m[1] * m[6] - m[0] * m[7]) * inv_det,
            (m[0] * m[4] - m[1] * m[3]) * inv_det,
        ];
        Self::from_row_major(&raw).ok()
    }

    /// Inverse, or the zero matrix if `self` is singular.
    pub fn inverse_or_zero(&self) -> Self {
        self.try_inverse().unwrap_or(Self::ZERO)
    }

    /// The cross-product matrix of `v`: `skew(v) * u == v.cross(u)`.
    pub fn skew(v: Vector3) -> Self {
        Self::new(
            Real::ZERO,
            -v.z,
            v.y,
            v.z,
            Real::ZERO,
            -v.x,
            -v.y,
            v.x,
            Real::ZERO,
        )
    }

    /// Axis vector of a skew-symmetric matrix, inverse of [`Matrix3::skew`].
    pub fn unskew(&self) -> Vector3 {
        Vector3::new(self.m[2][1], self.m[0][2], self.m[1][0])
    }

    /// Exponential map of a skew-symmetric matrix.
    ///
    /// With `θ = |ω|`, `exp(S) = I + (sin θ / θ) S + ((1 - cos θ) / θ²) S²`.
    /// Below `θ² < f64::EPSILON` the coefficients come from their Taylor
    /// series to avoid dividing by a vanishing angle.
    pub fn exp(skew: &Self) -> Self {
        let theta_squared = skew.unskew().length_squared();
        let skew_squared = *skew * *skew;

        let (sin_term, cos_term) = if theta_squared.value() < f64::EPSILON {
            (
                Real::ONE - theta_squared / Real::lit(6.0),
                Real::HALF - theta_squared / Real::lit(24.0),
            )
        } else {
            let theta = theta_squared.sqrt();
            (
                theta.sin() / theta,
                (Real::ONE - theta.cos()) / theta_squared,
            )
        };

        Self::IDENTITY + *skew * sin_term + skew_squared * cos_term
    }

    /// Rotation about the X axis by `angle` radians.
    pub fn rotation_x(angle: Real) -> Self {
        let (s, c) = (angle.sin(), angle.cos());
        Self::new(
            Real::ONE,
            Real::ZERO,
            Real::ZERO,
            Real::ZERO,
            c,
            -s,
            Real::ZERO,
            s,
            c,
        )
    }

    /// Rotation about the Y axis by `angle` radians.
    pub fn rotation_y(angle: Real) -> Self {
        let (s, c) = (angle.sin(), angle.cos());
        Self::new(
            c,
            Real::ZERO,
            s,
            Real::ZERO,
            Real::ONE,
            Real::ZERO,
            -s,
            Real::ZERO,
            c,
        )
    }

    /// Rotation about the Z axis by `angle` radians.
    pub fn rotation_z(angle: Real) -> Self {
        let (s, c) = (angle.sin(), angle.cos());
        Self::new(
            c,
            -s,
            Real::ZERO,
            s,
            c,
            Real::ZERO,
            Real::ZERO,
            Real::ZERO,
            Real::ONE,
        )
    }

    /// Rotation of `angle` radians about `axis`. A degenerate axis yields the
    /// identity.
    pub fn from_axis_angle(axis: Vector3, angle: Real) -> Self {
        match axis.try_normalize() {
            Some(unit) => Self::exp(&Self::skew(unit * angle)),
            None => Self::IDENTITY,
        }
    }

    /// Re-orthonormalize the columns in place with Gram-Schmidt.
    ///
    /// Column 0 is normalized, column 1 has its column-0 component removed and
    /// is normalized, column 2 becomes `c0 × c1`. A column that collapses below
    /// [`NORMALIZE_EPSILON`](crate::constants::NORMALIZE_EPSILON) is replaced:
    /// column 0 by +X, column 1 by the basis axis least aligned with column 0
    /// (made orthogonal to it).
    pub fn orthonormalize(&mut self) {
        let c0 = self.column(0).try_normalize().unwrap_or(Vector3::X);

        let c1 = self.column(1);
        let c1 = (c1 - c0 * c0.dot(c1))
            .try_normalize()
            .unwrap_or_else(|| c0.any_orthonormal());

        let c2 = c0.cross(c1).normalize_or(Vector3::Z);

        self.set_column(0, c0);
        self.set_column(1, c1);
        self.set_column(2, c2);
    }

    pub fn orthonormalized(mut self) -> Self {
        self.orthonormalize();
        self
    }

    /// Largest deviation of `selfᵀ · self` from the identity. Zero for an
    /// exact rotation.
    pub fn orthonormality_error(&self) -> Real {
        (self.transpose() * *self - Self::IDENTITY).max_abs()
    }

    pub fn is_orthonormal(&self, tolerance: Real) -> bool {
        self.orthonormality_error() <= tolerance
    }
}

impl Mul<Vector3> for Matrix3 {
    type Output = Vector3;

    #[track_caller]
    fn mul(self, v: Vector3) -> Vector3 {
        Vector3::new(self.row(0).dot(v), self.row(1).dot(v), self.row(2).dot(v))
    }
}

impl Matrix4 {
    pub const IDENTITY: Self = Self {
        m: [
            [Real::ONE, Real::ZERO, Real::ZERO, Real::ZERO],
            [Real::ZERO, Real::ONE, Real::ZERO, Real::ZERO],
            [Real::ZERO, Real::ZERO, Real::ONE, Real::ZERO],
            [Real::ZERO, Real::ZERO, Real::ZERO, Real::ONE],
        ],
    };

    pub fn row(&self, i: usize) -> Vector4 {
        Vector4::from(self.m[i])
    }

    pub fn column(&self, i: usize) -> Vector4 {
        Vector4::new(self.m[0][i], self.m[1][i], self.m[2][i], self.m[3][i])
    }

    pub fn translation(t: Vector3) -> Self {
        let mut out = Self::IDENTITY;
        out.m[0][3] = t.x;
        out.m[1][3] = t.y;
        out.m[2][3] = t.z;
        out
    }

    pub fn scale(s: Vector3) -> Self {
        let mut out = Self::IDENTITY;
        out.m[0][0] = s.x;
        out.m[1][1] = s.y;
        out.m[2][2] = s.z;
        out
    }

    /// Embed a 3x3 rotation (or any linear map) in the upper-left block.
    pub fn from_rotation(r: &Matrix3) -> Self {
        Self::from_rotation_translation(r, Vector3::ZERO)
    }

    /// The model matrix `T · R`: rotate, then translate.
    pub fn from_rotation_translation(r: &Matrix3, t: Vector3) -> Self {
        let mut out = Self::translation(t);
        for row in 0..3 {
            for col in 0..3 {
                out.m[row][col] = r.get(row, col);
            }
        }
        out
    }

    pub fn rotation_x(angle: Real) -> Self {
        Self::from_rotation(&Matrix3::rotation_x(angle))
    }

    pub fn rotation_y(angle: Real) -> Self {
        Self::from_rotation(&Matrix3::rotation_y(angle))
    }

    pub fn rotation_z(angle: Real) -> Self {
        Self::from_rotation(&Matrix3::rotation_z(angle))
    }

    /// Upper-left 3x3 block.
    pub fn linear_part(&self) -> Matrix3 {
        let mut out = Matrix3::ZERO;
        for row in 0..3 {
            for col in 0..3 {
                out.set(row, col, self.m[row][col]);
            }
        }
        out
    }

    pub fn translation_part(&self) -> Vector3 {
        Vector3::new(self.m[0][3], self.m[1][3], self.m[2][3])
    }

    fn minor(&self, skip_row: usize, skip_col: usize) -> Matrix3 {
        let mut out = Matrix3::ZERO;
        let rows = (0..4).filter(|r| *r != skip_row);
        for (dr, r) in rows.enumerate() {
            let cols = (0..4).filter(|c| *c != skip_col);
            for (dc, c) in cols.enumerate() {
                out.set(dr, dc, self.m[r][c]);
            }
        }
        out
    }

    /// Laplace expansion along the first row.
    pub fn determinant(&self) -> Real {
        (0..4)
            .map(|col| {
                let term = self.m[0][col] * self.minor(0, col).determinant();
                if col % 2 == 0 {
                    term
                } else {
                    -term
                }
            })
            .sum()
    }

    /// Gauss-Jordan elimination with partial pivoting.
    pub fn try_inverse(&self) -> Option<Self> {
        let scale = self.max_abs().value();
        if scale == 0.0 {
            return None;
        }

        let mut a = [[0.0f64; 4]; 4];
        let mut inv = [[0.0f64; 4]; 4];
        for r in 0..4 {
            for c in 0..4 {
                a[r][c] = self.m[r][c].value();
            }
            inv[r][r] = 1.0;
        }

        for col in 0..4 {
            let pivot = (col..4)
                .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
                .unwrap_or(col);
            if a[pivot][col].abs() <= f64::EPSILON * scale {
                return None;
            }
            a.swap(col, pivot);
            inv.swap(col, pivot);

            let p = a[col][col];
            for c in 0..4 {
                a[col][c] /= p;
                inv[col][c] /= p;
            }

            for r in 0..4 {
                if r == col {
                    continue;
                }
                let factor = a[r][col];
                if factor == 0.0 {
                    continue;
                }
                for c in 0..4 {
                    a[r][c] -= factor * a[col][c];
                    inv[r][c] -= factor * inv[col][c];
                }
            }
        }

        let mut flat = [0.0; 16];
        for (slot, value) in flat.iter_mut().zip(inv.iter().flatten()) {
            *slot = *value;
        }
        Self::from_row_major(&flat).ok()
    }

    /// Transform a point (w = 1). The result is divided by the output w when
    /// that w is neither zero nor one.
    pub fn transform_point(&self, p: Vector3) -> Vector3 {
        let out = *self * p.extend(Real::ONE);
        if out.w.is_zero() || out.w == Real::ONE {
            out.truncate()
        } else {
            out.truncate() / out.w
        }
    }

    /// Transform a direction (w = 0). Translation does not apply.
    pub fn transform_vector(&self, v: Vector3) -> Vector3 {
        (*self * v.extend(Real::ZERO)).truncate()
    }
}

impl Mul<Vector4> for Matrix4 {
    type Output = Vector4;

    #[track_caller]
    fn mul(self, v: Vector4) -> Vector4 {
        Vector4::new(
            self.row(0).dot(v),
            self.row(1).dot(v),
            self.row(2).dot(v),
            self.row(3).dot(v),
        )
    }
}
