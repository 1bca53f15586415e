//! Conversions to and from [`nalgebra`] for rendering and tooling code.
//!
//! Into nalgebra is infallible. Back from nalgebra goes through the same
//! finiteness validation as every other entry point and fails with
//! [`RealError`].

use nalgebra::{Isometry3, Rotation3, Translation3, UnitQuaternion};

use crate::body::Pose;
use crate::matrix::{Matrix3, Matrix4};
use crate::real::RealError;
use crate::vector::Vector3;

impl From<Vector3> for nalgebra::Vector3<f64> {
    fn from(v: Vector3) -> Self {
        nalgebra::Vector3::new(v.x.value(), v.y.value(), v.z.value())
    }
}

impl TryFrom<nalgebra::Vector3<f64>> for Vector3 {
    type Error = RealError;

    fn try_from(v: nalgebra::Vector3<f64>) -> Result<Self, Self::Error> {
        Vector3::from_array([v.x, v.y, v.z])
    }
}

impl From<Matrix3> for nalgebra::Matrix3<f64> {
    fn from(m: Matrix3) -> Self {
        nalgebra::Matrix3::from_row_slice(&m.to_row_major())
    }
}

impl TryFrom<nalgebra::Matrix3<f64>> for Matrix3 {
    type Error = RealError;

    fn try_from(m: nalgebra::Matrix3<f64>) -> Result<Self, Self::Error> {
        // nalgebra stores columns contiguously.
        Matrix3::from_row_major(m.transpose().as_slice())
    }
}

impl From<Matrix4> for nalgebra::Matrix4<f64> {
    fn from(m: Matrix4) -> Self {
        nalgebra::Matrix4::from_row_slice(&m.to_row_major())
    }
}

impl TryFrom<nalgebra::Matrix4<f64>> for Matrix4 {
    type Error = RealError;

    fn try_from(m: nalgebra::Matrix4<f64>) -> Result<Self, Self::Error> {
        Matrix4::from_row_major(m.transpose().as_slice())
    }
}

impl Pose {
    /// Rigid transform equivalent to [`Pose::to_model_matrix`].
    ///
    /// The orientation is taken as a rotation without re-checking; bodies keep
    /// it orthonormal after every step.
    pub fn to_isometry(&self) -> Isometry3<f64> {
        let matrix: nalgebra::Matrix3<f64> = self.orientation.into();
        let rotation = Rotation3::from_matrix_unchecked(matrix);
        Isometry3::from_parts(
            Translation3::from(nalgebra::Vector3::from(self.position)),
            UnitQuaternion::from_rotation_matrix(&rotation),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::real::Real;
    use approx::assert_relative_eq;

    #[test]
    fn test_vector_conversion() {
        let v = Vector3::lit(1.0, -2.0, 3.5);
        let n: nalgebra::Vector3<f64> = v.into();
        assert_eq!(n, nalgebra::Vector3::new(1.0, -2.0, 3.5));
        assert_eq!(Vector3::try_from(n).unwrap(), v);
    }

    #[test]
    fn test_non_finite_rejected() {
        let n = nalgebra::Vector3::new(0.0, f64::NAN, 0.0);
        assert!(Vector3::try_from(n).is_err());

        let mut m = nalgebra::Matrix3::<f64>::identity();
        m[(2, 1)] = f64::INFINITY;
        assert!(Matrix3::try_from(m).is_err());
    }

    #[test]
    fn test_matrix_layout_preserved() {
        let ours = Matrix3::rotation_z(Real::lit(0.3));
        let theirs: nalgebra::Matrix3<f64> = ours.into();
        for r in 0..3 {
            for c in 0..3 {
                assert_eq!(theirs[(r, c)], ours.get(r, c).value());
            }
        }
        assert_eq!(Matrix3::try_from(theirs).unwrap(), ours);

        let t = Matrix4::translation(Vector3::lit(1.0, 2.0, 3.0));
        let nt: nalgebra::Matrix4<f64> = t.into();
        assert_eq!(nt[(0, 3)], 1.0);
        assert_eq!(nt[(2, 3)], 3.0);
        assert_eq!(Matrix4::try_from(nt).unwrap(), t);
    }

    #[test]
    fn test_isometry_matches_model_matrix() {
        let pose = Pose {
            position: Vector3::lit(4.0, -1.0, 2.0),
            orientation: Matrix3::from_axis_angle(Vector3::lit(1.0, 1.0, 0.0), Real::lit(0.7)),
        };
        let iso = pose.to_isometry();
        let model = pose.to_model_matrix();

        let p = Vector3::lit(0.5, 1.5, -2.0);
        let expected = model.transform_point(p);
        let got = iso.transform_point(&nalgebra::Point3::new(0.5, 1.5, -2.0));
        assert_relative_eq!(got.x, expected.x.value(), epsilon = 1e-12);
        assert_relative_eq!(got.y, expected.y.value(), epsilon = 1e-12);
        assert_relative_eq!(got.z, expected.z.value(), epsilon = 1e-12);
    }
}
