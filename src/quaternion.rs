//! Quaternion algebra used by the attitude filters
//!
//! Quaternions are stored as nalgebra `Quaternion<f64>` (scalar `w`, vector
//! `i, j, k`). Functions that require unit norm take `UnitQuaternion<f64>`.

use nalgebra::{Matrix3, Quaternion, Unit, UnitQuaternion, Vector3};

use crate::error::{Error, Result};

/// Scale a quaternion to unit norm
///
/// Fails with [`Error::DegenerateInput`] when the norm is exactly zero.
///
/// # Example
/// ```
/// use nalgebra::Quaternion;
/// use ahrs_wmm::quaternion::normalize;
///
/// let q = normalize(&Quaternion::new(2.0, 0.0, 0.0, 0.0)).unwrap();
/// assert_eq!(q.w, 1.0);
/// assert!(normalize(&Quaternion::new(0.0, 0.0, 0.0, 0.0)).is_err());
/// ```
pub fn normalize(q: &Quaternion<f64>) -> Result<UnitQuaternion<f64>> {
    Unit::try_new(*q, 0.0).ok_or(Error::DegenerateInput("quaternion"))
}

/// Hamilton product `p ⊗ q`
pub fn product(p: &Quaternion<f64>, q: &Quaternion<f64>) -> Quaternion<f64> {
    Quaternion::new(
        p.w * q.w - p.i * q.i - p.j * q.j - p.k * q.k,
        p.w * q.i + p.i * q.w + p.j * q.k - p.k * q.j,
        p.w * q.j - p.i * q.k + p.j * q.w + p.k * q.i,
        p.w * q.k + p.i * q.j - p.j * q.i + p.k * q.w,
    )
}

/// Conjugate: negates the vector part
pub fn conjugate(q: &Quaternion<f64>) -> Quaternion<f64> {
    Quaternion::new(q.w, -q.i, -q.j, -q.k)
}

/// Pure quaternion `[0, v]`
pub fn pure(v: &Vector3<f64>) -> Quaternion<f64> {
    Quaternion::new(0.0, v.x, v.y, v.z)
}

/// Direction cosine matrix of a unit quaternion
pub fn to_rotation_matrix(q: &UnitQuaternion<f64>) -> Matrix3<f64> {
    let (w, x, y, z) = (q.w, q.i, q.j, q.k);
    Matrix3::new(
        1.0 - 2.0 * (y * y + z * z),
        2.0 * (x * y - w * z),
        2.0 * (x * z + w * y),
        2.0 * (x * y + w * z),
        1.0 - 2.0 * (x * x + z * z),
        2.0 * (y * z - w * x),
        2.0 * (x * z - w * y),
        2.0 * (w * x + y * z),
        1.0 - 2.0 * (x * x + y * y),
    )
}

/// Axis and angle (radians) of a unit quaternion
///
/// The angle is `2·atan2(‖v‖, w)` and lies in `[0, 2π]`. When the vector part
/// is zero there is no rotation axis and the zero vector is returned.
pub fn to_axis_angle(q: &UnitQuaternion<f64>) -> (Vector3<f64>, f64) {
    let v = q.vector().into_owned();
    let denom = v.norm();
    let angle = 2.0 * denom.atan2(q.w);
    if denom == 0.0 {
        (Vector3::zeros(), angle)
    } else {
        (v / denom, angle)
    }
}

/// Unit quaternion rotating by `angle` radians about `axis`
///
/// The axis is normalized first; a zero axis yields the identity.
pub fn from_axis_angle(axis: &Vector3<f64>, angle: f64) -> UnitQuaternion<f64> {
    let norm = axis.norm();
    if norm == 0.0 {
        return UnitQuaternion::identity();
    }
    let (sin_half, cos_half) = (0.5 * angle).sin_cos();
    let v = axis * (sin_half / norm);
    UnitQuaternion::new_unchecked(Quaternion::new(cos_half, v.x, v.y, v.z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::{FRAC_PI_2, PI};

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_product_matches_nalgebra() {
        let p = Quaternion::new(0.1, -0.7, 0.3, 0.5);
        let q = Quaternion::new(0.9, 0.2, -0.4, 0.1);
        assert!((product(&p, &q) - p * q).norm() < EPSILON);
        // Not commutative
        assert!((product(&p, &q) - product(&q, &p)).norm() > 0.1);
    }

    #[test]
    fn test_conjugate() {
        let q = Quaternion::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(conjugate(&q), q.conjugate());
    }

    #[test]
    fn test_normalize() {
        let q = normalize(&Quaternion::new(1.0, 1.0, 1.0, 1.0)).unwrap();
        assert!((q.w - 0.5).abs() < EPSILON);
        assert!((q.norm() - 1.0).abs() < EPSILON);

        let zero = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        assert!(matches!(normalize(&zero), Err(Error::DegenerateInput(_))));
    }

    #[test]
    fn test_rotation_matrix_matches_nalgebra() {
        let q = UnitQuaternion::from_euler_angles(0.3, -0.5, 1.2);
        let dcm = to_rotation_matrix(&q);
        let expected = q.to_rotation_matrix().into_inner();
        assert!((dcm - expected).norm() < EPSILON);
    }

    #[test]
    fn test_axis_angle() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let (axis, angle) = to_axis_angle(&q);
        assert!((axis - Vector3::z()).norm() < EPSILON);
        assert!((angle - FRAC_PI_2).abs() < EPSILON);

        let (axis, angle) = to_axis_angle(&UnitQuaternion::identity());
        assert_eq!(axis, Vector3::zeros());
        assert_eq!(angle, 0.0);
    }

    #[test]
    fn test_axis_angle_round_trip() {
        let q = UnitQuaternion::from_euler_angles(-2.0, 0.4, 2.9);
        let (axis, angle) = to_axis_angle(&q);
        let rebuilt = from_axis_angle(&axis, angle);
        assert!(q.angle_to(&rebuilt) < 1e-9);

        // Half turn about x
        let half_turn = from_axis_angle(&Vector3::x(), PI);
        assert!((half_turn.i - 1.0).abs() < EPSILON);
    }
}
