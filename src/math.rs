//! Angle constants and nalgebra extensions

use nalgebra::{UnitQuaternion, Vector3};

/// Mathematical constants
pub const DEG_TO_RAD: f64 = core::f64::consts::PI / 180.0;
pub const RAD_TO_DEG: f64 = 180.0 / core::f64::consts::PI;

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Normalize the vector, returning `None` if its magnitude is exactly zero
    fn unit_or_none(&self) -> Option<Vector3<f64>>;

    /// Convert degrees to radians
    fn deg_to_rad(&self) -> Vector3<f64>;

    /// Convert radians to degrees
    fn rad_to_deg(&self) -> Vector3<f64>;
}

impl Vector3Ext for Vector3<f64> {
    fn unit_or_none(&self) -> Option<Vector3<f64>> {
        let norm = self.norm();
        if norm > 0.0 { Some(*self / norm) } else { None }
    }

    fn deg_to_rad(&self) -> Vector3<f64> {
        *self * DEG_TO_RAD
    }

    fn rad_to_deg(&self) -> Vector3<f64> {
        *self * RAD_TO_DEG
    }
}

/// Extension trait for UnitQuaternion operations
pub trait QuaternionExt {
    /// Convert quaternion to Euler angles (roll, pitch, yaw) in radians
    fn to_euler(&self) -> Vector3<f64>;

    /// Convert quaternion to Euler angles in degrees
    fn to_euler_degrees(&self) -> Vector3<f64>;

    /// Create quaternion from Euler angles in degrees
    fn from_euler_degrees(roll: f64, pitch: f64, yaw: f64) -> UnitQuaternion<f64>;
}

impl QuaternionExt for UnitQuaternion<f64> {
    fn to_euler(&self) -> Vector3<f64> {
        let (roll, pitch, yaw) = self.euler_angles();
        Vector3::new(roll, pitch, yaw)
    }

    fn to_euler_degrees(&self) -> Vector3<f64> {
        self.to_euler().rad_to_deg()
    }

    fn from_euler_degrees(roll: f64, pitch: f64, yaw: f64) -> UnitQuaternion<f64> {
        let euler_rad = Vector3::new(roll, pitch, yaw).deg_to_rad();
        UnitQuaternion::from_euler_angles(euler_rad.x, euler_rad.y, euler_rad.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_extensions() {
        let v = Vector3::new(3.0, 4.0, 0.0);
        let normalized = v.unit_or_none().unwrap();
        assert!((normalized.norm() - 1.0).abs() < 1e-12);
        assert!((normalized.x - 0.6).abs() < 1e-12);

        assert!(Vector3::<f64>::zeros().unit_or_none().is_none());
    }

    #[test]
    fn test_quaternion_euler_conversion() {
        let euler = Vector3::new(30.0, 45.0, 60.0);
        let quat = UnitQuaternion::from_euler_degrees(euler.x, euler.y, euler.z);
        let recovered = quat.to_euler_degrees();

        assert!((euler - recovered).norm() < 1e-9);
    }
}
