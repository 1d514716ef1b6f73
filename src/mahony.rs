//! Mahony nonlinear complementary filter

use nalgebra::{UnitQuaternion, Vector3};

use crate::error::Result;
use crate::filter::{AttitudeFilter, integrate, magnetic_reference};
use crate::math::Vector3Ext;
use crate::quaternion::{product, pure};
use crate::types::MahonySettings;

/// Mahony filter
///
/// Feeds the cross product between measured and estimated reference
/// directions back into the gyroscope rate through a proportional-integral
/// controller. The integral error accumulates across updates for as long as
/// `ki` is positive.
///
/// # Example
/// ```
/// use nalgebra::{UnitQuaternion, Vector3};
/// use ahrs_wmm::Mahony;
///
/// let mut mahony = Mahony::new();
/// let mut q = UnitQuaternion::identity();
///
/// for _ in 0..256 {
///     q = mahony.update_imu(Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0), q);
/// }
/// assert!(q.angle() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Mahony {
    /// Filter gains and sample period
    settings: MahonySettings,
    /// Integral of the orientation error (rad)
    integral_error: Vector3<f64>,
}

impl Mahony {
    /// Create a filter with default settings (`kp = 1`, `ki = 0`, 256 Hz)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter with validated settings
    pub fn with_settings(settings: MahonySettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            integral_error: Vector3::zeros(),
        })
    }

    /// Replace the settings of a running filter
    ///
    /// The integral error is kept; it is cleared on the next update if the new
    /// `ki` is not positive.
    pub fn set_settings(&mut self, settings: MahonySettings) -> Result<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Get current filter settings
    pub fn settings(&self) -> MahonySettings {
        self.settings
    }

    /// Accumulated integral error
    pub fn integral_error(&self) -> Vector3<f64> {
        self.integral_error
    }

    /// Clear the integral error
    pub fn reset(&mut self) {
        self.integral_error = Vector3::zeros();
    }

    /// Update with gyroscope (rad/s) and accelerometer samples
    ///
    /// Returns `quaternion` unchanged, without touching the integral error, if
    /// the accelerometer sample is zero.
    pub fn update_imu(
        &mut self,
        gyroscope: Vector3<f64>,
        accelerometer: Vector3<f64>,
        quaternion: UnitQuaternion<f64>,
    ) -> UnitQuaternion<f64> {
        let Some(a) = accelerometer.unit_or_none() else {
            log::trace!("zero accelerometer sample, holding orientation");
            return quaternion;
        };

        let error = a.cross(&estimated_gravity(&quaternion));
        self.feedback(gyroscope, error, quaternion)
    }

    /// Update with gyroscope (rad/s), accelerometer and magnetometer samples
    ///
    /// Returns `quaternion` unchanged, without touching the integral error, if
    /// either the accelerometer or the magnetometer sample is zero.
    pub fn update_marg(
        &mut self,
        gyroscope: Vector3<f64>,
        accelerometer: Vector3<f64>,
        magnetometer: Vector3<f64>,
        quaternion: UnitQuaternion<f64>,
    ) -> UnitQuaternion<f64> {
        let Some(a) = accelerometer.unit_or_none() else {
            log::trace!("zero accelerometer sample, holding orientation");
            return quaternion;
        };
        let Some(m) = magnetometer.unit_or_none() else {
            log::trace!("zero magnetometer sample, holding orientation");
            return quaternion;
        };
        let (qw, qx, qy, qz) = (quaternion.w, quaternion.i, quaternion.j, quaternion.k);

        let (bx, bz) = magnetic_reference(&quaternion, &m);
        let magnetic = Vector3::new(
            2.0 * bx * (0.5 - qy * qy - qz * qz) + 2.0 * bz * (qx * qz - qw * qy),
            2.0 * bx * (qx * qy - qw * qz) + 2.0 * bz * (qw * qx + qy * qz),
            2.0 * bx * (qw * qy + qx * qz) + 2.0 * bz * (0.5 - qx * qx - qy * qy),
        );

        let error = a.cross(&estimated_gravity(&quaternion)) + m.cross(&magnetic);
        self.feedback(gyroscope, error, quaternion)
    }

    /// PI feedback on the gyroscope followed by integration
    fn feedback(
        &mut self,
        gyroscope: Vector3<f64>,
        error: Vector3<f64>,
        quaternion: UnitQuaternion<f64>,
    ) -> UnitQuaternion<f64> {
        let MahonySettings {
            kp,
            ki,
            sample_period,
        } = self.settings;

        // Non-positive ki discards the accumulated history
        self.integral_error = if ki > 0.0 {
            self.integral_error + error * sample_period
        } else {
            Vector3::zeros()
        };

        let corrected = gyroscope + error * kp + self.integral_error * ki;
        let derivative = product(quaternion.quaternion(), &pure(&corrected)) * 0.5;

        integrate(&quaternion, &derivative, sample_period)
    }
}

/// Gravity direction in the body frame predicted by `quaternion`
fn estimated_gravity(quaternion: &UnitQuaternion<f64>) -> Vector3<f64> {
    let (qw, qx, qy, qz) = (quaternion.w, quaternion.i, quaternion.j, quaternion.k);
    Vector3::new(
        2.0 * (qx * qz - qw * qy),
        2.0 * (qw * qx + qy * qz),
        qw * qw - qx * qx - qy * qy + qz * qz,
    )
}

impl AttitudeFilter for Mahony {
    fn update_imu(
        &mut self,
        gyroscope: Vector3<f64>,
        accelerometer: Vector3<f64>,
        quaternion: UnitQuaternion<f64>,
    ) -> UnitQuaternion<f64> {
        Mahony::update_imu(self, gyroscope, accelerometer, quaternion)
    }

    fn update_marg(
        &mut self,
        gyroscope: Vector3<f64>,
        accelerometer: Vector3<f64>,
        magnetometer: Vector3<f64>,
        quaternion: UnitQuaternion<f64>,
    ) -> UnitQuaternion<f64> {
        Mahony::update_marg(self, gyroscope, accelerometer, magnetometer, quaternion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimated_gravity_identity() {
        let gravity = estimated_gravity(&UnitQuaternion::identity());
        assert_eq!(gravity, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_zero_samples_hold_state() {
        let settings = MahonySettings {
            ki: 0.5,
            ..Default::default()
        };
        let mut mahony = Mahony::with_settings(settings).unwrap();
        let q = UnitQuaternion::from_euler_angles(0.3, 0.0, 0.0);

        // Build up some integral error first
        let q1 = mahony.update_imu(Vector3::zeros(), Vector3::z(), q);
        let integral = mahony.integral_error();
        assert!(integral.norm() > 0.0);

        assert_eq!(mahony.update_imu(Vector3::x(), Vector3::zeros(), q1), q1);
        assert_eq!(
            mahony.update_marg(Vector3::x(), Vector3::z(), Vector3::zeros(), q1),
            q1
        );
        assert_eq!(mahony.integral_error(), integral);
    }

    #[test]
    fn test_integral_accumulates_with_positive_ki() {
        let settings = MahonySettings {
            kp: 0.0,
            ki: 1.0,
            sample_period: 0.01,
        };
        let mut mahony = Mahony::with_settings(settings).unwrap();
        let q = UnitQuaternion::from_euler_angles(0.2, 0.0, 0.0);
        let accel = Vector3::z();
        let error = accel.cross(&estimated_gravity(&q));

        mahony.update_imu(Vector3::zeros(), accel, q);
        mahony.update_imu(Vector3::zeros(), accel, q);

        let expected = error * 0.02;
        assert!((mahony.integral_error() - expected).norm() < 1e-15);
    }

    #[test]
    fn test_non_positive_ki_discards_history() {
        let settings = MahonySettings {
            ki: 0.5,
            ..Default::default()
        };
        let mut mahony = Mahony::with_settings(settings).unwrap();
        let mut q = UnitQuaternion::from_euler_angles(0.5, -0.3, 0.0);

        for _ in 0..50 {
            q = mahony.update_imu(Vector3::zeros(), Vector3::z(), q);
        }
        assert!(mahony.integral_error().norm() > 0.0);

        mahony
            .set_settings(MahonySettings {
                ki: 0.0,
                ..settings
            })
            .unwrap();
        // Kept until the next update
        assert!(mahony.integral_error().norm() > 0.0);

        mahony.update_imu(Vector3::zeros(), Vector3::z(), q);
        assert_eq!(mahony.integral_error(), Vector3::zeros());
    }

    #[test]
    fn test_reset() {
        let mut mahony = Mahony::with_settings(MahonySettings {
            ki: 1.0,
            ..Default::default()
        })
        .unwrap();
        mahony.update_imu(
            Vector3::zeros(),
            Vector3::x(),
            UnitQuaternion::identity(),
        );
        assert!(mahony.integral_error().norm() > 0.0);

        mahony.reset();
        assert_eq!(mahony.integral_error(), Vector3::zeros());
    }
}
