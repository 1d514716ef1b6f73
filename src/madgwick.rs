//! Madgwick gradient-descent orientation filter

use nalgebra::{Matrix3x4, Matrix6x4, UnitQuaternion, Vector3, Vector4, Vector6};

use crate::error::Result;
use crate::filter::{AttitudeFilter, integrate, magnetic_reference};
use crate::math::Vector3Ext;
use crate::quaternion::{product, pure};
use crate::types::MadgwickSettings;

/// Gradients below this norm are rounding noise of an already matching
/// estimate and produce no correction
const GRADIENT_EPSILON: f64 = 1e-12;

/// Madgwick filter
///
/// Corrects the integrated gyroscope rate with one normalized gradient-descent
/// step per sample on the discrepancy between the measured and predicted
/// gravity (and magnetic field) directions. The filter holds only its
/// settings; the orientation is passed in and returned by every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct Madgwick {
    settings: MadgwickSettings,
}

impl Madgwick {
    /// Create a filter with default settings (`beta = 0.1`, 256 Hz)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter with validated settings
    pub fn with_settings(settings: MadgwickSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Replace the settings of a running filter
    ///
    /// The current settings are kept if the new ones are invalid.
    pub fn set_settings(&mut self, settings: MadgwickSettings) -> Result<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Get current filter settings
    pub fn settings(&self) -> MadgwickSettings {
        self.settings
    }

    /// Update with gyroscope (rad/s) and accelerometer samples
    ///
    /// Returns `quaternion` unchanged if the accelerometer sample is zero.
    pub fn update_imu(
        &self,
        gyroscope: Vector3<f64>,
        accelerometer: Vector3<f64>,
        quaternion: UnitQuaternion<f64>,
    ) -> UnitQuaternion<f64> {
        let Some(a) = accelerometer.unit_or_none() else {
            log::trace!("zero accelerometer sample, holding orientation");
            return quaternion;
        };
        let (qw, qx, qy, qz) = (quaternion.w, quaternion.i, quaternion.j, quaternion.k);

        // Objective function and Jacobian of the gravity direction
        let f = Vector3::new(
            2.0 * (qx * qz - qw * qy) - a.x,
            2.0 * (qw * qx + qy * qz) - a.y,
            2.0 * (0.5 - qx * qx - qy * qy) - a.z,
        );
        #[rustfmt::skip]
        let j = Matrix3x4::new(
            -2.0 * qy,  2.0 * qz, -2.0 * qw, 2.0 * qx,
             2.0 * qx,  2.0 * qw,  2.0 * qz, 2.0 * qy,
             0.0,      -4.0 * qx, -4.0 * qy, 0.0,
        );

        self.step(gyroscope, j.transpose() * f, quaternion)
    }

    /// Update with gyroscope (rad/s), accelerometer and magnetometer samples
    ///
    /// Returns `quaternion` unchanged if either the accelerometer or the
    /// magnetometer sample is zero.
    pub fn update_marg(
        &self,
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

        // Reference direction of the Earth's magnetic field
        let (bx, bz) = magnetic_reference(&quaternion, &m);

        let f = Vector6::new(
            2.0 * (qx * qz - qw * qy) - a.x,
            2.0 * (qw * qx + qy * qz) - a.y,
            2.0 * (0.5 - qx * qx - qy * qy) - a.z,
            2.0 * bx * (0.5 - qy * qy - qz * qz) + 2.0 * bz * (qx * qz - qw * qy) - m.x,
            2.0 * bx * (qx * qy - qw * qz) + 2.0 * bz * (qw * qx + qy * qz) - m.y,
            2.0 * bx * (qw * qy + qx * qz) + 2.0 * bz * (0.5 - qx * qx - qy * qy) - m.z,
        );
        #[rustfmt::skip]
        let j = Matrix6x4::new(
            -2.0 * qy,                      2.0 * qz,                      -2.0 * qw,                      2.0 * qx,
             2.0 * qx,                      2.0 * qw,                       2.0 * qz,                      2.0 * qy,
             0.0,                          -4.0 * qx,                      -4.0 * qy,                      0.0,
            -2.0 * bz * qy,                 2.0 * bz * qz,                 -4.0 * bx * qy - 2.0 * bz * qw, -4.0 * bx * qz + 2.0 * bz * qx,
            -2.0 * bx * qz + 2.0 * bz * qx, 2.0 * bx * qy + 2.0 * bz * qw,  2.0 * bx * qx + 2.0 * bz * qz, -2.0 * bx * qw + 2.0 * bz * qy,
             2.0 * bx * qy,                 2.0 * bx * qz - 4.0 * bz * qx,  2.0 * bx * qw - 4.0 * bz * qy,  2.0 * bx * qx,
        );

        self.step(gyroscope, j.transpose() * f, quaternion)
    }

    /// Apply the normalized corrective step and integrate
    fn step(
        &self,
        gyroscope: Vector3<f64>,
        gradient: Vector4<f64>,
        quaternion: UnitQuaternion<f64>,
    ) -> UnitQuaternion<f64> {
        let norm = gradient.norm();
        let step = if norm > GRADIENT_EPSILON {
            gradient / norm
        } else {
            Vector4::zeros()
        };

        // Gradient is ordered (w, x, y, z) while nalgebra stores (i, j, k, w)
        let mut derivative = product(quaternion.quaternion(), &pure(&gyroscope)) * 0.5;
        derivative.coords -= Vector4::new(step[1], step[2], step[3], step[0]) * self.settings.beta;

        integrate(&quaternion, &derivative, self.settings.sample_period)
    }
}

impl AttitudeFilter for Madgwick {
    fn update_imu(
        &mut self,
        gyroscope: Vector3<f64>,
        accelerometer: Vector3<f64>,
        quaternion: UnitQuaternion<f64>,
    ) -> UnitQuaternion<f64> {
        Madgwick::update_imu(self, gyroscope, accelerometer, quaternion)
    }

    fn update_marg(
        &mut self,
        gyroscope: Vector3<f64>,
        accelerometer: Vector3<f64>,
        magnetometer: Vector3<f64>,
        quaternion: UnitQuaternion<f64>,
    ) -> UnitQuaternion<f64> {
        Madgwick::update_marg(self, gyroscope, accelerometer, magnetometer, quaternion)
    }
}
