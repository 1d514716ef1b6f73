//! Interface shared by the attitude filters and a batch driver over sample streams

use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};

use crate::error::{Error, Result};
use crate::quaternion::{conjugate, product, pure};

/// Sample-by-sample orientation estimator
///
/// Each update maps the previous orientation to the next one. Quaternions
/// rotate body-frame vectors into the Earth frame. Gyroscope samples are in
/// rad/s; accelerometer and magnetometer samples may use any unit because only
/// their direction is used.
pub trait AttitudeFilter {
    /// Fuse gyroscope and accelerometer samples
    fn update_imu(
        &mut self,
        gyroscope: Vector3<f64>,
        accelerometer: Vector3<f64>,
        quaternion: UnitQuaternion<f64>,
    ) -> UnitQuaternion<f64>;

    /// Fuse gyroscope, accelerometer and magnetometer samples
    fn update_marg(
        &mut self,
        gyroscope: Vector3<f64>,
        accelerometer: Vector3<f64>,
        magnetometer: Vector3<f64>,
        quaternion: UnitQuaternion<f64>,
    ) -> UnitQuaternion<f64>;
}

/// Earth-frame magnetic reference `(horizontal, vertical)` for a normalized
/// magnetometer sample
///
/// The sample is rotated into the Earth frame with `q ⊗ m ⊗ q*` and its
/// horizontal components are collapsed onto the x axis.
pub(crate) fn magnetic_reference(
    quaternion: &UnitQuaternion<f64>,
    magnetometer: &Vector3<f64>,
) -> (f64, f64) {
    let q = quaternion.quaternion();
    let h = product(q, &product(&pure(magnetometer), &conjugate(q)));
    ((h.i * h.i + h.j * h.j).sqrt(), h.k)
}

/// Euler step `q + q̇·dt` followed by renormalization
pub(crate) fn integrate(
    quaternion: &UnitQuaternion<f64>,
    derivative: &Quaternion<f64>,
    sample_period: f64,
) -> UnitQuaternion<f64> {
    let next = quaternion.quaternion() + derivative * sample_period;
    Unit::try_new(next, 0.0).unwrap_or(*quaternion)
}

/// Run a filter over aligned sample streams
///
/// Every sample is processed in order starting from `initial`, and the
/// orientation after each update is returned, so the output has one entry per
/// sample. Without a magnetometer stream the IMU update is used.
///
/// Fails with [`Error::ShapeMismatch`] before processing anything if the
/// streams differ in length.
///
/// # Example
/// ```
/// use nalgebra::{UnitQuaternion, Vector3};
/// use ahrs_wmm::{Madgwick, filter::estimate};
///
/// let gyroscope = vec![Vector3::zeros(); 10];
/// let accelerometer = vec![Vector3::new(0.0, 0.0, 9.81); 10];
///
/// let mut madgwick = Madgwick::new();
/// let orientations = estimate(
///     &mut madgwick,
///     &gyroscope,
///     &accelerometer,
///     None,
///     UnitQuaternion::identity(),
/// )
/// .unwrap();
/// assert_eq!(orientations.len(), 10);
/// ```
pub fn estimate<F: AttitudeFilter>(
    filter: &mut F,
    gyroscope: &[Vector3<f64>],
    accelerometer: &[Vector3<f64>],
    magnetometer: Option<&[Vector3<f64>]>,
    initial: UnitQuaternion<f64>,
) -> Result<Vec<UnitQuaternion<f64>>> {
    let mismatch = gyroscope.len() != accelerometer.len()
        || magnetometer.is_some_and(|m| m.len() != gyroscope.len());
    if mismatch {
        return Err(Error::ShapeMismatch {
            gyroscope: gyroscope.len(),
            accelerometer: accelerometer.len(),
            magnetometer: magnetometer.map(<[_]>::len),
        });
    }

    let mut quaternion = initial;
    let mut orientations = Vec::with_capacity(gyroscope.len());
    for (i, (gyr, acc)) in gyroscope.iter().zip(accelerometer).enumerate() {
        quaternion = match magnetometer {
            Some(mag) => filter.update_marg(*gyr, *acc, mag[i], quaternion),
            None => filter.update_imu(*gyr, *acc, quaternion),
        };
        orientations.push(quaternion);
    }

    log::debug!(
        "estimated {} orientations ({})",
        orientations.len(),
        if magnetometer.is_some() { "MARG" } else { "IMU" }
    );
    Ok(orientations)
}
