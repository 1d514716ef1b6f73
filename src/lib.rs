//! [![license]](https://opensource.org/licenses/MIT)
//!
//! [license]: https://img.shields.io/badge/License-MIT-blue.svg?style=for-the-badge&labelColor=555555
//!
//! AHRS WMM - Attitude filters and the World Magnetic Model
//!
//! This library provides two classic orientation estimators for inertial
//! sensors together with an evaluator for the World Magnetic Model (WMM), which
//! gives the magnetic declination needed to turn a magnetic heading into a true
//! one.
//!
//! # Features
//!
//! - Madgwick gradient-descent filter (IMU and MARG updates)
//! - Mahony complementary filter with proportional-integral feedback
//! - Quaternion helpers (Hamilton product, rotation matrix, axis-angle)
//! - Batch estimation over aligned sample streams
//! - WMM2015 and WMM2020 coefficients compiled in, custom `.COF` files supported
//! - Field components, intensity, inclination, declination and grivation
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::{UnitQuaternion, Vector3};
//! use ahrs_wmm::{Madgwick, MadgwickSettings, Wmm};
//!
//! let settings = MadgwickSettings::default().with_frequency(100.0);
//! let madgwick = Madgwick::with_settings(settings).unwrap();
//!
//! // Sensor readings
//! let gyroscope = Vector3::new(0.01, -0.02, 0.005);     // rad/s
//! let accelerometer = Vector3::new(0.0, 0.0, 9.81);    // m/s^2, any unit
//! let magnetometer = Vector3::new(22.0, -3.5, -40.0);  // uT, any unit
//!
//! let q = madgwick.update_marg(gyroscope, accelerometer, magnetometer, UnitQuaternion::identity());
//! let (roll, pitch, yaw) = q.euler_angles();
//!
//! // Declination for the heading correction
//! let mut wmm = Wmm::new().unwrap();
//! let field = wmm.magnetic_field(48.1, 11.6, 0.5, 2022.5).unwrap();
//! let true_yaw = yaw + field.d.to_radians();
//! ```

pub mod coefficients;
mod error;
pub mod filter;
pub mod geodesy;
mod madgwick;
mod mahony;
mod math;
pub mod quaternion;
mod types;
mod wmm;

// Re-export all public types and functions
pub use error::{Error, Result};
pub use filter::{AttitudeFilter, estimate};
pub use madgwick::Madgwick;
pub use mahony::Mahony;
pub use math::{DEG_TO_RAD, QuaternionExt, RAD_TO_DEG, Vector3Ext};
pub use types::*;
pub use wmm::{DecimalYear, MagneticField, VALIDITY_YEARS, Wmm};
