//! Filter configuration types

use crate::error::{Error, Result};

/// Default sample period of both filters in seconds (256 Hz)
pub const DEFAULT_SAMPLE_PERIOD: f64 = 1.0 / 256.0;

/// Madgwick filter settings
///
/// The gradient-descent filter has a single gain. `beta` trades responsiveness
/// to accelerometer/magnetometer corrections against noise injected by gyroscope
/// drift.
///
/// # Example
/// ```
/// use ahrs_wmm::{Madgwick, MadgwickSettings};
///
/// let settings = MadgwickSettings {
///     beta: 0.041,
///     ..Default::default()
/// }
/// .with_frequency(100.0);
///
/// let filter = Madgwick::with_settings(settings).unwrap();
/// assert_eq!(filter.settings().sample_period, 0.01);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MadgwickSettings {
    /// Gradient-descent step gain (typically 0.033 to 0.1)
    pub beta: f64,
    /// Time between two consecutive samples in seconds
    pub sample_period: f64,
}

impl MadgwickSettings {
    /// Set the sample period from a sampling frequency in Hz
    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.sample_period = 1.0 / frequency;
        self
    }

    /// Check that the gain is a non-negative finite number and the sample period
    /// is positive
    pub fn validate(&self) -> Result<()> {
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(Error::InvalidSetting(format!(
                "beta must be finite and non-negative, got {}",
                self.beta
            )));
        }
        validate_sample_period(self.sample_period)
    }
}

impl Default for MadgwickSettings {
    fn default() -> Self {
        Self {
            beta: 0.1,
            sample_period: DEFAULT_SAMPLE_PERIOD,
        }
    }
}

/// Mahony filter settings
///
/// # Example
/// ```
/// use ahrs_wmm::{Mahony, MahonySettings};
///
/// let settings = MahonySettings {
///     kp: 2.0,
///     ki: 0.01,
///     ..Default::default()
/// };
/// let mahony = Mahony::with_settings(settings).unwrap();
/// assert_eq!(mahony.settings().kp, 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MahonySettings {
    /// Proportional gain
    pub kp: f64,
    /// Integral gain
    ///
    /// A value of zero or below disables the integral term and clears the
    /// accumulated error on every update.
    pub ki: f64,
    /// Time between two consecutive samples in seconds
    pub sample_period: f64,
}

impl MahonySettings {
    /// Set the sample period from a sampling frequency in Hz
    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.sample_period = 1.0 / frequency;
        self
    }

    /// Check that both gains are finite and the sample period is positive
    ///
    /// Any finite `ki` is accepted: zero or negative values disable the
    /// integral term.
    pub fn validate(&self) -> Result<()> {
        if !self.kp.is_finite() || self.kp < 0.0 {
            return Err(Error::InvalidSetting(format!(
                "kp must be finite and non-negative, got {}",
                self.kp
            )));
        }
        if !self.ki.is_finite() {
            return Err(Error::InvalidSetting(format!(
                "ki must be finite, got {}",
                self.ki
            )));
        }
        validate_sample_period(self.sample_period)
    }
}

impl Default for MahonySettings {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.0,
            sample_period: DEFAULT_SAMPLE_PERIOD,
        }
    }
}

fn validate_sample_period(sample_period: f64) -> Result<()> {
    if sample_period.is_finite() && sample_period > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidSetting(format!(
            "sample period must be finite and positive, got {sample_period}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let madgwick = MadgwickSettings::default();
        assert_eq!(madgwick.beta, 0.1);
        assert_eq!(madgwick.sample_period, 1.0 / 256.0);

        let mahony = MahonySettings::default();
        assert_eq!(mahony.kp, 1.0);
        assert_eq!(mahony.ki, 0.0);
        assert_eq!(mahony.sample_period, 1.0 / 256.0);
    }

    #[test]
    fn test_with_frequency() {
        let settings = MahonySettings::default().with_frequency(50.0);
        assert!((settings.sample_period - 0.02).abs() < 1e-15);
    }

    #[test]
    fn test_validation() {
        assert!(MadgwickSettings::default().validate().is_ok());
        assert!(MahonySettings::default().validate().is_ok());

        let negative_beta = MadgwickSettings {
            beta: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            negative_beta.validate(),
            Err(Error::InvalidSetting(_))
        ));

        let zero_rate = MadgwickSettings::default().with_frequency(0.0);
        assert!(zero_rate.validate().is_err());

        // Negative ki is legal: it disables the integral term
        let negative_ki = MahonySettings {
            ki: -1.0,
            ..Default::default()
        };
        assert!(negative_ki.validate().is_ok());

        let nan_kp = MahonySettings {
            kp: f64::NAN,
            ..Default::default()
        };
        assert!(nan_kp.validate().is_err());
    }
}
