//! Error type shared by the filters and the geomagnetic model

/// Errors reported by this crate
///
/// Zero-norm accelerometer or magnetometer samples are not errors: the filters
/// hold their previous orientation instead. [`Error::DegenerateInput`] is only
/// produced when a caller explicitly asks to normalize a zero quaternion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot normalize a zero-norm {0}")]
    DegenerateInput(&'static str),

    #[error(
        "sample streams differ in length: gyroscope {gyroscope}, accelerometer {accelerometer}, magnetometer {magnetometer:?}"
    )]
    ShapeMismatch {
        gyroscope: usize,
        accelerometer: usize,
        magnetometer: Option<usize>,
    },

    #[error("malformed coefficient table: {0}")]
    Format(String),

    #[error("no geomagnetic model covers {date:.3}; earliest epoch is {earliest:.1}")]
    Range { date: f64, earliest: f64 },

    #[error("invalid filter setting: {0}")]
    InvalidSetting(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = core::result::Result<T, Error>;
