//! Error types for envlog-core.
//!
//! # Recovery
//!
//! | Error Type | Strategy |
//! |------------|----------|
//! | [`Error::Hardware`] | Skip the tick, back off, retry on the next interval |
//! | [`Error::InvalidReading`] | Same as hardware: the sensor produced garbage |
//!
//! The scheduler counts consecutive failures of either kind and only
//! treats them as fatal once a configured limit is reached.

use std::fmt;

use thiserror::Error;

use envlog_types::ValidationError;

/// Errors that can occur when talking to the sensor capability.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The sensor bus or a sensor reported a failure.
    #[error("Sensor hardware error ({source_kind}): {message}")]
    Hardware {
        /// Which sensor source failed.
        source_kind: SensorSource,
        /// Driver-provided description.
        message: String,
    },

    /// The sensors answered but the values violate sample invariants.
    #[error("Invalid reading: {0}")]
    InvalidReading(#[from] ValidationError),
}

impl Error {
    /// Shorthand for a [`Error::Hardware`] error.
    pub fn hardware(source_kind: SensorSource, message: impl Into<String>) -> Self {
        Self::Hardware {
            source_kind,
            message: message.into(),
        }
    }
}

/// The physical sensor source involved in an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorSource {
    /// Temperature and pressure sensor.
    Primary,
    /// Temperature, humidity and CO2 sensor.
    Secondary,
}

impl fmt::Display for SensorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
        }
    }
}

/// Result type alias using envlog-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
