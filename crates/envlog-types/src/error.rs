//! Error types for sample validation in envlog-types.

use thiserror::Error;

/// Reasons a reading or stored row cannot become a [`Sample`](crate::Sample).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new checks
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// A floating point field is NaN or infinite.
    #[error("{field} is not finite ({value})")]
    NotFinite {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Relative humidity outside `(0, 100]`.
    #[error("relative humidity {0}% is outside (0, 100]")]
    HumidityOutOfRange(f64),

    /// CO2 concentration that does not fit the stored integer column.
    #[error("CO2 concentration {0} ppm is out of range")]
    Co2OutOfRange(i64),
}

/// Result type alias using envlog-types' ValidationError type.
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;
