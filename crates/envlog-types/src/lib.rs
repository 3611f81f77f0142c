//! Platform-agnostic types for the envlog environmental collector.
//!
//! This crate provides the data model shared by the sensor layer
//! (envlog-core), the time-series store (envlog-store) and the service.
//!
//! # Features
//!
//! - [`Sample`], the immutable unit of persistence, and [`RawReading`]
//! - [`DerivedMetrics`] computed on demand (absolute humidity, dew point)
//! - The [`psychro`] formulas themselves
//! - Validation errors for non-finite or out-of-range values
//!
//! # Example
//!
//! ```
//! use envlog_types::RawReading;
//!
//! let reading = RawReading {
//!     timestamp: 1_700_000_000,
//!     primary_temp_c: 21.3,
//!     pressure_hpa: 1012.4,
//!     secondary_temp_c: 21.9,
//!     relative_humidity_pct: 48.0,
//!     co2_ppm: 640,
//! };
//! let sample = reading.into_sample()?;
//! let derived = sample.derived();
//! assert!(derived.dew_point_c < sample.secondary_temp_c);
//! # Ok::<(), envlog_types::ValidationError>(())
//! ```

pub mod error;
pub mod psychro;
pub mod types;

pub use error::{ValidationError, ValidationResult};
pub use types::{DerivedMetrics, RawReading, Sample};

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> RawReading {
        RawReading {
            timestamp: 1_700_000_000,
            primary_temp_c: 21.0,
            pressure_hpa: 1013.25,
            secondary_temp_c: 20.0,
            relative_humidity_pct: 50.0,
            co2_ppm: 800,
        }
    }

    // --- RawReading -> Sample ---

    #[test]
    fn test_into_sample_copies_fields() {
        let sample = reading().into_sample().unwrap();
        assert_eq!(sample.timestamp, 1_700_000_000);
        assert_eq!(sample.pressure_hpa, 1013.25);
        assert_eq!(sample.co2_ppm, 800);
    }

    #[test]
    fn test_into_sample_rejects_nan() {
        let mut raw = reading();
        raw.pressure_hpa = f64::NAN;
        let err = raw.into_sample().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NotFinite {
                field: "pressure_hpa",
                ..
            }
        ));
    }

    #[test]
    fn test_into_sample_rejects_infinite_temperature() {
        let mut raw = reading();
        raw.secondary_temp_c = f64::INFINITY;
        assert!(raw.into_sample().is_err());
    }

    #[test]
    fn test_humidity_bounds() {
        let mut raw = reading();
        raw.relative_humidity_pct = 100.0;
        assert!(raw.into_sample().is_ok());

        raw.relative_humidity_pct = 100.01;
        assert_eq!(
            raw.into_sample().unwrap_err(),
            ValidationError::HumidityOutOfRange(100.01)
        );

        raw.relative_humidity_pct = 0.0;
        assert!(raw.into_sample().is_err());

        raw.relative_humidity_pct = -5.0;
        assert!(raw.into_sample().is_err());
    }

    // --- DerivedMetrics ---

    #[test]
    fn test_derived_uses_secondary_sensor() {
        let sample = reading().into_sample().unwrap();
        let derived = sample.derived();
        assert!((derived.dew_point_c - 9.27).abs() < 0.1);
        assert!((derived.absolute_humidity - 8.64).abs() < 0.1);
    }

    // --- Display / serde ---

    #[test]
    fn test_sample_display() {
        let sample = reading().into_sample().unwrap();
        let text = sample.to_string();
        assert!(text.contains("CO2=800ppm"));
        assert!(text.contains("RH=50.00%"));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::NotFinite {
            field: "pressure_hpa",
            value: f64::NAN,
        };
        assert!(err.to_string().contains("pressure_hpa"));
    }

    #[test]
    fn test_sample_serialization() {
        let sample = reading().into_sample().unwrap();
        let json = serde_json::to_string(&sample).unwrap();
        assert!(json.contains("\"co2_ppm\":800"));
        let back: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample);
    }
}
