//! Core types for envlog sensor data.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::psychro;

/// Values read from both sensor sources during a single poll.
///
/// A `RawReading` is not yet trusted: it becomes a [`Sample`] only after
/// [`RawReading::into_sample`] has checked the numeric invariants.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawReading {
    /// Seconds since the Unix epoch, captured at poll time.
    pub timestamp: i64,
    /// Temperature from the primary (barometric) sensor in °C.
    pub primary_temp_c: f64,
    /// Air pressure from the primary sensor in hPa.
    pub pressure_hpa: f64,
    /// Temperature from the secondary (CO2) sensor in °C.
    pub secondary_temp_c: f64,
    /// Relative humidity from the secondary sensor in %.
    pub relative_humidity_pct: f64,
    /// CO2 concentration from the secondary sensor in ppm.
    pub co2_ppm: u32,
}

impl RawReading {
    /// Validate the reading and turn it into a persistable [`Sample`].
    pub fn into_sample(self) -> ValidationResult<Sample> {
        let sample = Sample {
            timestamp: self.timestamp,
            primary_temp_c: self.primary_temp_c,
            pressure_hpa: self.pressure_hpa,
            secondary_temp_c: self.secondary_temp_c,
            relative_humidity_pct: self.relative_humidity_pct,
            co2_ppm: self.co2_ppm,
        };
        sample.validate()?;
        Ok(sample)
    }
}

/// One timestamped set of sensor readings, the unit of persistence.
///
/// Samples are immutable once written. The timestamp is the natural key:
/// the store holds at most one sample per second.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    /// Temperature from the primary sensor in °C.
    pub primary_temp_c: f64,
    /// Air pressure in hPa.
    pub pressure_hpa: f64,
    /// Temperature from the secondary sensor in °C.
    pub secondary_temp_c: f64,
    /// Relative humidity in %, within `(0, 100]`.
    pub relative_humidity_pct: f64,
    /// CO2 concentration in ppm.
    pub co2_ppm: u32,
}

impl Sample {
    /// Check that all numeric fields are finite and humidity is in range.
    ///
    /// ```
    /// use envlog_types::Sample;
    ///
    /// let mut sample = Sample {
    ///     timestamp: 0,
    ///     primary_temp_c: 21.0,
    ///     pressure_hpa: 1013.0,
    ///     secondary_temp_c: 21.5,
    ///     relative_humidity_pct: 45.0,
    ///     co2_ppm: 600,
    /// };
    /// assert!(sample.validate().is_ok());
    ///
    /// sample.relative_humidity_pct = 0.0;
    /// assert!(sample.validate().is_err());
    /// ```
    pub fn validate(&self) -> ValidationResult<()> {
        check_finite("primary_temp_c", self.primary_temp_c)?;
        check_finite("pressure_hpa", self.pressure_hpa)?;
        check_finite("secondary_temp_c", self.secondary_temp_c)?;
        check_finite("relative_humidity_pct", self.relative_humidity_pct)?;

        let rh = self.relative_humidity_pct;
        if rh <= 0.0 || rh > 100.0 {
            return Err(ValidationError::HumidityOutOfRange(rh));
        }

        Ok(())
    }

    /// Metrics derived from the secondary sensor's temperature and humidity.
    #[must_use]
    pub fn derived(&self) -> DerivedMetrics {
        DerivedMetrics::from_sample(self)
    }
}

fn check_finite(field: &'static str, value: f64) -> ValidationResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NotFinite { field, value })
    }
}

/// Secondary metrics computed on demand from a [`Sample`]. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DerivedMetrics {
    /// Absolute humidity in g/m³.
    pub absolute_humidity: f64,
    /// Dew point in °C.
    pub dew_point_c: f64,
}

impl DerivedMetrics {
    /// Derive metrics from a sample's secondary temperature and humidity.
    #[must_use]
    pub fn from_sample(sample: &Sample) -> Self {
        let t = sample.secondary_temp_c;
        let rh = sample.relative_humidity_pct;
        Self {
            absolute_humidity: psychro::absolute_humidity(t, rh),
            dew_point_c: psychro::dew_point(t, rh),
        }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={} T1={:.2}°C P={:.2}hPa T2={:.2}°C RH={:.2}% CO2={}ppm",
            self.timestamp,
            self.primary_temp_c,
            self.pressure_hpa,
            self.secondary_temp_c,
            self.relative_humidity_pct,
            self.co2_ppm
        )
    }
}
