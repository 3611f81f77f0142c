//! Row models and decoding.
//!
//! SQLite columns are dynamically typed, so a `REAL` column can still hold
//! text written by some other tool. Rows are therefore fetched as untyped
//! [`Value`]s and decoded in a second step that can fail per row.

use rusqlite::Row;
use rusqlite::types::Value;

use envlog_types::{Sample, ValidationError};

use crate::error::RowError;

/// Column list matching [`StoredRow::from_row`].
pub(crate) const SAMPLE_COLUMNS: &str = "id, time, temp1, pressure, temp2, relative_humidity, co2";

/// A row of `sensor_data` before validation.
#[derive(Debug, Clone)]
pub struct StoredRow {
    /// Surrogate row ID.
    pub id: i64,
    time: Value,
    temp1: Value,
    pressure: Value,
    temp2: Value,
    relative_humidity: Value,
    co2: Value,
}

impl StoredRow {
    /// Read the raw column values of a row selected with [`SAMPLE_COLUMNS`].
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            time: row.get(1)?,
            temp1: row.get(2)?,
            pressure: row.get(3)?,
            temp2: row.get(4)?,
            relative_humidity: row.get(5)?,
            co2: row.get(6)?,
        })
    }

    /// Decode into a validated [`Sample`].
    pub fn decode(&self) -> Result<Sample, RowError> {
        let timestamp = match &self.time {
            Value::Integer(i) => *i,
            Value::Real(f) if f.fract() == 0.0 => *f as i64,
            Value::Real(f) => return Err(RowError::FractionalTimestamp(*f)),
            other => return Err(not_numeric("time", other)),
        };

        let co2 = match &self.co2 {
            Value::Integer(i) => *i,
            Value::Real(f) if f.is_finite() && f.fract() == 0.0 => *f as i64,
            other => return Err(not_numeric("co2", other)),
        };
        let co2_ppm =
            u32::try_from(co2).map_err(|_| RowError::Invalid(ValidationError::Co2OutOfRange(co2)))?;

        let sample = Sample {
            timestamp,
            primary_temp_c: real("temp1", &self.temp1)?,
            pressure_hpa: real("pressure", &self.pressure)?,
            secondary_temp_c: real("temp2", &self.temp2)?,
            relative_humidity_pct: real("relative_humidity", &self.relative_humidity)?,
            co2_ppm,
        };
        sample.validate()?;
        Ok(sample)
    }
}

fn real(column: &'static str, value: &Value) -> Result<f64, RowError> {
    match value {
        Value::Real(f) => Ok(*f),
        Value::Integer(i) => Ok(*i as f64),
        other => Err(not_numeric(column, other)),
    }
}

fn not_numeric(column: &'static str, value: &Value) -> RowError {
    match value {
        Value::Null => RowError::Missing(column),
        Value::Text(_) => RowError::NotNumeric {
            column,
            found: "text",
        },
        Value::Blob(_) => RowError::NotNumeric {
            column,
            found: "blob",
        },
        // Numeric values only reach here when they are out of shape.
        Value::Integer(_) | Value::Real(_) => RowError::NotNumeric {
            column,
            found: "a non-integer number",
        },
    }
}
