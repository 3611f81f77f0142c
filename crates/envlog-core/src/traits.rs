//! Trait abstractions for sensor hardware.
//!
//! This module provides the [`SensorBus`] trait, the narrow capability the
//! collector needs from the hardware. Real drivers and the
//! [`SimulatedSensor`](crate::SimulatedSensor) both implement it.

use async_trait::async_trait;

use crate::error::Result;

/// Latest values of the primary (temperature + pressure) sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimaryReading {
    /// Temperature in °C.
    pub temp_c: f64,
    /// Air pressure in hPa.
    pub pressure_hpa: f64,
}

/// Latest values of the secondary (temperature + humidity + CO2) sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondaryReading {
    /// Temperature in °C.
    pub temp_c: f64,
    /// Relative humidity in %.
    pub relative_humidity_pct: f64,
    /// CO2 concentration in ppm.
    pub co2_ppm: u32,
}

/// Capability interface over the sensor hardware.
///
/// Methods take `&mut self`: the bus is owned by a single control flow and
/// is not expected to be shared between tasks. Implementations are
/// constructed once at startup and handed to a
/// [`SensorReader`](crate::SensorReader).
///
/// # Example
///
/// ```ignore
/// use envlog_core::{SensorBus, Result};
///
/// async fn co2<B: SensorBus>(bus: &mut B) -> Result<Option<u32>> {
///     if !bus.is_ready().await? {
///         return Ok(None);
///     }
///     Ok(Some(bus.read_secondary().await?.co2_ppm))
/// }
/// ```
#[async_trait]
pub trait SensorBus: Send {
    /// Whether the secondary sensor has a fresh measurement available.
    async fn is_ready(&mut self) -> Result<bool>;

    /// Read the primary sensor.
    async fn read_primary(&mut self) -> Result<PrimaryReading>;

    /// Read the secondary sensor.
    async fn read_secondary(&mut self) -> Result<SecondaryReading>;

    /// Feed the ambient pressure (hPa) to the secondary sensor's compensation.
    async fn calibrate(&mut self, ambient_pressure_hpa: f64) -> Result<()>;
}
