//! Simulated sensor implementation.
//!
//! [`SimulatedSensor`] implements [`SensorBus`] without any hardware. The
//! service binary uses it for the `simulated` sensor kind and every test in
//! the workspace uses it in place of a real bus.
//!
//! # Features
//!
//! - **Failure injection**: fail every read, one sensor's reads, the next N
//!   reads, or the ambient pressure command
//! - **Readiness control**: report "no fresh measurement"
//! - **Latency simulation**: add artificial delays to reads
//! - **Variation**: random-walk the values so charts have something to show
//!
//! Clones share state, so a test can keep a clone as a control handle after
//! moving the sensor into a reader.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::error::{Error, Result, SensorSource};
use crate::traits::{PrimaryReading, SecondaryReading, SensorBus};

#[derive(Debug)]
struct SimState {
    primary: PrimaryReading,
    secondary: SecondaryReading,
    temperature_offset: f64,
    ready: bool,
    should_fail: bool,
    failing_source: Option<SensorSource>,
    calibration_fails: bool,
    remaining_failures: u32,
    read_latency: Duration,
    variation: bool,
    read_count: u32,
    calibrations: Vec<f64>,
}

/// A simulated pair of environmental sensors.
///
/// # Example
///
/// ```
/// use envlog_core::{SensorReader, SimulatedSensorBuilder};
///
/// #[tokio::main]
/// async fn main() {
///     let sensor = SimulatedSensorBuilder::new().secondary(21.0, 45.0, 700).build();
///     let mut reader = SensorReader::new(sensor);
///     let reading = reader.poll(1_700_000_000).await.unwrap().unwrap();
///     assert_eq!(reading.co2_ppm, 700);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        SimulatedSensorBuilder::new().build()
    }
}

impl SimulatedSensor {
    /// Create a simulated sensor with default indoor values.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        // A panicking test thread must not wedge every other clone.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every subsequent read fail.
    pub fn set_should_fail(&self, fail: bool) {
        self.state().should_fail = fail;
    }

    /// Make every subsequent read of one source fail; `None` clears it.
    pub fn set_failing_source(&self, source: Option<SensorSource>) {
        self.state().failing_source = source;
    }

    /// Make the ambient pressure command fail while reads keep working.
    pub fn set_calibration_fails(&self, fail: bool) {
        self.state().calibration_fails = fail;
    }

    /// Fail the next `count` reads, then recover.
    pub fn set_transient_failures(&self, count: u32) {
        self.state().remaining_failures = count;
    }

    /// Number of transient failures still pending.
    pub fn remaining_failures(&self) -> u32 {
        self.state().remaining_failures
    }

    /// Control whether a fresh measurement is available.
    pub fn set_ready(&self, ready: bool) {
        self.state().ready = ready;
    }

    /// Set simulated read latency.
    pub fn set_read_latency(&self, latency: Duration) {
        self.state().read_latency = latency;
    }

    /// Replace the secondary sensor's values.
    pub fn set_secondary(&self, temp_c: f64, relative_humidity_pct: f64, co2_ppm: u32) {
        self.state().secondary = SecondaryReading {
            temp_c,
            relative_humidity_pct,
            co2_ppm,
        };
    }

    /// Number of successful primary reads.
    pub fn read_count(&self) -> u32 {
        self.state().read_count
    }

    /// Ambient pressures received through [`SensorBus::calibrate`], in order.
    pub fn calibrations(&self) -> Vec<f64> {
        self.state().calibrations.clone()
    }

    async fn simulate_latency(&self) {
        let latency = self.state().read_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_should_fail(state: &mut SimState, source: SensorSource) -> Result<()> {
        if state.remaining_failures > 0 {
            state.remaining_failures -= 1;
            return Err(Error::hardware(source, "simulated transient failure"));
        }
        if state.should_fail || state.failing_source == Some(source) {
            return Err(Error::hardware(source, "simulated failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl SensorBus for SimulatedSensor {
    async fn is_ready(&mut self) -> Result<bool> {
        Ok(self.state().ready)
    }

    async fn read_primary(&mut self) -> Result<PrimaryReading> {
        self.simulate_latency().await;
        let mut state = self.state();
        Self::check_should_fail(&mut state, SensorSource::Primary)?;

        if state.variation {
            let mut rng = rand::rng();
            state.primary.temp_c += rng.random_range(-0.05..0.05);
            state.primary.pressure_hpa += rng.random_range(-0.1..0.1);
        }
        state.read_count += 1;
        Ok(state.primary)
    }

    async fn read_secondary(&mut self) -> Result<SecondaryReading> {
        self.simulate_latency().await;
        let mut state = self.state();
        Self::check_should_fail(&mut state, SensorSource::Secondary)?;

        if state.variation {
            let mut rng = rand::rng();
            let secondary = &mut state.secondary;
            secondary.temp_c += rng.random_range(-0.05..0.05);
            secondary.relative_humidity_pct =
                (secondary.relative_humidity_pct + rng.random_range(-0.3..0.3)).clamp(5.0, 95.0);
            let co2 = i64::from(secondary.co2_ppm) + rng.random_range(-15..=15);
            secondary.co2_ppm = co2.clamp(400, 5000) as u32;
        }

        let mut reading = state.secondary;
        reading.temp_c -= state.temperature_offset;
        Ok(reading)
    }

    async fn calibrate(&mut self, ambient_pressure_hpa: f64) -> Result<()> {
        let mut state = self.state();
        if state.calibration_fails {
            return Err(Error::hardware(
                SensorSource::Secondary,
                "simulated calibration failure",
            ));
        }
        state.calibrations.push(ambient_pressure_hpa);
        Ok(())
    }
}

/// Builder for creating simulated sensors with custom settings.
#[derive(Debug, Clone)]
pub struct SimulatedSensorBuilder {
    primary: PrimaryReading,
    secondary: SecondaryReading,
    temperature_offset: f64,
    ready: bool,
    variation: bool,
}

impl Default for SimulatedSensorBuilder {
    fn default() -> Self {
        Self {
            primary: PrimaryReading {
                temp_c: 21.5,
                pressure_hpa: 1013.2,
            },
            secondary: SecondaryReading {
                temp_c: 22.0,
                relative_humidity_pct: 45.0,
                co2_ppm: 650,
            },
            temperature_offset: 0.0,
            ready: true,
            variation: false,
        }
    }
}

impl SimulatedSensorBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the primary sensor's temperature (°C) and pressure (hPa).
    #[must_use]
    pub fn primary(mut self, temp_c: f64, pressure_hpa: f64) -> Self {
        self.primary = PrimaryReading {
            temp_c,
            pressure_hpa,
        };
        self
    }

    /// Set the secondary sensor's temperature, humidity and CO2.
    #[must_use]
    pub fn secondary(mut self, temp_c: f64, relative_humidity_pct: f64, co2_ppm: u32) -> Self {
        self.secondary = SecondaryReading {
            temp_c,
            relative_humidity_pct,
            co2_ppm,
        };
        self
    }

    /// Subtract a fixed offset from the secondary temperature (self-heating).
    #[must_use]
    pub fn temperature_offset(mut self, offset: f64) -> Self {
        self.temperature_offset = offset;
        self
    }

    /// Set whether a measurement is available initially.
    #[must_use]
    pub fn ready(mut self, ready: bool) -> Self {
        self.ready = ready;
        self
    }

    /// Random-walk the values on every read.
    #[must_use]
    pub fn variation(mut self, enabled: bool) -> Self {
        self.variation = enabled;
        self
    }

    /// Build the simulated sensor.
    pub fn build(self) -> SimulatedSensor {
        SimulatedSensor {
            state: Arc::new(Mutex::new(SimState {
                primary: self.primary,
                secondary: self.secondary,
                temperature_offset: self.temperature_offset,
                ready: self.ready,
                should_fail: false,
                failing_source: None,
                calibration_fails: false,
                remaining_failures: 0,
                read_latency: Duration::ZERO,
                variation: self.variation,
                read_count: 0,
                calibrations: Vec::new(),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_values() {
        let mut sensor = SimulatedSensor::new();
        assert!(sensor.is_ready().await.unwrap());
        let primary = sensor.read_primary().await.unwrap();
        assert_eq!(primary.pressure_hpa, 1013.2);
        let secondary = sensor.read_secondary().await.unwrap();
        assert_eq!(secondary.co2_ppm, 650);
    }

    #[tokio::test]
    async fn test_transient_failures_recover() {
        let mut sensor = SimulatedSensor::new();
        sensor.set_transient_failures(2);

        assert!(sensor.read_primary().await.is_err());
        assert!(sensor.read_primary().await.is_err());
        assert_eq!(sensor.remaining_failures(), 0);
        assert!(sensor.read_primary().await.is_ok());
        assert_eq!(sensor.read_count(), 1);
    }

    #[tokio::test]
    async fn test_should_fail_persists() {
        let mut sensor = SimulatedSensor::new();
        sensor.set_should_fail(true);
        for _ in 0..3 {
            assert!(sensor.read_primary().await.is_err());
        }
        sensor.set_should_fail(false);
        assert!(sensor.read_primary().await.is_ok());
    }

    #[tokio::test]
    async fn test_failing_source_only_affects_that_sensor() {
        let mut sensor = SimulatedSensor::new();
        sensor.set_failing_source(Some(SensorSource::Secondary));

        assert!(sensor.read_primary().await.is_ok());
        assert!(matches!(
            sensor.read_secondary().await,
            Err(Error::Hardware {
                source_kind: SensorSource::Secondary,
                ..
            })
        ));

        sensor.set_failing_source(None);
        assert!(sensor.read_secondary().await.is_ok());
    }

    #[tokio::test]
    async fn test_calibration_failure_is_not_recorded() {
        let mut sensor = SimulatedSensor::new();
        sensor.set_calibration_fails(true);

        assert!(sensor.calibrate(1000.0).await.is_err());
        assert!(sensor.read_secondary().await.is_ok());
        assert!(sensor.calibrations().is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let sensor = SimulatedSensor::new();
        let mut moved = sensor.clone();
        sensor.set_ready(false);
        assert!(!moved.is_ready().await.unwrap());

        moved.calibrate(1001.0).await.unwrap();
        assert_eq!(sensor.calibrations(), vec![1001.0]);
    }

    #[tokio::test]
    async fn test_temperature_offset_applies_to_secondary_only() {
        let mut sensor = SimulatedSensorBuilder::new()
            .primary(20.0, 1000.0)
            .secondary(22.0, 50.0, 500)
            .temperature_offset(0.5)
            .build();

        assert_eq!(sensor.read_primary().await.unwrap().temp_c, 20.0);
        assert_eq!(sensor.read_secondary().await.unwrap().temp_c, 21.5);
    }

    #[tokio::test]
    async fn test_variation_stays_in_bounds() {
        let mut sensor = SimulatedSensorBuilder::new().variation(true).build();
        for _ in 0..200 {
            let secondary = sensor.read_secondary().await.unwrap();
            assert!(secondary.relative_humidity_pct > 0.0);
            assert!(secondary.relative_humidity_pct <= 100.0);
            assert!(secondary.co2_ppm >= 400);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_latency() {
        let mut sensor = SimulatedSensor::new();
        sensor.set_read_latency(Duration::from_millis(250));

        let start = tokio::time::Instant::now();
        sensor.read_primary().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
    }
}
