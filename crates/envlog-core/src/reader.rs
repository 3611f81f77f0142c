//! Sensor reader wrapping the hardware capability.

use tracing::{debug, trace};

use envlog_types::RawReading;

use crate::error::Result;
use crate::traits::SensorBus;

/// Polls a [`SensorBus`] and combines both sources into a [`RawReading`].
///
/// The reader owns the bus; whoever owns the reader is the only code that
/// touches the hardware.
#[derive(Debug)]
pub struct SensorReader<B> {
    bus: B,
    readings: u64,
}

impl<B: SensorBus> SensorReader<B> {
    /// Wrap a sensor bus.
    pub fn new(bus: B) -> Self {
        Self { bus, readings: 0 }
    }

    /// Poll the sensors.
    ///
    /// Returns `Ok(None)` when the capability reports no fresh measurement.
    /// Otherwise both sensors are read and the result is stamped with `now`
    /// (seconds since the Unix epoch, captured by the caller at poll time).
    pub async fn poll(&mut self, now: i64) -> Result<Option<RawReading>> {
        if !self.bus.is_ready().await? {
            trace!("Sensor not ready at {}", now);
            return Ok(None);
        }

        let primary = self.bus.read_primary().await?;
        let secondary = self.bus.read_secondary().await?;
        self.readings += 1;

        let reading = RawReading {
            timestamp: now,
            primary_temp_c: primary.temp_c,
            pressure_hpa: primary.pressure_hpa,
            secondary_temp_c: secondary.temp_c,
            relative_humidity_pct: secondary.relative_humidity_pct,
            co2_ppm: secondary.co2_ppm,
        };
        debug!("Polled reading #{}: {:?}", self.readings, reading);
        Ok(Some(reading))
    }

    /// Forward an ambient pressure correction to the secondary sensor.
    ///
    /// Called after a reading has been taken; it affects later measurements only.
    pub async fn calibrate(&mut self, pressure_hpa: f64) -> Result<()> {
        self.bus.calibrate(pressure_hpa).await
    }

    /// Number of successful readings so far.
    pub fn readings(&self) -> u64 {
        self.readings
    }

    /// Borrow the underlying bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }
}
