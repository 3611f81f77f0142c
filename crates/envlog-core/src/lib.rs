//! Sensor access for the envlog environmental collector.
//!
//! This crate sits between the hardware and the sampling loop. The hardware
//! is reached only through the [`SensorBus`] capability trait; a
//! [`SensorReader`] owns one bus and turns each successful poll into a
//! [`RawReading`].
//!
//! # Sensors
//!
//! | Source | Values |
//! |--------|--------|
//! | Primary | Temperature, Pressure |
//! | Secondary | Temperature, Relative Humidity, CO₂ |
//!
//! # Quick Start
//!
//! ```
//! use envlog_core::{SensorReader, SimulatedSensor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), envlog_core::Error> {
//!     let mut reader = SensorReader::new(SimulatedSensor::new());
//!
//!     if let Some(reading) = reader.poll(1_700_000_000).await? {
//!         reader.calibrate(reading.pressure_hpa).await?;
//!         let sample = reading.into_sample()?;
//!         println!("CO2: {} ppm", sample.co2_ppm);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod mock;
pub mod reader;
pub mod retry;
pub mod traits;

pub use error::{Error, Result, SensorSource};
pub use mock::{SimulatedSensor, SimulatedSensorBuilder};
pub use reader::SensorReader;
pub use retry::BackoffConfig;
pub use traits::{PrimaryReading, SecondaryReading, SensorBus};

// Re-export from envlog-types
pub use envlog_types::{DerivedMetrics, RawReading, Sample};
