//! Sampling loop, chart renderer and status page for envlog.
//!
//! This crate ties the sensor layer and the store together:
//! - A [`Scheduler`] polls the sensors on a fixed interval and appends each sample
//! - A [`Presenter`] writes the latest sample to the terminal or to `index.html`
//! - A [`Renderer`] draws six trailing-window charts as SVG files
//! - A [`RenderDispatcher`] keeps at most one render running, off the sampling task
//!
//! Every published file is replaced atomically, so a web server pointed at
//! the output directory never serves a partial page or chart.
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/envlog/envlog.toml`:
//!
//! ```toml
//! [sampling]
//! interval_secs = 30
//! render_every = 2
//!
//! [output]
//! mode = "page"
//! dir = "/var/www/html"
//! title = "Living room"
//!
//! [render]
//! window_secs = 86400
//! overlap = "skip"
//! ```

pub mod config;
pub mod dispatch;
pub mod presenter;
pub mod publish;
pub mod render;
pub mod scheduler;

pub use config::{
    Config, ConfigError, OutputConfig, OutputMode, OverlapPolicy, RenderConfig, SamplingConfig,
    SensorConfig, SensorKind, StorageConfig,
};
pub use dispatch::{DispatchOutcome, RenderDispatcher};
pub use presenter::{PresentError, Presenter};
pub use render::{RenderError, RenderReport, RenderedChart, Renderer, SensorLabels};
pub use scheduler::{Clock, Scheduler, SchedulerError, SchedulerSettings, SystemClock, TickReport};

impl From<&SensorConfig> for SensorLabels {
    fn from(config: &SensorConfig) -> Self {
        Self {
            primary: config.primary_label.clone(),
            secondary: config.secondary_label.clone(),
        }
    }
}
