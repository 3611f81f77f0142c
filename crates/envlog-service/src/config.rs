//! Collector configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Collector configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sampling cadence and failure policy.
    pub sampling: SamplingConfig,
    /// Which sensor bus to use and how to label it.
    pub sensor: SensorConfig,
    /// Storage settings.
    pub storage: StorageConfig,
    /// Snapshot output settings.
    pub output: OutputConfig,
    /// Chart settings.
    pub render: RenderConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return any errors.
    ///
    /// All sections are checked and every problem is reported at once.
    ///
    /// # Example
    ///
    /// ```
    /// use envlog_service::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        errors.extend(self.sampling.validate());
        errors.extend(self.sensor.validate());
        errors.extend(self.storage.validate());
        errors.extend(self.output.validate());
        errors.extend(self.render.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Write the default configuration to `path`.
    ///
    /// An existing file is only replaced when `force` is set.
    pub fn init_file<P: AsRef<Path>>(path: P, force: bool) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }

        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// The database path to use.
    ///
    /// An explicit `storage.path` wins; otherwise page and terminal mode
    /// keep separate logs under the platform data directory.
    pub fn database_path(&self) -> PathBuf {
        match &self.storage.path {
            Some(path) => path.clone(),
            None => envlog_store::default_db_path(self.output.mode.db_name()),
        }
    }
}

/// Minimum sampling interval in seconds.
pub const MIN_INTERVAL_SECS: u64 = 1;
/// Maximum sampling interval in seconds (1 hour).
pub const MAX_INTERVAL_SECS: u64 = 3600;

/// Sampling loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Seconds between ticks.
    pub interval_secs: u64,
    /// Dispatch a render every this many ticks.
    pub render_every: u64,
    /// Seconds to wait before the first tick.
    pub warmup_secs: u64,
    /// Consecutive sensor failures tolerated before giving up.
    pub max_consecutive_failures: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            render_every: 2,
            warmup_secs: 0,
            max_consecutive_failures: 5,
        }
    }
}

impl SamplingConfig {
    /// Tick interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Validate sampling configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.interval_secs < MIN_INTERVAL_SECS {
            errors.push(ValidationError {
                field: "sampling.interval_secs".to_string(),
                message: format!(
                    "interval {} is too short (minimum {} second)",
                    self.interval_secs, MIN_INTERVAL_SECS
                ),
            });
        } else if self.interval_secs > MAX_INTERVAL_SECS {
            errors.push(ValidationError {
                field: "sampling.interval_secs".to_string(),
                message: format!(
                    "interval {} is too long (maximum {} seconds / 1 hour)",
                    self.interval_secs, MAX_INTERVAL_SECS
                ),
            });
        }

        if self.render_every == 0 {
            errors.push(ValidationError {
                field: "sampling.render_every".to_string(),
                message: "render interval must be at least 1 tick".to_string(),
            });
        }

        if self.max_consecutive_failures == 0 {
            errors.push(ValidationError {
                field: "sampling.max_consecutive_failures".to_string(),
                message: "must allow at least 1 failure".to_string(),
            });
        }

        errors
    }
}

/// Kind of sensor bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// The built-in simulated pair of sensors.
    #[default]
    Simulated,
}

/// Sensor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Which bus implementation to use.
    pub kind: SensorKind,
    /// Label for the temperature/pressure sensor.
    pub primary_label: String,
    /// Label for the temperature/humidity/CO2 sensor.
    pub secondary_label: String,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            kind: SensorKind::Simulated,
            primary_label: "BMP280".to_string(),
            secondary_label: "SCD41".to_string(),
        }
    }
}

impl SensorConfig {
    /// Validate sensor configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for (field, label) in [
            ("sensor.primary_label", &self.primary_label),
            ("sensor.secondary_label", &self.secondary_label),
        ] {
            if label.trim().is_empty() {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message: "label cannot be empty".to_string(),
                });
            }
        }

        errors
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path. Defaults depend on the output mode.
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Validate storage configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let Some(path) = &self.path
            && path.as_os_str().is_empty()
        {
            errors.push(ValidationError {
                field: "storage.path".to_string(),
                message: "database path cannot be empty (omit it to use the default)".to_string(),
            });
        }

        errors
    }
}

/// Where the snapshot goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Write `index.html` plus charts into the output directory.
    #[default]
    Page,
    /// Print the snapshot to stdout. Charts are still rendered.
    Terminal,
}

impl OutputMode {
    /// File stem of the default database for this mode.
    pub fn db_name(self) -> &'static str {
        match self {
            OutputMode::Page => "web",
            OutputMode::Terminal => "terminal",
        }
    }
}

impl std::str::FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "page" | "web" => Ok(OutputMode::Page),
            "terminal" | "term" => Ok(OutputMode::Terminal),
            other => Err(format!(
                "unknown output mode '{}': expected 'page' or 'terminal'",
                other
            )),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Snapshot destination.
    pub mode: OutputMode,
    /// Directory holding `index.html` and the chart files.
    pub dir: PathBuf,
    /// Page title.
    pub title: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Page,
            dir: PathBuf::from("./www"),
            title: "Environment".to_string(),
        }
    }
}

impl OutputConfig {
    /// Validate output configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.dir.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "output.dir".to_string(),
                message: "output directory cannot be empty".to_string(),
            });
        }

        errors
    }
}

/// What the scheduler does when a render is due while one is still running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Leave the running render alone and skip this one.
    #[default]
    Skip,
    /// Join the running render, then dispatch.
    Wait,
}

/// Smallest chart dimension accepted.
pub const MIN_CHART_DIMENSION: u32 = 100;

/// Chart settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Trailing window length in seconds.
    pub window_secs: i64,
    /// Chart width in pixels.
    pub width: u32,
    /// Chart height in pixels.
    pub height: u32,
    /// Overlap handling.
    pub overlap: OverlapPolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_secs: 86_400,
            width: 1000,
            height: 500,
            overlap: OverlapPolicy::Skip,
        }
    }
}

impl RenderConfig {
    /// Validate render configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.window_secs <= 0 {
            errors.push(ValidationError {
                field: "render.window_secs".to_string(),
                message: format!("window {} must be positive", self.window_secs),
            });
        }

        for (field, value) in [("render.width", self.width), ("render.height", self.height)] {
            if value < MIN_CHART_DIMENSION {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message: format!(
                        "{} is too small (minimum {} pixels)",
                        value, MIN_CHART_DIMENSION
                    ),
                });
            }
        }

        errors
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Config file {0} already exists (use --force to replace it)")]
    AlreadyExists(PathBuf),
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `sampling.interval_secs`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("envlog")
        .join("envlog.toml")
}
