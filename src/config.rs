//! ==============================================================================
//! config.rs - Simulator Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `sensor-sim.toml`.
//!     loads configuration from file or falls back to defaults,
//!     then lets SENSOR_SIM_* environment variables override single values.
//!
//! structure:
//!     - ApiConfig: Where readings are POSTed and how long one request may take.
//!     - ScheduleConfig: Delay between two send cycles.
//!     - SensorsConfig: How many simulated sensors rotate and their id prefix.
//!     - LoggingConfig: Default log level when RUST_LOG is not set.
//!
//! ==============================================================================

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/log-data";

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub api: ApiConfig,
    pub schedule: ScheduleConfig,
    pub sensors: SensorsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    /// 0 disables the request timeout
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SensorsConfig {
    pub count: u32,
    pub prefix: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { interval_seconds: 1800 }
    }
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self { count: 3, prefix: "temp".to_string() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl SimConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).map_err(|e| anyhow!("Failed to parse config: {}", e))
    }

    /// Load with default fallback
    ///
    /// An explicit path must load; the well-known locations are only probed.
    pub fn load_or_default(explicit: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            let config = Self::load(&path)?;
            println!("[CONFIG] Loaded from {}", path.display());
            return Ok(config);
        }

        let paths = [
            PathBuf::from("config").join("sensor-sim.toml"),
            PathBuf::from("..").join("config").join("sensor-sim.toml"),
        ];

        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        println!("[CONFIG] Loaded from {}", path.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        println!("[CONFIG] Warning: Failed to load {}: {:#}", path.display(), e);
                    }
                }
            }
        }

        println!("[CONFIG] Warning: No config file found - using defaults");
        Ok(Self::default())
    }

    /// Apply SENSOR_SIM_* overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("SENSOR_SIM_API_ENDPOINT") {
            self.api.endpoint = endpoint;
        }
        if let Some(value) = lookup("SENSOR_SIM_TIMEOUT_SECONDS") {
            self.api.timeout_seconds = parse_number("SENSOR_SIM_TIMEOUT_SECONDS", &value)?;
        }
        if let Some(value) = lookup("SENSOR_SIM_SEND_INTERVAL_SECONDS") {
            self.schedule.interval_seconds =
                parse_number("SENSOR_SIM_SEND_INTERVAL_SECONDS", &value)?;
        }
        if let Some(value) = lookup("SENSOR_SIM_NUMBER_OF_SENSORS") {
            self.sensors.count = parse_number("SENSOR_SIM_NUMBER_OF_SENSORS", &value)?;
        }
        if let Some(prefix) = lookup("SENSOR_SIM_SENSOR_PREFIX") {
            self.sensors.prefix = prefix;
        }
        if let Some(level) = lookup("SENSOR_SIM_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = reqwest::Url::parse(&self.api.endpoint)
            .with_context(|| format!("Invalid API endpoint {:?}", self.api.endpoint))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("API endpoint must use http or https, got {}", url.scheme());
        }
        if self.sensors.count == 0 {
            bail!("sensors.count must be at least 1");
        }
        if self.sensors.prefix.is_empty() {
            bail!("sensors.prefix must not be empty");
        }
        if self.schedule.interval_seconds == 0 {
            bail!("schedule.interval_seconds must be greater than 0");
        }
        Ok(())
    }

    pub fn send_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_seconds)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        match self.api.timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        let timeout = match self.request_timeout() {
            Some(t) => format!("{}s", t.as_secs()),
            None => "none".to_string(),
        };
        println!("┌─────────────────────────────────────────┐");
        println!("│         SIMULATOR CONFIGURATION         │");
        println!("├─────────────────────────────────────────┤");
        println!("│ Endpoint: {}", self.api.endpoint);
        println!("│ Send Interval: {}s", self.schedule.interval_seconds);
        println!("│ Sensors: {} ({}_01..)", self.sensors.count, self.sensors.prefix);
        println!("│ Request Timeout: {}", timeout);
        println!("│ Log Level: {}", self.logging.level);
        println!("└─────────────────────────────────────────┘");
    }
}

fn parse_number<T>(key: &str, value: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| anyhow!("{} must be a non-negative integer, got {:?}: {}", key, value, e))
}
