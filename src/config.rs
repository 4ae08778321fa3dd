//! Configuration management for Helios
//!
//! Settings come from a YAML file. JSON is valid YAML, so the `config.json`
//! files written for earlier releases load unchanged.

use crate::aggregate::ScalingPolicy;
use crate::error::{HeliosError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod defaults;
pub mod values;

pub use defaults::{DEFAULT_PATH, DEFAULT_PVOUTPUT_URL, DEFAULT_TIMEOUT_SECS};

/// Locations searched, in order, when no config path is given
pub const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "helios_config.yaml",
    "config.json",
    "/etc/helios/config.yaml",
];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ECU host name or IP address (no scheme)
    pub host: String,

    /// Path of the status page on the ECU
    pub path: String,

    /// Timeout for the status page request, in seconds
    pub timeout_secs: u64,

    /// IANA timezone for PVOutput date/time fields; system local time if unset
    pub timezone: Option<String>,

    /// Extrapolate the total when fewer inverters report than expected
    #[serde(deserialize_with = "values::bool_like")]
    pub scale_missing: bool,

    /// Number of inverters installed; required when `scale_missing` is on
    #[serde(deserialize_with = "values::count_like")]
    pub expected_count: Option<i64>,

    /// PVOutput publishing
    pub pvoutput: PvOutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// PVOutput publishing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PvOutputConfig {
    /// Whether to publish after a successful read
    #[serde(deserialize_with = "values::bool_like")]
    pub publish: bool,

    /// `X-Pvoutput-Apikey` header value
    pub api_key: Option<String>,

    /// `X-Pvoutput-SystemId` header value
    #[serde(deserialize_with = "values::text_like")]
    pub system_id: Option<String>,

    /// Add-status endpoint
    pub url: String,

    /// Timeout for the publish request, in seconds
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Directory or file path for a daily-rolling log file; console only if unset
    pub file: Option<String>,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to the console (stderr)
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Config {
    /// Load configuration from a YAML (or JSON) file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            HeliosError::config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        serde_yaml::from_str(&contents)
            .map_err(|e| HeliosError::config(format!("Cannot parse {}: {}", path.display(), e)))
    }

    /// Load from `path`, or from the first of [`DEFAULT_CONFIG_PATHS`] that exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .map(Self::from_file)
            .unwrap_or_else(|| {
                Err(HeliosError::config(format!(
                    "Config file not found (looked for {})",
                    DEFAULT_CONFIG_PATHS.join(", ")
                )))
            })
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Status page URL on the ECU
    pub fn url(&self) -> String {
        format!("http://{}{}", self.host.trim(), self.path)
    }

    /// Validated missing-panel scaling settings
    pub fn scaling_policy(&self) -> Result<ScalingPolicy> {
        ScalingPolicy::from_settings(self.scale_missing, self.expected_count)
    }

    /// Configured panel count, if it is a usable positive number
    pub fn expected_panels(&self) -> Option<u32> {
        self.expected_count
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
    }

    /// Parsed timezone, `None` for system local time
    pub fn tz(&self) -> Result<Option<chrono_tz::Tz>> {
        match self.timezone.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => name.parse::<chrono_tz::Tz>().map(Some).map_err(|_| {
                HeliosError::validation("timezone", format!("Unknown timezone: {}", name))
            }),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(HeliosError::validation("host", "Host cannot be empty"));
        }
        if host.contains("://") || host.contains('/') {
            return Err(HeliosError::validation(
                "host",
                "Host must be a bare name or address, without scheme or path",
            ));
        }

        if !self.path.starts_with('/') {
            return Err(HeliosError::validation("path", "Path must start with '/'"));
        }

        if self.timeout_secs == 0 {
            return Err(HeliosError::validation(
                "timeout_secs",
                "Must be greater than 0",
            ));
        }

        if self.pvoutput.timeout_secs == 0 {
            return Err(HeliosError::validation(
                "pvoutput.timeout_secs",
                "Must be greater than 0",
            ));
        }

        self.tz()?;
        self.scaling_policy()?;
        crate::logging::parse_log_level(&self.logging.level)?;

        Ok(())
    }
}
