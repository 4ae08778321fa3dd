//! Error types and handling for Helios
//!
//! Every failure a run can end with is one of these variants. Cell-level parse
//! problems never show up here: they are absorbed as absent values by the
//! extractor, and only "no table" / "no rows" surface as errors.

use thiserror::Error;

/// Result type alias for Helios operations
pub type Result<T> = std::result::Result<T, HeliosError>;

/// Process exit code for a run that completed without error
pub const EXIT_OK: i32 = 0;
/// Process exit code for configuration problems
pub const EXIT_CONFIG: i32 = 1;
/// Process exit code for fetch or parse failures
pub const EXIT_FETCH: i32 = 2;
/// Process exit code when the inverter table had no usable rows
pub const EXIT_EMPTY: i32 = 3;
/// Process exit code when publishing to PVOutput failed
pub const EXIT_PUBLISH: i32 = 4;

/// Main error type for Helios
#[derive(Debug, Error)]
pub enum HeliosError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Fetching the inverter status page failed
    #[error("Fetch error: {message}")]
    Fetch { message: String },

    /// No table in the page carried the inverter header marker
    #[error("Could not find inverter data table (no table header contains {marker:?})")]
    TableNotFound { marker: String },

    /// The inverter table was found but yielded no readings
    #[error("No inverter readings found: {message}")]
    EmptyResult { message: String },

    /// Publishing to PVOutput failed
    #[error("Publish error: {message}")]
    Publish { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl HeliosError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        HeliosError::Config {
            message: message.into(),
        }
    }

    /// Create a new fetch error
    pub fn fetch<S: Into<String>>(message: S) -> Self {
        HeliosError::Fetch {
            message: message.into(),
        }
    }

    /// Create a table-not-found error for the given header marker
    pub fn table_not_found<S: Into<String>>(marker: S) -> Self {
        HeliosError::TableNotFound {
            marker: marker.into(),
        }
    }

    /// Create a new empty-result error
    pub fn empty_result<S: Into<String>>(message: S) -> Self {
        HeliosError::EmptyResult {
            message: message.into(),
        }
    }

    /// Create a new publish error
    pub fn publish<S: Into<String>>(message: S) -> Self {
        HeliosError::Publish {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        HeliosError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        HeliosError::Io {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        HeliosError::Generic {
            message: message.into(),
        }
    }

    /// Exit code the CLI reports for this error.
    ///
    /// Configuration, fetch/parse, empty-result and publish failures stay
    /// distinguishable so a timer unit can tell them apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            HeliosError::Config { .. } | HeliosError::Validation { .. } => EXIT_CONFIG,
            HeliosError::EmptyResult { .. } => EXIT_EMPTY,
            HeliosError::Publish { .. } => EXIT_PUBLISH,
            HeliosError::Fetch { .. }
            | HeliosError::TableNotFound { .. }
            | HeliosError::Serialization { .. }
            | HeliosError::Io { .. }
            | HeliosError::Generic { .. } => EXIT_FETCH,
        }
    }
}

impl From<std::io::Error> for HeliosError {
    fn from(err: std::io::Error) -> Self {
        HeliosError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for HeliosError {
    fn from(err: serde_yaml::Error) -> Self {
        HeliosError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for HeliosError {
    fn from(err: serde_json::Error) -> Self {
        HeliosError::Serialization {
            message: err.to_string(),
        }
    }
}

// Only the inverter fetch uses `?` on reqwest errors; the publisher maps its own.
impl From<reqwest::Error> for HeliosError {
    fn from(err: reqwest::Error) -> Self {
        HeliosError::fetch(err.to_string())
    }
}

impl From<regex::Error> for HeliosError {
    fn from(err: regex::Error) -> Self {
        HeliosError::generic(format!("Invalid cell pattern: {}", err))
    }
}
