//! # Helios - APS Solar Inverter Reader
//!
//! Reads the per-panel status page served by an APS ECU (Energy
//! Communication Unit), totals the power figures, and optionally publishes a
//! live status to PVOutput.
//!
//! ## Features
//!
//! - **Tolerant HTML parsing**: Table extraction on the html5ever tokenizer
//!   that survives unclosed tags, legacy entities and chunked input
//! - **Unit-aware extraction**: Power, voltage and temperature read by unit
//!   suffix rather than column position alone
//! - **Missing-panel scaling**: Optional estimate of the array total when
//!   micro-inverters drop off the ECU
//! - **PVOutput publishing**: One live status per run
//! - **Configuration**: YAML (or legacy JSON) configuration with validation
//!
//! ## Architecture
//!
//! - `markup`: HTML tables to rows of normalized cell text
//! - `locator`: Finding the inverter table by its header
//! - `extract`: Numeric field extraction from cell text
//! - `reading`: Per-inverter readings from table rows
//! - `aggregate`: Totals, averages and missing-panel scaling
//! - `report`: Text and JSON rendering
//! - `inverter`: Fetching the ECU status page
//! - `pvoutput`: PVOutput status publishing
//! - `app`: One read, aggregate and publish cycle
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing

pub mod aggregate;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod inverter;
pub mod locator;
pub mod logging;
pub mod markup;
pub mod pvoutput;
pub mod reading;
pub mod report;

// Re-export commonly used types
pub use aggregate::{Aggregate, ScalingPolicy};
pub use config::Config;
pub use error::{HeliosError, Result};
pub use reading::Reading;
pub use report::Report;
