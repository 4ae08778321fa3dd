//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

/// Read APS inverter data and optionally publish to PVOutput.
#[derive(Parser, Debug, Clone)]
#[command(name = "helios")]
#[command(version = env!("HELIOS_VERSION"))]
pub struct Cli {
    /// Path to config file (default: first of helios_config.yaml, config.json, /etc/helios/config.yaml)
    #[arg(short, long, env = "HELIOS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Skip publishing even if pvoutput.publish is enabled
    #[arg(long)]
    pub no_publish: bool,

    /// Parse a saved status page instead of fetching it from the ECU
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Log at DEBUG level on the console
    #[arg(short, long)]
    pub verbose: bool,
}
