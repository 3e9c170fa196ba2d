//! Command-line interface for alertbox using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format for log aggregation.
    Json,
}

/// Replay alert scenarios against an in-memory notification surface.
#[derive(Parser, Debug)]
#[command(name = "alertbox")]
#[command(version)]
#[command(about = "Replay alert scenarios against an in-memory notification surface")]
pub struct Cli {
    /// Path to configuration file. Built-in defaults apply when omitted.
    #[arg(short = 'c', long = "config", env = "ALERTBOX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Validate configuration (and scenario, if given) and exit.
    #[arg(long = "validate")]
    pub validate: bool,

    /// Log format: text or json.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text, env = "LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Scenario file to replay.
    #[arg(required_unless_present = "validate")]
    pub scenario: Option<PathBuf>,
}
