//! Command-line interface definition.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use slotcheck_core::TracingConfig;

use crate::config::ClientConfig;

/// slotcheck - find calendar conflicts for a proposed time slot
#[derive(Debug, Parser)]
#[command(name = "slotcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "SLOTCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Calendar identity to check (can be repeated, replaces configured calendars)
    #[arg(long = "calendar", action = clap::ArgAction::Append)]
    pub calendars: Vec<String>,

    /// Days ahead to fetch
    #[arg(long)]
    pub days: Option<u32>,

    /// Start of the proposed slot (RFC 3339), defaults to now
    #[arg(long, value_parser = parse_rfc3339)]
    pub start: Option<DateTime<Utc>>,

    /// Length of the proposed slot in minutes
    #[arg(long, default_value = "60")]
    pub minutes: u32,

    /// Skip the event report
    #[arg(long)]
    pub no_report: bool,

    /// Print conflicts as JSON
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration (token redacted)
    Dump,

    /// Show configuration file path
    Path,
}

impl Cli {
    /// Logging setup for this run; `--debug` or `debug = true` in the
    /// config file turns on debug output.
    pub fn tracing_config(&self, config: &ClientConfig) -> TracingConfig {
        if self.debug || config.debug {
            TracingConfig::cli_debug()
        } else {
            TracingConfig::cli()
        }
    }
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp like 2021-11-16T09:00:00Z: {}", e))
}
