// src/cli.rs

//! CLI argument parsing using `clap`.

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};

/// Command-line arguments for `blockdates`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "blockdates",
    version,
    about = "Compute effective release dates of a course outline and filter it for a viewer.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the course outline (TOML).
    #[arg(long, value_name = "PATH", default_value = "Course.toml")]
    pub config: String,

    /// Viewer to filter the outline for.
    #[arg(long, value_name = "NAME", default_value = "anonymous")]
    pub user: String,

    /// Viewer has staff access (no date filtering).
    #[arg(long)]
    pub staff: bool,

    /// Viewer may see content whose start date is in the future.
    #[arg(long)]
    pub allow_future: bool,

    /// Evaluate start dates at this instant (RFC 3339) instead of now.
    #[arg(long, value_name = "DATETIME", value_parser = parse_datetime)]
    pub now: Option<DateTime<Utc>>,

    /// Print every block's effective start date instead of filtering.
    #[arg(long)]
    pub fields: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BLOCKDATES_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate and print the outline, without running transformers.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 datetime {s:?}: {e}"))
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
