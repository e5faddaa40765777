//! Command-line interface definitions.
//!
//! Every option can also be set through the environment variable named next to
//! it, which `main` populates from a `.env` file when one exists.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use crate::config::constants::{
    DB_PATH, DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_CONNECTIONS, DEFAULT_WINDOW_DAYS,
    DEFAULT_WINDOW_START,
};
use crate::config::types::{parse_timestamp, Config, InvalidAddressPolicy, LogFormat, LogLevel};

/// Top-level command line.
#[derive(Debug, Parser)]
#[command(
    name = "country_backfill",
    version,
    about = "Fill in client country codes on download log rows"
)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve country codes for one processing window
    Reconcile(ReconcileArgs),
    /// Show recorded reconcile runs, newest first
    History(HistoryArgs),
}

/// Options of `reconcile`.
#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Record store (SQLite file)
    #[arg(long, env = "COUNTRY_BACKFILL_DB_PATH", default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// Separate range reference database, opened read-only
    #[arg(long, env = "COUNTRY_BACKFILL_LOOKUP_DB")]
    pub lookup_db: Option<PathBuf>,

    /// Connection limit for each pool
    #[arg(long, env = "COUNTRY_BACKFILL_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,

    /// Window start (RFC 3339, YYYY-MM-DD or YYYY-MM-DD HH:MM:SS, UTC)
    #[arg(long, env = "COUNTRY_BACKFILL_START", default_value = DEFAULT_WINDOW_START, value_parser = parse_timestamp)]
    pub start: DateTime<Utc>,

    /// Window end, exclusive (same formats as --start)
    #[arg(long, env = "COUNTRY_BACKFILL_END", value_parser = parse_timestamp, conflicts_with = "days")]
    pub end: Option<DateTime<Utc>>,

    /// Window length in days when --end is not given
    #[arg(long, env = "COUNTRY_BACKFILL_DAYS", default_value_t = DEFAULT_WINDOW_DAYS, value_parser = clap::value_parser!(i64).range(1..))]
    pub days: i64,

    /// Start where the latest completed run ended (falls back to --start)
    #[arg(long, env = "COUNTRY_BACKFILL_RESUME")]
    pub resume: bool,

    /// Handling of malformed client addresses
    #[arg(long, env = "COUNTRY_BACKFILL_INVALID_ADDRESS", value_enum, default_value_t = InvalidAddressPolicy::Skip)]
    pub invalid_address: InvalidAddressPolicy,

    /// Count updates that affect zero rows as skips (another run got there first)
    #[arg(long, env = "COUNTRY_BACKFILL_STALE_ROWS_ARE_SKIPS")]
    pub stale_rows_are_skips: bool,

    /// Log level
    #[arg(long, env = "COUNTRY_BACKFILL_LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, env = "COUNTRY_BACKFILL_LOG_FORMAT", value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

/// Options of `history`.
#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Record store (SQLite file)
    #[arg(long, env = "COUNTRY_BACKFILL_DB_PATH", default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// Maximum number of runs to show
    #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    pub limit: usize,
}

impl From<ReconcileArgs> for Config {
    fn from(args: ReconcileArgs) -> Self {
        Config {
            log_level: args.log_level,
            log_format: args.log_format,
            db_path: args.db_path,
            lookup_db: args.lookup_db,
            max_connections: args.max_connections,
            start: args.start,
            end: args.end,
            days: args.days,
            resume: args.resume,
            invalid_address: args.invalid_address,
            stale_rows_are_skips: args.stale_rows_are_skips,
        }
    }
}
