//! Configuration types.
//!
//! This module defines the enums and the library `Config` struct used to drive a
//! reconcile run, plus window bound parsing.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::ValueEnum;

use crate::config::constants::{
    DB_PATH, DEFAULT_MAX_CONNECTIONS, DEFAULT_WINDOW_DAYS, DEFAULT_WINDOW_START,
    NAIVE_TIMESTAMP_FORMATS,
};
use crate::error_handling::ReconcileError;
use crate::models::ProcessingWindow;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace). `Debug` adds one line per processed row.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// What to do with a client address that is not a valid dotted-decimal IPv4.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum InvalidAddressPolicy {
    /// Log a warning, leave the row unresolved and continue (default)
    Skip,
    /// Stop the window with an error
    Abort,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use country_backfill::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     db_path: PathBuf::from("downloads.db"),
///     resume: true,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Record store path (SQLite file)
    pub db_path: PathBuf,

    /// Separate range reference database; ranges are read from `db_path` when unset
    pub lookup_db: Option<PathBuf>,

    /// Connection limit for each pool
    pub max_connections: u32,

    /// Window start, used unless `resume` finds a watermark
    pub start: DateTime<Utc>,

    /// Window end (exclusive); `start + days` when unset
    pub end: Option<DateTime<Utc>>,

    /// Window length in days when `end` is unset
    pub days: i64,

    /// Start at the end of the latest completed window
    pub resume: bool,

    /// Handling of malformed client addresses
    pub invalid_address: InvalidAddressPolicy,

    /// Treat updates that affect zero rows as skips instead of aborting
    pub stale_rows_are_skips: bool,
}

impl Config {
    /// Resolves the processing window, preferring `watermark` when resuming.
    pub fn window(
        &self,
        watermark: Option<DateTime<Utc>>,
    ) -> Result<ProcessingWindow, ReconcileError> {
        let start = match (self.resume, watermark) {
            (true, Some(mark)) => mark,
            _ => self.start,
        };
        match self.end {
            Some(end) => ProcessingWindow::new(start, end),
            None => ProcessingWindow::spanning_days(start, self.days),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            db_path: PathBuf::from(DB_PATH),
            lookup_db: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            start: default_window_start(),
            end: None,
            days: DEFAULT_WINDOW_DAYS,
            resume: false,
            invalid_address: InvalidAddressPolicy::Skip,
            stale_rows_are_skips: false,
        }
    }
}

fn default_window_start() -> DateTime<Utc> {
    parse_timestamp(DEFAULT_WINDOW_START).unwrap_or_default()
}

/// Parses a window bound.
///
/// Accepts RFC 3339 (`2019-04-01T00:00:00Z`), a bare date (`2019-04-01`, midnight
/// UTC) or a naive date-time (`2019-04-01 12:30:00`, UTC).
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, String> {
    let input = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(format!(
        "invalid timestamp '{input}': expected RFC 3339, YYYY-MM-DD or YYYY-MM-DD HH:MM:SS"
    ))
}
