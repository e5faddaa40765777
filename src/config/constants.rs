//! Configuration constants used as defaults.

/// Default record store path (SQLite file).
pub const DB_PATH: &str = "./downloads.db";

/// Default size of each connection pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default start of the processing window when neither `--start` nor `--resume`
/// supplies one.
pub const DEFAULT_WINDOW_START: &str = "2019-04-01";

/// Default window length in days when no explicit end is given.
pub const DEFAULT_WINDOW_DAYS: i64 = 31;

/// Number of runs `history` shows by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Formats accepted for window bounds besides RFC 3339.
pub const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
