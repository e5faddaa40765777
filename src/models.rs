//! Data model shared by the stores and the reconciler.

use chrono::{DateTime, Duration, TimeDelta, Utc};

use crate::error_handling::ReconcileError;

/// A row of `download_log` that still needs a country code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRecord {
    /// `download_id`
    pub id: i64,
    /// When the download was requested
    pub request_time: DateTime<Utc>,
    /// Client address as stored, not yet validated
    pub client_ip: String,
    /// Resolved country code, `None` until written
    pub country_code: Option<String>,
}

/// A row of the `country_code_lookups` reference table.
///
/// Both bounds are exclusive: a value `v` matches when
/// `range_start < v && v < range_end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpRange {
    /// `ipfrom` (exclusive)
    pub range_start: i64,
    /// `ipto` (exclusive)
    pub range_end: i64,
    /// `cntry`
    pub country_code: String,
}

impl IpRange {
    /// Whether `value` lies strictly between the bounds.
    pub fn contains(&self, value: u32) -> bool {
        let value = i64::from(value);
        self.range_start < value && value < self.range_end
    }
}

/// Half-open `[start, end)` interval over `request_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ProcessingWindow {
    /// Creates a window, rejecting `start >= end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ReconcileError> {
        if start >= end {
            return Err(ReconcileError::InvalidWindow {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Creates a window covering `duration` from `start`.
    ///
    /// An end past the representable range is an `InvalidWindow`.
    pub fn starting_at(start: DateTime<Utc>, duration: Duration) -> Result<Self, ReconcileError> {
        match start.checked_add_signed(duration) {
            Some(end) => Self::new(start, end),
            None => Err(out_of_range(start, &format!("{duration}"))),
        }
    }

    /// Creates a window covering `days` whole days from `start`.
    pub fn spanning_days(start: DateTime<Utc>, days: i64) -> Result<Self, ReconcileError> {
        match TimeDelta::try_days(days) {
            Some(duration) => Self::starting_at(start, duration),
            None => Err(out_of_range(start, &format!("{days} days"))),
        }
    }

    /// Inclusive lower bound.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive upper bound.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Start as milliseconds since the Unix epoch.
    pub fn start_ms(&self) -> i64 {
        self.start.timestamp_millis()
    }

    /// End as milliseconds since the Unix epoch.
    pub fn end_ms(&self) -> i64 {
        self.end.timestamp_millis()
    }

    /// Whether `time` falls inside `[start, end)`.
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time < self.end
    }
}

fn out_of_range(start: DateTime<Utc>, length: &str) -> ReconcileError {
    ReconcileError::InvalidWindow {
        start: start.to_rfc3339(),
        end: format!("start + {length} (out of range)"),
    }
}

impl std::fmt::Display for ProcessingWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' - '{}'",
            self.start.format("%d %b %y %H:%M UTC"),
            self.end.format("%d %b %y %H:%M UTC")
        )
    }
}
