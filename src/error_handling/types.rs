//! Error type definitions.
//!
//! This module defines all error types and the per-row outcome categories used
//! throughout the application.

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

/// Error returned when a client address cannot be encoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The string is not four dot-separated decimal octets in `0..=255`.
    #[error("Invalid IPv4 address format '{address}': {reason}")]
    InvalidAddressFormat {
        /// The address as it was stored.
        address: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Errors that stop a reconcile pass over a processing window.
///
/// Anything not listed here (unknown country, a skipped malformed address) is a
/// per-row outcome, counted in [`RowOutcome`], not an error.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The window's start is not strictly before its end.
    #[error("Invalid processing window: start {start} is not before end {end}")]
    InvalidWindow {
        /// Requested start (RFC 3339).
        start: String,
        /// Requested end (RFC 3339).
        end: String,
    },

    /// A malformed address under the `abort` policy.
    #[error("Download {download_id}: {source}")]
    InvalidAddress {
        /// Row being processed.
        download_id: i64,
        /// Underlying codec error.
        #[source]
        source: AddressError,
    },

    /// The range reference query failed.
    #[error("Country lookup for '{address}' (download {download_id}) failed: {source}")]
    LookupUnavailable {
        /// Row being processed.
        download_id: i64,
        /// Address being resolved.
        address: String,
        /// Underlying store error.
        #[source]
        source: DatabaseError,
    },

    /// The row-scoped update touched something other than exactly one row.
    #[error(
        "Wrong number of rows affected ({affected}) when updating download {download_id} with country code '{country_code}'"
    )]
    UpdateCountMismatch {
        /// Row being processed.
        download_id: i64,
        /// Code that was being written.
        country_code: String,
        /// Rows the update reported.
        affected: u64,
    },

    /// Connection or transaction failure on either store.
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(#[from] DatabaseError),
}

/// Per-row outcome of a reconcile pass.
///
/// Each candidate row lands in exactly one category, except that a committed row
/// with overlapping ranges is counted as both `Updated` and `AmbiguousRange`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum RowOutcome {
    /// Country code written and committed.
    Updated,
    /// Address is not covered by any range; row left unresolved.
    NoRangeMatch,
    /// Address could not be encoded; row skipped.
    InvalidAddress,
    /// More than one range matched and the first was committed (also counted as `Updated`).
    AmbiguousRange,
    /// Update affected zero rows and stale rows are tolerated; row skipped.
    StaleRow,
}

impl std::fmt::Display for RowOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RowOutcome {
    /// Label used in operator output.
    pub fn as_str(&self) -> &'static str {
        match self {
            RowOutcome::Updated => "Updated",
            RowOutcome::NoRangeMatch => "No range match",
            RowOutcome::InvalidAddress => "Invalid address",
            RowOutcome::AmbiguousRange => "Ambiguous range match",
            RowOutcome::StaleRow => "Stale row",
        }
    }
}
