//! Error handling and outcome statistics.
//!
//! This module provides:
//! - Error type definitions for initialization, storage, the address codec and
//!   the reconcile pass
//! - Per-row outcome counters for the run summary
//!
//! A reconcile pass distinguishes between:
//! - **Errors**: failures that stop the current window ([`ReconcileError`])
//! - **Outcomes**: per-row results that are counted and skipped ([`RowOutcome`])

mod stats;
mod types;

// Re-export public API
pub use stats::OutcomeStats;
pub use types::{AddressError, DatabaseError, InitializationError, ReconcileError, RowOutcome};
