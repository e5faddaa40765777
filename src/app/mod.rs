//! Operator-facing output for reconcile runs.

pub mod statistics;

// Re-export public API
pub use statistics::{print_outcome_statistics, print_simple_summary};
