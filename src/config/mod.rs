//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (defaults for paths, pool size, window)
//! - The library `Config` struct and window resolution
//! - CLI option types and parsing

mod cli;
mod constants;
mod types;

// Re-export public API
pub use cli::{Cli, Command, HistoryArgs, ReconcileArgs};
pub use constants::*;
pub use types::{parse_timestamp, Config, InvalidAddressPolicy, LogFormat, LogLevel};
