// storage/mod.rs
// Database operations module

pub mod migrations;
pub mod pool;
pub mod ranges;
pub mod records;
pub mod runs;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used items
pub use migrations::run_migrations;
pub use pool::{init_db_pool_with_path, init_lookup_pool};
pub use ranges::{RangeLookup, SqliteRangeLookup, StaticRangeLookup};
pub use records::{RecordStore, RowUpdate, SqliteRecordStore};
pub use runs::{
    finish_run, insert_run_start, last_watermark, query_run_history, RunOutcome, RunSummary,
};
