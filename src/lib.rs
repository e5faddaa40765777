//! country_backfill library: resolve client countries for download log rows
//!
//! Walks the `download_log` rows of a processing window that have a client IPv4
//! address but no country, resolves each address against the
//! `country_code_lookups` range table and writes the country back one
//! row-scoped transaction at a time.
//!
//! # Example
//!
//! ```no_run
//! use country_backfill::{run_reconcile, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     db_path: std::path::PathBuf::from("downloads.db"),
//!     resume: true,
//!     ..Default::default()
//! };
//!
//! let report = run_reconcile(config).await?;
//! println!("{} of {} rows updated", report.updated, report.candidates);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime.

#![warn(missing_docs)]

mod address;
mod app;
pub mod config;
mod error_handling;
pub mod initialization;
mod models;
mod reconcile;
mod storage;

// Re-export public API
pub use address::encode_ipv4;
pub use config::{Config, InvalidAddressPolicy, LogFormat, LogLevel};
pub use error_handling::{
    AddressError, DatabaseError, InitializationError, OutcomeStats, ReconcileError, RowOutcome,
};
pub use models::{DownloadRecord, IpRange, ProcessingWindow};
pub use reconcile::{ReconcileOptions, Reconciler};
pub use run::{run_reconcile, ReconcileReport};
pub use storage::{
    init_db_pool_with_path, init_lookup_pool, last_watermark, query_run_history,
    run_migrations, RangeLookup, RecordStore, RowUpdate, RunSummary, SqliteRangeLookup,
    SqliteRecordStore, StaticRangeLookup,
};

// Internal run module (wires configuration, stores and the reconciler together)
mod run {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Instant;

    use anyhow::{Context, Result};
    use chrono::Utc;
    use log::{info, warn};

    use crate::app::{print_outcome_statistics, print_simple_summary};
    use crate::config::Config;
    use crate::error_handling::{OutcomeStats, RowOutcome};
    use crate::models::ProcessingWindow;
    use crate::reconcile::{ReconcileOptions, Reconciler};
    use crate::storage::{
        finish_run, init_db_pool_with_path, init_lookup_pool, insert_run_start, last_watermark,
        run_migrations, RunOutcome, SqliteRangeLookup, SqliteRecordStore,
    };

    /// Results of a completed reconcile run.
    #[derive(Debug, Clone)]
    pub struct ReconcileReport {
        /// Run identifier (format: `run_<timestamp_millis>`)
        pub run_id: String,
        /// Window that was processed
        pub window: ProcessingWindow,
        /// Rows selected for the window
        pub candidates: usize,
        /// Rows whose country was written
        pub updated: usize,
        /// Rows whose address is in no range
        pub unmatched: usize,
        /// Rows skipped for a malformed address
        pub invalid: usize,
        /// Committed rows whose address matched overlapping ranges
        pub ambiguous: usize,
        /// Rows skipped because the update affected nothing
        pub stale: usize,
        /// Path to the record store
        pub db_path: PathBuf,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    impl ReconcileReport {
        fn new(
            run_id: String,
            window: ProcessingWindow,
            stats: &OutcomeStats,
            db_path: PathBuf,
            elapsed_seconds: f64,
        ) -> Self {
            Self {
                run_id,
                window,
                candidates: stats.candidates(),
                updated: stats.get(RowOutcome::Updated),
                unmatched: stats.get(RowOutcome::NoRangeMatch),
                invalid: stats.get(RowOutcome::InvalidAddress),
                ambiguous: stats.get(RowOutcome::AmbiguousRange),
                stale: stats.get(RowOutcome::StaleRow),
                db_path,
                elapsed_seconds,
            }
        }
    }

    /// Runs one reconcile pass with the provided configuration.
    ///
    /// Opens the record store (applying migrations), optionally a separate
    /// read-only range database, resolves the window, and records the run in
    /// `reconcile_runs` whether it completes or aborts.
    ///
    /// # Errors
    ///
    /// Returns an error if a store cannot be opened, the window is empty, or the
    /// pass aborts. Rows committed before an abort stay committed; re-running the
    /// same window only picks up the rest.
    pub async fn run_reconcile(config: Config) -> Result<ReconcileReport> {
        let started = Instant::now();

        let pool = init_db_pool_with_path(&config.db_path, config.max_connections)
            .await
            .context("Failed to open record store")?;
        run_migrations(&pool)
            .await
            .context("Failed to apply database migrations")?;

        let lookup_pool = match &config.lookup_db {
            Some(path) => init_lookup_pool(path, config.max_connections)
                .await
                .context("Failed to open range reference database")?,
            None => Arc::clone(&pool),
        };

        let watermark = if config.resume {
            let mark = last_watermark(&pool)
                .await
                .context("Failed to read the last processed watermark")?;
            match mark {
                Some(mark) => info!("Resuming from watermark {}", mark.to_rfc3339()),
                None => info!(
                    "No completed run recorded; starting at {}",
                    config.start.to_rfc3339()
                ),
            }
            mark
        } else {
            None
        };
        let window = config.window(watermark)?;

        let run_id = format!("run_{}", Utc::now().timestamp_millis());
        insert_run_start(&pool, &run_id, &window, Utc::now().timestamp_millis())
            .await
            .with_context(|| format!("Failed to record the start of {run_id}"))?;

        let reconciler = Reconciler::new(
            SqliteRecordStore::new(Arc::clone(&pool)),
            SqliteRangeLookup::new(lookup_pool),
            ReconcileOptions {
                invalid_address: config.invalid_address,
                stale_rows_are_skips: config.stale_rows_are_skips,
            },
        );

        let mut stats = OutcomeStats::new();
        let result = reconciler.reconcile_window(&window, &mut stats).await;

        let (outcome, error) = match &result {
            Ok(()) => (RunOutcome::Completed, None),
            Err(e) => (RunOutcome::Aborted, Some(e.to_string())),
        };
        if let Err(e) = finish_run(&pool, &run_id, &stats, outcome, error.as_deref()).await {
            warn!("Failed to record the outcome of {}: {e}", run_id);
        }

        let elapsed_seconds = started.elapsed().as_secs_f64();
        print_outcome_statistics(&stats);
        print_simple_summary(&window, &stats, result.is_ok(), elapsed_seconds);

        result.with_context(|| {
            format!(
                "Reconciling range {} stopped ({}); re-running the same window is safe",
                window, run_id
            )
        })?;

        Ok(ReconcileReport::new(
            run_id,
            window,
            &stats,
            config.db_path,
            elapsed_seconds,
        ))
    }
}
