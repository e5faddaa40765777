//! Reconcile run history.
//!
//! Every pass over a window is recorded in `reconcile_runs`. The end of the
//! latest completed window is the watermark a resumed run starts from.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::error_handling::{DatabaseError, OutcomeStats, RowOutcome};
use crate::models::ProcessingWindow;

/// Final state of a recorded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every candidate reached a terminal outcome
    Completed,
    /// The pass stopped on an error
    Aborted,
}

impl RunOutcome {
    /// Value stored in `reconcile_runs.outcome`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::Aborted => "aborted",
        }
    }
}

/// Inserts the start-of-run row.
///
/// A `run_id` that is already recorded is an error; an existing run is never
/// overwritten.
pub async fn insert_run_start(
    pool: &SqlitePool,
    run_id: &str,
    window: &ProcessingWindow,
    start_time_ms: i64,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO reconcile_runs (run_id, window_start_ms, window_end_ms, start_time_ms)
         VALUES (?, ?, ?, ?)",
    )
    .bind(run_id)
    .bind(window.start_ms())
    .bind(window.end_ms())
    .bind(start_time_ms)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(())
}

/// Records the counts and outcome of a finished run.
pub async fn finish_run(
    pool: &SqlitePool,
    run_id: &str,
    stats: &OutcomeStats,
    outcome: RunOutcome,
    error: Option<&str>,
) -> Result<(), DatabaseError> {
    let end_time_ms = Utc::now().timestamp_millis();

    sqlx::query(
        "UPDATE reconcile_runs
         SET end_time_ms = ?, candidates = ?, updated = ?, unmatched = ?, invalid = ?,
             ambiguous = ?, stale = ?, outcome = ?, error = ?
         WHERE run_id = ?",
    )
    .bind(end_time_ms)
    .bind(count(stats.candidates()))
    .bind(count(stats.get(RowOutcome::Updated)))
    .bind(count(stats.get(RowOutcome::NoRangeMatch)))
    .bind(count(stats.get(RowOutcome::InvalidAddress)))
    .bind(count(stats.get(RowOutcome::AmbiguousRange)))
    .bind(count(stats.get(RowOutcome::StaleRow)))
    .bind(outcome.as_str())
    .bind(error)
    .bind(run_id)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(())
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Returns the end of the latest completed window, if any.
pub async fn last_watermark(pool: &SqlitePool) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    let end_ms: Option<i64> = sqlx::query_scalar(
        "SELECT MAX(window_end_ms) FROM reconcile_runs WHERE outcome = 'completed'",
    )
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(end_ms.and_then(DateTime::<Utc>::from_timestamp_millis))
}

/// Query run history from the database.
///
/// Returns finished runs sorted by `start_time_ms` (most recent first).
///
/// # Example
///
/// ```no_run
/// use country_backfill::query_run_history;
/// use sqlx::SqlitePool;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = SqlitePool::connect("sqlite:./downloads.db").await?;
/// for run in query_run_history(&pool, Some(10)).await? {
///     println!("{}: {} of {} rows updated ({})",
///              run.run_id, run.updated, run.candidates, run.outcome);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn query_run_history(
    pool: &SqlitePool,
    limit: Option<usize>,
) -> Result<Vec<RunSummary>, DatabaseError> {
    let query = if let Some(limit) = limit {
        format!(
            "SELECT run_id, window_start_ms, window_end_ms, start_time_ms, end_time_ms,
                    candidates, updated, unmatched, invalid, ambiguous, stale, outcome, error
             FROM reconcile_runs
             WHERE end_time_ms IS NOT NULL
             ORDER BY start_time_ms DESC, run_id DESC
             LIMIT {}",
            limit
        )
    } else {
        "SELECT run_id, window_start_ms, window_end_ms, start_time_ms, end_time_ms,
                candidates, updated, unmatched, invalid, ambiguous, stale, outcome, error
         FROM reconcile_runs
         WHERE end_time_ms IS NOT NULL
         ORDER BY start_time_ms DESC, run_id DESC"
            .to_string()
    };

    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .await
        .map_err(DatabaseError::SqlError)?;

    let summaries: Vec<RunSummary> = rows
        .into_iter()
        .map(|row| RunSummary {
            run_id: row.get("run_id"),
            window_start_ms: row.get("window_start_ms"),
            window_end_ms: row.get("window_end_ms"),
            start_time_ms: row.get("start_time_ms"),
            end_time_ms: row.get("end_time_ms"),
            candidates: row.get("candidates"),
            updated: row.get("updated"),
            unmatched: row.get("unmatched"),
            invalid: row.get("invalid"),
            ambiguous: row.get("ambiguous"),
            stale: row.get("stale"),
            outcome: row.get::<Option<String>, _>("outcome").unwrap_or_default(),
            error: row.get("error"),
        })
        .collect();

    Ok(summaries)
}

/// Summary of a finished run, suitable for displaying run history.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Unique identifier for this run (e.g., "run_1765150444953").
    pub run_id: String,
    /// Window start as milliseconds since Unix epoch.
    pub window_start_ms: i64,
    /// Window end (exclusive) as milliseconds since Unix epoch.
    pub window_end_ms: i64,
    /// Start time as milliseconds since Unix epoch.
    pub start_time_ms: i64,
    /// End time as milliseconds since Unix epoch.
    pub end_time_ms: Option<i64>,
    /// Rows selected for the window.
    pub candidates: i64,
    /// Rows whose country was written.
    pub updated: i64,
    /// Rows whose address is in no range.
    pub unmatched: i64,
    /// Rows skipped for a malformed address.
    pub invalid: i64,
    /// Committed rows whose address matched overlapping ranges.
    pub ambiguous: i64,
    /// Rows skipped because the update affected nothing.
    pub stale: i64,
    /// `completed` or `aborted`.
    pub outcome: String,
    /// Error message of an aborted run.
    pub error: Option<String>,
}
