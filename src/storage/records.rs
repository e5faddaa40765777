//! Download record store.
//!
//! Selects candidate rows for a processing window and writes resolved country
//! codes back, one row-scoped transaction per row.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::error_handling::DatabaseError;
use crate::models::{DownloadRecord, ProcessingWindow};

/// Result of a row-scoped update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowUpdate {
    /// Exactly one row changed and the transaction committed.
    Committed,
    /// Some other number of rows changed; the transaction was rolled back.
    Mismatch { affected: u64 },
}

/// Query and update surface of the download log.
#[async_trait]
pub trait RecordStore {
    /// Returns every row in `window` with a client address and no country code,
    /// ordered by request time.
    async fn fetch_candidates(
        &self,
        window: &ProcessingWindow,
    ) -> Result<Vec<DownloadRecord>, DatabaseError>;

    /// Sets the country code of one row inside its own transaction.
    ///
    /// Only a row whose country is still unset is touched, so a row resolved by
    /// someone else after the candidate snapshot reports zero affected rows.
    async fn apply_country(
        &self,
        download_id: i64,
        country_code: &str,
    ) -> Result<RowUpdate, DatabaseError>;
}

/// [`RecordStore`] backed by the `download_log` table.
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: Arc<SqlitePool>,
}

impl SqliteRecordStore {
    /// Wraps a pool whose database holds `download_log`.
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn fetch_candidates(
        &self,
        window: &ProcessingWindow,
    ) -> Result<Vec<DownloadRecord>, DatabaseError> {
        // fetch_all materializes the snapshot before any row is written
        let rows = sqlx::query(
            "SELECT download_id, request_time_ms, client_ipv4
             FROM download_log
             WHERE client_ipv4 IS NOT NULL
                 AND client_country IS NULL
                 AND request_time_ms >= ?
                 AND request_time_ms < ?
             ORDER BY request_time_ms, download_id",
        )
        .bind(window.start_ms())
        .bind(window.end_ms())
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(DatabaseError::SqlError)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("download_id")?;
            let request_time_ms: i64 = row.try_get("request_time_ms")?;
            let request_time = DateTime::<Utc>::from_timestamp_millis(request_time_ms)
                .ok_or_else(|| {
                    DatabaseError::SqlError(sqlx::Error::Decode(
                        format!("download {id}: request_time_ms {request_time_ms} out of range")
                            .into(),
                    ))
                })?;
            records.push(DownloadRecord {
                id,
                request_time,
                client_ip: row.try_get("client_ipv4")?,
                country_code: None,
            });
        }

        Ok(records)
    }

    async fn apply_country(
        &self,
        download_id: i64,
        country_code: &str,
    ) -> Result<RowUpdate, DatabaseError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::SqlError)?;

        let result = sqlx::query(
            "UPDATE download_log
             SET client_country = ?
             WHERE download_id = ?
                 AND client_country IS NULL",
        )
        .bind(country_code)
        .bind(download_id)
        .execute(&mut *tx)
        .await;

        let affected = match result {
            Ok(done) => done.rows_affected(),
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    log::error!("Rolling back update of download {download_id} failed: {rollback}");
                }
                return Err(DatabaseError::SqlError(e));
            }
        };

        if affected != 1 {
            tx.rollback().await.map_err(DatabaseError::SqlError)?;
            return Ok(RowUpdate::Mismatch { affected });
        }

        tx.commit().await.map_err(DatabaseError::SqlError)?;
        Ok(RowUpdate::Committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::storage::test_helpers::{country_of, create_test_pool, insert_download};

    fn april(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 4, day, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_candidates_filters_rows() {
        let pool = create_test_pool().await;
        let window = ProcessingWindow::new(april(1), april(10)).unwrap();

        let wanted = insert_download(&pool, april(2), Some("8.8.8.8"), None).await;
        insert_download(&pool, april(3), None, None).await;
        insert_download(&pool, april(4), Some("1.1.1.1"), Some("AUS")).await;
        insert_download(&pool, april(11), Some("9.9.9.9"), None).await;

        let store = SqliteRecordStore::new(Arc::new(pool));
        let candidates = store.fetch_candidates(&window).await.unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, wanted);
        assert_eq!(candidates[0].client_ip, "8.8.8.8");
        assert_eq!(candidates[0].request_time, april(2));
        assert_eq!(candidates[0].country_code, None);
    }

    #[tokio::test]
    async fn test_fetch_candidates_window_is_half_open() {
        let pool = create_test_pool().await;
        let window = ProcessingWindow::new(april(1), april(2)).unwrap();

        let at_start = insert_download(&pool, april(1), Some("8.8.8.8"), None).await;
        insert_download(&pool, april(2), Some("8.8.4.4"), None).await;

        let store = SqliteRecordStore::new(Arc::new(pool));
        let ids: Vec<i64> = store
            .fetch_candidates(&window)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![at_start]);
    }

    #[tokio::test]
    async fn test_fetch_candidates_ordered_by_request_time() {
        let pool = create_test_pool().await;
        let window = ProcessingWindow::new(april(1), april(10)).unwrap();

        let later = insert_download(&pool, april(5), Some("8.8.8.8"), None).await;
        let earlier = insert_download(&pool, april(2), Some("8.8.4.4"), None).await;

        let store = SqliteRecordStore::new(Arc::new(pool));
        let ids: Vec<i64> = store
            .fetch_candidates(&window)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![earlier, later]);
    }

    #[tokio::test]
    async fn test_apply_country_commits_single_row() {
        let pool = create_test_pool().await;
        let id = insert_download(&pool, april(2), Some("8.8.8.8"), None).await;
        let store = SqliteRecordStore::new(Arc::new(pool.clone()));

        let outcome = store.apply_country(id, "USA").await.unwrap();

        assert_eq!(outcome, RowUpdate::Committed);
        assert_eq!(country_of(&pool, id).await.as_deref(), Some("USA"));
    }

    #[tokio::test]
    async fn test_apply_country_unknown_id_is_mismatch() {
        let pool = create_test_pool().await;
        let store = SqliteRecordStore::new(Arc::new(pool));

        let outcome = store.apply_country(9_999, "USA").await.unwrap();

        assert_eq!(outcome, RowUpdate::Mismatch { affected: 0 });
    }

    #[tokio::test]
    async fn test_apply_country_leaves_concurrently_resolved_row() {
        let pool = create_test_pool().await;
        let window = ProcessingWindow::new(april(1), april(10)).unwrap();
        let id = insert_download(&pool, april(2), Some("8.8.8.8"), None).await;
        let store = SqliteRecordStore::new(Arc::new(pool.clone()));

        let candidates = store.fetch_candidates(&window).await.unwrap();
        assert_eq!(candidates.len(), 1);

        // another run resolves the row after the snapshot
        sqlx::query("UPDATE download_log SET client_country = 'CAN' WHERE download_id = ?")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();

        let outcome = store.apply_country(id, "USA").await.unwrap();

        assert_eq!(outcome, RowUpdate::Mismatch { affected: 0 });
        assert_eq!(country_of(&pool, id).await.as_deref(), Some("CAN"));
    }
}
