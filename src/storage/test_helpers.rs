//! Shared test helpers for storage and reconciler tests.
//!
//! This module provides common utilities for database setup and test data creation.

#[cfg(test)]
use chrono::{DateTime, Utc};
#[cfg(test)]
use sqlx::sqlite::SqlitePoolOptions;
#[cfg(test)]
use sqlx::SqlitePool;

#[cfg(test)]
use crate::storage::run_migrations;

/// Creates a test database pool with migrations applied.
/// Uses a single-connection in-memory database for fast test execution.
#[cfg(test)]
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<std::time::Duration>)
        .max_lifetime(None::<std::time::Duration>)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Inserts a download row and returns its ID.
#[cfg(test)]
pub async fn insert_download(
    pool: &SqlitePool,
    request_time: DateTime<Utc>,
    client_ip: Option<&str>,
    country: Option<&str>,
) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO download_log (request_time_ms, client_ipv4, client_country)
         VALUES (?, ?, ?)
         RETURNING download_id",
    )
    .bind(request_time.timestamp_millis())
    .bind(client_ip)
    .bind(country)
    .fetch_one(pool)
    .await
    .expect("Failed to insert test download")
}

/// Inserts a reference range with exclusive bounds.
#[cfg(test)]
pub async fn insert_range(pool: &SqlitePool, ipfrom: i64, ipto: i64, country: &str) {
    sqlx::query("INSERT INTO country_code_lookups (ipfrom, ipto, cntry) VALUES (?, ?, ?)")
        .bind(ipfrom)
        .bind(ipto)
        .bind(country)
        .execute(pool)
        .await
        .expect("Failed to insert test range");
}

/// Reads back the country code of a download row.
#[cfg(test)]
pub async fn country_of(pool: &SqlitePool, download_id: i64) -> Option<String> {
    sqlx::query_scalar::<_, Option<String>>(
        "SELECT client_country FROM download_log WHERE download_id = ?",
    )
    .bind(download_id)
    .fetch_one(pool)
    .await
    .expect("Failed to read test download")
}
