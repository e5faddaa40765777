// Shared test helpers for database setup and test data creation.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::SqlitePool;

use country_backfill::{init_db_pool_with_path, run_migrations};

/// Midnight UTC on the given day of April 2019.
#[allow(dead_code)] // Used by other test files
pub fn april(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 4, day, 0, 0, 0).unwrap()
}

/// Creates an on-disk record store with migrations applied.
#[allow(dead_code)] // Used by other test files
pub async fn create_record_store(db_path: &Path) -> SqlitePool {
    let pool = init_db_pool_with_path(db_path, 1)
        .await
        .expect("Failed to create test database");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    (*pool).clone()
}

/// Creates a standalone range reference database with only the lookup table.
#[allow(dead_code)] // Used by other test files
pub async fn create_range_store(db_path: &Path) -> SqlitePool {
    let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path.display()))
        .await
        .expect("Failed to create range database");
    sqlx::query("CREATE TABLE country_code_lookups (ipfrom INTEGER NOT NULL, ipto INTEGER NOT NULL, cntry TEXT NOT NULL)")
        .execute(&pool)
        .await
        .expect("Failed to create country_code_lookups");
    pool
}

/// Inserts a download row and returns its ID.
#[allow(dead_code)] // Used by other test files
pub async fn insert_download(
    pool: &SqlitePool,
    request_time: DateTime<Utc>,
    client_ip: Option<&str>,
) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO download_log (request_time_ms, client_ipv4) VALUES (?, ?) RETURNING download_id",
    )
    .bind(request_time.timestamp_millis())
    .bind(client_ip)
    .fetch_one(pool)
    .await
    .expect("Failed to insert download")
}

/// Inserts a reference range covering `first..=last` (stored with exclusive bounds).
#[allow(dead_code)] // Used by other test files
pub async fn insert_range(pool: &SqlitePool, first: &str, last: &str, country: &str) {
    let first = country_backfill::encode_ipv4(first).expect("valid first address");
    let last = country_backfill::encode_ipv4(last).expect("valid last address");
    sqlx::query("INSERT INTO country_code_lookups (ipfrom, ipto, cntry) VALUES (?, ?, ?)")
        .bind(i64::from(first) - 1)
        .bind(i64::from(last) + 1)
        .bind(country)
        .execute(pool)
        .await
        .expect("Failed to insert range");
}

/// Reads back the country code of a download row.
#[allow(dead_code)] // Used by other test files
pub async fn country_of(pool: &SqlitePool, download_id: i64) -> Option<String> {
    sqlx::query_scalar::<_, Option<String>>(
        "SELECT client_country FROM download_log WHERE download_id = ?",
    )
    .bind(download_id)
    .fetch_one(pool)
    .await
    .expect("Failed to read download")
}
