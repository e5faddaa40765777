//! Database connection pool management.
//!
//! This module initializes and configures the SQLite connection pools with:
//! - WAL mode enabled so per-row commits do not block readers
//! - A configurable connection limit
//! - Automatic database file creation for the record store
//! - A read-only pool for an external range reference database

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use log::{error, info};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::error_handling::DatabaseError;

/// Initializes and returns the record store connection pool.
///
/// Creates the database file if it doesn't exist and enables WAL mode.
pub async fn init_db_pool_with_path(
    db_path: &Path,
    max_connections: u32,
) -> Result<Arc<Pool<Sqlite>>, DatabaseError> {
    let db_path_str = db_path.to_string_lossy().to_string();
    match OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(&db_path_str)
    {
        Ok(_) => info!("Database file created successfully."),
        Err(ref e) if e.kind() == ErrorKind::AlreadyExists => {
            info!("Database file already exists.")
        }
        Err(e) => {
            error!("Failed to create database file: {e}");
            return Err(DatabaseError::FileCreationError(e.to_string()));
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(&format!("sqlite:{}", db_path_str))
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {e}");
            DatabaseError::SqlError(e)
        })?;

    // Enable WAL mode
    sqlx::query("PRAGMA journal_mode=WAL")
        .execute(&pool)
        .await
        .map_err(|e| {
            error!("Failed to set WAL mode: {e}");
            DatabaseError::SqlError(e)
        })?;

    Ok(Arc::new(pool))
}

/// Opens an existing range reference database read-only.
///
/// The file is externally maintained, so it is never created or migrated here.
pub async fn init_lookup_pool(
    lookup_path: &Path,
    max_connections: u32,
) -> Result<Arc<Pool<Sqlite>>, DatabaseError> {
    if !lookup_path.exists() {
        error!(
            "Range reference database not found: {}",
            lookup_path.display()
        );
        return Err(DatabaseError::FileCreationError(format!(
            "{} does not exist",
            lookup_path.display()
        )));
    }

    let options = SqliteConnectOptions::new()
        .filename(lookup_path)
        .read_only(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await
        .map_err(|e| {
            error!("Failed to open range reference database: {e}");
            DatabaseError::SqlError(e)
        })?;

    info!("Range reference database opened: {}", lookup_path.display());
    Ok(Arc::new(pool))
}
