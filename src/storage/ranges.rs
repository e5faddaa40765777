//! IPv4 range reference lookups.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;
use crate::models::IpRange;

/// Point query against the range reference table.
#[async_trait]
pub trait RangeLookup {
    /// Returns the country code of every range with `range_start < value < range_end`,
    /// ordered by `range_start`.
    ///
    /// An empty result means the address is unassigned or reserved.
    async fn lookup(&self, value: u32) -> Result<Vec<String>, DatabaseError>;
}

/// [`RangeLookup`] backed by the `country_code_lookups` table.
#[derive(Clone)]
pub struct SqliteRangeLookup {
    pool: Arc<SqlitePool>,
}

impl SqliteRangeLookup {
    /// Wraps a pool whose database holds `country_code_lookups`.
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RangeLookup for SqliteRangeLookup {
    async fn lookup(&self, value: u32) -> Result<Vec<String>, DatabaseError> {
        let value = i64::from(value);
        sqlx::query_scalar::<_, String>(
            "SELECT cntry
             FROM country_code_lookups
             WHERE ipfrom < ?
                 AND ipto > ?
             ORDER BY ipfrom, ipto",
        )
        .bind(value)
        .bind(value)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(DatabaseError::SqlError)
    }
}

/// In-memory [`RangeLookup`] over a fixed list of ranges.
///
/// Useful for small reference sets and as a stand-in for the database table.
#[derive(Debug, Clone, Default)]
pub struct StaticRangeLookup {
    ranges: Vec<IpRange>,
}

impl StaticRangeLookup {
    /// Builds a lookup over `ranges`, ordered the way the table query orders them.
    pub fn new(mut ranges: Vec<IpRange>) -> Self {
        ranges.sort_by_key(|r| (r.range_start, r.range_end));
        Self { ranges }
    }
}

#[async_trait]
impl RangeLookup for StaticRangeLookup {
    async fn lookup(&self, value: u32) -> Result<Vec<String>, DatabaseError> {
        Ok(self
            .ranges
            .iter()
            .filter(|r| r.contains(value))
            .map(|r| r.country_code.clone())
            .collect())
    }
}
