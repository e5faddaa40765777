//! Window reconciliation.
//!
//! Resolves the country of every candidate row in a processing window and writes
//! it back one row-scoped transaction at a time. The candidate list is read once
//! up front; each committed row stays committed even if a later row aborts the
//! pass, and re-running the window only picks up rows still lacking a country.


use log::{debug, error, info, warn};

use crate::address::encode_ipv4;
use crate::config::InvalidAddressPolicy;
use crate::error_handling::{OutcomeStats, ReconcileError, RowOutcome};
use crate::models::{DownloadRecord, ProcessingWindow};
use crate::storage::{RangeLookup, RecordStore, RowUpdate};

/// Policies applied while reconciling a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// What to do with an address that cannot be encoded.
    pub invalid_address: InvalidAddressPolicy,
    /// Count an update that touched zero rows as a skip instead of aborting.
    ///
    /// Zero rows means another process resolved or removed the row after the
    /// candidate snapshot was taken. Any other count is always fatal.
    pub stale_rows_are_skips: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            invalid_address: InvalidAddressPolicy::Skip,
            stale_rows_are_skips: false,
        }
    }
}

/// Resolves and persists country codes for download rows.
///
/// Generic over its stores so either can be replaced, e.g. a separate reference
/// database for ranges or in-memory doubles in tests.
pub struct Reconciler<R, L> {
    records: R,
    ranges: L,
    options: ReconcileOptions,
}

impl<R, L> Reconciler<R, L>
where
    R: RecordStore + Send + Sync,
    L: RangeLookup + Send + Sync,
{
    /// Creates a reconciler over the given stores.
    pub fn new(records: R, ranges: L, options: ReconcileOptions) -> Self {
        Self {
            records,
            ranges,
            options,
        }
    }

    /// Processes every candidate row in `window`, in request-time order.
    ///
    /// `stats` is updated as rows are processed, so it reflects partial progress
    /// when an error is returned.
    ///
    /// # Errors
    ///
    /// Stops at the first fatal condition: the candidate query or an update
    /// failing (`StoreUnavailable`), the range query failing
    /// (`LookupUnavailable`), an update not touching exactly one row
    /// (`UpdateCountMismatch`), or a malformed address under
    /// [`InvalidAddressPolicy::Abort`]. Rows committed before the failure remain
    /// committed.
    pub async fn reconcile_window(
        &self,
        window: &ProcessingWindow,
        stats: &mut OutcomeStats,
    ) -> Result<(), ReconcileError> {
        info!("Processing range {}", window);

        let candidates = self.records.fetch_candidates(window).await.map_err(|e| {
            error!("Retrieving unprocessed IPv4 addresses for {} failed: {e}", window);
            ReconcileError::StoreUnavailable(e)
        })?;
        stats.set_candidates(candidates.len());
        debug!("{} candidate rows in range {}", candidates.len(), window);

        for record in &candidates {
            if let Err(e) = self.reconcile_row(window, record, stats).await {
                error!(
                    "Aborting range {} at download {} ('{}'): {e}",
                    window, record.id, record.client_ip
                );
                return Err(e);
            }
        }

        info!("Country codes updated for {}", window);
        Ok(())
    }

    async fn reconcile_row(
        &self,
        window: &ProcessingWindow,
        record: &DownloadRecord,
        stats: &mut OutcomeStats,
    ) -> Result<(), ReconcileError> {
        let value = match encode_ipv4(&record.client_ip) {
            Ok(value) => value,
            Err(source) => match self.options.invalid_address {
                InvalidAddressPolicy::Skip => {
                    warn!(
                        "Skipping download {} in range {}: {source}",
                        record.id, window
                    );
                    stats.increment(RowOutcome::InvalidAddress);
                    return Ok(());
                }
                InvalidAddressPolicy::Abort => {
                    return Err(ReconcileError::InvalidAddress {
                        download_id: record.id,
                        source,
                    });
                }
            },
        };

        let codes =
            self.ranges
                .lookup(value)
                .await
                .map_err(|source| ReconcileError::LookupUnavailable {
                    download_id: record.id,
                    address: record.client_ip.clone(),
                    source,
                })?;

        let (country_code, ambiguous) = match codes.as_slice() {
            [] => {
                debug!(
                    "No country range covers '{}' ({}) for download {}",
                    record.client_ip, value, record.id
                );
                stats.increment(RowOutcome::NoRangeMatch);
                return Ok(());
            }
            [only] => (only, false),
            [first, ..] => {
                warn!(
                    "{} country ranges cover '{}' ({}) for download {}: [{}]; using '{}'. Check country_code_lookups for overlaps",
                    codes.len(),
                    record.client_ip,
                    value,
                    record.id,
                    codes.join(", "),
                    first
                );
                (first, true)
            }
        };

        debug!(
            "Processing request #{} dated '{}' : IPv4: '{}' : Country code: '{}'",
            record.id,
            record.request_time.format("%d %b %y %H:%M UTC"),
            record.client_ip,
            country_code
        );

        match self.records.apply_country(record.id, country_code).await? {
            RowUpdate::Committed => {
                stats.increment(RowOutcome::Updated);
                if ambiguous {
                    stats.increment(RowOutcome::AmbiguousRange);
                }
            }
            RowUpdate::Mismatch { affected: 0 } if self.options.stale_rows_are_skips => {
                warn!(
                    "Download {} was not updated with '{}' (0 rows affected); assuming another run resolved it",
                    record.id, country_code
                );
                stats.increment(RowOutcome::StaleRow);
            }
            RowUpdate::Mismatch { affected } => {
                return Err(ReconcileError::UpdateCountMismatch {
                    download_id: record.id,
                    country_code: country_code.clone(),
                    affected,
                });
            }
        }

        Ok(())
    }
}
