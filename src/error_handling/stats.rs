//! Per-row outcome tracking.
//!
//! Processing is strictly sequential, so the counters are plain integers owned by
//! the reconcile pass rather than shared atomics.

use std::collections::HashMap;
use strum::IntoEnumIterator;

use super::types::RowOutcome;

/// Counts of every [`RowOutcome`] seen during one pass.
///
/// All outcomes are initialized to zero on creation so reports always list every
/// category.
#[derive(Debug, Clone)]
pub struct OutcomeStats {
    candidates: usize,
    outcomes: HashMap<RowOutcome, usize>,
}

impl OutcomeStats {
    /// Creates empty stats with every outcome at zero.
    pub fn new() -> Self {
        let mut outcomes = HashMap::new();
        for outcome in RowOutcome::iter() {
            outcomes.insert(outcome, 0);
        }

        OutcomeStats {
            candidates: 0,
            outcomes,
        }
    }

    /// Records the size of the candidate snapshot.
    pub fn set_candidates(&mut self, candidates: usize) {
        self.candidates = candidates;
    }

    /// Number of candidate rows selected for the window.
    pub fn candidates(&self) -> usize {
        self.candidates
    }

    /// Increment an outcome counter.
    pub fn increment(&mut self, outcome: RowOutcome) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
    }

    /// Get the count for an outcome.
    pub fn get(&self, outcome: RowOutcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Rows that reached a terminal outcome (updated or deliberately skipped).
    ///
    /// `AmbiguousRange` overlaps with `Updated` and is not added twice.
    pub fn processed(&self) -> usize {
        RowOutcome::iter()
            .filter(|o| *o != RowOutcome::AmbiguousRange)
            .map(|o| self.get(o))
            .sum()
    }
}

impl Default for OutcomeStats {
    fn default() -> Self {
        Self::new()
    }
}
