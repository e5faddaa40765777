//! Run summary printing.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{OutcomeStats, RowOutcome};
use crate::models::ProcessingWindow;

/// Prints a one-line summary of a reconcile pass.
pub fn print_simple_summary(
    window: &ProcessingWindow,
    stats: &OutcomeStats,
    completed: bool,
    elapsed_seconds: f64,
) {
    info!(
        "{} range {}: {} of {} candidate row{} updated in {:.1}s",
        if completed { "Finished" } else { "Aborted" },
        window,
        stats.get(RowOutcome::Updated),
        stats.candidates(),
        if stats.candidates() == 1 { "" } else { "s" },
        elapsed_seconds
    );
}

/// Non-zero outcome counts as `"<label>: <count>"`, in declaration order.
pub fn outcome_lines(stats: &OutcomeStats) -> Vec<String> {
    RowOutcome::iter()
        .filter_map(|outcome| {
            let count = stats.get(outcome);
            (count > 0).then(|| format!("{}: {}", outcome.as_str(), count))
        })
        .collect()
}

/// Prints the per-outcome breakdown, flagging counts an operator should look at.
pub fn print_outcome_statistics(stats: &OutcomeStats) {
    let lines = outcome_lines(stats);
    if lines.is_empty() {
        info!("No candidate rows were processed");
        return;
    }

    info!("Outcome Counts ({} processed):", stats.processed());
    for line in lines {
        info!("   {}", line);
    }

    if stats.get(RowOutcome::AmbiguousRange) > 0 {
        log::warn!(
            "{} address(es) matched more than one country range; country_code_lookups has overlapping rows",
            stats.get(RowOutcome::AmbiguousRange)
        );
    }
}
