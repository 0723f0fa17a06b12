use indexmap::IndexMap;

use crate::model::{DealMap, RunResult, SourceSummary};
use crate::source::ResolvedBatch;

/// Compute the summary of one source from its resolved batch.
pub fn source_summary(
    listings: usize,
    rejected_rows: usize,
    batch: &ResolvedBatch,
    deals: &DealMap,
) -> SourceSummary {
    let mut reason_counts: IndexMap<String, usize> = IndexMap::new();
    for u in &batch.unresolved {
        *reason_counts.entry(u.reason.to_string()).or_insert(0) += 1;
    }

    SourceSummary {
        listings,
        filtered: batch.filtered,
        rejected_rows,
        resolved: batch.resolved(),
        unresolved: batch.unresolved.len(),
        distinct_ids: deals.len(),
        reason_counts,
        unresolved_titles: batch.unresolved.clone(),
    }
}

/// One `info` line per catalog and source.
pub fn log_summary(result: &RunResult) {
    for (name, c) in &result.summary.catalogs {
        log::info!(
            "catalog {name}: {} products, {} parsed, {} unparsed",
            c.products,
            c.parsed,
            c.unparsed_names.len()
        );
    }
    for (name, s) in &result.summary.sources {
        log::info!(
            "source {name}: {} listings, {} resolved to {} products, {} unresolved",
            s.listings,
            s.resolved,
            s.distinct_ids,
            s.unresolved
        );
    }
}
