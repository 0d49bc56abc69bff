//! Blocking quality metrics
//!
//! - **Reduction ratio**: fraction of the exhaustive comparison space the
//!   candidate index removes.
//! - **Pairs completeness**: share of gold positive pairs that survive
//!   blocking.

use serde::{Deserialize, Serialize};

use crate::candidates::CandidateIndex;
use crate::gold::PairSet;

/// `1 - candidates / (size_a * size_b)`
///
/// Returns `None` when either side is empty and there is no comparison
/// space to reduce.
pub fn reduction_ratio(index: &CandidateIndex, size_a: usize, size_b: usize) -> Option<f64> {
    let exhaustive = (size_a as u128) * (size_b as u128);
    if exhaustive == 0 {
        return None;
    }
    Some(1.0 - index.pair_count() as f64 / exhaustive as f64)
}

/// Retrieved gold positives over all gold positives
///
/// A gold identifier missing from the index simply retrieves nothing.
/// Returns `None` when there are no gold positives.
pub fn pairs_completeness(index: &CandidateIndex, gold_positives: &PairSet) -> Option<f64> {
    let (total, retrieved) = gold_coverage(index, gold_positives);
    if total == 0 {
        return None;
    }
    Some(retrieved as f64 / total as f64)
}

/// (gold positive pairs, of which retrieved)
fn gold_coverage(index: &CandidateIndex, gold_positives: &PairSet) -> (u64, u64) {
    let mut total = 0;
    let mut retrieved = 0;
    for (id1, ids2) in gold_positives {
        total += ids2.len() as u64;
        if let Some(candidates) = index.get(id1) {
            retrieved += ids2.iter().filter(|id2| candidates.contains(*id2)).count() as u64;
        }
    }
    (total, retrieved)
}

/// Full metrics report for one blocking run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockingMetrics {
    pub first_size: usize,
    pub second_size: usize,
    /// `first_size * second_size`
    pub exhaustive_pairs: u128,
    /// Deduplicated candidate pairs
    pub candidate_pairs: u64,
    pub reduction_ratio: Option<f64>,
    pub gold_positive_pairs: u64,
    pub retrieved_gold_pairs: u64,
    pub pairs_completeness: Option<f64>,
}

impl BlockingMetrics {
    /// Compute every metric; pass `None` when no gold standard is available
    pub fn compute(
        index: &CandidateIndex,
        first_size: usize,
        second_size: usize,
        gold_positives: Option<&PairSet>,
    ) -> Self {
        let (gold_positive_pairs, retrieved_gold_pairs) = gold_positives
            .map(|gold| gold_coverage(index, gold))
            .unwrap_or((0, 0));

        Self {
            first_size,
            second_size,
            exhaustive_pairs: (first_size as u128) * (second_size as u128),
            candidate_pairs: index.pair_count(),
            reduction_ratio: reduction_ratio(index, first_size, second_size),
            gold_positive_pairs,
            retrieved_gold_pairs,
            pairs_completeness: gold_positives.and_then(|gold| pairs_completeness(index, gold)),
        }
    }

    /// Log the report at info level
    pub fn log(&self) {
        tracing::info!("Exhaustive set size: {}", self.exhaustive_pairs);
        tracing::info!("Deduplicated candidate set size: {}", self.candidate_pairs);
        match self.reduction_ratio {
            Some(rr) => tracing::info!("Reduction ratio: {}", rr),
            None => tracing::info!("Reduction ratio: undefined (empty dataset)"),
        }
        if let Some(pc) = self.pairs_completeness {
            tracing::info!("Gold positive pairs: {}", self.gold_positive_pairs);
            tracing::info!("Retrieved gold positive pairs: {}", self.retrieved_gold_pairs);
            tracing::info!("Pairs completeness: {}", pc);
        }
    }
}
