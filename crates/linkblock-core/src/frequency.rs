//! Blocking-key selection under two skew-control thresholds
//!
//! Tokens are counted per side. A token whose count on either side reaches
//! the block threshold is dropped outright. Of the survivors, a token is a
//! valid blocking key only if the product of its two side counts stays
//! within the pairwise threshold, which bounds the number of candidate
//! pairs any single key can generate.
//!
//! The smaller side is counted first and only its surviving tokens are
//! tracked on the larger side: a token missing there has no count to
//! multiply with and can never qualify.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::Serialize;

use crate::config::{BlockThreshold, BlockingConfig};
use crate::dataset::Dataset;

/// One of the two datasets, in argument order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }
}

/// The side counted first; the first argument wins ties
pub fn smaller_side(first: &Dataset, second: &Dataset) -> Side {
    if first.len() <= second.len() {
        Side::First
    } else {
        Side::Second
    }
}

/// Token occurrence counts for one side, with capped tokens removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: HashMap<String, u64>,
    forbidden: usize,
}

impl FrequencyTable {
    pub fn get(&self, token: &str) -> Option<u64> {
        self.counts.get(token).copied()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.counts.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of tokens removed for reaching the block threshold
    pub fn forbidden(&self) -> usize {
        self.forbidden
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(token, count)| (token.as_str(), *count))
    }
}

/// Tokens admissible as blocking keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidKeySet {
    keys: HashSet<String>,
}

impl ValidKeySet {
    pub fn contains(&self, token: &str) -> bool {
        self.keys.contains(token)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Keys in ascending order
    pub fn sorted(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.iter().collect();
        keys.sort_unstable();
        keys
    }
}

impl<S: Into<String>> FromIterator<S> for ValidKeySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Everything computed while selecting keys
#[derive(Debug, Clone)]
pub struct FrequencyAnalysis {
    pub smaller_side: Side,
    pub smaller_counts: FrequencyTable,
    /// Restricted to tokens that survived on the smaller side
    pub larger_counts: FrequencyTable,
    pub valid_keys: ValidKeySet,
}

/// Derives the valid key set from two datasets
#[derive(Debug, Clone, Copy)]
pub struct FrequencyFilter {
    block_threshold: BlockThreshold,
    pairwise_threshold: u64,
}

impl FrequencyFilter {
    pub fn new(config: &BlockingConfig) -> Self {
        Self {
            block_threshold: config.block_threshold(),
            pairwise_threshold: config.pairwise_threshold(),
        }
    }

    /// Select keys and keep the intermediate tables
    pub fn analyze(&self, first: &Dataset, second: &Dataset) -> FrequencyAnalysis {
        let smaller_side = smaller_side(first, second);
        let (smaller, larger) = match smaller_side {
            Side::First => (first, second),
            Side::Second => (second, first),
        };

        let smaller_counts = self.cap(count_tokens(smaller, |_| true));
        let larger_counts =
            self.cap(count_tokens(larger, |token| smaller_counts.contains(token)));

        let pairwise = u128::from(self.pairwise_threshold);
        let valid_keys = larger_counts
            .iter()
            .filter(|(token, larger_count)| {
                // Present by construction; a missing entry would never qualify
                smaller_counts.get(token).is_some_and(|smaller_count| {
                    u128::from(smaller_count) * u128::from(*larger_count) <= pairwise
                })
            })
            .map(|(token, _)| token.to_string())
            .collect::<ValidKeySet>();

        tracing::debug!(
            smaller = ?smaller_side,
            smaller_tokens = smaller_counts.len(),
            smaller_forbidden = smaller_counts.forbidden(),
            larger_tokens = larger_counts.len(),
            larger_forbidden = larger_counts.forbidden(),
            valid_keys = valid_keys.len(),
            "Selected blocking keys"
        );

        FrequencyAnalysis {
            smaller_side,
            smaller_counts,
            larger_counts,
            valid_keys,
        }
    }

    /// Select the valid blocking keys
    pub fn select(&self, first: &Dataset, second: &Dataset) -> ValidKeySet {
        self.analyze(first, second).valid_keys
    }

    /// Drop every token whose count reached the block threshold
    fn cap(&self, counts: HashMap<&str, u64>) -> FrequencyTable {
        let mut forbidden = 0;
        let counts = counts
            .into_iter()
            .filter(|(_, count)| {
                let reached = self.block_threshold.is_reached(*count);
                if reached {
                    forbidden += 1;
                }
                !reached
            })
            .map(|(token, count)| (token.to_string(), count))
            .collect();

        FrequencyTable { counts, forbidden }
    }
}

/// Build the valid key set for two datasets under `config`
pub fn build_valid_key_set(
    first: &Dataset,
    second: &Dataset,
    config: &BlockingConfig,
) -> ValidKeySet {
    FrequencyFilter::new(config).select(first, second)
}

/// Count record-level token occurrences, in parallel shards
///
/// Token sets have set semantics, so each record adds at most one per token.
fn count_tokens<'a, F>(dataset: &'a Dataset, admit: F) -> HashMap<&'a str, u64>
where
    F: Fn(&str) -> bool + Sync,
{
    dataset
        .entries()
        .par_iter()
        .fold(HashMap::new, |mut counts, entry| {
            for token in &entry.tokens {
                if admit(token.as_str()) {
                    *counts.entry(token.as_str()).or_insert(0) += 1;
                }
            }
            counts
        })
        .reduce(HashMap::new, merge_counts)
}

fn merge_counts<'a>(
    mut a: HashMap<&'a str, u64>,
    mut b: HashMap<&'a str, u64>,
) -> HashMap<&'a str, u64> {
    if a.len() < b.len() {
        std::mem::swap(&mut a, &mut b);
    }
    for (token, count) in b {
        *a.entry(token).or_insert(0) += count;
    }
    a
}
