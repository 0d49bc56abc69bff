//! Bilateral block construction
//!
//! An inverted index maps each valid key to the first-side identifiers whose
//! token set contains it. Every second-side record is then joined against
//! that index, giving each first-side identifier the set of second-side
//! identifiers it shares at least one valid key with.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::frequency::ValidKeySet;

/// Field separator of the persisted block format
pub const DEFAULT_BLOCK_DELIMITER: char = '\t';

/// First-side identifier to the second-side identifiers paired with it
///
/// Both levels are ordered, so iteration and rendering are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateIndex {
    blocks: BTreeMap<String, BTreeSet<String>>,
}

impl CandidateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one candidate pair; returns false if it was already present
    pub fn insert(&mut self, id1: impl Into<String>, id2: impl Into<String>) -> bool {
        self.blocks.entry(id1.into()).or_default().insert(id2.into())
    }

    /// Candidate second-side identifiers for `id1`
    pub fn get(&self, id1: &str) -> Option<&BTreeSet<String>> {
        self.blocks.get(id1)
    }

    pub fn contains_pair(&self, id1: &str, id2: &str) -> bool {
        self.blocks.get(id1).is_some_and(|ids| ids.contains(id2))
    }

    /// Number of first-side identifiers with at least one candidate
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total deduplicated candidate pairs
    pub fn pair_count(&self) -> u64 {
        self.blocks.values().map(|ids| ids.len() as u64).sum()
    }

    /// Entries ascending by first-side identifier
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.blocks.iter().map(|(id1, ids)| (id1.as_str(), ids))
    }

    /// All pairs, ascending by (id1, id2)
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.blocks
            .iter()
            .flat_map(|(id1, ids)| ids.iter().map(move |id2| (id1.as_str(), id2.as_str())))
    }

    /// One line per entry: `id1 <sep> id2_a <sep> ... <sep> id2_n`
    pub fn lines(&self, delimiter: char) -> impl Iterator<Item = String> + '_ {
        self.blocks.iter().filter(|(_, ids)| !ids.is_empty()).map(move |(id1, ids)| {
            let mut line = id1.clone();
            for id2 in ids {
                line.push(delimiter);
                line.push_str(id2);
            }
            line
        })
    }

    /// The whole index, one line per entry
    ///
    /// Identifiers are joined as-is; `linkblock-io` quotes any identifier
    /// containing the delimiter when persisting blocks.
    pub fn render(&self, delimiter: char) -> String {
        let mut out = String::new();
        for line in self.lines(delimiter) {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

impl<A: Into<String>, B: Into<String>> FromIterator<(A, B)> for CandidateIndex {
    fn from_iter<I: IntoIterator<Item = (A, B)>>(iter: I) -> Self {
        let mut index = CandidateIndex::new();
        for (id1, id2) in iter {
            index.insert(id1, id2);
        }
        index
    }
}

/// Joins two datasets on a valid key set
#[derive(Debug, Clone, Copy)]
pub struct CandidateGenerator<'k> {
    keys: &'k ValidKeySet,
}

impl<'k> CandidateGenerator<'k> {
    pub fn new(keys: &'k ValidKeySet) -> Self {
        Self { keys }
    }

    /// Valid key to the first-side identifiers containing it
    pub fn inverted_index<'d>(&self, first: &'d Dataset) -> HashMap<&'d str, HashSet<&'d str>> {
        let keys = self.keys;
        first
            .entries()
            .par_iter()
            .fold(HashMap::new, |mut index, entry| {
                for token in entry.tokens.iter().filter(|t| keys.contains(t.as_str())) {
                    index
                        .entry(token.as_str())
                        .or_insert_with(HashSet::new)
                        .insert(entry.id.as_str());
                }
                index
            })
            .reduce(HashMap::new, merge_sets)
    }

    /// Build the candidate index for (`first`, `second`)
    pub fn generate(&self, first: &Dataset, second: &Dataset) -> CandidateIndex {
        let blocks = self.inverted_index(first);

        let joined: HashMap<&str, HashSet<&str>> = second
            .entries()
            .par_iter()
            .fold(HashMap::new, |mut acc, entry| {
                for token in &entry.tokens {
                    if let Some(ids1) = blocks.get(token.as_str()) {
                        for id1 in ids1 {
                            acc.entry(*id1)
                                .or_insert_with(HashSet::new)
                                .insert(entry.id.as_str());
                        }
                    }
                }
                acc
            })
            .reduce(HashMap::new, merge_sets);

        let index = CandidateIndex {
            blocks: joined
                .into_iter()
                .map(|(id1, ids2)| {
                    (
                        id1.to_string(),
                        ids2.into_iter().map(str::to_string).collect(),
                    )
                })
                .collect(),
        };

        tracing::debug!(
            keys = self.keys.len(),
            blocks = blocks.len(),
            first_ids = index.len(),
            pairs = index.pair_count(),
            "Built candidate index"
        );

        index
    }
}

/// Build the candidate index for two datasets and a valid key set
pub fn build_candidate_index(
    first: &Dataset,
    second: &Dataset,
    keys: &ValidKeySet,
) -> CandidateIndex {
    CandidateGenerator::new(keys).generate(first, second)
}

fn merge_sets<'a>(
    mut a: HashMap<&'a str, HashSet<&'a str>>,
    mut b: HashMap<&'a str, HashSet<&'a str>>,
) -> HashMap<&'a str, HashSet<&'a str>> {
    if a.len() < b.len() {
        std::mem::swap(&mut a, &mut b);
    }
    for (key, ids) in b {
        a.entry(key).or_default().extend(ids);
    }
    a
}
