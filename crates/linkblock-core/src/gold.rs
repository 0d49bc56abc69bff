//! Labeled gold-standard pairs
//!
//! Gold rows are `(id1, id2, label)` with a case-insensitive `yes`/`no`
//! label. Positives drive pairs completeness; negatives are kept for callers
//! that analyse non-matches.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{GoldLabelError, IssueReport, RecordFormatError};

/// Columns in a gold row
pub const GOLD_WIDTH: usize = 3;

/// First-side identifier to the second-side identifiers labeled with it
pub type PairSet = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoldLabel {
    Match,
    NonMatch,
}

impl GoldLabel {
    /// `yes` or `no`, any case
    pub fn parse(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "yes" => Some(GoldLabel::Match),
            "no" => Some(GoldLabel::NonMatch),
            _ => None,
        }
    }
}

/// Positive and negative gold pairs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldStandard {
    positives: PairSet,
    negatives: PairSet,
}

impl GoldStandard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a labeled pair
    pub fn insert(&mut self, id1: impl Into<String>, id2: impl Into<String>, label: GoldLabel) {
        let target = match label {
            GoldLabel::Match => &mut self.positives,
            GoldLabel::NonMatch => &mut self.negatives,
        };
        target.entry(id1.into()).or_default().insert(id2.into());
    }

    /// Build from positive pairs only
    pub fn from_positives<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        let mut gold = Self::new();
        for (id1, id2) in pairs {
            gold.insert(id1, id2, GoldLabel::Match);
        }
        gold
    }

    pub fn positives(&self) -> &PairSet {
        &self.positives
    }

    pub fn negatives(&self) -> &PairSet {
        &self.negatives
    }

    pub fn positive_pair_count(&self) -> u64 {
        count_pairs(&self.positives)
    }

    pub fn negative_pair_count(&self) -> u64 {
        count_pairs(&self.negatives)
    }

    pub fn is_match(&self, id1: &str, id2: &str) -> bool {
        self.positives.get(id1).is_some_and(|ids| ids.contains(id2))
    }
}

fn count_pairs(pairs: &PairSet) -> u64 {
    pairs.values().map(|ids| ids.len() as u64).sum()
}

/// Collects gold rows, reporting the ones that cannot be used
#[derive(Debug, Default)]
pub struct GoldStandardBuilder {
    gold: GoldStandard,
    rows_seen: usize,
    report: IssueReport,
}

impl GoldStandardBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the next row; returns whether it was accepted
    pub fn push<S: AsRef<str>>(&mut self, fields: &[S]) -> bool {
        self.rows_seen += 1;

        let [id1, id2, label] = fields else {
            self.report.gold_format.push(RecordFormatError {
                row: self.rows_seen,
                id: fields.first().map(|f| f.as_ref().to_string()),
                expected: GOLD_WIDTH,
                found: fields.len(),
            });
            return false;
        };

        let (id1, id2, label) = (id1.as_ref(), id2.as_ref(), label.as_ref());
        match GoldLabel::parse(label) {
            Some(parsed) => {
                self.gold.insert(id1, id2, parsed);
                true
            }
            None => {
                let err = GoldLabelError {
                    row: self.rows_seen,
                    id1: id1.to_string(),
                    id2: id2.to_string(),
                    label: label.to_string(),
                };
                tracing::debug!("Skipping gold row: {}", err);
                self.report.gold_labels.push(err);
                false
            }
        }
    }

    pub fn finish(self) -> (GoldStandard, IssueReport) {
        (self.gold, self.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_label() {
        assert_eq!(GoldLabel::parse("yes"), Some(GoldLabel::Match));
        assert_eq!(GoldLabel::parse("YES"), Some(GoldLabel::Match));
        assert_eq!(GoldLabel::parse("No"), Some(GoldLabel::NonMatch));
        assert_eq!(GoldLabel::parse("maybe"), None);
        assert_eq!(GoldLabel::parse(""), None);
    }

    #[test]
    fn test_builder_splits_labels() {
        let mut builder = GoldStandardBuilder::new();
        assert!(builder.push(&["A", "B", "yes"]));
        assert!(builder.push(&["A", "C", "Yes"]));
        assert!(builder.push(&["A", "D", "NO"]));
        assert!(!builder.push(&["E", "F", "unsure"]));
        assert!(!builder.push(&["G", "H"]));

        let (gold, report) = builder.finish();
        assert_eq!(gold.positive_pair_count(), 2);
        assert_eq!(gold.negative_pair_count(), 1);
        assert!(gold.is_match("A", "C"));
        assert!(!gold.is_match("A", "D"));
        assert!(!gold.is_match("E", "F"));

        assert_eq!(report.gold_labels.len(), 1);
        assert_eq!(report.gold_labels[0].row, 4);
        assert_eq!(report.gold_format.len(), 1);
        assert_eq!(report.gold_format[0].found, 2);
    }

    #[test]
    fn test_duplicate_gold_pairs_collapse() {
        let gold = GoldStandard::from_positives([("A", "B"), ("A", "B")]);
        assert_eq!(gold.positive_pair_count(), 1);
    }
}
