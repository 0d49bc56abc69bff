//! Records and per-side datasets
//!
//! A [`Dataset`] is the ordered list of (identifier, token set) entries for
//! one side of a linkage task. It is built once by [`DatasetBuilder`] and is
//! read-only afterwards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{DuplicateIdentifier, IssueReport};
use crate::tokenizer::{TokenSet, Tokenizer};

/// One input row: identifier plus raw attribute fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Opaque, case-preserving identifier
    pub id: String,
    /// Attribute fields in column order (column 1 onwards)
    pub fields: Vec<String>,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build a record from a full row whose first column is the identifier
    pub fn from_row<I, S>(row: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns = row.into_iter().map(Into::into);
        let id = columns.next().unwrap_or_default();
        Self {
            id,
            fields: columns.collect(),
        }
    }

    /// Number of columns in the row, identifier included
    pub fn width(&self) -> usize {
        self.fields.len() + 1
    }
}

/// An identifier with its token set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub tokens: TokenSet,
}

/// Ordered (identifier, token set) entries for one side
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    entries: Vec<Entry>,
}

impl Dataset {
    /// Build directly from already-tokenized entries
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Entry at `position`
    pub fn get(&self, position: usize) -> Option<&Entry> {
        self.entries.get(position)
    }

    /// Identifiers in dataset order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.id.as_str())
    }

    /// Identifier to position; a repeated identifier maps to its last position
    pub fn id_positions(&self) -> HashMap<&str, usize> {
        self.entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.id.as_str(), position))
            .collect()
    }

    /// Token set of the last entry carrying `id`
    pub fn tokens_of(&self, id: &str) -> Option<&TokenSet> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.tokens)
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Incrementally tokenizes records into a [`Dataset`]
///
/// Malformed records are skipped and reported; repeated identifiers are
/// kept and reported.
#[derive(Debug)]
pub struct DatasetBuilder {
    tokenizer: Tokenizer,
    entries: Vec<Entry>,
    /// Identifier to the position it was first accepted at
    first_positions: HashMap<String, usize>,
    rows_seen: usize,
    report: IssueReport,
}

impl DatasetBuilder {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            entries: Vec::new(),
            first_positions: HashMap::new(),
            rows_seen: 0,
            report: IssueReport::new(),
        }
    }

    /// Add the next row; returns whether it was accepted
    pub fn push(&mut self, record: Record) -> bool {
        self.rows_seen += 1;

        let tokens = match self.tokenizer.tokenize(&record, self.rows_seen) {
            Ok(tokens) => tokens,
            Err(err) => {
                tracing::debug!("Skipping record: {}", err);
                self.report.record_format.push(err);
                return false;
            }
        };

        let position = self.entries.len();
        let first_position = *self
            .first_positions
            .entry(record.id.clone())
            .or_insert(position);
        if first_position != position {
            let duplicate = DuplicateIdentifier {
                id: record.id.clone(),
                first_position,
                position,
            };
            tracing::debug!("Duplicate identifier: {}", duplicate);
            self.report.duplicate_ids.push(duplicate);
        }

        self.entries.push(Entry {
            id: record.id,
            tokens,
        });
        true
    }

    pub fn extend<I: IntoIterator<Item = Record>>(&mut self, records: I) {
        for record in records {
            self.push(record);
        }
    }

    /// Rows offered so far, accepted or not
    pub fn rows_seen(&self) -> usize {
        self.rows_seen
    }

    pub fn finish(self) -> (Dataset, IssueReport) {
        (
            Dataset {
                entries: self.entries,
            },
            self.report,
        )
    }
}

/// Tokenize a batch of records in one call
pub fn build_dataset<I>(records: I, tokenizer: &Tokenizer) -> (Dataset, IssueReport)
where
    I: IntoIterator<Item = Record>,
{
    let mut builder = DatasetBuilder::new(tokenizer.clone());
    builder.extend(records);
    builder.finish()
}
