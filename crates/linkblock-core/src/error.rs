//! Error types and the non-fatal issue report for linkblock-core

use serde::Serialize;
use thiserror::Error;

/// Result type alias for blocking operations
pub type Result<T> = std::result::Result<T, BlockingError>;

/// Main error type for blocking operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockingError {
    /// Configuration rejected before any data was scanned
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration validation error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A threshold was given a negative value
    #[error("Threshold {name} must be non-negative, got {value}")]
    NegativeThreshold { name: &'static str, value: i64 },

    /// A selected column does not exist in the schema
    #[error("Column {column} is out of range for schema width {width}")]
    ColumnOutOfRange { column: usize, width: usize },

    /// Column 0 holds the identifier and cannot be tokenized
    #[error("Column 0 is the identifier column and cannot be selected")]
    IdentifierColumnSelected,

    /// An explicit column selection with no columns
    #[error("Explicit field selection is empty")]
    EmptySelection,

    /// Rows need an identifier plus at least one attribute
    #[error("Schema width must be at least 2, got {0}")]
    SchemaTooNarrow(usize),

    /// The config text could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// A record whose field count does not match the schema
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error(
    "row {row} ({}) has {found} fields, expected {expected}",
    .id.as_deref().unwrap_or("<no id>")
)]
pub struct RecordFormatError {
    /// Row number in the source (1-based, header excluded)
    pub row: usize,
    /// Identifier of the row, when one was present
    pub id: Option<String>,
    pub expected: usize,
    pub found: usize,
}

/// The same identifier appeared more than once on one side
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("identifier {id} occurs at positions {first_position} and {position}")]
pub struct DuplicateIdentifier {
    pub id: String,
    pub first_position: usize,
    pub position: usize,
}

/// A gold-standard row whose label is neither `yes` nor `no`
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("gold row {row} ({id1}, {id2}) has label {label:?}, expected yes or no")]
pub struct GoldLabelError {
    pub row: usize,
    pub id1: String,
    pub id2: String,
    pub label: String,
}

/// Accumulated non-fatal conditions for one run
///
/// Nothing recorded here aborts a run; callers log the summary at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueReport {
    pub record_format: Vec<RecordFormatError>,
    pub duplicate_ids: Vec<DuplicateIdentifier>,
    pub gold_labels: Vec<GoldLabelError>,
    /// Gold rows without exactly three columns
    pub gold_format: Vec<RecordFormatError>,
}

impl IssueReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skipped_records(&self) -> usize {
        self.record_format.len()
    }

    pub fn skipped_gold_rows(&self) -> usize {
        self.gold_labels.len() + self.gold_format.len()
    }

    pub fn is_clean(&self) -> bool {
        self.record_format.is_empty()
            && self.duplicate_ids.is_empty()
            && self.gold_labels.is_empty()
            && self.gold_format.is_empty()
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: IssueReport) {
        self.record_format.extend(other.record_format);
        self.duplicate_ids.extend(other.duplicate_ids);
        self.gold_labels.extend(other.gold_labels);
        self.gold_format.extend(other.gold_format);
    }

    /// Emit one warning line per non-empty category
    pub fn log_summary(&self, context: &str) {
        if !self.record_format.is_empty() {
            tracing::warn!(
                "{}: skipped {} records with the wrong field count",
                context,
                self.record_format.len()
            );
        }
        if !self.duplicate_ids.is_empty() {
            tracing::warn!(
                "{}: {} duplicate identifiers (last occurrence wins)",
                context,
                self.duplicate_ids.len()
            );
        }
        if !self.gold_labels.is_empty() {
            tracing::warn!(
                "{}: skipped {} gold rows with a label other than yes/no",
                context,
                self.gold_labels.len()
            );
        }
        if !self.gold_format.is_empty() {
            tracing::warn!(
                "{}: skipped {} gold rows without exactly three columns",
                context,
                self.gold_format.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_format_message() {
        let err = RecordFormatError {
            row: 3,
            id: Some("R7".to_string()),
            expected: 6,
            found: 4,
        };
        assert_eq!(err.to_string(), "row 3 (R7) has 4 fields, expected 6");

        let err = RecordFormatError {
            row: 9,
            id: None,
            expected: 6,
            found: 0,
        };
        assert!(err.to_string().contains("<no id>"));
    }

    #[test]
    fn test_report_merge_and_counts() {
        let mut report = IssueReport::new();
        assert!(report.is_clean());

        let mut other = IssueReport::new();
        other.gold_labels.push(GoldLabelError {
            row: 1,
            id1: "a".to_string(),
            id2: "b".to_string(),
            label: "maybe".to_string(),
        });
        other.record_format.push(RecordFormatError {
            row: 2,
            id: None,
            expected: 3,
            found: 2,
        });

        report.merge(other);
        assert!(!report.is_clean());
        assert_eq!(report.skipped_records(), 1);
        assert_eq!(report.skipped_gold_rows(), 1);
    }

    #[test]
    fn test_config_error_converts() {
        let err: BlockingError = ConfigError::EmptySelection.into();
        assert!(matches!(err, BlockingError::Config(ConfigError::EmptySelection)));
    }
}
