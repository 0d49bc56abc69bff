//! Configuration for blocking runs
//!
//! A run is parameterized by one immutable [`BlockingConfig`]: the two
//! skew-control thresholds, the attribute columns to tokenize, and the
//! expected row width. Editable input (config files, command line flags)
//! lands in [`BlockingSettings`] first and is validated into a config
//! before any data is scanned.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Pairwise-product bound used when none is configured
pub const DEFAULT_PAIRWISE_THRESHOLD: u64 = 3000;

/// Identifier plus five attribute columns
pub const DEFAULT_SCHEMA_WIDTH: usize = 6;

/// Per-side occurrence cap for a blocking key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockThreshold {
    /// A token occurring this many times on one side is forbidden
    Bounded(u64),
    #[default]
    Unbounded,
}

impl BlockThreshold {
    /// Whether a token seen `count` times has reached the cap
    pub fn is_reached(&self, count: u64) -> bool {
        match self {
            BlockThreshold::Bounded(cap) => count >= *cap,
            BlockThreshold::Unbounded => false,
        }
    }

    pub fn as_option(&self) -> Option<u64> {
        match self {
            BlockThreshold::Bounded(cap) => Some(*cap),
            BlockThreshold::Unbounded => None,
        }
    }
}

impl fmt::Display for BlockThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockThreshold::Bounded(cap) => write!(f, "{}", cap),
            BlockThreshold::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Which attribute columns feed the tokenizer
///
/// Column numbers count positions in the input row; column 0 is the
/// identifier and is never tokenized.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldSelection {
    /// Every non-identifier column
    #[default]
    All,
    Columns(BTreeSet<usize>),
}

impl FieldSelection {
    pub fn columns<I: IntoIterator<Item = usize>>(columns: I) -> Self {
        FieldSelection::Columns(columns.into_iter().collect())
    }

    pub fn includes(&self, column: usize) -> bool {
        match self {
            FieldSelection::All => column >= 1,
            FieldSelection::Columns(set) => set.contains(&column),
        }
    }
}

/// Validated, immutable blocking configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BlockingSettings", into = "BlockingSettings")]
pub struct BlockingConfig {
    block_threshold: BlockThreshold,
    pairwise_threshold: u64,
    fields: FieldSelection,
    schema_width: usize,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            block_threshold: BlockThreshold::Unbounded,
            pairwise_threshold: DEFAULT_PAIRWISE_THRESHOLD,
            fields: FieldSelection::All,
            schema_width: DEFAULT_SCHEMA_WIDTH,
        }
    }
}

impl BlockingConfig {
    /// Build and validate a configuration
    pub fn new(
        block_threshold: BlockThreshold,
        pairwise_threshold: u64,
        fields: FieldSelection,
        schema_width: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            block_threshold,
            pairwise_threshold,
            fields,
            schema_width,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn block_threshold(&self) -> BlockThreshold {
        self.block_threshold
    }

    pub fn pairwise_threshold(&self) -> u64 {
        self.pairwise_threshold
    }

    pub fn fields(&self) -> &FieldSelection {
        &self.fields
    }

    pub fn schema_width(&self) -> usize {
        self.schema_width
    }

    /// Copy with a different block threshold
    pub fn with_block_threshold(&self, block_threshold: BlockThreshold) -> Self {
        Self {
            block_threshold,
            ..self.clone()
        }
    }

    /// Copy with a different pairwise threshold
    pub fn with_pairwise_threshold(&self, pairwise_threshold: u64) -> Self {
        Self {
            pairwise_threshold,
            ..self.clone()
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema_width < 2 {
            return Err(ConfigError::SchemaTooNarrow(self.schema_width));
        }

        if let FieldSelection::Columns(columns) = &self.fields {
            if columns.is_empty() {
                return Err(ConfigError::EmptySelection);
            }
            if columns.contains(&0) {
                return Err(ConfigError::IdentifierColumnSelected);
            }
            if let Some(&column) = columns.iter().find(|&&c| c >= self.schema_width) {
                return Err(ConfigError::ColumnOutOfRange {
                    column,
                    width: self.schema_width,
                });
            }
        }

        Ok(())
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let settings: BlockingSettings =
            toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::try_from(settings)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&BlockingSettings::from(self.clone()))
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        let settings: BlockingSettings =
            serde_json::from_str(json_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::try_from(settings)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Unvalidated configuration as it appears in config files and flags
///
/// Thresholds are signed here so that a negative value is reported as a
/// configuration error rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockingSettings {
    /// Per-side cap; absent means unbounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_threshold: Option<i64>,
    pub pairwise_threshold: i64,
    /// Attribute columns to tokenize; absent means all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<usize>>,
    pub schema_width: usize,
}

impl Default for BlockingSettings {
    fn default() -> Self {
        BlockingConfig::default().into()
    }
}

impl TryFrom<BlockingSettings> for BlockingConfig {
    type Error = ConfigError;

    fn try_from(settings: BlockingSettings) -> Result<Self, Self::Error> {
        let block_threshold = match settings.block_threshold {
            None => BlockThreshold::Unbounded,
            Some(value) if value < 0 => {
                return Err(ConfigError::NegativeThreshold {
                    name: "block_threshold",
                    value,
                })
            }
            Some(value) => BlockThreshold::Bounded(value as u64),
        };

        if settings.pairwise_threshold < 0 {
            return Err(ConfigError::NegativeThreshold {
                name: "pairwise_threshold",
                value: settings.pairwise_threshold,
            });
        }

        let fields = match settings.fields {
            None => FieldSelection::All,
            Some(columns) => FieldSelection::columns(columns),
        };

        BlockingConfig::new(
            block_threshold,
            settings.pairwise_threshold as u64,
            fields,
            settings.schema_width,
        )
    }
}

impl From<BlockingConfig> for BlockingSettings {
    fn from(config: BlockingConfig) -> Self {
        Self {
            block_threshold: config
                .block_threshold
                .as_option()
                .map(|cap| i64::try_from(cap).unwrap_or(i64::MAX)),
            pairwise_threshold: i64::try_from(config.pairwise_threshold).unwrap_or(i64::MAX),
            fields: match config.fields {
                FieldSelection::All => None,
                FieldSelection::Columns(set) => Some(set.into_iter().collect()),
            },
            schema_width: config.schema_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BlockingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.block_threshold(), BlockThreshold::Unbounded);
        assert_eq!(config.pairwise_threshold(), 3000);
        assert_eq!(config.schema_width(), 6);
    }

    #[test]
    fn test_block_threshold_reached() {
        let cap = BlockThreshold::Bounded(3);
        assert!(!cap.is_reached(2));
        assert!(cap.is_reached(3));
        assert!(!BlockThreshold::Unbounded.is_reached(u64::MAX));
    }

    #[test]
    fn test_field_selection() {
        assert!(FieldSelection::All.includes(1));
        assert!(!FieldSelection::All.includes(0));

        let selection = FieldSelection::columns([1, 3]);
        assert!(selection.includes(3));
        assert!(!selection.includes(2));
    }

    #[test]
    fn test_column_out_of_range() {
        let result = BlockingConfig::new(
            BlockThreshold::Unbounded,
            10,
            FieldSelection::columns([1, 6]),
            6,
        );
        assert_eq!(
            result,
            Err(ConfigError::ColumnOutOfRange {
                column: 6,
                width: 6
            })
        );
    }

    #[test]
    fn test_identifier_column_rejected() {
        let result = BlockingConfig::new(
            BlockThreshold::Unbounded,
            10,
            FieldSelection::columns([0, 1]),
            6,
        );
        assert_eq!(result, Err(ConfigError::IdentifierColumnSelected));
    }

    #[test]
    fn test_empty_selection_rejected() {
        let result = BlockingConfig::new(
            BlockThreshold::Unbounded,
            10,
            FieldSelection::Columns(BTreeSet::new()),
            6,
        );
        assert_eq!(result, Err(ConfigError::EmptySelection));
    }

    #[test]
    fn test_negative_threshold_in_toml() {
        let result = BlockingConfig::from_toml("block_threshold = -1\n");
        assert_eq!(
            result,
            Err(ConfigError::NegativeThreshold {
                name: "block_threshold",
                value: -1
            })
        );

        let result = BlockingConfig::from_toml("pairwise_threshold = -20\n");
        assert!(matches!(
            result,
            Err(ConfigError::NegativeThreshold {
                name: "pairwise_threshold",
                ..
            })
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = BlockingConfig::new(
            BlockThreshold::Bounded(500),
            20,
            FieldSelection::columns([1, 2]),
            4,
        )
        .unwrap();
        let text = config.to_toml().unwrap();
        assert!(text.contains("block_threshold = 500"));
        assert_eq!(BlockingConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = BlockingConfig::from_toml("fields = [1]\n").unwrap();
        assert_eq!(config.block_threshold(), BlockThreshold::Unbounded);
        assert_eq!(config.pairwise_threshold(), DEFAULT_PAIRWISE_THRESHOLD);
        assert_eq!(config.fields(), &FieldSelection::columns([1]));
    }

    #[test]
    fn test_json_serialization() {
        let config = BlockingConfig::default().with_block_threshold(BlockThreshold::Bounded(7));
        let json = config.to_json().unwrap();
        let parsed = BlockingConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_serde_rejects_invalid_embedded_config() {
        let result: Result<BlockingConfig, _> =
            serde_json::from_str(r#"{"pairwise_threshold": 5, "schema_width": 1}"#);
        assert!(result.is_err());
    }
}
