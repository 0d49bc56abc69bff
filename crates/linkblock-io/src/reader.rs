//! Reader trait and common I/O types
//!
//! The `DatasetReader` trait gives every tabular source a uniform way to
//! turn its rows into a tokenized [`Dataset`].

use std::fs;
use std::path::Path;

use linkblock_core::{
    BlockingConfig, BlockingError, Dataset, DatasetBuilder, IssueReport, Tokenizer,
};
use thiserror::Error;

/// Errors that can occur during I/O operations
///
/// Any of these is fatal for the stream that raised it.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to open file: {0}")]
    OpenFailed(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Core(#[from] BlockingError),
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        IoError::Io(err.to_string())
    }
}

/// Result type for I/O operations
pub type IoResult<T> = Result<T, IoError>;

/// A tabular source of records
///
/// The first column of every row is the identifier. Rows are fed to a
/// [`DatasetBuilder`], so rows with the wrong width are reported rather
/// than failing the read.
pub trait DatasetReader {
    /// Tokenize every remaining row into `builder`
    fn read_into(&mut self, builder: &mut DatasetBuilder) -> IoResult<()>;

    /// Get the file path (if applicable)
    fn path(&self) -> Option<&str> {
        None
    }

    /// Get the format name
    fn format_name(&self) -> &'static str;

    /// Build the whole dataset with `tokenizer`
    fn read_dataset(&mut self, tokenizer: &Tokenizer) -> IoResult<(Dataset, IssueReport)> {
        let mut builder = DatasetBuilder::new(tokenizer.clone());
        self.read_into(&mut builder)?;
        let rows = builder.rows_seen();
        let (dataset, report) = builder.finish();

        tracing::debug!(
            source = self.path().unwrap_or("<stream>"),
            format = self.format_name(),
            rows,
            records = dataset.len(),
            "Read dataset"
        );

        Ok((dataset, report))
    }
}

/// Fail with `FileNotFound` before attempting to open a missing path
pub(crate) fn ensure_exists(path: &Path) -> IoResult<()> {
    if !path.exists() {
        return Err(IoError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

/// Load a blocking configuration from a TOML or JSON file
///
/// The format follows the extension; anything but `.json` is read as TOML.
pub fn load_config<P: AsRef<Path>>(path: P) -> IoResult<BlockingConfig> {
    let path = path.as_ref();
    ensure_exists(path)?;

    let text = fs::read_to_string(path)
        .map_err(|e| IoError::OpenFailed(format!("{}: {}", path.display(), e)))?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let config = if is_json {
        BlockingConfig::from_json(&text)
    } else {
        BlockingConfig::from_toml(&text)
    };

    config.map_err(|e| IoError::Core(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkblock_core::{BlockThreshold, ConfigError};
    use std::io::Write;

    #[test]
    fn test_load_config_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "block_threshold = 50\npairwise_threshold = 200").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.block_threshold(), BlockThreshold::Bounded(50));
        assert_eq!(config.pairwise_threshold(), 200);
    }

    #[test]
    fn test_load_config_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"pairwise_threshold": 10, "fields": [1, 2]}}"#).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.pairwise_threshold(), 10);
        assert!(config.fields().includes(2));
        assert!(!config.fields().includes(3));
    }

    #[test]
    fn test_load_config_rejects_negative_threshold() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "pairwise_threshold = -1").unwrap();

        match load_config(file.path()) {
            Err(IoError::Core(BlockingError::Config(ConfigError::NegativeThreshold { .. }))) => {}
            other => panic!("expected a negative threshold error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(IoError::FileNotFound(_))));
    }
}
