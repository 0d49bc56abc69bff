//! CSV dataset reader

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use linkblock_core::{DatasetBuilder, Record};

use crate::reader::{ensure_exists, DatasetReader, IoError, IoResult};

/// CSV dataset reader
///
/// The header row is discarded. Rows are read flexibly so that a row with
/// the wrong number of fields reaches the dataset builder and is reported
/// there instead of aborting the read.
pub struct CsvDatasetReader<R: Read> {
    reader: csv::Reader<R>,
    path: Option<String>,
}

impl CsvDatasetReader<BufReader<File>> {
    /// Open a comma-separated file
    pub fn open<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        Self::open_with_options(path, b',', true)
    }

    /// Open a CSV file with options
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        delimiter: u8,
        has_header: bool,
    ) -> IoResult<Self> {
        let path = path.as_ref();
        ensure_exists(path)?;

        let file = File::open(path)
            .map_err(|e| IoError::OpenFailed(format!("{}: {}", path.display(), e)))?;

        let mut reader = Self::with_options(BufReader::new(file), delimiter, has_header);
        reader.path = Some(path.display().to_string());
        Ok(reader)
    }
}

impl<R: Read> CsvDatasetReader<R> {
    /// Read comma-separated rows with a header from any stream
    pub fn from_reader(reader: R) -> Self {
        Self::with_options(reader, b',', true)
    }

    pub fn with_options(reader: R, delimiter: u8, has_header: bool) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(has_header)
            .flexible(true)
            .from_reader(reader);

        Self { reader, path: None }
    }
}

impl<R: Read> DatasetReader for CsvDatasetReader<R> {
    fn read_into(&mut self, builder: &mut DatasetBuilder) -> IoResult<()> {
        for result in self.reader.records() {
            let row = result.map_err(|e| IoError::InvalidFormat(csv_error_context(&e)))?;
            builder.push(Record::from_row(row.iter()));
        }
        Ok(())
    }

    fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}

/// Describe a csv error with its line number when known
pub(crate) fn csv_error_context(err: &csv::Error) -> String {
    match err.position() {
        Some(position) => format!("line {}: {}", position.line(), err),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkblock_core::{BlockingConfig, Tokenizer};
    use std::io::Cursor;

    fn tokenizer(schema_width: usize) -> Tokenizer {
        let config =
            BlockingConfig::from_toml(&format!("schema_width = {}", schema_width)).unwrap();
        Tokenizer::new(&config)
    }

    #[test]
    fn test_header_is_discarded() {
        let data = "id,name,city\nA1,Acme Corp.,Austin\nA2,Zeta Bank,Dallas\n";
        let mut reader = CsvDatasetReader::from_reader(Cursor::new(data));

        let (dataset, report) = reader.read_dataset(&tokenizer(3)).unwrap();
        assert!(report.is_clean());
        assert_eq!(dataset.ids().collect::<Vec<_>>(), vec!["A1", "A2"]);
        assert!(dataset.tokens_of("A1").unwrap().contains("acme"));
        assert!(dataset.tokens_of("id").is_none());
    }

    #[test]
    fn test_quoted_fields() {
        let data = "id,name,city\nA1,\"Acme, Inc.\",Austin\n";
        let mut reader = CsvDatasetReader::from_reader(Cursor::new(data));

        let (dataset, report) = reader.read_dataset(&tokenizer(3)).unwrap();
        assert!(report.is_clean());
        let tokens = dataset.tokens_of("A1").unwrap();
        assert!(tokens.contains("acme"));
        assert!(tokens.contains("inc"));
    }

    #[test]
    fn test_wrong_width_rows_are_reported() {
        let data = "id,name,city\nA1,Acme,Austin\nA2,Short\n\
                    A3,Zeta,Dallas,Extra\nA4,Lone Star,Houston\n";
        let mut reader = CsvDatasetReader::from_reader(Cursor::new(data));

        let (dataset, report) = reader.read_dataset(&tokenizer(3)).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(report.skipped_records(), 2);
        assert_eq!(report.record_format[0].id.as_deref(), Some("A2"));
        assert_eq!(report.record_format[0].found, 2);
        assert_eq!(report.record_format[1].found, 4);
    }

    #[test]
    fn test_duplicate_ids_are_kept_and_reported() {
        let data = "id,name\nA1,first\nA1,second\n";
        let mut reader = CsvDatasetReader::from_reader(Cursor::new(data));

        let (dataset, report) = reader.read_dataset(&tokenizer(2)).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(report.duplicate_ids.len(), 1);
        assert!(dataset.tokens_of("A1").unwrap().contains("second"));
    }

    #[test]
    fn test_tab_delimited() {
        let data = "A1\tAcme Corp\nA2\tZeta\n";
        let mut reader = CsvDatasetReader::with_options(Cursor::new(data), b'\t', false);

        let (dataset, _) = reader.read_dataset(&tokenizer(2)).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(reader.format_name(), "CSV");
        assert!(reader.path().is_none());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = CsvDatasetReader::open(dir.path().join("missing.csv"));
        assert!(matches!(result, Err(IoError::FileNotFound(_))));
    }
}
