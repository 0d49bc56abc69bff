//! Gold-standard CSV reader
//!
//! Rows are `id1,id2,label` after a discarded header. Rows with an
//! unknown label or the wrong number of columns are reported, not fatal.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use linkblock_core::{GoldStandard, GoldStandardBuilder, IssueReport};

use crate::csv_reader::csv_error_context;
use crate::reader::{ensure_exists, IoError, IoResult};

/// Read a gold standard from any CSV stream
pub fn read_gold<R: Read>(reader: R) -> IoResult<(GoldStandard, IssueReport)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut builder = GoldStandardBuilder::new();
    for result in reader.records() {
        let row = result.map_err(|e| IoError::InvalidFormat(csv_error_context(&e)))?;
        let fields: Vec<&str> = row.iter().collect();
        builder.push(fields.as_slice());
    }

    let (gold, report) = builder.finish();
    tracing::debug!(
        positives = gold.positive_pair_count(),
        negatives = gold.negative_pair_count(),
        skipped = report.skipped_gold_rows(),
        "Read gold standard"
    );
    Ok((gold, report))
}

/// Open and read a gold-standard file
pub fn open_gold<P: AsRef<Path>>(path: P) -> IoResult<(GoldStandard, IssueReport)> {
    let path = path.as_ref();
    ensure_exists(path)?;

    let file = File::open(path)
        .map_err(|e| IoError::OpenFailed(format!("{}: {}", path.display(), e)))?;
    read_gold(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_gold() {
        let data = "id1,id2,match\nA,B,yes\nA,C,YES\nA,D,no\nE,F,maybe\nG,H\n";
        let (gold, report) = read_gold(Cursor::new(data)).unwrap();

        assert_eq!(gold.positive_pair_count(), 2);
        assert_eq!(gold.negative_pair_count(), 1);
        assert!(gold.is_match("A", "C"));
        assert!(!gold.is_match("E", "F"));

        assert_eq!(report.gold_labels.len(), 1);
        assert_eq!(report.gold_labels[0].label, "maybe");
        assert_eq!(report.gold_format.len(), 1);
        assert_eq!(report.skipped_gold_rows(), 2);
    }

    #[test]
    fn test_header_only() {
        let (gold, report) = read_gold(Cursor::new("id1,id2,match\n")).unwrap();
        assert_eq!(gold.positive_pair_count(), 0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_open_gold_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gold.csv");
        std::fs::write(&path, "id1,id2,match\nX,Y,Yes\n").unwrap();

        let (gold, _) = open_gold(&path).unwrap();
        assert!(gold.is_match("X", "Y"));

        let missing = open_gold(dir.path().join("absent.csv"));
        assert!(matches!(missing, Err(IoError::FileNotFound(_))));
    }
}
