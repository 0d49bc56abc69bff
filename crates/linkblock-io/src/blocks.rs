//! Persisted candidate blocks
//!
//! One record per first-side identifier: `id1 <sep> id2_a <sep> ... <sep> id2_n`,
//! records ascending by `id1` and each identifier list ascending. Records are
//! CSV-encoded with the given delimiter, so an identifier containing the
//! delimiter, a quote or a line break is quoted; ordinary identifiers are
//! written bare.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use linkblock_core::CandidateIndex;

use crate::csv_reader::csv_error_context;
use crate::reader::{ensure_exists, IoError, IoResult};

/// The delimiter as a single byte; the block format only supports ASCII
fn delimiter_byte(delimiter: char) -> IoResult<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| {
            IoError::InvalidFormat(format!("block delimiter {:?} is not ASCII", delimiter))
        })
}

fn block_reader<R: Read>(reader: R, delimiter: char) -> IoResult<csv::Reader<R>> {
    Ok(csv::ReaderBuilder::new()
        .delimiter(delimiter_byte(delimiter)?)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader))
}

/// Write `index` in the block format; returns the number of lines written
pub fn write_blocks<W: Write>(
    index: &CandidateIndex,
    writer: W,
    delimiter: char,
) -> IoResult<usize> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter_byte(delimiter)?)
        .flexible(true)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    let mut lines = 0;
    for (id1, ids2) in index.iter().filter(|(_, ids2)| !ids2.is_empty()) {
        writer
            .write_record(std::iter::once(id1).chain(ids2.iter().map(String::as_str)))
            .map_err(|e| IoError::Io(e.to_string()))?;
        lines += 1;
    }
    writer.flush()?;
    Ok(lines)
}

/// Create (or truncate) `path` and write the blocks to it
pub fn save_blocks<P: AsRef<Path>>(
    index: &CandidateIndex,
    path: P,
    delimiter: char,
) -> IoResult<usize> {
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|e| IoError::OpenFailed(format!("{}: {}", path.display(), e)))?;

    let lines = write_blocks(index, file, delimiter)?;
    tracing::debug!(path = %path.display(), lines, "Wrote candidate blocks");
    Ok(lines)
}

/// Parse a block file back into a candidate index
///
/// Blank lines are ignored. An identifier listed twice on a line, or a
/// first-side identifier split over several lines, collapses as in any
/// candidate index.
pub fn read_blocks<R: Read>(reader: R, delimiter: char) -> IoResult<CandidateIndex> {
    let mut index = CandidateIndex::new();
    for result in block_reader(reader, delimiter)?.records() {
        let record = result.map_err(|e| IoError::InvalidFormat(csv_error_context(&e)))?;

        let mut fields = record.iter();
        let Some(id1) = fields.next() else {
            continue;
        };
        for id2 in fields {
            index.insert(id1, id2);
        }
    }
    Ok(index)
}

pub fn open_blocks<P: AsRef<Path>>(path: P, delimiter: char) -> IoResult<CandidateIndex> {
    let path = path.as_ref();
    ensure_exists(path)?;

    let file = File::open(path)
        .map_err(|e| IoError::OpenFailed(format!("{}: {}", path.display(), e)))?;
    read_blocks(file, delimiter)
}

/// Count candidate pairs in a block file without building an index
///
/// Each line contributes its field count minus one, so repeated entries
/// are counted as written.
pub fn count_pairs<R: Read>(reader: R, delimiter: char) -> IoResult<u64> {
    let mut pairs = 0u64;
    for result in block_reader(reader, delimiter)?.records() {
        let record = result.map_err(|e| IoError::InvalidFormat(csv_error_context(&e)))?;
        pairs += record.len().saturating_sub(1) as u64;
    }
    Ok(pairs)
}

/// Open `path` and count its candidate pairs
pub fn count_pairs_in_file<P: AsRef<Path>>(path: P, delimiter: char) -> IoResult<u64> {
    let path = path.as_ref();
    ensure_exists(path)?;

    let file = File::open(path)
        .map_err(|e| IoError::OpenFailed(format!("{}: {}", path.display(), e)))?;
    count_pairs(file, delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    fn sample_index() -> CandidateIndex {
        [("F2", "S9"), ("F1", "S3"), ("F1", "S1"), ("F2", "S1")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_write_blocks_sorted() {
        let mut out = Vec::new();
        let lines = write_blocks(&sample_index(), &mut out, '\t').unwrap();

        assert_eq!(lines, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "F1\tS1\tS3\nF2\tS1\tS9\n");
    }

    #[test]
    fn test_plain_ids_match_rendered_index() {
        let mut out = Vec::new();
        write_blocks(&sample_index(), &mut out, ',').unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), sample_index().render(','));
    }

    #[test]
    fn test_empty_index_writes_nothing() {
        let mut out = Vec::new();
        assert_eq!(write_blocks(&CandidateIndex::new(), &mut out, '\t').unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_read_blocks() {
        let data = "F1\tS1\tS3\n\nF2\tS9\tS1\r\nF3\n";
        let index = read_blocks(Cursor::new(data), '\t').unwrap();

        assert_eq!(index, sample_index());
        assert!(index.get("F3").is_none());
    }

    #[test]
    fn test_count_pairs() {
        let data = "F1\tS1\tS3\nF2\tS9\nF3\n\n";
        assert_eq!(count_pairs(Cursor::new(data), '\t').unwrap(), 3);
        assert_eq!(count_pairs(Cursor::new(""), '\t').unwrap(), 0);
    }

    #[test]
    fn test_custom_delimiter() {
        let mut out = Vec::new();
        write_blocks(&sample_index(), &mut out, '|').unwrap();
        assert_eq!(read_blocks(Cursor::new(out), '|').unwrap(), sample_index());
    }

    #[rstest]
    #[case(',', "ACME, Inc", "B1")]
    #[case('\t', "ACME\tInc", "B\t1")]
    #[case('\t', "ACME \"Holdings\"", "B1")]
    #[case(',', "ACME\nInc", "B,1")]
    fn test_ids_containing_special_characters(
        #[case] delimiter: char,
        #[case] id1: &str,
        #[case] id2: &str,
    ) {
        let index: CandidateIndex = [(id1, id2), (id1, "B2")].into_iter().collect();

        let mut out = Vec::new();
        assert_eq!(write_blocks(&index, &mut out, delimiter).unwrap(), 1);

        assert_eq!(read_blocks(Cursor::new(&out), delimiter).unwrap(), index);
        assert_eq!(count_pairs(Cursor::new(&out), delimiter).unwrap(), 2);
    }

    #[test]
    fn test_quoted_id_bytes() {
        let index: CandidateIndex = [("ACME, Inc", "B1")].into_iter().collect();
        let mut out = Vec::new();
        write_blocks(&index, &mut out, ',').unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\"ACME, Inc\",B1\n");
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let mut out = Vec::new();
        let result = write_blocks(&sample_index(), &mut out, '§');
        assert!(matches!(result, Err(IoError::InvalidFormat(_))));
        assert!(matches!(
            read_blocks(Cursor::new("F1§S1"), '§'),
            Err(IoError::InvalidFormat(_))
        ));
    }
}
