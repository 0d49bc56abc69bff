//! End-to-end blocking over two in-memory datasets or record sets

use crate::candidates::{CandidateGenerator, CandidateIndex};
use crate::config::{BlockingConfig, BlockingSettings};
use crate::dataset::{build_dataset, Dataset, Record};
use crate::error::{IssueReport, Result};
use crate::frequency::{FrequencyAnalysis, FrequencyFilter};
use crate::tokenizer::Tokenizer;

/// Key selection details plus the resulting candidate index
#[derive(Debug, Clone)]
pub struct BlockingOutput {
    pub analysis: FrequencyAnalysis,
    pub index: CandidateIndex,
}

/// Select keys, then join the two sides on them
pub fn run_blocking(first: &Dataset, second: &Dataset, config: &BlockingConfig) -> BlockingOutput {
    let analysis = FrequencyFilter::new(config).analyze(first, second);
    let index = CandidateGenerator::new(&analysis.valid_keys).generate(first, second);
    BlockingOutput { analysis, index }
}

/// Validate `settings`, tokenize both record sets and block them
///
/// Fails only on an invalid configuration; malformed records and
/// duplicate identifiers end up in the returned report.
pub fn block_records<I, J>(
    first: I,
    second: J,
    settings: BlockingSettings,
) -> Result<(BlockingOutput, IssueReport)>
where
    I: IntoIterator<Item = Record>,
    J: IntoIterator<Item = Record>,
{
    let config = BlockingConfig::try_from(settings)?;
    let tokenizer = Tokenizer::new(&config);

    let (first, mut report) = build_dataset(first, &tokenizer);
    let (second, second_report) = build_dataset(second, &tokenizer);
    report.merge(second_report);

    Ok((run_blocking(&first, &second, &config), report))
}
