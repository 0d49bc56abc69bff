//! Subcommand runners

use std::path::Path;
use std::time::Instant;

use linkblock_core::{
    run_blocking, BlockingConfig, BlockingMetrics, Dataset, IssueReport, Tokenizer,
};
use linkblock_io::{
    count_pairs_in_file, open_gold, save_blocks, CsvDatasetReader, DatasetReader, IoResult,
};

/// Read both sides with the configured tokenizer
fn load_datasets(
    config: &BlockingConfig,
    first: &Path,
    second: &Path,
) -> IoResult<(Dataset, Dataset, IssueReport)> {
    let start = Instant::now();
    let tokenizer = Tokenizer::new(config);

    let (first_dataset, mut report) = CsvDatasetReader::open(first)?.read_dataset(&tokenizer)?;
    let (second_dataset, second_report) =
        CsvDatasetReader::open(second)?.read_dataset(&tokenizer)?;
    report.merge(second_report);

    tracing::info!(
        "Loaded {} and {} records in {:?}",
        first_dataset.len(),
        second_dataset.len(),
        start.elapsed()
    );
    if first_dataset.len() == second_dataset.len() {
        tracing::warn!("Datasets have equal size; the first is treated as the smaller side");
    }

    Ok((first_dataset, second_dataset, report))
}

pub fn blocks(
    config: &BlockingConfig,
    first: &Path,
    second: &Path,
    out: &Path,
    delimiter: char,
) -> Result<(), Box<dyn std::error::Error>> {
    let (first, second, report) = load_datasets(config, first, second)?;

    let start = Instant::now();
    let output = run_blocking(&first, &second, config);
    tracing::info!(
        "Selected {} blocking keys and {} candidate pairs in {:?}",
        output.analysis.valid_keys.len(),
        output.index.pair_count(),
        start.elapsed()
    );

    let lines = save_blocks(&output.index, out, delimiter)?;
    tracing::info!("Wrote {} blocks to {}", lines, out.display());

    report.log_summary("datasets");
    Ok(())
}

pub fn evaluate(
    config: &BlockingConfig,
    first: &Path,
    second: &Path,
    gold: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (first, second, mut report) = load_datasets(config, first, second)?;

    let gold = match gold {
        Some(path) => {
            let (gold, gold_report) = open_gold(path)?;
            report.merge(gold_report);
            Some(gold)
        }
        None => None,
    };

    let start = Instant::now();
    let index = run_blocking(&first, &second, config).index;
    tracing::info!("Blocking finished in {:?}", start.elapsed());

    let metrics = BlockingMetrics::compute(
        &index,
        first.len(),
        second.len(),
        gold.as_ref().map(|g| g.positives()),
    );
    metrics.log();

    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print_metrics(&metrics, gold.is_some());
    }

    report.log_summary("inputs");
    Ok(())
}

fn print_metrics(metrics: &BlockingMetrics, with_gold: bool) {
    println!("exhaustive pairs:  {}", metrics.exhaustive_pairs);
    println!("candidate pairs:   {}", metrics.candidate_pairs);
    println!("reduction ratio:   {}", format_ratio(metrics.reduction_ratio));
    if with_gold {
        println!("gold positives:    {}", metrics.gold_positive_pairs);
        println!("retrieved gold:    {}", metrics.retrieved_gold_pairs);
        println!("pairs completeness: {}", format_ratio(metrics.pairs_completeness));
    }
}

fn format_ratio(ratio: Option<f64>) -> String {
    match ratio {
        Some(value) => format!("{:.6}", value),
        None => "undefined".to_string(),
    }
}

pub fn count(blocks: &Path, delimiter: char) -> Result<(), Box<dyn std::error::Error>> {
    let pairs = count_pairs_in_file(blocks, delimiter)?;
    tracing::info!("Counted {} candidate pairs in {}", pairs, blocks.display());
    println!("{}", pairs);
    Ok(())
}
