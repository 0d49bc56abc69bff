//! linkblock - token blocking for record linkage
//!
//! Builds the candidate pairs worth comparing between two CSV datasets,
//! writes them as a block file and reports blocking quality.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use linkblock_core::{BlockingConfig, BlockingSettings, DEFAULT_BLOCK_DELIMITER};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Blocking configuration file (TOML, or JSON with a .json extension)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Per-side token count at which a token is dropped
    #[arg(long, global = true, allow_negative_numbers = true)]
    block_threshold: Option<i64>,

    /// Largest allowed product of the two side counts for a key
    #[arg(long, global = true, allow_negative_numbers = true)]
    pairwise_threshold: Option<i64>,

    /// Attribute columns to tokenize, e.g. `1,2` (identifier is column 0)
    #[arg(long, global = true, value_delimiter = ',')]
    fields: Option<Vec<usize>>,

    /// Columns per input row, identifier included
    #[arg(long, global = true)]
    schema_width: Option<usize>,

    /// Worker threads (0 = one per core)
    #[arg(long, global = true, default_value_t = 0)]
    threads: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the candidate blocks of two datasets
    Blocks {
        #[arg(long)]
        first: PathBuf,

        #[arg(long)]
        second: PathBuf,

        #[arg(long)]
        out: PathBuf,

        /// Block file field separator (`TAB` or a single character)
        #[arg(long, default_value = "TAB", value_parser = parse_delimiter)]
        delimiter: char,
    },

    /// Report reduction ratio and, given a gold standard, pairs completeness
    Evaluate {
        #[arg(long)]
        first: PathBuf,

        #[arg(long)]
        second: PathBuf,

        #[arg(long)]
        gold: Option<PathBuf>,

        /// Print the metrics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Count candidate pairs in a block file
    Count {
        #[arg(long)]
        blocks: PathBuf,

        #[arg(long, default_value = "TAB", value_parser = parse_delimiter)]
        delimiter: char,
    },
}

fn parse_delimiter(value: &str) -> Result<char, String> {
    match value {
        "TAB" | "tab" | "\\t" => Ok(DEFAULT_BLOCK_DELIMITER),
        _ => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c),
                _ => Err(format!("expected a single ASCII character or TAB, got {:?}", value)),
            }
        }
    }
}

impl Cli {
    /// Config file (or defaults) with command-line overrides, validated
    fn blocking_config(&self) -> Result<BlockingConfig, Box<dyn std::error::Error>> {
        let mut settings = match &self.config {
            Some(path) => BlockingSettings::from(linkblock_io::load_config(path)?),
            None => BlockingSettings::default(),
        };

        if let Some(value) = self.block_threshold {
            settings.block_threshold = Some(value);
        }
        if let Some(value) = self.pairwise_threshold {
            settings.pairwise_threshold = value;
        }
        if let Some(fields) = &self.fields {
            settings.fields = Some(fields.clone());
        }
        if let Some(width) = self.schema_width {
            settings.schema_width = width;
        }

        Ok(BlockingConfig::try_from(settings)?)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()?;
    }

    match &cli.command {
        Commands::Blocks {
            first,
            second,
            out,
            delimiter,
        } => {
            let config = cli.blocking_config()?;
            commands::blocks(&config, first, second, out, *delimiter)?;
        }
        Commands::Evaluate {
            first,
            second,
            gold,
            json,
        } => {
            let config = cli.blocking_config()?;
            commands::evaluate(&config, first, second, gold.as_deref(), *json)?;
        }
        Commands::Count { blocks, delimiter } => {
            commands::count(blocks, *delimiter)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkblock_core::BlockThreshold;

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter("TAB"), Ok('\t'));
        assert_eq!(parse_delimiter("|"), Ok('|'));
        assert!(parse_delimiter("||").is_err());
        assert!(parse_delimiter("§").is_err());
        assert!(parse_delimiter("").is_err());
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from([
            "linkblock",
            "count",
            "--blocks",
            "b.tsv",
            "--block-threshold",
            "40",
            "--fields",
            "1,3",
        ]);
        let config = cli.blocking_config().unwrap();
        assert_eq!(config.block_threshold(), BlockThreshold::Bounded(40));
        assert_eq!(config.pairwise_threshold(), 3000);
        assert!(config.fields().includes(3));
        assert!(!config.fields().includes(2));
    }

    #[test]
    fn test_negative_override_rejected() {
        let cli = Cli::parse_from([
            "linkblock",
            "count",
            "--blocks",
            "b.tsv",
            "--pairwise-threshold",
            "-5",
        ]);
        assert!(cli.blocking_config().is_err());
    }
}
