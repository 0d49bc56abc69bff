//! linkblock-io - Files around the blocking core
//!
//! - **Datasets**: CSV rows to tokenized datasets, header discarded
//! - **Gold standards**: `id1,id2,label` CSV files
//! - **Blocks**: the persisted candidate-block format, written, parsed
//!   back and counted
//! - **Configuration**: TOML or JSON blocking configuration files
//!
//! # Design
//!
//! Every reader is generic over `std::io::Read`; the path-based helpers
//! only open the file and delegate. Row-level problems are collected in an
//! `IssueReport`, while an `IoError` is fatal for its stream.

pub mod blocks;
pub mod csv_reader;
pub mod gold;
pub mod reader;

pub use blocks::*;
pub use csv_reader::*;
pub use gold::*;
pub use reader::*;
