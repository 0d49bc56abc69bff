//! linkblock-core - Token-based blocking for record linkage
//!
//! Given two datasets to cross-match, this crate produces the reduced set
//! of candidate record pairs worth comparing:
//!
//! - **Tokenizer**: record attributes to a normalized token set
//! - **Dataset**: ordered (identifier, token set) entries per side
//! - **FrequencyFilter**: valid blocking keys under a per-side block
//!   threshold and a cross-side pairwise-product threshold
//! - **CandidateGenerator**: first-side identifier to the second-side
//!   identifiers sharing a valid key
//! - **Evaluation**: reduction ratio and pairs completeness
//!
//! # Design
//!
//! The crate only works on in-memory values. Reading CSV files, gold
//! standards and block files lives in `linkblock-io`.

pub mod candidates;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod frequency;
pub mod gold;
pub mod pipeline;
pub mod tokenizer;

pub use candidates::*;
pub use config::*;
pub use dataset::*;
pub use error::*;
pub use evaluation::*;
pub use frequency::*;
pub use gold::*;
pub use pipeline::*;
pub use tokenizer::*;
