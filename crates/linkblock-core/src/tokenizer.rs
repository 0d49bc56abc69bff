//! Record tokenization into normalized token sets
//!
//! Each selected attribute field is cleaned by a fixed, ordered list of
//! separator patterns, split on spaces and lower-cased. Identifiers are
//! never touched: they keep their case and never enter a token set.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::{BlockingConfig, FieldSelection};
use crate::dataset::Record;
use crate::error::RecordFormatError;

/// Set of normalized tokens for one record
pub type TokenSet = BTreeSet<String>;

lazy_static! {
    /// Applied in this order; whitespace runs go last so every earlier
    /// replacement collapses into a single space.
    static ref SEPARATORS: Vec<Regex> = vec![
        Regex::new(r"/").unwrap(),
        Regex::new(r",").unwrap(),
        Regex::new(r":").unwrap(),
        Regex::new(r";").unwrap(),
        Regex::new(r"\(").unwrap(),
        Regex::new(r"\)").unwrap(),
        Regex::new(r"\.").unwrap(),
        Regex::new("\"").unwrap(),
        Regex::new(r"_").unwrap(),
        Regex::new(r"-").unwrap(),
        Regex::new(r"#").unwrap(),
        Regex::new(r"\\").unwrap(),
        Regex::new(r"\s+").unwrap(),
    ];
}

/// Replace every separator with a space, trimming after each pass
pub fn clean_field(field: &str) -> String {
    let mut cleaned = field.to_string();
    for pattern in SEPARATORS.iter() {
        cleaned = pattern.replace_all(&cleaned, " ").trim().to_string();
    }
    cleaned
}

/// Add the normalized tokens of one field to `tokens`
pub fn tokenize_field_into(field: &str, tokens: &mut TokenSet) {
    let cleaned = clean_field(field);
    tokens.extend(
        cleaned
            .split(' ')
            .filter(|piece| !piece.is_empty())
            .map(|piece| piece.to_lowercase()),
    );
}

/// Tokenize a free-standing piece of text
pub fn tokenize_text(text: &str) -> TokenSet {
    let mut tokens = TokenSet::new();
    tokenize_field_into(text, &mut tokens);
    tokens
}

/// Converts records into token sets under one field selection
#[derive(Debug, Clone)]
pub struct Tokenizer {
    fields: FieldSelection,
    schema_width: usize,
}

impl Tokenizer {
    pub fn new(config: &BlockingConfig) -> Self {
        Self {
            fields: config.fields().clone(),
            schema_width: config.schema_width(),
        }
    }

    /// Expected number of columns per row, identifier included
    pub fn schema_width(&self) -> usize {
        self.schema_width
    }

    /// Tokenize the selected fields of `record`
    ///
    /// The width check runs before any field is read; a record of the wrong
    /// width yields an error and no tokens.
    pub fn tokenize(&self, record: &Record, row: usize) -> Result<TokenSet, RecordFormatError> {
        let found = record.width();
        if found != self.schema_width {
            return Err(RecordFormatError {
                row,
                id: (!record.id.is_empty()).then(|| record.id.clone()),
                expected: self.schema_width,
                found,
            });
        }

        let mut tokens = TokenSet::new();
        for (offset, field) in record.fields.iter().enumerate() {
            // Attribute fields start at column 1
            if self.fields.includes(offset + 1) {
                tokenize_field_into(field, &mut tokens);
            }
        }
        Ok(tokens)
    }
}
