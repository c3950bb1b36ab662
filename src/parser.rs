//! Parsers for delimited and JSON launch datasets.
//!
//! Rows are kept as open-ended [`RawRecord`]s: the datasets this crate reads
//! disagree on column names, so no schema is enforced at this boundary.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

// "35,786" or "1,234,567.5"; any other comma makes the cell non-numeric
static THOUSANDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").unwrap());

/// A single scalar cell of a raw record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl RawValue {
    /// `Null` and blank text carry no information.
    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Renders the value as text, `None` when empty.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Null => None,
            RawValue::Bool(b) => Some(b.to_string()),
            RawValue::Number(n) => Some(n.to_string()),
            RawValue::Text(s) if s.trim().is_empty() => None,
            RawValue::Text(s) => Some(s.trim().to_string()),
        }
    }

    /// Numeric coercion. Missing or unparseable values become NaN, never 0.
    pub fn as_number(&self) -> f64 {
        match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => {
                let s = s.trim();
                if THOUSANDS_RE.is_match(s) {
                    s.replace(',', "").parse().unwrap_or(f64::NAN)
                } else {
                    s.parse().unwrap_or(f64::NAN)
                }
            }
            RawValue::Null | RawValue::Bool(_) => f64::NAN,
        }
    }
}

/// An arbitrarily-keyed row from a launch or satellite dataset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: HashMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly handy in tests.
    pub fn with(mut self, key: &str, value: RawValue) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn with_text(self, key: &str, value: &str) -> Self {
        self.with(key, RawValue::Text(value.to_string()))
    }

    pub fn insert(&mut self, key: String, value: RawValue) {
        self.fields.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key)
    }

    /// Returns the first non-empty value among `aliases`, in list order.
    pub fn first_present<S: AsRef<str>>(&self, aliases: &[S]) -> Option<&RawValue> {
        aliases
            .iter()
            .filter_map(|alias| self.fields.get(alias.as_ref()))
            .find(|value| !value.is_empty())
    }

    /// Text of the first non-empty alias.
    pub fn text<S: AsRef<str>>(&self, aliases: &[S]) -> Option<String> {
        self.first_present(aliases).and_then(RawValue::as_text)
    }

    /// Number of the first non-empty alias, NaN when none is present.
    pub fn number<S: AsRef<str>>(&self, aliases: &[S]) -> f64 {
        self.first_present(aliases)
            .map(RawValue::as_number)
            .unwrap_or(f64::NAN)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Encoding of a dataset payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    /// Picks the format from the file extension (ignoring a trailing `.gz`),
    /// falling back to sniffing the first non-blank byte.
    pub fn detect(path: &str, bytes: &[u8]) -> Self {
        let trimmed = path.strip_suffix(".gz").unwrap_or(path);
        match Path::new(trimmed).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SourceFormat::Json,
            Some(ext) if ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("tsv") => {
                SourceFormat::Csv
            }
            _ => match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
                Some(b'[') => SourceFormat::Json,
                _ => SourceFormat::Csv,
            },
        }
    }
}

/// Parses comma-separated rows; the header row supplies the keys.
///
/// # Errors
///
/// Returns an error if the payload is not readable as CSV.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = rdr.headers().context("reading CSV header row")?.clone();
    let mut records = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let row = result.with_context(|| format!("reading CSV row {}", line + 2))?;
        let mut record = RawRecord::new();
        for (key, cell) in headers.iter().zip(row.iter()) {
            record.insert(key.to_string(), RawValue::Text(cell.to_string()));
        }
        records.push(record);
    }

    Ok(records)
}

/// Parses a JSON array of flat objects.
///
/// # Errors
///
/// Returns an error if the payload is not a JSON array of objects with scalar values.
pub fn parse_json(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    serde_json::from_slice(bytes).context("decoding JSON record array")
}

pub fn parse_records(bytes: &[u8], format: SourceFormat) -> Result<Vec<RawRecord>> {
    match format {
        SourceFormat::Csv => parse_csv(bytes),
        SourceFormat::Json => parse_json(bytes),
    }
}
