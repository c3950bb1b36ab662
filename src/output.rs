//! Output formatting and persistence for analysis results.
//!
//! Supports pretty-printing, JSON files for the renderer, and CSV append for
//! dataset statistics.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::stats::DatasetStats;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs dataset statistics using Rust's debug pretty-print format.
pub fn print_pretty(stats: &DatasetStats) {
    debug!("{:#?}", stats);
}

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes `value` as pretty JSON to `path`, creating parent directories.
pub fn write_json(path: &str, value: &impl Serialize) -> Result<()> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating '{}'", parent.display()))?;
    }
    let body = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, body).with_context(|| format!("writing '{path}'"))?;
    info!(path, "JSON written");
    Ok(())
}

/// Appends a [`DatasetStats`] record as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, stats: &DatasetStats) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // header only for a fresh file
        .from_writer(file);

    writer.serialize(stats)?;
    writer.flush()?;

    Ok(())
}
