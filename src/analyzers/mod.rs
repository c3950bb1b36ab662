//! Launch aggregation over a discovered time axis.
//!
//! This module turns raw launch rows into canonical events, folds them into
//! cumulative per-site snapshots for every year present in the data, and
//! keeps a separate government-vs-commercial series per year.

pub mod aggregate;
pub mod analyzer;
pub mod sectors;
pub mod types;
pub mod utility;
