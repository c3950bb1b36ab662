use chrono::{DateTime, Utc};
use serde::Serialize;

/// Data-quality tally for one ingested dataset.
///
/// Dropped records are expected sparsity, not errors; this is where they show up.
#[derive(Debug, Default, Clone, Serialize)]
pub struct DatasetStats {
    pub timestamp: DateTime<Utc>,
    pub source: Option<String>,
    pub total_records: usize,

    // launch fields
    pub with_year: usize,
    pub with_owner: usize,
    pub with_site_label: usize,
    pub with_coordinates: usize,
    pub events: usize,
    pub dual_attributed: usize,
    pub dropped_no_year: usize,
    pub dropped_no_site: usize,

    // orbital fields
    pub with_perigee: usize,
    pub with_apogee: usize,
    pub with_inclination: usize,
    pub orbits: usize,
    pub inverted_apsides: usize,
    pub mean_inclination_deg: Option<f64>,

    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub sites: usize,
}

impl DatasetStats {
    pub fn new() -> Self {
        DatasetStats {
            timestamp: Utc::now(),
            ..Default::default()
        }
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    /// Share of records that became canonical events.
    pub fn event_pct(&self) -> f64 {
        Self::pct(self.events, self.total_records)
    }

    pub fn orbit_pct(&self) -> f64 {
        Self::pct(self.orbits, self.total_records)
    }

    /// Set the dataset origin (path or URL)
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(DatasetStats::pct(10, 0), 0.0);
    }

    #[test]
    fn test_pct_normal_values() {
        assert_eq!(DatasetStats::pct(50, 100), 50.0);
        assert_eq!(DatasetStats::pct(1, 4), 25.0);
    }

    #[test]
    fn test_event_pct() {
        let mut stats = DatasetStats::new();
        stats.total_records = 200;
        stats.events = 150;
        stats.orbits = 20;

        assert_eq!(stats.event_pct(), 75.0);
        assert_eq!(stats.orbit_pct(), 10.0);
    }

    #[test]
    fn test_with_source() {
        let stats = DatasetStats::new().with_source("launches.csv");
        assert_eq!(stats.source.as_deref(), Some("launches.csv"));
        assert_eq!(stats.total_records, 0);
    }
}
