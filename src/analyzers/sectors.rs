//! Government-vs-commercial launch counts per year.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::normalize::{NormalizedRecord, Sector, classify_sector};

/// Launch counts for one year under the two-category policy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectorCounts {
    pub government: u32,
    pub commercial: u32,
    pub other: u32,
}

impl SectorCounts {
    pub fn add(&mut self, sector: Sector) {
        match sector {
            Sector::Government => self.government += 1,
            Sector::Commercial => self.commercial += 1,
            Sector::Other => self.other += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.government + self.commercial + self.other
    }
}

/// Per-year sector counts, ascending by year.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SectorSeries {
    per_year: BTreeMap<i32, SectorCounts>,
}

impl SectorSeries {
    /// Records without a year are skipped. Site resolution is not required.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a NormalizedRecord>) -> Self {
        let mut per_year: BTreeMap<i32, SectorCounts> = BTreeMap::new();
        for record in records {
            let Some(year) = record.year else { continue };
            let counts = per_year.entry(year).or_default();
            for sector in classify_sector(record.ownership_raw.as_deref()) {
                counts.add(sector);
            }
        }
        Self { per_year }
    }

    pub fn year(&self, year: i32) -> SectorCounts {
        self.per_year.get(&year).copied().unwrap_or_default()
    }

    pub fn per_year(&self) -> &BTreeMap<i32, SectorCounts> {
        &self.per_year
    }

    /// Running totals as of and including each year.
    pub fn cumulative(&self) -> BTreeMap<i32, SectorCounts> {
        let mut running = SectorCounts::default();
        self.per_year
            .iter()
            .map(|(year, counts)| {
                running.government += counts.government;
                running.commercial += counts.commercial;
                running.other += counts.other;
                (*year, running)
            })
            .collect()
    }
}
