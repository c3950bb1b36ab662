use crate::analyzers::aggregate::{TemporalAggregator, Timeline};
use crate::analyzers::sectors::SectorSeries;
use crate::analyzers::types::CanonicalEvent;
use crate::analyzers::utility::finite_mean;
use crate::config::AtlasConfig;
use crate::normalize::{NormalizedRecord, RecordNormalizer, classify_ownership};
use crate::orbit::OrbitRecord;
use crate::parser::RawRecord;
use crate::sites::{SiteDictionary, SiteResolver};
use crate::stats::DatasetStats;
use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

/// Everything derived from one launch dataset.
#[derive(Debug, Serialize)]
pub struct LaunchAnalysis {
    pub stats: DatasetStats,
    pub timeline: Timeline,
    pub sectors: SectorSeries,
    #[serde(skip)]
    pub events: Vec<CanonicalEvent>,
}

/// Raw records → canonical events → cumulative timeline.
#[derive(Debug, Clone, Default)]
pub struct LaunchPipeline {
    normalizer: RecordNormalizer,
    resolver: SiteResolver,
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

impl LaunchPipeline {
    pub fn new(normalizer: RecordNormalizer, resolver: SiteResolver) -> Self {
        Self {
            normalizer,
            resolver,
        }
    }

    /// Builds the pipeline from configured aliases and site dictionary.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured site pattern does not compile.
    pub fn from_config(config: &AtlasConfig) -> Result<Self> {
        let dictionary = match &config.sites {
            Some(rules) => SiteDictionary::from_config(rules)?,
            None => SiteDictionary::default(),
        };
        Ok(Self::new(
            RecordNormalizer::new(config.aliases.clone()),
            SiteResolver::new(dictionary),
        ))
    }

    pub fn normalizer(&self) -> &RecordNormalizer {
        &self.normalizer
    }

    /// Canonical event for one record, `None` when its year or site is unknown.
    pub fn event(&self, record: &RawRecord, normalized: &NormalizedRecord) -> Option<CanonicalEvent> {
        let aliases = self.normalizer.aliases();
        let year = normalized.year?;

        let label = record.text(&aliases.site);
        let lat = finite(record.number(&aliases.latitude));
        let lon = finite(record.number(&aliases.longitude));
        let site = self.resolver.resolve(label.as_deref(), lat, lon)?;

        let country = site
            .country
            .clone()
            .or_else(|| record.text(&aliases.country))
            .unwrap_or_else(|| "Unknown".to_string());

        Some(CanonicalEvent {
            year,
            site_key: site.key(),
            lon: site.lon,
            lat: site.lat,
            ownership: classify_ownership(normalized.ownership_raw.as_deref()),
            vehicle: record.text(&aliases.vehicle).unwrap_or_default(),
            site_name: site.canonical_name,
            country,
        })
    }

    /// Runs the launch pipeline over every record. Records without a year or
    /// a resolvable site are dropped and only counted in the stats.
    #[tracing::instrument(skip_all, fields(records = records.len()))]
    pub fn analyze(&self, records: &[RawRecord]) -> LaunchAnalysis {
        let aliases = self.normalizer.aliases();
        let mut stats = DatasetStats::new();
        stats.total_records = records.len();

        let mut normalized = Vec::with_capacity(records.len());
        let mut events = Vec::new();

        for (row, record) in records.iter().enumerate() {
            let n = self.normalizer.normalize(record);

            if n.year.is_some() {
                stats.with_year += 1;
            }
            if n.ownership_raw.is_some() {
                stats.with_owner += 1;
            }
            if record.first_present(&aliases.site).is_some() {
                stats.with_site_label += 1;
            }
            if finite(record.number(&aliases.latitude)).is_some()
                && finite(record.number(&aliases.longitude)).is_some()
            {
                stats.with_coordinates += 1;
            }
            self.tally_orbital_fields(&n, &mut stats);

            match self.event(record, &n) {
                Some(event) => {
                    if event.ownership.is_dual() {
                        stats.dual_attributed += 1;
                    }
                    events.push(event);
                }
                None if n.year.is_none() => {
                    debug!(row, "Dropped record without a launch year");
                    stats.dropped_no_year += 1;
                }
                None => {
                    debug!(row, site = ?record.text(&aliases.site), "Dropped record with unresolvable site");
                    stats.dropped_no_site += 1;
                }
            }
            normalized.push(n);
        }

        let timeline = TemporalAggregator::aggregate(&events);
        let sectors = SectorSeries::from_records(&normalized);

        let inclinations: Vec<f64> = normalized.iter().map(|n| n.inclination_deg).collect();
        stats.mean_inclination_deg = finite_mean(&inclinations);
        stats.events = events.len();
        stats.first_year = timeline.years().first().copied();
        stats.last_year = timeline.years().last().copied();
        stats.sites = timeline.all_time().len();

        info!(
            events = stats.events,
            dropped_no_year = stats.dropped_no_year,
            dropped_no_site = stats.dropped_no_site,
            years = timeline.len(),
            sites = stats.sites,
            "Launch dataset analyzed"
        );

        LaunchAnalysis {
            stats,
            timeline,
            sectors,
            events,
        }
    }

    fn tally_orbital_fields(&self, n: &NormalizedRecord, stats: &mut DatasetStats) {
        if n.perigee_km.is_finite() {
            stats.with_perigee += 1;
        }
        if n.apogee_km.is_finite() {
            stats.with_apogee += 1;
        }
        if n.inclination_deg.is_finite() {
            stats.with_inclination += 1;
        }
        if let Some(orbit) = OrbitRecord::from_normalized(n) {
            stats.orbits += 1;
            if orbit.has_inverted_apsides() {
                stats.inverted_apsides += 1;
            }
        }
    }

    /// Drawable orbits; records missing perigee or apogee are skipped.
    #[tracing::instrument(skip_all, fields(records = records.len()))]
    pub fn orbits(&self, records: &[RawRecord]) -> Vec<OrbitRecord> {
        let orbits: Vec<OrbitRecord> = records
            .iter()
            .filter_map(|r| OrbitRecord::from_normalized(&self.normalizer.normalize(r)))
            .collect();
        info!(orbits = orbits.len(), skipped = records.len() - orbits.len(), "Orbital records read");
        orbits
    }
}
