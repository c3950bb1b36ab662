//! Data types used by the aggregation pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::sites::SiteKey;

/// Ownership category a launch is attributed to on the site map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ownership {
    Government,
    Military,
    Commercial,
    Civilian,
    Unknown,
}

/// One or two categories credited for a single launch.
///
/// Mixed government/commercial launches carry both and increment both counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Attribution {
    primary: Ownership,
    secondary: Option<Ownership>,
}

impl Attribution {
    pub fn single(category: Ownership) -> Self {
        Self {
            primary: category,
            secondary: None,
        }
    }

    pub fn dual(primary: Ownership, secondary: Ownership) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    pub fn primary(&self) -> Ownership {
        self.primary
    }

    pub fn is_dual(&self) -> bool {
        self.secondary.is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = Ownership> + '_ {
        std::iter::once(self.primary).chain(self.secondary)
    }
}

/// A normalized launch with a resolved year and site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalEvent {
    pub year: i32,
    pub site_key: SiteKey,
    pub lon: f64,
    pub lat: f64,
    pub ownership: Attribution,
    pub vehicle: String,
    pub site_name: String,
    pub country: String,
}

/// Running launch tally for one site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteAggregate {
    pub site_key: SiteKey,
    pub lon: f64,
    pub lat: f64,
    pub site_name: String,
    pub country: String,
    pub cumulative_count: u32,
    pub counts_by_category: BTreeMap<Ownership, u32>,
}

impl SiteAggregate {
    /// A zeroed aggregate seeded from the first event seen at the site.
    pub fn empty_for(event: &CanonicalEvent) -> Self {
        Self {
            site_key: event.site_key.clone(),
            lon: event.lon,
            lat: event.lat,
            site_name: event.site_name.clone(),
            country: event.country.clone(),
            cumulative_count: 0,
            counts_by_category: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, event: &CanonicalEvent) {
        self.cumulative_count += 1;
        for category in event.ownership.iter() {
            *self.counts_by_category.entry(category).or_default() += 1;
        }
    }

    /// Count for a category, zero when the site never saw it.
    pub fn category_count(&self, category: Ownership) -> u32 {
        self.counts_by_category.get(&category).copied().unwrap_or(0)
    }
}

/// State of every site as of and including a given year.
pub type YearSnapshot = BTreeMap<SiteKey, SiteAggregate>;
