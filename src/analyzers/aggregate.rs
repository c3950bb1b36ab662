use crate::analyzers::types::{CanonicalEvent, SiteAggregate, YearSnapshot};
use crate::sites::SiteKey;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Running per-site tallies, mutated in place as years are applied.
#[derive(Debug, Default, Clone)]
pub struct SiteAccumulator {
    sites: YearSnapshot,
}

impl SiteAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &CanonicalEvent) {
        self.sites
            .entry(event.site_key.clone())
            .or_insert_with(|| SiteAggregate::empty_for(event))
            .record(event);
    }

    /// Deep copy of the current state.
    pub fn snapshot(&self) -> YearSnapshot {
        self.sites.clone()
    }

    pub fn into_inner(self) -> YearSnapshot {
        self.sites
    }
}

/// Cumulative per-year snapshots plus an all-time view of the same events.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Timeline {
    snapshots: BTreeMap<i32, YearSnapshot>,
    all_time: YearSnapshot,
}

impl Timeline {
    /// Years with at least one launch, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.snapshots.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshot(&self, year: i32) -> Option<&YearSnapshot> {
        self.snapshots.get(&year)
    }

    /// Snapshot by position on the year axis, as used by playback.
    pub fn snapshot_at(&self, index: usize) -> Option<(i32, &YearSnapshot)> {
        self.snapshots.iter().nth(index).map(|(y, s)| (*y, s))
    }

    /// Cumulative count of `key` as of `year`; sites not yet seen count as zero.
    pub fn count_at(&self, year: i32, key: &SiteKey) -> u32 {
        self.snapshots
            .range(..=year)
            .next_back()
            .and_then(|(_, snapshot)| snapshot.get(key))
            .map(|site| site.cumulative_count)
            .unwrap_or(0)
    }

    pub fn all_time(&self) -> &YearSnapshot {
        &self.all_time
    }
}

/// Folds canonical events into cumulative [`YearSnapshot`]s.
#[derive(Debug, Default)]
pub struct TemporalAggregator {
    accumulator: SiteAccumulator,
    snapshots: BTreeMap<i32, YearSnapshot>,
}

impl TemporalAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one year's events and records the resulting snapshot.
    /// Years arrive strictly ascending from [`Self::aggregate`].
    fn push_year(&mut self, year: i32, events: &[&CanonicalEvent]) {
        debug_assert!(
            self.snapshots.last_key_value().is_none_or(|(last, _)| *last < year),
            "year {year} pushed out of order"
        );
        for event in events {
            self.accumulator.apply(event);
        }
        self.snapshots.insert(year, self.accumulator.snapshot());
        debug!(year, events = events.len(), sites = self.snapshots[&year].len(), "Year applied");
    }

    /// Builds the full timeline. Input order does not matter; events are
    /// grouped by year and applied in ascending year order.
    pub fn aggregate(events: &[CanonicalEvent]) -> Timeline {
        let mut by_year: BTreeMap<i32, Vec<&CanonicalEvent>> = BTreeMap::new();
        for event in events {
            by_year.entry(event.year).or_default().push(event);
        }

        let mut aggregator = Self::new();
        for (year, year_events) in &by_year {
            aggregator.push_year(*year, year_events);
        }
        aggregator.finish()
    }

    /// Totals per site ignoring the time axis.
    pub fn all_time(events: &[CanonicalEvent]) -> YearSnapshot {
        let mut acc = SiteAccumulator::new();
        for event in events {
            acc.apply(event);
        }
        acc.into_inner()
    }

    pub fn finish(self) -> Timeline {
        Timeline {
            all_time: self.accumulator.into_inner(),
            snapshots: self.snapshots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::{Attribution, Ownership};

    fn event(year: i32, lon: f64, lat: f64, ownership: Attribution) -> CanonicalEvent {
        CanonicalEvent {
            year,
            site_key: SiteKey::from_coords(lon, lat),
            lon,
            lat,
            ownership,
            vehicle: "Soyuz".to_string(),
            site_name: "Test Site".to_string(),
            country: "Nowhere".to_string(),
        }
    }

    fn gov() -> Attribution {
        Attribution::single(Ownership::Government)
    }

    fn com() -> Attribution {
        Attribution::single(Ownership::Commercial)
    }

    #[test]
    fn test_cumulative_counts_per_year() {
        let events = vec![
            event(2015, 63.305, 45.964, gov()),
            event(2016, 63.305, 45.964, com()),
            event(2016, 63.305, 45.964, com()),
        ];
        let timeline = TemporalAggregator::aggregate(&events);
        let key = SiteKey::from_coords(63.305, 45.964);

        assert_eq!(timeline.years(), vec![2015, 2016]);
        assert_eq!(timeline.snapshot(2015).unwrap()[&key].cumulative_count, 1);

        let site = &timeline.snapshot(2016).unwrap()[&key];
        assert_eq!(site.cumulative_count, 3);
        assert_eq!(site.category_count(Ownership::Commercial), 2);
        assert_eq!(site.category_count(Ownership::Government), 1);
    }

    #[test]
    fn test_snapshots_are_monotonic_and_diff_matches_events() {
        let events = vec![
            event(2000, 1.0, 1.0, gov()),
            event(2003, 1.0, 1.0, gov()),
            event(2001, 2.0, 2.0, com()),
            event(2003, 1.0, 1.0, com()),
            event(2005, 1.0, 1.0, gov()),
            event(2005, 2.0, 2.0, gov()),
        ];
        let timeline = TemporalAggregator::aggregate(&events);
        let years = timeline.years();

        for (i, y1) in years.iter().enumerate() {
            for y2 in &years[i + 1..] {
                for (key, site) in timeline.snapshot(*y1).unwrap() {
                    let later = timeline.snapshot(*y2).unwrap()[key].cumulative_count;
                    assert!(later >= site.cumulative_count);

                    let between = events
                        .iter()
                        .filter(|e| &e.site_key == key && e.year > *y1 && e.year <= *y2)
                        .count() as u32;
                    assert_eq!(later - site.cumulative_count, between);
                }
            }
        }
    }

    #[test]
    fn test_site_appearing_later_is_zero_before() {
        let events = vec![event(1990, 1.0, 1.0, gov()), event(1995, 5.0, 5.0, gov())];
        let timeline = TemporalAggregator::aggregate(&events);
        let late = SiteKey::from_coords(5.0, 5.0);

        assert!(timeline.snapshot(1990).unwrap().get(&late).is_none());
        assert_eq!(timeline.count_at(1990, &late), 0);
        assert_eq!(timeline.count_at(1993, &late), 0);
        assert_eq!(timeline.count_at(1995, &late), 1);
        assert_eq!(timeline.count_at(1980, &SiteKey::from_coords(1.0, 1.0)), 0);
    }

    #[test]
    fn test_dual_attribution_counts_both_categories_once_each() {
        let dual = Attribution::dual(Ownership::Government, Ownership::Commercial);
        let timeline = TemporalAggregator::aggregate(&[event(2020, 0.5, 0.5, dual)]);
        let site = &timeline.snapshot(2020).unwrap()[&SiteKey::from_coords(0.5, 0.5)];

        assert_eq!(site.cumulative_count, 1);
        assert_eq!(site.category_count(Ownership::Government), 1);
        assert_eq!(site.category_count(Ownership::Commercial), 1);
        assert_eq!(site.category_count(Ownership::Military), 0);
    }

    #[test]
    fn test_all_time_matches_last_snapshot() {
        let events = vec![
            event(2010, 1.0, 1.0, gov()),
            event(2012, 1.0, 1.0, com()),
            event(2011, 3.0, 3.0, com()),
        ];
        let timeline = TemporalAggregator::aggregate(&events);
        let standalone = TemporalAggregator::all_time(&events);

        assert_eq!(timeline.all_time(), &standalone);
        assert_eq!(timeline.snapshot(2012).unwrap(), &standalone);
    }

    #[test]
    fn test_snapshot_at_index() {
        let events = vec![event(2001, 1.0, 1.0, gov()), event(1999, 1.0, 1.0, gov())];
        let timeline = TemporalAggregator::aggregate(&events);

        let (year, snapshot) = timeline.snapshot_at(0).unwrap();
        assert_eq!(year, 1999);
        assert_eq!(snapshot.len(), 1);
        assert!(timeline.snapshot_at(2).is_none());
    }

    #[test]
    fn test_empty_input() {
        let timeline = TemporalAggregator::aggregate(&[]);
        assert!(timeline.is_empty());
        assert!(timeline.all_time().is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of order")]
    fn test_push_year_rejects_earlier_year() {
        let later = event(2016, 63.305, 45.964, gov());
        let earlier = event(2015, 63.305, 45.964, gov());
        let mut aggregator = TemporalAggregator::new();
        aggregator.push_year(2016, &[&later]);
        aggregator.push_year(2015, &[&earlier]);
    }
}
