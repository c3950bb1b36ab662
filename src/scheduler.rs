//! Tick-driven orchestration for year playback and orbit animation.
//!
//! A single [`AnimationScheduler`] owns every [`Subscriber`] and calls them
//! synchronously, one tick at a time; the only suspension point is waiting on
//! the injected [`Clock`]. Nothing runs in parallel, so no locking is needed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, trace};

use crate::analyzers::aggregate::Timeline;
use crate::analyzers::types::YearSnapshot;
use crate::orbit::{EllipseGeometry, OrbitAnimationState};

/// Source of ticks.
#[async_trait]
pub trait Clock: Send {
    /// Waits until the next tick is due.
    async fn tick(&mut self);
}

/// Wall-clock cadence backed by a tokio interval.
pub struct IntervalClock {
    interval: Interval,
}

impl IntervalClock {
    /// Must be called from within a tokio runtime.
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Clock for IntervalClock {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

/// Clock that never waits. Counts how often it was asked for a tick.
#[derive(Debug, Default)]
pub struct ManualClock {
    pub ticks: u64,
}

#[async_trait]
impl Clock for ManualClock {
    async fn tick(&mut self) {
        self.ticks += 1;
    }
}

/// What playback does after showing the last year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndPolicy {
    Stop,
    Loop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// Discrete year-index state machine.
///
/// Controls may be used in either state; the index is always clamped to
/// `[0, len - 1]`. Any control that changes what should be on screen marks
/// the playback dirty so the next tick renders it.
#[derive(Debug, Clone)]
pub struct Playback {
    index: usize,
    len: usize,
    state: PlaybackState,
    policy: EndPolicy,
    dirty: bool,
}

impl Playback {
    pub fn new(len: usize, policy: EndPolicy) -> Self {
        Self {
            index: 0,
            len,
            state: PlaybackState::Stopped,
            policy,
            dirty: len > 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// True when the next tick has something to render.
    pub fn is_pending(&self) -> bool {
        self.is_playing() || self.dirty
    }

    fn last(&self) -> usize {
        self.len.saturating_sub(1)
    }

    /// Starts playing. Under [`EndPolicy::Stop`], when the last year is
    /// already on screen this rewinds first; a last year that is still
    /// waiting to be rendered is shown and playback stops there.
    pub fn play(&mut self) {
        if self.len == 0 || self.is_playing() {
            return;
        }
        if self.policy == EndPolicy::Stop && self.index == self.last() && !self.dirty {
            self.index = 0;
            self.dirty = true;
        }
        self.state = PlaybackState::Playing;
    }

    pub fn pause(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    pub fn step_forward(&mut self) -> usize {
        self.seek(self.index + 1)
    }

    pub fn step_backward(&mut self) -> usize {
        self.seek(self.index.saturating_sub(1))
    }

    pub fn seek(&mut self, index: usize) -> usize {
        if self.len > 0 {
            self.index = index.min(self.last());
            self.dirty = true;
        }
        self.index
    }

    /// Index to render on this tick, if any.
    ///
    /// A dirty frame is shown as-is; otherwise a playing timeline advances by
    /// one. Under [`EndPolicy::Stop`] rendering the last index stops playback,
    /// so no year is emitted twice. Under [`EndPolicy::Loop`] the index after
    /// the last is 0.
    pub fn tick(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        if self.dirty {
            self.dirty = false;
            self.stop_at_end();
            return Some(self.index);
        }
        if !self.is_playing() {
            return None;
        }

        let last = self.last();
        match self.policy {
            EndPolicy::Stop => {
                if self.index >= last {
                    self.state = PlaybackState::Stopped;
                    return None;
                }
                self.index += 1;
                self.stop_at_end();
            }
            EndPolicy::Loop => {
                self.index = if self.index >= last { 0 } else { self.index + 1 };
            }
        }
        Some(self.index)
    }

    fn stop_at_end(&mut self) {
        if self.is_playing() && self.policy == EndPolicy::Stop && self.index == self.last() {
            self.state = PlaybackState::Stopped;
        }
    }
}

/// Shared handle to a [`Playback`], given to the UI layer for its controls.
#[derive(Debug, Clone)]
pub struct PlaybackControls(Rc<RefCell<Playback>>);

impl PlaybackControls {
    pub fn new(playback: Playback) -> Self {
        Self(Rc::new(RefCell::new(playback)))
    }

    pub fn play(&self) {
        self.0.borrow_mut().play();
    }

    pub fn pause(&self) {
        self.0.borrow_mut().pause();
    }

    pub fn step_forward(&self) -> usize {
        self.0.borrow_mut().step_forward()
    }

    pub fn step_backward(&self) -> usize {
        self.0.borrow_mut().step_backward()
    }

    pub fn seek(&self, index: usize) -> usize {
        self.0.borrow_mut().seek(index)
    }

    pub fn index(&self) -> usize {
        self.0.borrow().index()
    }

    pub fn state(&self) -> PlaybackState {
        self.0.borrow().state()
    }

    fn tick(&self) -> Option<usize> {
        self.0.borrow_mut().tick()
    }

    fn is_pending(&self) -> bool {
        self.0.borrow().is_pending()
    }
}

/// Something the scheduler calls once per tick.
pub trait Subscriber {
    fn on_tick(&mut self, tick: u64);

    /// Inactive subscribers are still ticked; once none is active the run ends.
    fn is_active(&self) -> bool;
}

/// Hands the active year's snapshot to `on_frame` whenever the year changes.
pub struct PlaybackSubscriber<F>
where
    F: FnMut(i32, &YearSnapshot),
{
    timeline: Timeline,
    controls: PlaybackControls,
    on_frame: F,
}

impl<F> PlaybackSubscriber<F>
where
    F: FnMut(i32, &YearSnapshot),
{
    pub fn new(timeline: Timeline, policy: EndPolicy, on_frame: F) -> Self {
        let controls = PlaybackControls::new(Playback::new(timeline.len(), policy));
        Self {
            timeline,
            controls,
            on_frame,
        }
    }

    pub fn controls(&self) -> PlaybackControls {
        self.controls.clone()
    }
}

impl<F> Subscriber for PlaybackSubscriber<F>
where
    F: FnMut(i32, &YearSnapshot),
{
    fn on_tick(&mut self, tick: u64) {
        let Some(index) = self.controls.tick() else {
            return;
        };
        if let Some((year, snapshot)) = self.timeline.snapshot_at(index) {
            debug!(tick, index, year, sites = snapshot.len(), "Playback frame");
            (self.on_frame)(year, snapshot);
        }
    }

    fn is_active(&self) -> bool {
        self.controls.is_pending()
    }
}

/// Advances every object's phase each tick and hands the new positions to `on_frame`.
pub struct OrbitSubscriber<F>
where
    F: FnMut(&[(f64, f64)]),
{
    ellipses: Vec<EllipseGeometry>,
    states: Vec<OrbitAnimationState>,
    positions: Vec<(f64, f64)>,
    on_frame: F,
}

impl<F> OrbitSubscriber<F>
where
    F: FnMut(&[(f64, f64)]),
{
    /// `ellipses` and `states` are paired by index.
    pub fn new(ellipses: Vec<EllipseGeometry>, states: Vec<OrbitAnimationState>, on_frame: F) -> Self {
        debug_assert_eq!(ellipses.len(), states.len());
        Self {
            positions: Vec::with_capacity(ellipses.len()),
            ellipses,
            states,
            on_frame,
        }
    }

    /// Swaps in freshly derived geometry (after a resize). Phases carry over.
    pub fn set_geometry(&mut self, ellipses: Vec<EllipseGeometry>) {
        debug_assert_eq!(ellipses.len(), self.states.len());
        self.ellipses = ellipses;
    }

    pub fn states(&self) -> &[OrbitAnimationState] {
        &self.states
    }
}

impl<F> Subscriber for OrbitSubscriber<F>
where
    F: FnMut(&[(f64, f64)]),
{
    fn on_tick(&mut self, tick: u64) {
        self.positions.clear();
        for (ellipse, state) in self.ellipses.iter().zip(self.states.iter_mut()) {
            state.advance();
            self.positions.push(ellipse.point_at(state.phase_angle));
        }
        trace!(tick, objects = self.positions.len(), "Orbit frame");
        (self.on_frame)(&self.positions);
    }

    fn is_active(&self) -> bool {
        !self.states.is_empty()
    }
}

/// Drives all subscribers from one clock.
pub struct AnimationScheduler<'a, C: Clock> {
    clock: C,
    subscribers: Vec<Box<dyn Subscriber + 'a>>,
    ticks: u64,
}

impl<'a, C: Clock> AnimationScheduler<'a, C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            subscribers: Vec::new(),
            ticks: 0,
        }
    }

    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'a) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn is_active(&self) -> bool {
        self.subscribers.iter().any(|s| s.is_active())
    }

    /// Runs one tick to completion across every subscriber.
    pub fn tick(&mut self) {
        self.ticks += 1;
        for subscriber in &mut self.subscribers {
            subscriber.on_tick(self.ticks);
        }
    }

    /// Ticks on the clock's cadence until no subscriber is active or `limit`
    /// ticks have run. Returns the number of ticks run by this call.
    pub async fn run(&mut self, limit: Option<u64>) -> u64 {
        let mut ran = 0;
        while self.is_active() && limit.is_none_or(|limit| ran < limit) {
            self.clock.tick().await;
            self.tick();
            ran += 1;
        }
        debug!(ran, total = self.ticks, "Scheduler idle");
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::TemporalAggregator;
    use crate::analyzers::types::{Attribution, CanonicalEvent, Ownership};
    use crate::sites::SiteKey;

    fn timeline(years: &[i32]) -> Timeline {
        let events: Vec<CanonicalEvent> = years
            .iter()
            .map(|&year| CanonicalEvent {
                year,
                site_key: SiteKey::from_coords(1.0, 1.0),
                lon: 1.0,
                lat: 1.0,
                ownership: Attribution::single(Ownership::Government),
                vehicle: String::new(),
                site_name: "Pad".into(),
                country: "Here".into(),
            })
            .collect();
        TemporalAggregator::aggregate(&events)
    }

    #[test]
    fn test_play_runs_to_end_and_stops() {
        let mut p = Playback::new(3, EndPolicy::Stop);
        p.play();
        p.play();

        assert_eq!(p.tick(), Some(0));
        assert_eq!(p.tick(), Some(1));
        assert!(p.is_playing());
        assert_eq!(p.tick(), Some(2));
        assert_eq!(p.state(), PlaybackState::Stopped);
        assert_eq!(p.tick(), None);
    }

    #[test]
    fn test_loop_policy_wraps() {
        let mut p = Playback::new(2, EndPolicy::Loop);
        p.play();
        let frames: Vec<_> = (0..5).filter_map(|_| p.tick()).collect();

        assert_eq!(frames, vec![0, 1, 0, 1, 0]);
        assert!(p.is_playing());
    }

    #[test]
    fn test_controls_clamp() {
        let mut p = Playback::new(4, EndPolicy::Stop);
        assert_eq!(p.step_backward(), 0);
        assert_eq!(p.seek(99), 3);
        assert_eq!(p.step_forward(), 3);
        assert_eq!(p.step_backward(), 2);
        assert_eq!(p.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_pause_stops_advancing() {
        let mut p = Playback::new(5, EndPolicy::Stop);
        p.play();
        p.tick();
        p.tick();
        p.pause();

        assert_eq!(p.tick(), None);
        assert_eq!(p.index(), 1);
    }

    #[test]
    fn test_seek_while_stopped_renders_once() {
        let mut p = Playback::new(5, EndPolicy::Stop);
        assert_eq!(p.tick(), Some(0));
        p.seek(3);
        assert_eq!(p.tick(), Some(3));
        assert_eq!(p.tick(), None);
    }

    #[test]
    fn test_play_after_seeking_to_last_shows_only_last() {
        let mut p = Playback::new(3, EndPolicy::Stop);
        p.seek(2);
        p.play();
        let frames: Vec<_> = (0..4).filter_map(|_| p.tick()).collect();

        assert_eq!(frames, vec![2]);
        assert_eq!(p.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_single_year_plays_once() {
        let mut p = Playback::new(1, EndPolicy::Stop);
        p.play();
        let frames: Vec<_> = (0..3).filter_map(|_| p.tick()).collect();

        assert_eq!(frames, vec![0]);
        assert!(!p.is_pending());
    }

    #[test]
    fn test_seek_to_last_while_playing_does_not_repeat() {
        let mut p = Playback::new(3, EndPolicy::Stop);
        p.play();
        assert_eq!(p.tick(), Some(0));
        p.seek(2);
        let frames: Vec<_> = (0..3).filter_map(|_| p.tick()).collect();

        assert_eq!(frames, vec![2]);
        assert_eq!(p.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_play_after_finishing_rewinds() {
        let mut p = Playback::new(3, EndPolicy::Stop);
        p.play();
        while p.tick().is_some() {}
        assert_eq!(p.index(), 2);

        p.play();
        assert_eq!(p.tick(), Some(0));
        assert_eq!(p.tick(), Some(1));
    }

    #[test]
    fn test_play_at_end_rewinds() {
        let mut p = Playback::new(3, EndPolicy::Stop);
        p.seek(2);
        p.tick();
        p.play();

        assert_eq!(p.tick(), Some(0));
    }

    #[test]
    fn test_empty_playback_is_inert() {
        let mut p = Playback::new(0, EndPolicy::Loop);
        p.play();
        assert_eq!(p.seek(3), 0);
        assert_eq!(p.tick(), None);
        assert!(!p.is_pending());
    }

    #[tokio::test]
    async fn test_scheduler_plays_timeline_to_end() {
        let mut frames = Vec::new();
        let ran = {
            let subscriber = PlaybackSubscriber::new(
                timeline(&[2001, 2002, 2002, 2004]),
                EndPolicy::Stop,
                |year, snapshot: &YearSnapshot| {
                    let total: u32 = snapshot.values().map(|s| s.cumulative_count).sum();
                    frames.push((year, total));
                },
            );
            subscriber.controls().play();

            let mut scheduler = AnimationScheduler::new(ManualClock::default());
            scheduler.subscribe(subscriber);
            let ran = scheduler.run(None).await;
            assert_eq!(scheduler.clock().ticks, ran);
            ran
        };

        assert_eq!(ran, 3);
        assert_eq!(frames, vec![(2001, 1), (2002, 3), (2004, 4)]);
    }

    #[tokio::test]
    async fn test_scheduler_respects_limit_with_orbits() {
        let ellipse = EllipseGeometry::from_apsides(10.0, 10.0, 0.0, (0.0, 0.0));
        let state = OrbitAnimationState {
            phase_angle: 0.0,
            angular_speed: 0.1,
        };
        let mut seen = 0;
        {
            let subscriber = OrbitSubscriber::new(vec![ellipse; 2], vec![state; 2], |positions: &[(f64, f64)]| {
                assert_eq!(positions.len(), 2);
                seen += 1;
            });
            let mut scheduler = AnimationScheduler::new(ManualClock::default());
            scheduler.subscribe(subscriber);

            assert_eq!(scheduler.run(Some(10)).await, 10);
            assert!(scheduler.is_active());
        }
        assert_eq!(seen, 10);
    }

    #[test]
    fn test_orbit_subscriber_moves_objects() {
        let ellipse = EllipseGeometry::from_apsides(10.0, 10.0, 0.0, (0.0, 0.0));
        let state = OrbitAnimationState {
            phase_angle: 0.0,
            angular_speed: std::f64::consts::FRAC_PI_2,
        };
        let mut last = Vec::new();
        {
            let mut subscriber = OrbitSubscriber::new(vec![ellipse], vec![state], |p: &[(f64, f64)]| {
                last = p.to_vec();
            });
            subscriber.on_tick(1);
            assert!((subscriber.states()[0].phase_angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        }
        assert!(last[0].0.abs() < 1e-9);
        assert!((last[0].1 - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_resize_keeps_phases_and_uses_new_geometry() {
        use crate::orbit::{OrbitClass, OrbitGeometryEngine, OrbitRecord, Viewport};

        let orbits = [
            OrbitRecord {
                perigee_km: 400.0,
                apogee_km: 420.0,
                inclination_deg: 0.0,
                orbit_class: OrbitClass::Leo,
            },
            OrbitRecord {
                perigee_km: 35_780.0,
                apogee_km: 35_790.0,
                inclination_deg: 0.0,
                orbit_class: OrbitClass::Geo,
            },
        ];
        let mut engine = OrbitGeometryEngine::linear(Viewport::default(), &orbits);
        let states = orbits.iter().enumerate().map(|(i, o)| OrbitAnimationState::for_orbit(o, i)).collect();

        let mut last = Vec::new();
        {
            let mut subscriber = OrbitSubscriber::new(engine.layout(&orbits), states, |p: &[(f64, f64)]| {
                last = p.to_vec();
            });
            subscriber.on_tick(1);
            let phases: Vec<f64> = subscriber.states().iter().map(|s| s.phase_angle).collect();

            let small = Viewport {
                width: 200.0,
                height: 200.0,
                margin: 0.0,
            };
            subscriber.set_geometry(engine.resize(small, &orbits));
            let carried: Vec<f64> = subscriber.states().iter().map(|s| s.phase_angle).collect();
            assert_eq!(carried, phases);

            subscriber.on_tick(2);
        }

        // the GEO object now rides a ~100 px ellipse around (100, 100)
        let (x, y) = last[1];
        assert!(((x - 100.0).hypot(y - 100.0) - 100.0).abs() < 0.05);
    }

    #[test]
    fn test_stopped_playback_does_not_keep_scheduler_alive() {
        let subscriber = PlaybackSubscriber::new(timeline(&[1999]), EndPolicy::Stop, |_, _: &YearSnapshot| {});
        let mut scheduler = AnimationScheduler::new(ManualClock::default());
        scheduler.subscribe(subscriber);

        assert!(scheduler.is_active());
        scheduler.tick();
        assert!(!scheduler.is_active());
    }
}
