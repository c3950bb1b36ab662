//! Flat 2-D orbit ellipses for display.
//!
//! Perigee and apogee are mapped through a pixel scale and turned into an
//! ellipse sharing the viewport center, rotated by the orbit's inclination.
//! This is a display approximation, not orbital mechanics.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::{debug, warn};

use crate::analyzers::utility::finite_max;
use crate::normalize::NormalizedRecord;

/// Size given to an ellipse with no extent, in pixels. Thin ellipses keep
/// their minor axis at least this wide (never wider than the major axis).
pub const MIN_VISIBLE_PX: f64 = 0.5;

// semi-major axes at or below this are treated as zero
const DEGENERATE_PX: f64 = 1e-9;

/// Mean Earth radius, km. Only used to pace the animation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Phase advance per tick, radians, for an object skimming the surface.
pub const BASE_ANGULAR_SPEED: f64 = 0.05;

/// Geostationary altitude, km.
const GEO_ALTITUDE_KM: f64 = 35_786.0;
const GEO_TOLERANCE_KM: f64 = 1_000.0;
const LEO_CEILING_KM: f64 = 2_000.0;
const ELLIPTICAL_MIN_ECCENTRICITY: f64 = 0.1;

// golden angle, spreads initial phases without clustering
const PHASE_SPREAD: f64 = 2.399_963_229_728_653;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OrbitClass {
    Leo,
    Meo,
    Geo,
    Elliptical,
}

impl OrbitClass {
    /// Case-insensitive match on the usual catalogue spellings.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "leo" | "low earth orbit" => Some(OrbitClass::Leo),
            "meo" | "medium earth orbit" => Some(OrbitClass::Meo),
            "geo" | "geosynchronous" | "geostationary" => Some(OrbitClass::Geo),
            "elliptical" | "heo" | "highly elliptical" => Some(OrbitClass::Elliptical),
            _ => None,
        }
    }

    /// Classification from the apsides when the catalogue leaves it blank.
    pub fn infer(perigee_km: f64, apogee_km: f64) -> Self {
        let a = (perigee_km + apogee_km) / 2.0 + EARTH_RADIUS_KM;
        let eccentricity = ((apogee_km - perigee_km) / 2.0).abs() / a;
        if eccentricity >= ELLIPTICAL_MIN_ECCENTRICITY {
            OrbitClass::Elliptical
        } else if apogee_km.max(perigee_km) <= LEO_CEILING_KM {
            OrbitClass::Leo
        } else if (perigee_km - GEO_ALTITUDE_KM).abs() <= GEO_TOLERANCE_KM
            && (apogee_km - GEO_ALTITUDE_KM).abs() <= GEO_TOLERANCE_KM
        {
            OrbitClass::Geo
        } else {
            OrbitClass::Meo
        }
    }
}

/// Orbital elements of one satellite as read from the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrbitRecord {
    pub perigee_km: f64,
    pub apogee_km: f64,
    pub inclination_deg: f64,
    pub orbit_class: OrbitClass,
}

impl OrbitRecord {
    /// `None` when perigee or apogee is missing or negative; such objects cannot be drawn.
    ///
    /// Apogee below perigee is kept as given.
    pub fn from_normalized(record: &NormalizedRecord) -> Option<Self> {
        let (pe, ap) = (record.perigee_km, record.apogee_km);
        if !pe.is_finite() || !ap.is_finite() || pe < 0.0 || ap < 0.0 {
            return None;
        }
        let orbit_class = record
            .orbit_class_raw
            .as_deref()
            .and_then(OrbitClass::parse)
            .unwrap_or_else(|| OrbitClass::infer(pe, ap));

        let orbit = OrbitRecord {
            perigee_km: pe,
            apogee_km: ap,
            inclination_deg: record.inclination_deg,
            orbit_class,
        };
        if orbit.has_inverted_apsides() {
            warn!(perigee_km = pe, apogee_km = ap, "Apogee below perigee, rendering as given");
        }
        Some(orbit)
    }

    pub fn has_inverted_apsides(&self) -> bool {
        self.apogee_km < self.perigee_km
    }
}

/// Monotonic map from kilometres to pixels with `px(0) == 0`.
pub trait DistanceScale {
    fn px(&self, km: f64) -> f64;
}

impl<F: Fn(f64) -> f64> DistanceScale for F {
    fn px(&self, km: f64) -> f64 {
        self(km)
    }
}

/// Drawing area the ellipses are centred in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 600.0,
            margin: 20.0,
        }
    }
}

impl Viewport {
    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Largest radius that fits inside the margins.
    pub fn max_radius(&self) -> f64 {
        (self.width.min(self.height) / 2.0 - self.margin).max(0.0)
    }
}

/// Linear km → px scale over `[0, domain_max_km]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain_max_km: f64,
    pub range_max_px: f64,
}

impl LinearScale {
    /// Scale whose domain ends at the largest finite value of `apogees_km`.
    pub fn for_viewport(viewport: &Viewport, apogees_km: &[f64]) -> Self {
        Self {
            domain_max_km: finite_max(apogees_km).unwrap_or(0.0),
            range_max_px: viewport.max_radius(),
        }
    }
}

impl DistanceScale for LinearScale {
    fn px(&self, km: f64) -> f64 {
        if self.domain_max_km <= 0.0 {
            return 0.0;
        }
        km / self.domain_max_km * self.range_max_px
    }
}

/// Square-root scale; keeps LEO orbits distinguishable next to GEO.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SqrtScale {
    pub domain_max_km: f64,
    pub range_max_px: f64,
}

impl SqrtScale {
    pub fn for_viewport(viewport: &Viewport, apogees_km: &[f64]) -> Self {
        Self {
            domain_max_km: finite_max(apogees_km).unwrap_or(0.0),
            range_max_px: viewport.max_radius(),
        }
    }
}

impl DistanceScale for SqrtScale {
    fn px(&self, km: f64) -> f64 {
        if self.domain_max_km <= 0.0 {
            return 0.0;
        }
        (km.max(0.0) / self.domain_max_km).sqrt() * self.range_max_px
    }
}

/// A renderable ellipse in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EllipseGeometry {
    pub semi_major_px: f64,
    pub semi_minor_px: f64,
    pub rotation_deg: f64,
    pub center_x: f64,
    pub center_y: f64,
}

impl EllipseGeometry {
    /// Builds the ellipse from scaled apsides.
    ///
    /// `a = (ap + pe) / 2`, `c = (ap - pe) / 2`, `b = sqrt(max(0, a² - c²))`.
    /// A zero or non-finite `a` yields a [`MIN_VISIBLE_PX`] circle. Any
    /// positive `a` is kept as-is so the major axis stays monotonic in apogee.
    pub fn from_apsides(apogee_px: f64, perigee_px: f64, rotation_deg: f64, center: (f64, f64)) -> Self {
        let a = (apogee_px + perigee_px) / 2.0;
        let c = (apogee_px - perigee_px) / 2.0;
        let b = (a * a - c * c).max(0.0).sqrt();

        let (semi_major_px, semi_minor_px) = if !a.is_finite() || a <= DEGENERATE_PX {
            (MIN_VISIBLE_PX, MIN_VISIBLE_PX)
        } else {
            (a, b.max(a.min(MIN_VISIBLE_PX)))
        };

        Self {
            semi_major_px,
            semi_minor_px,
            rotation_deg,
            center_x: center.0,
            center_y: center.1,
        }
    }

    /// Position at `phase` radians, rotated about the centre by `rotation_deg`.
    pub fn point_at(&self, phase: f64) -> (f64, f64) {
        let x = self.semi_major_px * phase.cos();
        let y = self.semi_minor_px * phase.sin();
        let (sin_r, cos_r) = self.rotation_deg.to_radians().sin_cos();
        (
            self.center_x + x * cos_r - y * sin_r,
            self.center_y + x * sin_r + y * cos_r,
        )
    }
}

/// Per-object animation state, advanced once per orbital tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrbitAnimationState {
    pub phase_angle: f64,
    pub angular_speed: f64,
}

impl OrbitAnimationState {
    /// Speed falls off with mean orbital radius (Kepler-like `r^-1.5`) so
    /// farther orbits animate slower. It is computed from kilometres, so a
    /// resize never changes it. `index` staggers the starting phase.
    pub fn for_orbit(orbit: &OrbitRecord, index: usize) -> Self {
        let mean_radius_km = (orbit.perigee_km + orbit.apogee_km) / 2.0 + EARTH_RADIUS_KM;
        let angular_speed = BASE_ANGULAR_SPEED * (EARTH_RADIUS_KM / mean_radius_km).powf(1.5);
        Self {
            phase_angle: (index as f64 * PHASE_SPREAD).rem_euclid(TAU),
            angular_speed,
        }
    }

    pub fn advance(&mut self) {
        self.phase_angle = (self.phase_angle + self.angular_speed).rem_euclid(TAU);
    }
}

/// Derives [`EllipseGeometry`] for a set of orbits under the current viewport.
#[derive(Debug, Clone)]
pub struct OrbitGeometryEngine<S: DistanceScale> {
    viewport: Viewport,
    scale: S,
}

impl<S: DistanceScale> OrbitGeometryEngine<S> {
    pub fn new(viewport: Viewport, scale: S) -> Self {
        Self { viewport, scale }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn ellipse(&self, orbit: &OrbitRecord) -> EllipseGeometry {
        let rotation_deg = if orbit.inclination_deg.is_finite() {
            orbit.inclination_deg
        } else {
            0.0
        };
        EllipseGeometry::from_apsides(
            self.scale.px(orbit.apogee_km),
            self.scale.px(orbit.perigee_km),
            rotation_deg,
            self.viewport.center(),
        )
    }

    /// Full re-derivation for every orbit.
    pub fn layout(&self, orbits: &[OrbitRecord]) -> Vec<EllipseGeometry> {
        orbits.iter().map(|o| self.ellipse(o)).collect()
    }
}

impl OrbitGeometryEngine<LinearScale> {
    /// Linear engine whose domain spans the largest apogee in `orbits`.
    pub fn linear(viewport: Viewport, orbits: &[OrbitRecord]) -> Self {
        let apogees: Vec<f64> = orbits.iter().map(|o| o.apogee_km).collect();
        Self::new(viewport, LinearScale::for_viewport(&viewport, &apogees))
    }

    /// Rebuilds the scale for a new viewport and re-derives every ellipse.
    pub fn resize(&mut self, viewport: Viewport, orbits: &[OrbitRecord]) -> Vec<EllipseGeometry> {
        debug!(width = viewport.width, height = viewport.height, orbits = orbits.len(), "Viewport resized");
        *self = Self::linear(viewport, orbits);
        self.layout(orbits)
    }
}
