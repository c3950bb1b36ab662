//! Record normalization across inconsistent launch dataset schemas.
//!
//! Every logical field is looked up through an ordered alias list
//! ([`FieldAliases`]); the first non-empty alias wins.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::analyzers::types::{Attribution, Ownership};
use crate::parser::RawRecord;

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").unwrap());

/// Civil space agencies that count as a government owner even without "gov" in the text.
const GOVERNMENT_NAMES: &[&str] = &[
    "nasa", "noaa", "esa", "jaxa", "roscosmos", "isro", "cnsa", "cnes", "dlr", "asi", "kari",
];

/// Company markers and operators that count as a commercial owner.
const COMMERCIAL_NAMES: &[&str] = &[
    "spacex", "inc", "inc.", "corp", "corp.", "ltd", "ltd.", "llc", "plc", "gmbh", "s.a.",
];

/// Ordered alias lists for every logical field a launch or satellite row may carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldAliases {
    pub launch_date: Vec<String>,
    pub owner: Vec<String>,
    pub site: Vec<String>,
    pub latitude: Vec<String>,
    pub longitude: Vec<String>,
    pub vehicle: Vec<String>,
    pub country: Vec<String>,
    pub perigee: Vec<String>,
    pub apogee: Vec<String>,
    pub inclination: Vec<String>,
    pub eccentricity: Vec<String>,
    pub orbit_class: Vec<String>,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            launch_date: owned(&["Date of Launch", "Launch_Date", "Launch Date", "Date", "launch_date"]),
            owner: owned(&["Users", "Owner", "Operator/Owner", "Ownership", "users", "owner"]),
            site: owned(&["Launch Site", "Launch_Site", "Site", "launch_site", "Location"]),
            latitude: owned(&["Latitude", "Lat", "lat", "Site Latitude"]),
            longitude: owned(&["Longitude", "Lon", "Lng", "lon", "lng", "Site Longitude"]),
            vehicle: owned(&["Launch Vehicle", "Launch_Vehicle", "Vehicle", "Rocket"]),
            country: owned(&[
                "Country of Operator/Owner",
                "Country",
                "Launch Country",
                "country",
            ]),
            perigee: owned(&["Perigee (km)", "Perigee", "Perigee_km", "perigee"]),
            apogee: owned(&["Apogee (km)", "Apogee", "Apogee_km", "apogee"]),
            inclination: owned(&[
                "Inclination (degrees)",
                "Inclination",
                "Inclination_deg",
                "inclination",
            ]),
            eccentricity: owned(&["Eccentricity", "eccentricity"]),
            orbit_class: owned(&["Class of Orbit", "Orbit Class", "Orbit_Class", "orbit_class"]),
        }
    }
}

/// Canonical shape of one raw row. Numeric fields are NaN when missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub year: Option<i32>,
    pub ownership_raw: Option<String>,
    pub perigee_km: f64,
    pub apogee_km: f64,
    pub inclination_deg: f64,
    pub eccentricity: f64,
    pub orbit_class_raw: Option<String>,
}

/// Maps raw rows onto [`NormalizedRecord`] using a fixed alias table.
#[derive(Debug, Clone, Default)]
pub struct RecordNormalizer {
    aliases: FieldAliases,
}

impl RecordNormalizer {
    pub fn new(aliases: FieldAliases) -> Self {
        Self { aliases }
    }

    pub fn aliases(&self) -> &FieldAliases {
        &self.aliases
    }

    pub fn normalize(&self, record: &RawRecord) -> NormalizedRecord {
        let a = &self.aliases;
        NormalizedRecord {
            year: extract_year(record, &a.launch_date),
            ownership_raw: record.text(&a.owner),
            perigee_km: record.number(&a.perigee),
            apogee_km: record.number(&a.apogee),
            inclination_deg: record.number(&a.inclination),
            eccentricity: record.number(&a.eccentricity),
            orbit_class_raw: record.text(&a.orbit_class),
        }
    }
}

/// Year of the first non-empty date alias: the first run of four digits in it.
pub fn extract_year<S: AsRef<str>>(record: &RawRecord, date_keys: &[S]) -> Option<i32> {
    let text = record.text(date_keys)?;
    YEAR_RE.find(&text)?.as_str().parse().ok()
}

fn tokens(raw: &str) -> Vec<String> {
    raw.split([';', ',', '/'])
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn has_word(token: &str, names: &[&str]) -> bool {
    token.split_whitespace().any(|word| names.contains(&word))
}

fn is_government(token: &str) -> bool {
    token.contains("gov") || has_word(token, GOVERNMENT_NAMES)
}

fn is_commercial(token: &str) -> bool {
    token.contains("com") || has_word(token, COMMERCIAL_NAMES)
}

/// Mixed government/commercial ownership: at least two tokens, one of each kind.
fn is_dual(tokens: &[String]) -> bool {
    tokens.len() > 1
        && tokens.iter().any(|t| is_government(t))
        && tokens.iter().any(|t| is_commercial(t))
}

/// Site-map ownership policy.
///
/// Mixed government/commercial owners count as both; otherwise the first
/// matching category in the order Military, Government, Commercial, Civilian.
/// Unrecognized owners fall back to Civilian; a missing owner is Unknown.
pub fn classify_ownership(raw: Option<&str>) -> Attribution {
    let tokens = match raw {
        Some(raw) => tokens(raw),
        None => Vec::new(),
    };
    if tokens.is_empty() {
        return Attribution::single(Ownership::Unknown);
    }
    if is_dual(&tokens) {
        return Attribution::dual(Ownership::Government, Ownership::Commercial);
    }

    let any = |pred: fn(&str) -> bool| tokens.iter().any(|t| pred(t));
    let category = if any(|t| t.contains("military")) {
        Ownership::Military
    } else if any(is_government) {
        Ownership::Government
    } else if any(is_commercial) {
        Ownership::Commercial
    } else {
        // civil, research and university owners land here with everything unrecognized
        Ownership::Civilian
    };
    Attribution::single(category)
}

/// Sector of the two-category government-vs-commercial view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sector {
    Government,
    Commercial,
    Other,
}

/// Government-vs-commercial policy. Mixed owners count in both sectors;
/// anything else unrecognized, missing owners included, is Other.
pub fn classify_sector(raw: Option<&str>) -> Vec<Sector> {
    let tokens = raw.map(tokens).unwrap_or_default();
    if is_dual(&tokens) {
        return vec![Sector::Government, Sector::Commercial];
    }
    if tokens.iter().any(|t| is_government(t)) {
        vec![Sector::Government]
    } else if tokens.iter().any(|t| is_commercial(t)) {
        vec![Sector::Commercial]
    } else {
        vec![Sector::Other]
    }
}
