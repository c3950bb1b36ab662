//! Launch-site resolution.
//!
//! Explicit coordinates win; otherwise the label is matched against an ordered
//! [`SiteDictionary`] where the first matching rule wins. Sites that cannot be
//! geolocated resolve to `None` and their records are dropped.

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static PARENTHETICAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());

/// Coordinate-derived join key: `"{lon},{lat}"` rounded to 4 decimal degrees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteKey(String);

fn round4(value: f64) -> f64 {
    // adding 0.0 turns -0 into 0
    (value * 10_000.0).round() / 10_000.0 + 0.0
}

impl SiteKey {
    pub fn from_coords(lon: f64, lat: f64) -> Self {
        SiteKey(format!("{},{}", round4(lon), round4(lat)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A geolocated site label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSite {
    pub lon: f64,
    pub lat: f64,
    pub canonical_name: String,
    pub country: Option<String>,
}

impl ResolvedSite {
    pub fn key(&self) -> SiteKey {
        SiteKey::from_coords(self.lon, self.lat)
    }
}

/// One dictionary entry: a case-insensitive pattern and the site it stands for.
#[derive(Debug, Clone)]
pub struct SiteRule {
    pub pattern: Regex,
    pub lon: f64,
    pub lat: f64,
    pub name: String,
    pub country: Option<String>,
}

impl SiteRule {
    pub fn new(pattern: &str, lon: f64, lat: f64, name: &str, country: Option<&str>) -> Result<Self> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("invalid site pattern '{pattern}'"))?;
        Ok(Self {
            pattern,
            lon,
            lat,
            name: name.to_string(),
            country: country.map(str::to_string),
        })
    }

    pub fn matches(&self, label: &str) -> bool {
        self.pattern.is_match(label)
    }
}

/// Serialized form of a [`SiteRule`], as found in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRuleConfig {
    pub pattern: String,
    pub lon: f64,
    pub lat: f64,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
}

// (pattern, lon, lat, canonical name, country). Specific patterns come before
// broader ones that would otherwise shadow them.
const DEFAULT_SITES: &[(&str, f64, f64, &str, &str)] = &[
    (r"kodiak|pacific spaceport|alaska aerospace", -152.3393, 57.4356, "Pacific Spaceport Complex (Kodiak)", "USA"),
    (r"cape canaveral|kennedy|\bksc\b|ccafs|ccsfs", -80.6041, 28.6082, "Cape Canaveral", "USA"),
    (r"vandenberg|\bvafb\b|\bvsfb\b", -120.6106, 34.7420, "Vandenberg", "USA"),
    (r"wallops|mid-atlantic regional", -75.4662, 37.8337, "Wallops Flight Facility", "USA"),
    (r"kwajalein|reagan test site|omelek", 167.7431, 9.0477, "Kwajalein Atoll", "Marshall Islands"),
    (r"boca chica|starbase", -97.1557, 25.9972, "Starbase", "USA"),
    (r"baikonur|tyuratam", 63.305, 45.964, "Baikonur Cosmodrome", "Kazakhstan"),
    (r"plesetsk", 40.5772, 62.9256, "Plesetsk Cosmodrome", "Russia"),
    (r"vostochny", 128.3339, 51.8844, "Vostochny Cosmodrome", "Russia"),
    (r"dombarovsky|yasny", 59.7911, 51.0937, "Dombarovsky", "Russia"),
    (r"kapustin", 45.7417, 48.5697, "Kapustin Yar", "Russia"),
    (r"barents|submarine", 35.0, 70.0, "Barents Sea Launch Area", "Russia"),
    (r"jiuquan", 100.2915, 40.9581, "Jiuquan Satellite Launch Center", "China"),
    (r"taiyuan", 111.6083, 38.8491, "Taiyuan Satellite Launch Center", "China"),
    (r"xichang", 102.0267, 28.2463, "Xichang Satellite Launch Center", "China"),
    (r"wenchang", 110.9510, 19.6145, "Wenchang Spacecraft Launch Site", "China"),
    (r"yellow sea", 121.0, 34.9, "Yellow Sea Launch Platform", "China"),
    (r"satish dhawan|sriharikota|shar\b", 80.2304, 13.7199, "Satish Dhawan Space Centre", "India"),
    (r"tanegashima", 130.9570, 30.4009, "Tanegashima Space Center", "Japan"),
    (r"uchinoura|kagoshima", 131.0791, 31.2510, "Uchinoura Space Center", "Japan"),
    (r"guiana|kourou|\bcsg\b", -52.7683, 5.2360, "Guiana Space Centre", "France"),
    (r"naro|goheung", 127.5353, 34.4318, "Naro Space Center", "South Korea"),
    (r"sohae|tongchang", 124.7050, 39.6600, "Sohae Satellite Launching Station", "North Korea"),
    (r"semnan|imam khomeini", 53.9530, 35.2346, "Semnan Space Center", "Iran"),
    (r"shahroud", 55.3353, 36.2010, "Shahroud Space Center", "Iran"),
    (r"palmachim", 34.6802, 31.8848, "Palmachim Airbase", "Israel"),
    (r"mahia|rocket lab launch complex", 177.8649, -39.2615, "Rocket Lab Launch Complex 1", "New Zealand"),
    (r"alcantara", -44.3962, -2.3731, "Alcantara Launch Center", "Brazil"),
    (r"woomera", 136.5031, -30.9553, "Woomera Range Complex", "Australia"),
    (r"sea launch|odyssey", -154.0, 0.0, "Sea Launch Odyssey", "International"),
];

/// Ordered rules; resolution is first-match-wins.
#[derive(Debug, Clone)]
pub struct SiteDictionary {
    rules: Vec<SiteRule>,
}

impl Default for SiteDictionary {
    fn default() -> Self {
        let rules = DEFAULT_SITES
            .iter()
            .map(|(pattern, lon, lat, name, country)| {
                // built-in patterns are static and known to compile
                SiteRule::new(pattern, *lon, *lat, name, Some(*country)).unwrap()
            })
            .collect();
        Self { rules }
    }
}

impl SiteDictionary {
    pub fn new(rules: Vec<SiteRule>) -> Self {
        Self { rules }
    }

    /// Compiles configured rules, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first pattern that is not a valid regex.
    pub fn from_config(rules: &[SiteRuleConfig]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|r| SiteRule::new(&r.pattern, r.lon, r.lat, &r.name, r.country.as_deref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn lookup(&self, label: &str) -> Option<&SiteRule> {
        self.rules.iter().find(|rule| rule.matches(label))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Resolves free-text launch-site labels to coordinates.
#[derive(Debug, Clone, Default)]
pub struct SiteResolver {
    dictionary: SiteDictionary,
}

impl SiteResolver {
    pub fn new(dictionary: SiteDictionary) -> Self {
        Self { dictionary }
    }

    /// Explicit finite coordinates are used as given, named after the raw label.
    /// Otherwise the first dictionary rule matching the label decides.
    pub fn resolve(&self, label: Option<&str>, lat: Option<f64>, lon: Option<f64>) -> Option<ResolvedSite> {
        if let (Some(lat), Some(lon)) = (lat, lon) {
            if lat.is_finite() && lon.is_finite() {
                let canonical_name = match label {
                    Some(l) if !l.trim().is_empty() => l.trim().to_string(),
                    _ => SiteKey::from_coords(lon, lat).to_string(),
                };
                return Some(ResolvedSite {
                    lon,
                    lat,
                    canonical_name,
                    country: None,
                });
            }
        }

        let rule = self.dictionary.lookup(label?)?;
        Some(ResolvedSite {
            lon: rule.lon,
            lat: rule.lat,
            canonical_name: rule.name.clone(),
            country: rule.country.clone(),
        })
    }
}

/// Short map label for a site: initials of the first two words once
/// parentheticals and punctuation are stripped, or the first two characters
/// of a single-word name.
pub fn site_acronym(name: &str) -> String {
    let stripped = PARENTHETICAL_RE.replace_all(name, "");
    let cleaned: String = stripped
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let words: Vec<&str> = cleaned.split_whitespace().collect();

    let acronym: String = match words.as_slice() {
        [] => String::new(),
        [single] => single.chars().take(2).collect(),
        [first, second, ..] => first.chars().take(1).chain(second.chars().take(1)).collect(),
    };
    acronym.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_key_rounding_and_format() {
        assert_eq!(SiteKey::from_coords(63.305, 45.964).as_str(), "63.305,45.964");
        assert_eq!(SiteKey::from_coords(-80.60412345, 28.60829).as_str(), "-80.6041,28.6083");
        assert_eq!(SiteKey::from_coords(-0.00001, 0.0).as_str(), "0,0");
    }

    #[test]
    fn test_explicit_coordinates_win() {
        let resolver = SiteResolver::default();
        let site = resolver
            .resolve(Some("Baikonur Cosmodrome"), Some(10.0), Some(20.0))
            .unwrap();

        assert_eq!(site.lat, 10.0);
        assert_eq!(site.lon, 20.0);
        assert_eq!(site.canonical_name, "Baikonur Cosmodrome");
    }

    #[test]
    fn test_non_finite_coordinates_fall_back_to_dictionary() {
        let resolver = SiteResolver::default();
        let site = resolver
            .resolve(Some("Baikonur Cosmodrome"), Some(f64::NAN), Some(20.0))
            .unwrap();

        assert_eq!(site.key().as_str(), "63.305,45.964");
        assert_eq!(site.country.as_deref(), Some("Kazakhstan"));
    }

    #[test]
    fn test_different_labels_share_a_key() {
        let resolver = SiteResolver::default();
        let cape = resolver.resolve(Some("Cape Canaveral"), None, None).unwrap();
        let ksc = resolver.resolve(Some("Kennedy Space Center"), None, None).unwrap();

        assert_eq!(cape.key(), ksc.key());
        assert_eq!(cape.canonical_name, ksc.canonical_name);
    }

    #[test]
    fn test_unresolvable_site_is_none() {
        let resolver = SiteResolver::default();
        assert!(resolver.resolve(Some("Somewhere over the rainbow"), None, None).is_none());
        assert!(resolver.resolve(None, None, None).is_none());
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let dictionary = SiteDictionary::from_config(&[
            SiteRuleConfig {
                pattern: "kodiak".into(),
                lon: -152.3,
                lat: 57.4,
                name: "Kodiak".into(),
                country: None,
            },
            SiteRuleConfig {
                pattern: "alaska".into(),
                lon: -150.0,
                lat: 61.0,
                name: "Alaska".into(),
                country: None,
            },
        ])
        .unwrap();
        let resolver = SiteResolver::new(dictionary);

        let site = resolver.resolve(Some("Kodiak Launch Complex, Alaska"), None, None).unwrap();
        assert_eq!(site.canonical_name, "Kodiak");
        let site = resolver.resolve(Some("Poker Flat, ALASKA"), None, None).unwrap();
        assert_eq!(site.canonical_name, "Alaska");
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let err = SiteDictionary::from_config(&[SiteRuleConfig {
            pattern: "(unclosed".into(),
            lon: 0.0,
            lat: 0.0,
            name: "Broken".into(),
            country: None,
        }]);
        assert!(err.is_err());
    }

    #[test]
    fn test_default_dictionary_compiles() {
        assert_eq!(SiteDictionary::default().len(), DEFAULT_SITES.len());
    }

    #[test]
    fn test_site_acronym() {
        assert_eq!(site_acronym("Baikonur Cosmodrome"), "BC");
        assert_eq!(site_acronym("Pacific Spaceport Complex (Kodiak)"), "PS");
        assert_eq!(site_acronym("(Kodiak) Vandenberg"), "VA");
        assert_eq!(site_acronym("Plesetsk"), "PL");
        assert_eq!(site_acronym("St. Helena's Pad"), "SH");
        assert_eq!(site_acronym(""), "");
    }
}
