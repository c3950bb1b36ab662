//! Runtime configuration.
//!
//! Stored as a JSON object on disk; every section is optional:
//! ```json
//! {
//!   "aliases": { "launch_date": ["Date of Launch", "Launch_Date"] },
//!   "sites": [{ "pattern": "baikonur", "lon": 63.305, "lat": 45.964, "name": "Baikonur" }],
//!   "playback": { "tick_ms": 800, "end_policy": "stop" },
//!   "orbit": { "tick_ms": 30, "viewport": { "width": 960, "height": 600, "margin": 20 } }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::normalize::FieldAliases;
use crate::orbit::Viewport;
use crate::scheduler::EndPolicy;
use crate::sites::SiteRuleConfig;

/// Year playback cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub tick_ms: u64,
    pub end_policy: EndPolicy,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_ms: 800,
            end_policy: EndPolicy::Stop,
        }
    }
}

/// Orbit animation cadence and drawing area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub tick_ms: u64,
    pub viewport: Viewport,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            tick_ms: 30,
            viewport: Viewport::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub aliases: FieldAliases,
    /// Replaces the built-in site dictionary when present.
    pub sites: Option<Vec<SiteRuleConfig>>,
    pub playback: PlaybackConfig,
    pub orbit: OrbitConfig,
}

impl AtlasConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading config '{path}'"))?;
        serde_json::from_str(&content).with_context(|| format!("decoding config '{path}'"))
    }

    /// Loads `path` when given, else `ATLAS_CONFIG` when set, else defaults.
    pub fn resolve(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match std::env::var("ATLAS_CONFIG") {
                Ok(path) => Self::load(&path),
                Err(_) => Ok(Self::default()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: AtlasConfig =
            serde_json::from_str(r#"{ "playback": { "end_policy": "loop" } }"#).unwrap();

        assert_eq!(config.playback.end_policy, EndPolicy::Loop);
        assert_eq!(config.playback.tick_ms, 800);
        assert_eq!(config.aliases, FieldAliases::default());
        assert!(config.sites.is_none());
    }

    #[test]
    fn test_custom_aliases_and_sites() {
        let config: AtlasConfig = serde_json::from_str(
            r#"{
                "aliases": { "launch_date": ["When"] },
                "sites": [{ "pattern": "home", "lon": 1.0, "lat": 2.0, "name": "Home Pad" }]
            }"#,
        )
        .unwrap();

        assert_eq!(config.aliases.launch_date, vec!["When".to_string()]);
        assert_eq!(config.aliases.owner, FieldAliases::default().owner);
        assert_eq!(config.sites.unwrap()[0].name, "Home Pad");
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        assert!(AtlasConfig::load("/definitely/not/here.json").is_err());
    }
}
