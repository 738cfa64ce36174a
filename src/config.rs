//! Dashboard configuration
//!
//! All per-feature settings (credentials, location, zone, TTLs, intervals)
//! live in one [`DashboardConfig`], loaded from a JSON file, overridden from
//! the command line and validated once at startup. Every field has a default
//! so an empty or missing file yields a working dashboard (minus weather,
//! which needs an API key).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feature::FeatureKind;

/// OpenWeatherMap city id for Anderson, SC
pub const DEFAULT_CITY_ID: u32 = 4569298;
/// NWS forecast zone for Anderson County, SC
pub const DEFAULT_ALERT_ZONE: &str = "SCZ010";
pub const DEFAULT_FEED_URL: &str = "https://feeds.bbci.co.uk/news/rss.xml";

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub clock: ClockConfig,
    pub weather: WeatherConfig,
    pub alerts: AlertsConfig,
    pub news: NewsConfig,
    pub network: NetworkConfig,
    pub speed_test: SpeedTestConfig,
    /// Timeout applied to every API request
    pub request_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            clock: ClockConfig::default(),
            weather: WeatherConfig::default(),
            alerts: AlertsConfig::default(),
            news: NewsConfig::default(),
            network: NetworkConfig::default(),
            speed_test: SpeedTestConfig::default(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub interval_millis: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            interval_millis: 1000,
        }
    }
}

/// Where to ask for weather
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    CityId { city_id: u32 },
    Coordinates { lat: f64, lon: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key; weather is disabled without one
    pub api_key: Option<String>,
    pub location: Location,
    pub ttl_secs: u64,
    pub interval_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            location: Location::CityId {
                city_id: DEFAULT_CITY_ID,
            },
            ttl_secs: 30 * 60,
            interval_secs: 60 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub enabled: bool,
    /// NWS zone code, e.g. "SCZ010"
    pub zone: String,
    pub interval_secs: u64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            zone: DEFAULT_ALERT_ZONE.to_string(),
            interval_secs: 10 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub enabled: bool,
    pub feed_url: String,
    pub max_headlines: usize,
    pub ttl_secs: u64,
    pub interval_secs: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            feed_url: DEFAULT_FEED_URL.to_string(),
            max_headlines: 8,
            ttl_secs: 15 * 60,
            interval_secs: 15 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub interval_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 60 * 60,
            interval_secs: 60 * 60,
        }
    }
}

/// One payload the speed test can download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedProbe {
    pub url: String,
    /// Advertised payload size
    pub bytes: u64,
}

impl SpeedProbe {
    fn cloudflare(bytes: u64) -> Self {
        Self {
            url: format!("https://speed.cloudflare.com/__down?bytes={}", bytes),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedTestConfig {
    pub enabled: bool,
    /// Tried in order until one succeeds
    pub probes: Vec<SpeedProbe>,
    pub timeout_secs: u64,
}

impl Default for SpeedTestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probes: vec![SpeedProbe::cloudflare(10_000_000), SpeedProbe::cloudflare(1_000_000)],
            timeout_secs: 60,
        }
    }
}

impl DashboardConfig {
    /// Default config file location (`~/.config/homedash/config.json` on Linux)
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "homedash").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Loads configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads from `path` if given, else from the default path if that file
    /// exists, else returns defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Checks every setting once; the dashboard never re-validates
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.request_timeout_secs == 0 {
            return invalid("request_timeout_secs must be greater than zero");
        }
        if self.clock.interval_millis == 0 {
            return invalid("clock.interval_millis must be greater than zero");
        }

        if self.weather.ttl_secs == 0 || self.weather.interval_secs == 0 {
            return invalid("weather.ttl_secs and weather.interval_secs must be greater than zero");
        }
        if let Location::Coordinates { lat, lon } = self.weather.location {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return invalid("weather.location coordinates are out of range");
            }
        }
        if matches!(&self.weather.api_key, Some(key) if key.trim().is_empty()) {
            return invalid("weather.api_key must not be empty");
        }

        if self.alerts.enabled {
            if self.alerts.zone.trim().is_empty() {
                return invalid("alerts.zone must not be empty");
            }
            if self.alerts.interval_secs == 0 {
                return invalid("alerts.interval_secs must be greater than zero");
            }
        }

        if self.news.enabled {
            if self.news.feed_url.trim().is_empty() {
                return invalid("news.feed_url must not be empty");
            }
            if self.news.max_headlines == 0 {
                return invalid("news.max_headlines must be at least 1");
            }
            if self.news.ttl_secs == 0 || self.news.interval_secs == 0 {
                return invalid("news.ttl_secs and news.interval_secs must be greater than zero");
            }
        }

        if self.network.enabled && (self.network.ttl_secs == 0 || self.network.interval_secs == 0) {
            return invalid("network.ttl_secs and network.interval_secs must be greater than zero");
        }

        if self.speed_test.enabled {
            if self.speed_test.probes.is_empty() {
                return invalid("speed_test.probes must list at least one probe");
            }
            if self.speed_test.timeout_secs == 0 {
                return invalid("speed_test.timeout_secs must be greater than zero");
            }
        }

        Ok(())
    }

    /// Features that get a region on screen, in screen order
    pub fn enabled_features(&self) -> Vec<FeatureKind> {
        FeatureKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                FeatureKind::Clock => true,
                FeatureKind::Weather => self.weather.api_key.is_some(),
                FeatureKind::Alerts => self.alerts.enabled,
                FeatureKind::News => self.news.enabled,
                FeatureKind::Network => self.network.enabled,
                FeatureKind::SpeedTest => self.speed_test.enabled,
            })
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Pretty JSON with the API key masked
    pub fn to_redacted_json(&self) -> Result<String, serde_json::Error> {
        let mut shown = self.clone();
        if shown.weather.api_key.is_some() {
            shown.weather.api_key = Some("********".to_string());
        }
        serde_json::to_string_pretty(&shown)
    }
}
