//! The contract every dashboard panel implements
//!
//! A [`Feature`] supplies the pieces the refresh controller is parameterised
//! by: how to fetch, how to turn the raw response into a model, how to render
//! that model (or a fallback), whether and for how long to cache it, and how
//! often to run.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::data::FetchError;
use crate::scheduler::Schedule;
use crate::view::Panel;

/// Identifies one independently scheduled panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureKind {
    Clock,
    Weather,
    Alerts,
    News,
    Network,
    SpeedTest,
}

impl FeatureKind {
    /// All features in screen order
    pub const ALL: [FeatureKind; 6] = [
        FeatureKind::Clock,
        FeatureKind::Weather,
        FeatureKind::Alerts,
        FeatureKind::News,
        FeatureKind::Network,
        FeatureKind::SpeedTest,
    ];

    /// Human-readable panel title
    pub fn title(&self) -> &'static str {
        match self {
            FeatureKind::Clock => "Clock",
            FeatureKind::Weather => "Weather",
            FeatureKind::Alerts => "Alerts",
            FeatureKind::News => "News",
            FeatureKind::Network => "Network",
            FeatureKind::SpeedTest => "Speed Test",
        }
    }

    /// Stable key used for cache file names and log fields
    pub fn key(&self) -> &'static str {
        match self {
            FeatureKind::Clock => "clock",
            FeatureKind::Weather => "weather",
            FeatureKind::Alerts => "alerts",
            FeatureKind::News => "news",
            FeatureKind::Network => "network",
            FeatureKind::SpeedTest => "speed_test",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Where and for how long a feature's model is cached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// Cache file key
    pub key: String,
    /// Maximum age at which the cached model is rendered without fetching
    pub ttl: Duration,
    /// Identity of the query the model answers; an entry with another scope is ignored
    pub scope: Option<String>,
}

impl CachePolicy {
    pub fn new(key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            ttl,
            scope: None,
        }
    }

    /// Ties cached entries to one location, feed or similar query
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

/// One dashboard panel's data source and presentation
#[async_trait]
pub trait Feature: Send + Sync {
    /// Response as received from the source
    type Raw: Send;
    /// Display model; this is what gets cached
    type Model: Serialize + DeserializeOwned + Clone + Send + Sync;

    fn kind(&self) -> FeatureKind;

    fn schedule(&self) -> Schedule;

    /// `None` for features that always fetch (clock, speed test, alerts)
    fn cache_policy(&self) -> Option<CachePolicy> {
        None
    }

    /// Issues the outbound request(s)
    async fn fetch(&self) -> Result<Self::Raw, FetchError>;

    /// Maps the raw response into the display model
    fn transform(&self, raw: Self::Raw) -> Result<Self::Model, FetchError>;

    /// Pure view of a model
    fn render(&self, model: &Self::Model) -> Panel;

    /// What the panel shows after a failed cycle
    fn fallback(&self) -> Panel;
}
