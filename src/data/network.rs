//! Public network info from ipinfo.io

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{get_json, FetchError};
use crate::config::NetworkConfig;
use crate::feature::{CachePolicy, Feature, FeatureKind};
use crate::scheduler::Schedule;
use crate::view::{self, Panel, NETWORK_FALLBACK};

const IPINFO_URL: &str = "https://ipinfo.io/json";

/// What the outside world sees of this connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub ip: String,
    /// "City, Region, Country" with empty parts dropped
    pub location: Option<String>,
    /// Autonomous system / ISP name
    pub provider: Option<String>,
    pub timezone: Option<String>,
}

/// Network info feature
#[derive(Debug, Clone)]
pub struct NetworkSource {
    client: Client,
    url: String,
    ttl: Duration,
    interval: Duration,
}

impl NetworkSource {
    pub fn from_config(client: Client, config: &NetworkConfig) -> Self {
        Self {
            client,
            url: IPINFO_URL.to_string(),
            ttl: Duration::from_secs(config.ttl_secs),
            interval: Duration::from_secs(config.interval_secs),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl Feature for NetworkSource {
    type Raw = IpInfoResponse;
    type Model = NetworkInfo;

    fn kind(&self) -> FeatureKind {
        FeatureKind::Network
    }

    fn schedule(&self) -> Schedule {
        Schedule::Every(self.interval)
    }

    fn cache_policy(&self) -> Option<CachePolicy> {
        Some(CachePolicy::new(FeatureKind::Network.key(), self.ttl))
    }

    async fn fetch(&self) -> Result<Self::Raw, FetchError> {
        get_json(self.client.get(&self.url)).await
    }

    fn transform(&self, raw: Self::Raw) -> Result<Self::Model, FetchError> {
        let ip = raw.ip.trim().to_string();
        if ip.is_empty() {
            return Err(FetchError::Malformed("ipinfo response has no ip".to_string()));
        }

        let parts: Vec<String> = [raw.city, raw.region, raw.country]
            .into_iter()
            .flatten()
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect();

        Ok(NetworkInfo {
            ip,
            location: (!parts.is_empty()).then(|| parts.join(", ")),
            provider: non_empty(raw.org),
            timezone: non_empty(raw.timezone),
        })
    }

    fn render(&self, model: &Self::Model) -> Panel {
        view::render_network(model)
    }

    fn fallback(&self) -> Panel {
        Panel::unavailable(FeatureKind::Network, NETWORK_FALLBACK)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// ipinfo.io `/json` response
#[derive(Debug, Deserialize)]
pub struct IpInfoResponse {
    ip: String,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    org: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
}
