//! News headlines via an RSS-to-JSON proxy
//!
//! The proxy (rss2json) fetches the configured RSS feed and returns its items
//! as JSON, so no XML parsing happens here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{get_json, FetchError};
use crate::config::NewsConfig;
use crate::feature::{CachePolicy, Feature, FeatureKind};
use crate::scheduler::Schedule;
use crate::view::{self, Panel, NEWS_FALLBACK};

/// rss2json conversion endpoint
const RSS2JSON_URL: &str = "https://api.rss2json.com/v1/api.json";

/// Headlines from one feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headlines {
    /// Feed title, e.g. "BBC News"
    pub source: String,
    pub items: Vec<Headline>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub link: String,
}

/// News ticker feature
#[derive(Debug, Clone)]
pub struct NewsSource {
    client: Client,
    proxy_url: String,
    feed_url: String,
    max_headlines: usize,
    ttl: Duration,
    interval: Duration,
}

impl NewsSource {
    pub fn from_config(client: Client, config: &NewsConfig) -> Self {
        Self {
            client,
            proxy_url: RSS2JSON_URL.to_string(),
            feed_url: config.feed_url.clone(),
            max_headlines: config.max_headlines,
            ttl: Duration::from_secs(config.ttl_secs),
            interval: Duration::from_secs(config.interval_secs),
        }
    }

    /// Points the source at a different proxy
    pub fn with_proxy_url(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = proxy_url.into();
        self
    }
}

#[async_trait]
impl Feature for NewsSource {
    type Raw = FeedResponse;
    type Model = Headlines;

    fn kind(&self) -> FeatureKind {
        FeatureKind::News
    }

    fn schedule(&self) -> Schedule {
        Schedule::Every(self.interval)
    }

    fn cache_policy(&self) -> Option<CachePolicy> {
        Some(CachePolicy::new(FeatureKind::News.key(), self.ttl).with_scope(self.feed_url.clone()))
    }

    async fn fetch(&self) -> Result<Self::Raw, FetchError> {
        get_json(
            self.client
                .get(&self.proxy_url)
                .query(&[("rss_url", self.feed_url.as_str())]),
        )
        .await
    }

    fn transform(&self, raw: Self::Raw) -> Result<Self::Model, FetchError> {
        if raw.status != "ok" {
            let reason = raw.message.unwrap_or_else(|| format!("status {}", raw.status));
            return Err(FetchError::Malformed(format!("feed proxy: {}", reason)));
        }

        let items = raw
            .items
            .into_iter()
            .filter_map(|item| {
                let title = item.title.trim().to_string();
                (!title.is_empty()).then_some(Headline {
                    title,
                    link: item.link,
                })
            })
            .take(self.max_headlines)
            .collect();

        let source = raw
            .feed
            .map(|feed| feed.title.trim().to_string())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| "Headlines".to_string());

        Ok(Headlines { source, items })
    }

    fn render(&self, model: &Self::Model) -> Panel {
        view::render_news(model)
    }

    fn fallback(&self) -> Panel {
        Panel::unavailable(FeatureKind::News, NEWS_FALLBACK)
    }
}

/// rss2json response
#[derive(Debug, Deserialize)]
pub struct FeedResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    feed: Option<FeedMeta>,
    #[serde(default)]
    items: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
struct FeedMeta {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    title: String,
    #[serde(default)]
    link: String,
}
