//! National Weather Service alert source
//!
//! Polls api.weather.gov for alerts active in one forecast zone. Any active
//! alert shows the banner; none, or a failed request, hides it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{get_json, FetchError};
use crate::config::AlertsConfig;
use crate::feature::{Feature, FeatureKind};
use crate::scheduler::Schedule;
use crate::view::{self, AlertBanner, Panel};

/// Base URL for active alerts by zone
const NWS_ALERTS_URL: &str = "https://api.weather.gov/alerts/active/zone";

/// Headline used when an alert carries neither headline nor event name
const UNTITLED_ALERT: &str = "Weather alert in effect";

/// Alerts currently active for a zone, most relevant first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveAlerts {
    pub zone: String,
    pub headlines: Vec<String>,
}

impl ActiveAlerts {
    pub fn is_active(&self) -> bool {
        !self.headlines.is_empty()
    }
}

/// Weather-alert banner feature
#[derive(Debug, Clone)]
pub struct AlertsSource {
    client: Client,
    base_url: String,
    zone: String,
    interval: Duration,
}

impl AlertsSource {
    pub fn from_config(client: Client, config: &AlertsConfig) -> Self {
        Self {
            client,
            base_url: NWS_ALERTS_URL.to_string(),
            zone: config.zone.trim().to_uppercase(),
            interval: Duration::from_secs(config.interval_secs),
        }
    }

    /// Points the source at a different API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Feature for AlertsSource {
    type Raw = AlertsResponse;
    type Model = ActiveAlerts;

    fn kind(&self) -> FeatureKind {
        FeatureKind::Alerts
    }

    fn schedule(&self) -> Schedule {
        Schedule::Every(self.interval)
    }

    async fn fetch(&self) -> Result<Self::Raw, FetchError> {
        let url = format!("{}/{}", self.base_url, self.zone);
        get_json(
            self.client
                .get(url)
                .header(reqwest::header::ACCEPT, "application/geo+json"),
        )
        .await
    }

    fn transform(&self, raw: Self::Raw) -> Result<Self::Model, FetchError> {
        let headlines = raw
            .features
            .into_iter()
            .map(|feature| {
                let AlertProperties { headline, event } = feature.properties;
                headline
                    .or(event)
                    .map(|text| text.trim().to_string())
                    .filter(|text| !text.is_empty())
                    .unwrap_or_else(|| UNTITLED_ALERT.to_string())
            })
            .collect();

        Ok(ActiveAlerts {
            zone: self.zone.clone(),
            headlines,
        })
    }

    fn render(&self, model: &Self::Model) -> Panel {
        view::render_alerts(model)
    }

    /// A failed check hides the banner
    fn fallback(&self) -> Panel {
        Panel::Alert(AlertBanner::hidden())
    }
}

/// GeoJSON feature collection returned by `/alerts/active/zone/{zone}`
#[derive(Debug, Deserialize)]
pub struct AlertsResponse {
    features: Vec<AlertFeature>,
}

#[derive(Debug, Deserialize)]
struct AlertFeature {
    properties: AlertProperties,
}

#[derive(Debug, Deserialize)]
struct AlertProperties {
    #[serde(default)]
    headline: Option<String>,
    #[serde(default)]
    event: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_server::TestServer;

    fn source() -> AlertsSource {
        AlertsSource::from_config(Client::new(), &AlertsConfig::default())
    }

    const ONE_ALERT: &str = r#"{
        "@context": ["https://geojson.org/geojson-ld/geojson-context.jsonld"],
        "type": "FeatureCollection",
        "features": [
            {
                "id": "https://api.weather.gov/alerts/urn:oid:2.49.0.1.840.0.abc",
                "type": "Feature",
                "geometry": null,
                "properties": {
                    "event": "Tornado Warning",
                    "severity": "Extreme",
                    "headline": "Tornado Warning issued July 15 at 1:45PM EDT until July 15 at 2:30PM EDT by NWS Greenville-Spartanburg SC"
                }
            }
        ],
        "title": "current watches, warnings, and advisories for Anderson (SCZ010) SC"
    }"#;

    const NO_ALERTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [],
        "title": "current watches, warnings, and advisories for Anderson (SCZ010) SC"
    }"#;

    #[test]
    fn test_one_feature_shows_banner() {
        let raw: AlertsResponse = serde_json::from_str(ONE_ALERT).unwrap();
        let alerts = source().transform(raw).unwrap();

        assert!(alerts.is_active());
        assert_eq!(alerts.zone, "SCZ010");

        match source().render(&alerts) {
            Panel::Alert(banner) => {
                assert!(banner.visible);
                assert!(banner.text.contains("Tornado Warning issued July 15"));
            }
            other => panic!("Expected alert panel, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_features_hide_banner() {
        let raw: AlertsResponse = serde_json::from_str(NO_ALERTS).unwrap();
        let alerts = source().transform(raw).unwrap();

        assert!(!alerts.is_active());
        assert_eq!(source().render(&alerts), Panel::Alert(AlertBanner::hidden()));
    }

    #[test]
    fn test_headline_falls_back_to_event_name() {
        let json = r#"{ "features": [ { "properties": { "event": "Heat Advisory", "headline": null } } ] }"#;
        let raw: AlertsResponse = serde_json::from_str(json).unwrap();

        let alerts = source().transform(raw).unwrap();

        assert_eq!(alerts.headlines, vec!["Heat Advisory"]);
    }

    #[test]
    fn test_untitled_alert_still_counts() {
        let json = r#"{ "features": [ { "properties": {} } ] }"#;
        let raw: AlertsResponse = serde_json::from_str(json).unwrap();

        let alerts = source().transform(raw).unwrap();

        assert_eq!(alerts.headlines, vec![UNTITLED_ALERT]);
    }

    #[test]
    fn test_missing_features_is_malformed() {
        let result: Result<AlertsResponse, _> = serde_json::from_str(r#"{ "type": "FeatureCollection" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_fallback_hides_banner() {
        assert_eq!(source().fallback(), Panel::Alert(AlertBanner::hidden()));
    }

    #[test]
    fn test_zone_is_normalised() {
        let config = AlertsConfig {
            zone: " scz010 ".to_string(),
            ..AlertsConfig::default()
        };
        let source = AlertsSource::from_config(Client::new(), &config);
        assert_eq!(source.zone, "SCZ010");
    }

    #[test]
    fn test_alerts_are_not_cached() {
        assert!(source().cache_policy().is_none());
    }

    #[tokio::test]
    async fn test_fetch_requests_zone_path() {
        let server = TestServer::start(&[("/alerts/active/zone/SCZ010", 200, ONE_ALERT)]).await;
        let source = source().with_base_url(server.url("/alerts/active/zone"));

        let alerts = source.transform(source.fetch().await.unwrap()).unwrap();

        assert!(alerts.is_active());
        assert_eq!(server.requests(), vec!["/alerts/active/zone/SCZ010"]);
    }

    #[tokio::test]
    async fn test_fetch_unknown_zone_is_status_error() {
        let server = TestServer::start(&[]).await;
        let source = source().with_base_url(server.url("/alerts/active/zone"));

        let err = source.fetch().await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status, .. } if status.as_u16() == 404));
    }
}
