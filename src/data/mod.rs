//! Data sources for each dashboard feature
//!
//! Every submodule owns one feature: the raw response schema it consumes, the
//! transformation into its display model, and the [`crate::feature::Feature`]
//! implementation the refresh controller drives. Shared HTTP plumbing and the
//! error taxonomy live here.

pub mod alerts;
pub mod clock;
pub mod network;
pub mod news;
pub mod speed;
pub mod weather;

#[cfg(test)]
pub(crate) mod test_server;

pub use alerts::{ActiveAlerts, AlertsSource};
pub use clock::{ClockReading, ClockSource};
pub use network::{NetworkInfo, NetworkSource};
pub use news::{Headline, Headlines, NewsSource};
pub use speed::{SpeedEstimate, SpeedTest};
pub use weather::{ForecastDay, WeatherReport, WeatherSource};

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// User agent sent with every request; api.weather.gov rejects anonymous clients
pub const DEFAULT_USER_AGENT: &str = concat!("homedash/", env!("CARGO_PKG_VERSION"));

/// Why a refresh cycle's fetch or transform failed
///
/// The controller collapses all of these into one failed outcome; the
/// variants only matter for diagnostics.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, timeout or body read failure; never carries the URL
    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    /// Body was not the JSON we expected
    #[error("Failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// Body parsed but is missing something the feature needs
    #[error("Unexpected response: {0}")]
    Malformed(String),
}

/// Drops the request URL, whose query may hold an API key, before the error
/// can reach a log line
impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        FetchError::Transport(error.without_url())
    }
}

/// Builds the HTTP client shared by the API-backed features
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
}

/// Sends `request` and decodes a JSON body, rejecting non-success statuses
pub(crate) async fn get_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, FetchError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: redacted_url(response.url()),
            status,
        });
    }

    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

/// URL without its query string, which may carry an API key
pub(crate) fn redacted_url(url: &reqwest::Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}
