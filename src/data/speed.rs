//! Bandwidth speed test
//!
//! Downloads a fixed-size payload and times it from request start to the last
//! body byte. Probes are tried in order, so a large primary payload can fall
//! back to a smaller or alternate one.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{redacted_url, FetchError};
use crate::config::{SpeedProbe, SpeedTestConfig};
use crate::feature::{Feature, FeatureKind};
use crate::scheduler::Schedule;
use crate::view::{self, Panel, SPEED_FALLBACK};

/// One completed download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub probe_url: String,
    pub bytes: u64,
    pub elapsed: Duration,
}

/// Result shown in the speed panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedEstimate {
    /// Whole megabits per second
    pub mbps: u64,
    pub bytes: u64,
    pub elapsed_ms: u64,
}

/// `bytes × 8 / seconds`, or `None` for an empty or instantaneous transfer
pub fn bits_per_second(bytes: u64, elapsed: Duration) -> Option<f64> {
    let seconds = elapsed.as_secs_f64();
    if bytes == 0 || seconds <= 0.0 {
        return None;
    }
    Some(bytes as f64 * 8.0 / seconds)
}

/// Bandwidth rounded to whole Mbps
pub fn mbps(bytes: u64, elapsed: Duration) -> Option<u64> {
    bits_per_second(bytes, elapsed).map(|bps| (bps / 1_000_000.0).round() as u64)
}

/// Speed test feature; runs once per launch unless re-requested
#[derive(Debug, Clone)]
pub struct SpeedTest {
    client: Client,
    probes: Vec<SpeedProbe>,
}

impl SpeedTest {
    pub fn from_config(client: Client, config: &SpeedTestConfig) -> Self {
        Self {
            client,
            probes: config.probes.clone(),
        }
    }

    async fn measure(&self, probe: &SpeedProbe) -> Result<Measurement, FetchError> {
        let started = Instant::now();
        let mut response = self.client.get(&probe.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: redacted_url(response.url()),
                status,
            });
        }

        let mut bytes: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            bytes += chunk.len() as u64;
        }

        Ok(Measurement {
            probe_url: probe.url.clone(),
            bytes,
            elapsed: started.elapsed(),
        })
    }
}

#[async_trait]
impl Feature for SpeedTest {
    type Raw = Measurement;
    type Model = SpeedEstimate;

    fn kind(&self) -> FeatureKind {
        FeatureKind::SpeedTest
    }

    fn schedule(&self) -> Schedule {
        Schedule::Once
    }

    async fn fetch(&self) -> Result<Self::Raw, FetchError> {
        let mut last_error = FetchError::Malformed("no speed probes configured".to_string());

        for probe in &self.probes {
            match self.measure(probe).await {
                Ok(measurement) if measurement.bytes > 0 => {
                    if measurement.bytes != probe.bytes {
                        debug!(
                            url = %probe.url,
                            expected = probe.bytes,
                            received = measurement.bytes,
                            "speed probe size differs from advertised"
                        );
                    }
                    return Ok(measurement);
                }
                Ok(_) => {
                    warn!(url = %probe.url, "speed probe returned an empty body");
                    last_error = FetchError::Malformed(format!("{} returned no data", probe.url));
                }
                Err(e) => {
                    warn!(url = %probe.url, error = %e, "speed probe failed, trying next");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    fn transform(&self, raw: Self::Raw) -> Result<Self::Model, FetchError> {
        let mbps = mbps(raw.bytes, raw.elapsed)
            .ok_or_else(|| FetchError::Malformed("empty speed measurement".to_string()))?;

        Ok(SpeedEstimate {
            mbps,
            bytes: raw.bytes,
            elapsed_ms: raw.elapsed.as_millis() as u64,
        })
    }

    fn render(&self, model: &Self::Model) -> Panel {
        view::render_speed(model)
    }

    fn fallback(&self) -> Panel {
        Panel::unavailable(FeatureKind::SpeedTest, SPEED_FALLBACK)
    }
}
