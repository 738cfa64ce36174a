//! View models produced by each feature's render function
//!
//! Rendering a model is a pure function from the feature's data to a
//! [`Panel`]; the terminal UI only ever draws panels. This keeps every
//! feature's presentation testable without a terminal.

use crate::data::alerts::ActiveAlerts;
use crate::data::clock::ClockReading;
use crate::data::network::NetworkInfo;
use crate::data::news::Headlines;
use crate::data::speed::SpeedEstimate;
use crate::data::weather::WeatherReport;
use crate::feature::FeatureKind;

pub const WEATHER_FALLBACK: &str = "Weather unavailable";
pub const NEWS_FALLBACK: &str = "News unavailable";
pub const NETWORK_FALLBACK: &str = "Network info unavailable";
pub const SPEED_FALLBACK: &str = "Speed test failed";

/// Glyph shown in front of an active alert headline
pub const ALERT_GLYPH: &str = "\u{1F6A8}"; // 🚨

/// The full content of one screen region
#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    Clock(ClockView),
    Weather(WeatherView),
    Alert(AlertBanner),
    News(NewsView),
    Network(NetworkView),
    Speed(SpeedView),
    /// Fallback text for a feature whose last cycle failed
    Unavailable { kind: FeatureKind, message: String },
}

impl Panel {
    /// The feature (and therefore region) this panel belongs to
    pub fn kind(&self) -> FeatureKind {
        match self {
            Panel::Clock(_) => FeatureKind::Clock,
            Panel::Weather(_) => FeatureKind::Weather,
            Panel::Alert(_) => FeatureKind::Alerts,
            Panel::News(_) => FeatureKind::News,
            Panel::Network(_) => FeatureKind::Network,
            Panel::Speed(_) => FeatureKind::SpeedTest,
            Panel::Unavailable { kind, .. } => *kind,
        }
    }

    pub fn unavailable(kind: FeatureKind, message: &str) -> Self {
        Panel::Unavailable {
            kind,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockView {
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherView {
    /// City name reported by the provider
    pub location: String,
    /// e.g. "⛅ scattered clouds | 81°F"
    pub summary: String,
    pub forecast: Vec<ForecastCell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastCell {
    /// "Today" or a short weekday name
    pub label: String,
    pub glyph: &'static str,
    pub temperature: String,
    pub description: String,
}

/// The weather-alert banner; hidden banners carry no text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlertBanner {
    pub visible: bool,
    pub text: String,
}

impl AlertBanner {
    pub fn hidden() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsView {
    pub source: String,
    pub headlines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkView {
    pub rows: Vec<(&'static str, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeedView {
    /// e.g. "94 Mbps"
    pub headline: String,
    /// e.g. "10.0 MB in 0.85 s"
    pub detail: String,
}

pub fn render_clock(reading: &ClockReading) -> Panel {
    Panel::Clock(ClockView {
        date: reading.date.clone(),
        time: reading.time.clone(),
    })
}

pub fn render_weather(report: &WeatherReport) -> Panel {
    let summary = format!(
        "{} {} | {}\u{b0}F",
        weather_glyph(&report.icon),
        report.description,
        report.temperature_f
    );

    let forecast = report
        .forecast
        .iter()
        .map(|day| ForecastCell {
            label: day.label.clone(),
            glyph: weather_glyph(&day.icon),
            temperature: format!("{}\u{b0}F", day.temperature_f),
            description: day.description.clone(),
        })
        .collect();

    Panel::Weather(WeatherView {
        location: report.location.clone(),
        summary,
        forecast,
    })
}

/// Visible iff at least one alert is active for the zone
pub fn render_alerts(alerts: &ActiveAlerts) -> Panel {
    let Some(first) = alerts.headlines.first() else {
        return Panel::Alert(AlertBanner::hidden());
    };

    let mut text = format!("{} {}", ALERT_GLYPH, first);
    let more = alerts.headlines.len() - 1;
    if more > 0 {
        text.push_str(&format!(" (+{} more)", more));
    }

    Panel::Alert(AlertBanner {
        visible: true,
        text,
    })
}

pub fn render_news(headlines: &Headlines) -> Panel {
    Panel::News(NewsView {
        source: headlines.source.clone(),
        headlines: headlines.items.iter().map(|h| h.title.clone()).collect(),
    })
}

pub fn render_network(info: &NetworkInfo) -> Panel {
    let mut rows = vec![("IP", info.ip.clone())];
    if let Some(location) = &info.location {
        rows.push(("Location", location.clone()));
    }
    if let Some(provider) = &info.provider {
        rows.push(("Provider", provider.clone()));
    }
    if let Some(timezone) = &info.timezone {
        rows.push(("Timezone", timezone.clone()));
    }
    Panel::Network(NetworkView { rows })
}

pub fn render_speed(estimate: &SpeedEstimate) -> Panel {
    Panel::Speed(SpeedView {
        headline: format!("{} Mbps", estimate.mbps),
        detail: format!(
            "{} in {:.2} s",
            format_bytes(estimate.bytes),
            estimate.elapsed_ms as f64 / 1000.0
        ),
    })
}

/// Maps an OpenWeatherMap icon code ("01d", "10n", ...) to a glyph
pub fn weather_glyph(icon: &str) -> &'static str {
    match icon.get(..2) {
        Some("01") => "\u{2600}",  // ☀
        Some("02") => "\u{26C5}",  // ⛅
        Some("03") | Some("04") => "\u{2601}", // ☁
        Some("09") => "\u{1F327}", // 🌧
        Some("10") => "\u{1F326}", // 🌦
        Some("11") => "\u{26C8}",  // ⛈
        Some("13") => "\u{2744}",  // ❄
        Some("50") => "\u{1F32B}", // 🌫
        _ => "\u{2022}",           // •
    }
}

/// Formats a byte count with a decimal unit
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1_000.0;
    const MB: f64 = KB * 1_000.0;
    let bytes = bytes as f64;
    if bytes >= MB {
        format!("{:.1} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.1} kB", bytes / KB)
    } else {
        format!("{} B", bytes)
    }
}
