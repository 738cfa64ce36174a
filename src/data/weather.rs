//! OpenWeatherMap weather source
//!
//! Fetches current conditions and the 5-day / 3-hour forecast concurrently,
//! converts Kelvin to Fahrenheit and condenses the forecast to one sample per
//! day.

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{get_json, FetchError};
use crate::config::{Location, WeatherConfig};
use crate::feature::{CachePolicy, Feature, FeatureKind};
use crate::scheduler::Schedule;
use crate::view::{self, Panel, WEATHER_FALLBACK};

/// Base URL for the OpenWeatherMap API
const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Number of days shown in the forecast strip
pub const FORECAST_DAYS: usize = 5;

/// Local hours a representative daytime sample is taken from
const MIDDAY_HOURS: RangeInclusive<u32> = 11..=14;

/// Samples per day in a 3-hour forecast
const BACKFILL_STRIDE: usize = 8;

/// Current conditions plus a short daily forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// City name reported by the provider
    pub location: String,
    pub description: String,
    /// OpenWeatherMap icon code, e.g. "10d"
    pub icon: String,
    pub temperature_f: i64,
    pub forecast: Vec<ForecastDay>,
}

/// One day of the forecast strip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// "Today" for the first day, short weekday name otherwise
    pub label: String,
    pub date: NaiveDate,
    pub temperature_f: i64,
    pub description: String,
    pub icon: String,
}

/// Converts Kelvin to whole degrees Fahrenheit
pub fn fahrenheit(kelvin: f64) -> i64 {
    ((kelvin - 273.15) * 1.8).round() as i64 + 32
}

/// Weather feature backed by OpenWeatherMap
#[derive(Debug, Clone)]
pub struct WeatherSource {
    client: Client,
    base_url: String,
    api_key: String,
    location: Location,
    ttl: Duration,
    interval: Duration,
}

impl WeatherSource {
    /// Returns `None` when no API key is configured
    pub fn from_config(client: Client, config: &WeatherConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        Some(Self {
            client,
            base_url: OPENWEATHER_BASE_URL.to_string(),
            api_key,
            location: config.location.clone(),
            ttl: Duration::from_secs(config.ttl_secs),
            interval: Duration::from_secs(config.interval_secs),
        })
    }

    /// Points the source at a different API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Identifies the location a cached report belongs to; never includes the key
    fn location_scope(&self) -> String {
        match self.location {
            Location::CityId { city_id } => format!("city:{}", city_id),
            Location::Coordinates { lat, lon } => format!("coords:{},{}", lat, lon),
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = match self.location {
            Location::CityId { city_id } => vec![("id", city_id.to_string())],
            Location::Coordinates { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
        };
        query.push(("appid", self.api_key.clone()));
        query
    }

    async fn fetch_current(&self) -> Result<CurrentResponse, FetchError> {
        let url = format!("{}/weather", self.base_url);
        get_json(self.client.get(url).query(&self.query())).await
    }

    async fn fetch_forecast(&self) -> Result<ForecastResponse, FetchError> {
        let url = format!("{}/forecast", self.base_url);
        get_json(self.client.get(url).query(&self.query())).await
    }
}

#[async_trait]
impl Feature for WeatherSource {
    type Raw = (CurrentResponse, ForecastResponse);
    type Model = WeatherReport;

    fn kind(&self) -> FeatureKind {
        FeatureKind::Weather
    }

    fn schedule(&self) -> Schedule {
        Schedule::Every(self.interval)
    }

    fn cache_policy(&self) -> Option<CachePolicy> {
        Some(CachePolicy::new(FeatureKind::Weather.key(), self.ttl).with_scope(self.location_scope()))
    }

    /// Both requests must succeed
    async fn fetch(&self) -> Result<Self::Raw, FetchError> {
        futures::try_join!(self.fetch_current(), self.fetch_forecast())
    }

    fn transform(&self, (current, forecast): Self::Raw) -> Result<Self::Model, FetchError> {
        build_report(current, forecast)
    }

    fn render(&self, model: &Self::Model) -> Panel {
        view::render_weather(model)
    }

    fn fallback(&self) -> Panel {
        Panel::unavailable(FeatureKind::Weather, WEATHER_FALLBACK)
    }
}

fn build_report(current: CurrentResponse, forecast: ForecastResponse) -> Result<WeatherReport, FetchError> {
    let condition = current
        .weather
        .first()
        .ok_or_else(|| FetchError::Malformed("current weather has no conditions".to_string()))?;

    let offset = forecast
        .city
        .as_ref()
        .and_then(|city| FixedOffset::east_opt(city.timezone))
        .or_else(|| FixedOffset::east_opt(current.timezone))
        .ok_or_else(|| FetchError::Malformed("timezone offset out of range".to_string()))?;

    Ok(WeatherReport {
        location: current.name.clone(),
        description: condition.description.clone(),
        icon: condition.icon.clone(),
        temperature_f: fahrenheit(current.main.temp),
        forecast: select_forecast_days(&forecast.list, offset),
    })
}

/// Picks at most one sample per local calendar day
///
/// The first sample of each day whose local hour is in [`MIDDAY_HOURS`] wins.
/// If that yields fewer than [`FORECAST_DAYS`] days, the remaining samples are
/// walked with a stride of [`BACKFILL_STRIDE`], adding any that land on a day
/// not yet covered. The result is in time order with the first entry labelled
/// "Today".
fn select_forecast_days(samples: &[ForecastSample], offset: FixedOffset) -> Vec<ForecastDay> {
    let local = |sample: &ForecastSample| {
        DateTime::from_timestamp(sample.dt, 0).map(|t| t.with_timezone(&offset))
    };

    let mut chosen: Vec<(usize, DateTime<FixedOffset>)> = Vec::new();
    let mut days: HashSet<NaiveDate> = HashSet::new();

    for (index, sample) in samples.iter().enumerate() {
        if chosen.len() == FORECAST_DAYS {
            break;
        }
        let Some(time) = local(sample) else { continue };
        if MIDDAY_HOURS.contains(&time.hour()) && days.insert(time.date_naive()) {
            chosen.push((index, time));
        }
    }

    if chosen.len() < FORECAST_DAYS {
        let remaining: Vec<usize> = (0..samples.len())
            .filter(|index| !chosen.iter().any(|(picked, _)| picked == index))
            .collect();

        for &index in remaining.iter().step_by(BACKFILL_STRIDE) {
            if chosen.len() == FORECAST_DAYS {
                break;
            }
            let Some(time) = local(&samples[index]) else { continue };
            if days.insert(time.date_naive()) {
                chosen.push((index, time));
            }
        }
    }

    chosen.sort_by_key(|(_, time)| *time);

    chosen
        .into_iter()
        .enumerate()
        .map(|(position, (index, time))| {
            let sample = &samples[index];
            let condition = sample.weather.first();
            ForecastDay {
                label: if position == 0 {
                    "Today".to_string()
                } else {
                    time.format("%a").to_string()
                },
                date: time.date_naive(),
                temperature_f: fahrenheit(sample.main.temp),
                description: condition.map(|c| c.description.clone()).unwrap_or_default(),
                icon: condition.map(|c| c.icon.clone()).unwrap_or_default(),
            }
        })
        .collect()
}

/// `/weather` response
#[derive(Debug, Deserialize)]
pub struct CurrentResponse {
    name: String,
    weather: Vec<Condition>,
    main: MainReadings,
    /// UTC offset in seconds
    #[serde(default)]
    timezone: i32,
}

/// `/forecast` response
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    list: Vec<ForecastSample>,
    #[serde(default)]
    city: Option<ForecastCity>,
}

#[derive(Debug, Deserialize)]
struct ForecastCity {
    /// UTC offset in seconds
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Clone, Deserialize)]
struct ForecastSample {
    /// Unix seconds
    dt: i64,
    main: MainReadings,
    #[serde(default)]
    weather: Vec<Condition>,
}

#[derive(Debug, Clone, Deserialize)]
struct Condition {
    description: String,
    icon: String,
}

#[derive(Debug, Clone, Deserialize)]
struct MainReadings {
    /// Kelvin
    temp: f64,
}
