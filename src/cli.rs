//! Command-line interface parsing for homedash
//!
//! Flags override individual settings from the config file. The merged
//! configuration is validated once here, before anything is spawned.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::config::{ConfigError, DashboardConfig, Location};

/// Error types for CLI startup
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// homedash - a home information dashboard for the terminal
#[derive(Parser, Debug)]
#[command(name = "homedash")]
#[command(about = "Clock, weather, alerts, news and network status in one terminal dashboard")]
#[command(version)]
pub struct Cli {
    /// Path to a JSON config file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// OpenWeatherMap API key; weather is hidden without one
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// OpenWeatherMap city id to report weather for
    #[arg(long, value_name = "ID", conflicts_with_all = ["lat", "lon"])]
    pub city_id: Option<u32>,

    /// Latitude to report weather for (requires --lon)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude to report weather for (requires --lat)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// NWS zone code to watch for weather alerts, e.g. SCZ010
    #[arg(long, value_name = "ZONE")]
    pub zone: Option<String>,

    /// RSS feed URL for the news panel
    #[arg(long, value_name = "URL")]
    pub feed: Option<String>,

    /// Skip the bandwidth test at startup
    #[arg(long)]
    pub no_speed_test: bool,

    /// Log debug output from homedash to the log file
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the effective configuration (API key masked) and exit
    #[arg(long)]
    pub print_config: bool,
}

/// Everything the binary needs to start
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub dashboard: DashboardConfig,
    pub verbose: bool,
    pub print_config: bool,
}

impl Cli {
    /// Writes the flags that were given over `config`
    pub fn apply_overrides(&self, config: &mut DashboardConfig) {
        if let Some(key) = &self.api_key {
            config.weather.api_key = Some(key.clone());
        }
        if let Some(city_id) = self.city_id {
            config.weather.location = Location::CityId { city_id };
        }
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            config.weather.location = Location::Coordinates { lat, lon };
        }
        if let Some(zone) = &self.zone {
            config.alerts.zone = zone.clone();
            config.alerts.enabled = true;
        }
        if let Some(feed) = &self.feed {
            config.news.feed_url = feed.clone();
            config.news.enabled = true;
        }
        if self.no_speed_test {
            config.speed_test.enabled = false;
        }
    }
}

impl StartupConfig {
    /// Loads the config file, applies CLI overrides and validates the result
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut dashboard = DashboardConfig::load_or_default(cli.config.as_deref())?;
        cli.apply_overrides(&mut dashboard);
        dashboard.validate()?;

        Ok(StartupConfig {
            dashboard,
            verbose: cli.verbose,
            print_config: cli.print_config,
        })
    }
}
