//! Local date and time for the clock panel
//!
//! The clock needs no network: its "fetch" is a read of the shared wall
//! clock, so it goes through the same refresh cycle as every other panel and
//! can never fail.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FetchError;
use crate::config::ClockConfig;
use crate::feature::{Feature, FeatureKind};
use crate::scheduler::{Schedule, SharedClock};
use crate::view::{self, Panel};

/// Formatted date and time lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockReading {
    /// e.g. "Mon Jul 15 2024"
    pub date: String,
    /// e.g. "2:30:05 PM"
    pub time: String,
}

/// Formats a local timestamp for display
pub fn read_clock(local: NaiveDateTime) -> ClockReading {
    ClockReading {
        date: local.format("%a %b %d %Y").to_string(),
        time: local.format("%-I:%M:%S %p").to_string(),
    }
}

/// Clock feature
#[derive(Debug, Clone)]
pub struct ClockSource {
    clock: SharedClock,
    /// Display offset; `None` uses the system time zone
    offset: Option<FixedOffset>,
    interval: Duration,
}

impl ClockSource {
    pub fn from_config(clock: SharedClock, config: &ClockConfig) -> Self {
        Self {
            clock,
            offset: None,
            interval: Duration::from_millis(config.interval_millis),
        }
    }

    /// Shows time at a fixed UTC offset instead of the system zone
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = Some(offset);
        self
    }
}

#[async_trait]
impl Feature for ClockSource {
    type Raw = DateTime<Utc>;
    type Model = ClockReading;

    fn kind(&self) -> FeatureKind {
        FeatureKind::Clock
    }

    fn schedule(&self) -> Schedule {
        Schedule::Every(self.interval)
    }

    async fn fetch(&self) -> Result<Self::Raw, FetchError> {
        Ok(self.clock.now())
    }

    fn transform(&self, raw: Self::Raw) -> Result<Self::Model, FetchError> {
        let local = match self.offset {
            Some(offset) => raw.with_timezone(&offset).naive_local(),
            None => raw.with_timezone(&Local).naive_local(),
        };
        Ok(read_clock(local))
    }

    fn render(&self, model: &Self::Model) -> Panel {
        view::render_clock(model)
    }

    fn fallback(&self) -> Panel {
        Panel::unavailable(FeatureKind::Clock, "--:--:--")
    }
}
