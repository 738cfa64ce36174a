//! Clocks and ticking sources for refresh cycles
//!
//! Wall-clock time (cache ages, the clock panel) is read through a [`Clock`],
//! and every feature subscribes to its own [`Ticker`] built from a
//! [`Schedule`]. Both can be advanced deterministically in tests: a
//! [`ManualClock`] is moved by hand and tickers follow tokio's paused clock.

use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{Interval, MissedTickBehavior};

/// Source of wall-clock time
pub trait Clock: Send + Sync + Debug {
    /// Returns the current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Clock shared between all feature controllers
pub type SharedClock = Arc<dyn Clock>;

/// The real system clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward by `by`
    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    /// Jumps the clock to `to`
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// How often a feature refreshes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Once at startup, then every period
    Every(Duration),
    /// Once at startup only
    Once,
}

impl Schedule {
    /// Creates the ticking source for this schedule
    ///
    /// Must be called from within a tokio runtime.
    pub fn ticker(self) -> Ticker {
        match self {
            Schedule::Every(period) => {
                // tokio::time::interval panics on a zero period
                let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                Ticker {
                    interval: Some(interval),
                    fired: false,
                }
            }
            Schedule::Once => Ticker {
                interval: None,
                fired: false,
            },
        }
    }
}

/// Ticking source a single feature task waits on
///
/// The first tick completes immediately. A [`Schedule::Once`] ticker never
/// completes again after that, which keeps it usable inside `tokio::select!`.
#[derive(Debug)]
pub struct Ticker {
    interval: Option<Interval>,
    fired: bool,
}

impl Ticker {
    /// Waits for the next scheduled tick
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None if !self.fired => {
                self.fired = true;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
