//! Homedash library
//!
//! A terminal personal dashboard. Every panel (clock, weather, alert banner,
//! news, network info, speed test) is driven by the same poll-cache-render
//! refresh cycle, implemented once in [`refresh`] and parameterised by a
//! [`feature::Feature`] per panel.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod feature;
pub mod logging;
pub mod refresh;
pub mod scheduler;
pub mod ui;
pub mod view;
