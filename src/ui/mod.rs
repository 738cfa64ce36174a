//! UI rendering module for homedash
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components. Panels arrive pre-rendered from
//! the refresh tasks; drawing here is pure layout and styling.

pub mod dashboard;
pub mod help_overlay;

pub use dashboard::render as render_dashboard;
pub use help_overlay::render as render_help_overlay;

use ratatui::Frame;

use crate::app::App;

/// Draws the whole screen for the current app state
pub fn render(frame: &mut Frame, app: &App) {
    render_dashboard(frame, app);
    if app.show_help {
        render_help_overlay(frame);
    }
}
