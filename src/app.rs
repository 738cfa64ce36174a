//! Application state for the dashboard
//!
//! The app owns one region per enabled feature and replaces a region's panel
//! whenever that feature's task delivers a new render. Key handling only sets
//! flags; the event loop in `main` acts on them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};

use crate::feature::FeatureKind;
use crate::refresh::{Command, CycleOutcome, RefreshMessage};
use crate::view::Panel;

/// One screen region and the last panel rendered into it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    /// `None` until the feature's first cycle completes
    pub panel: Option<Panel>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_outcome: Option<CycleOutcome>,
}

/// Main application struct
pub struct App {
    regions: HashMap<FeatureKind, Region>,
    /// Enabled features in screen order
    order: Vec<FeatureKind>,
    /// Whether the alert banner is showing; drives the alert styling
    pub alert_active: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    pending_refresh: Option<Command>,
}

impl App {
    /// Creates an app with an empty region for each enabled feature
    pub fn new(enabled: &[FeatureKind]) -> Self {
        let mut order = enabled.to_vec();
        order.sort();
        order.dedup();

        Self {
            regions: order.iter().map(|kind| (*kind, Region::default())).collect(),
            order,
            alert_active: false,
            show_help: false,
            should_quit: false,
            pending_refresh: None,
        }
    }

    /// Enabled features in screen order
    pub fn features(&self) -> &[FeatureKind] {
        &self.order
    }

    pub fn has_region(&self, kind: FeatureKind) -> bool {
        self.regions.contains_key(&kind)
    }

    pub fn region(&self, kind: FeatureKind) -> Option<&Region> {
        self.regions.get(&kind)
    }

    /// The panel currently shown for `kind`, if any
    pub fn panel(&self, kind: FeatureKind) -> Option<&Panel> {
        self.regions.get(&kind).and_then(|region| region.panel.as_ref())
    }

    /// Most recent update from any feature other than the clock
    pub fn last_data_update(&self) -> Option<DateTime<Utc>> {
        self.regions
            .iter()
            .filter(|(kind, _)| **kind != FeatureKind::Clock)
            .filter_map(|(_, region)| region.updated_at)
            .max()
    }

    /// Replaces a region's content with a freshly rendered panel
    ///
    /// Returns `false` (and changes nothing) if the panel's feature has no
    /// region, which is the case for disabled features.
    pub fn apply(&mut self, message: RefreshMessage) -> bool {
        let kind = message.panel.kind();
        let Some(region) = self.regions.get_mut(&kind) else {
            return false;
        };

        if kind == FeatureKind::Alerts {
            self.alert_active = matches!(&message.panel, Panel::Alert(banner) if banner.visible);
        }

        region.panel = Some(message.panel);
        region.updated_at = Some(message.at);
        region.last_outcome = Some(message.outcome);
        true
    }

    /// Handles keyboard input
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Help overlay intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {}
            }
            return;
        }

        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('r') => {
                self.pending_refresh = Some(Command::RefreshAll);
            }
            KeyCode::Char('s') if self.has_region(FeatureKind::SpeedTest) => {
                self.pending_refresh = Some(Command::Refresh(FeatureKind::SpeedTest));
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    /// Takes the refresh the user asked for since the last call, if any
    pub fn take_refresh_request(&mut self) -> Option<Command> {
        self.pending_refresh.take()
    }
}
