//! Consumer-side reconciliation state
//!
//! Owns the last-known settings and what the sink currently shows.
//! Every update path (initial load, store change, preview, periodic
//! tick) funnels through `reconcile`, so applying the same settings
//! twice never produces duplicate sink calls.

use chrono::{DateTime, Local};
use serde_json::Value;

use crate::activation::should_activate;
use crate::overlay::{OverlayFrame, OverlaySink};
use crate::settings::Settings;

pub struct ShadeState {
    host: String,
    settings: Settings,
    applied: Option<OverlayFrame>,
}

impl ShadeState {
    pub fn new(host: String) -> Self {
        Self {
            host,
            settings: Settings::default(),
            applied: None,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Take a raw record (persisted or previewed), normalize it, and
    /// reconcile the overlay. Nothing is ever persisted here; previews
    /// stay in-memory by construction.
    pub fn apply_value(&mut self, raw: &Value, now: DateTime<Local>, sink: &mut dyn OverlaySink) {
        self.settings = Settings::normalize(raw);
        self.reconcile(now, sink);
    }

    /// Re-evaluate the last-known settings against the current wall
    /// clock. Catches transitions that produce no settings write:
    /// snooze expiry and daily-window boundaries.
    pub fn reapply(&mut self, now: DateTime<Local>, sink: &mut dyn OverlaySink) {
        self.reconcile(now, sink);
    }

    fn reconcile(&mut self, now: DateTime<Local>, sink: &mut dyn OverlaySink) {
        if !should_activate(&self.settings, &self.host, now) {
            if self.applied.take().is_some() {
                sink.clear();
            }
            return;
        }
        let frame = OverlayFrame::from_settings(&self.settings);
        if self.applied.as_ref() != Some(&frame) {
            sink.apply(&frame);
            self.applied = Some(frame);
        }
    }
}
