//! Overlay rendering seam
//!
//! The decision engine produces an `OverlayFrame`; how that becomes a
//! visible tint (DOM nodes, CSS filters, a compositor layer) is the
//! sink's business. The daemon binary uses `LogSink`; tests plug in
//! recording sinks.

use tracing::info;

use crate::constants::overlay::{BRIGHTNESS_FACTOR, MIN_BRIGHTNESS};
use crate::settings::{Settings, clamp_intensity};

/// What an active overlay should look like right now
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFrame {
    /// Tint color (hex string, passed through from the record)
    pub color: String,
    /// Tint opacity in [0, MAX_INTENSITY]
    pub intensity: f64,
    /// Derived whole-page brightness filter value
    pub brightness: f64,
}

impl OverlayFrame {
    pub fn from_settings(settings: &Settings) -> Self {
        let color = if settings.overlay_color.is_empty() {
            Settings::default().overlay_color
        } else {
            settings.overlay_color.clone()
        };
        let intensity = clamp_intensity(settings.intensity);
        let brightness = (1.0 - intensity * BRIGHTNESS_FACTOR).clamp(MIN_BRIGHTNESS, 1.0);
        Self {
            color,
            intensity,
            brightness,
        }
    }
}

/// Consumer of activation decisions; must tolerate repeated clears
pub trait OverlaySink {
    fn apply(&mut self, frame: &OverlayFrame);
    fn clear(&mut self);
}

/// Sink that just reports what a renderer would do
pub struct LogSink;

impl OverlaySink for LogSink {
    fn apply(&mut self, frame: &OverlayFrame) {
        info!(
            color = %frame.color,
            intensity = frame.intensity,
            brightness = frame.brightness,
            "Overlay applied"
        );
    }

    fn clear(&mut self) {
        info!("Overlay removed");
    }
}
