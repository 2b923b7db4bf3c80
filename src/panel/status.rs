//! Derived display strings for the panel

use chrono::{DateTime, Local};

use crate::activation::{Suppression, suppression};
use crate::presets;
use crate::settings::Settings;

/// Whole minutes left in the snooze, rounded up, never below 1
fn snooze_minutes_left(until: i64, now: DateTime<Local>) -> i64 {
    ((until - now.timestamp_millis()) as f64 / 60_000.0).ceil().max(1.0) as i64
}

/// One-line summary of the current state, in suppression precedence
/// order; a configured daily window is surfaced even when the clock is
/// currently outside it.
pub fn status_line(settings: &Settings, host: Option<&str>, now: DateTime<Local>) -> String {
    match suppression(settings, host.unwrap_or(""), now) {
        Some(Suppression::Disabled) => "Off: disabled manually".to_string(),
        Some(Suppression::Snoozed { until }) => {
            let minutes = snooze_minutes_left(until, now);
            format!("Paused, resuming in {minutes} min")
        }
        Some(Suppression::SiteExcluded) => "Shading is off for this site".to_string(),
        Some(Suppression::DailyOff) | None if settings.daily_off.enabled => format!(
            "Off daily between {} and {}",
            settings.daily_off.start, settings.daily_off.end
        ),
        _ => "Running, easing your eyes".to_string(),
    }
}

/// Catalog label for the active preset; an unknown or "custom" key
/// reads as a custom color
pub fn preset_label(settings: &Settings) -> String {
    match presets::find(&settings.preset_key) {
        Some(preset) => preset.label.to_string(),
        None => format!("Custom ({})", settings.overlay_color),
    }
}

/// Label for the site-exception control
pub fn site_label(settings: &Settings, host: Option<&str>) -> String {
    let Some(host) = host else {
        return "Site control unavailable (no shaded host)".to_string();
    };
    if settings.site_exceptions.get(host).copied().unwrap_or(false) {
        format!("Shading off for {host}")
    } else {
        format!("Current site: {host}")
    }
}
