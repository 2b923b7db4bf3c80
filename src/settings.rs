//! The settings record shared by the shade daemon and the control panel
//!
//! One record is persisted and broadcast as a unit. `normalize` is the
//! only entry point for turning untrusted/partial data into a usable
//! record; it never fails and always yields a fully-populated,
//! range-valid `Settings`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::constants::overlay::MAX_INTENSITY;

/// Recurring daily suppression window, local time, may wrap past midnight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyOff {
    pub enabled: bool,
    /// Zero-padded 24h local time, e.g. "22:00"
    pub start: String,
    pub end: String,
}

impl Default for DailyOff {
    fn default() -> Self {
        Self {
            enabled: false,
            start: "22:00".to_string(),
            end: "07:00".to_string(),
        }
    }
}

/// The canonical settings record (camelCase on the wire)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Master on/off switch
    pub enabled: bool,
    /// Key of the active color preset, or "custom"
    pub preset_key: String,
    /// Color currently applied to the overlay (hex string)
    pub overlay_color: String,
    /// Last user-picked custom color, kept independent of the overlay color
    pub custom_color: String,
    /// Overlay opacity, always within [0, MAX_INTENSITY]
    pub intensity: f64,
    /// Per-host disable flags; presence + true means "off on this host"
    pub site_exceptions: HashMap<String, bool>,
    /// Snooze expiry in epoch millis; 0 = no snooze. A past value is
    /// inert, never auto-cleared.
    pub temporary_off_until: i64,
    pub daily_off: DailyOff,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            preset_key: "sunset".to_string(),
            overlay_color: "#f4e9d8".to_string(),
            custom_color: "#f4e9d8".to_string(),
            intensity: 0.4,
            site_exceptions: HashMap::new(),
            temporary_off_until: 0,
            daily_off: DailyOff::default(),
        }
    }
}

impl Settings {
    /// Build a fully-populated record from an arbitrary raw value.
    ///
    /// Top-level fields shallow-merge over defaults; `dailyOff` and
    /// `siteExceptions` each deep-merge over their own defaults, so a
    /// partial `dailyOff` override keeps the untouched sub-fields.
    /// Intensity is coerced to a number (non-numeric → 0) and clamped.
    /// Color strings, preset keys, hostnames and time strings pass
    /// through unvalidated; that leniency is deliberate.
    pub fn normalize(raw: &Value) -> Settings {
        let Some(obj) = raw.as_object() else {
            return Settings::default();
        };
        let defaults = Settings::default();
        let daily_defaults = DailyOff::default();
        let daily = obj.get("dailyOff").and_then(Value::as_object);

        Settings {
            enabled: obj
                .get("enabled")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.enabled),
            preset_key: str_field(obj, "presetKey", defaults.preset_key),
            overlay_color: str_field(obj, "overlayColor", defaults.overlay_color),
            custom_color: str_field(obj, "customColor", defaults.custom_color),
            intensity: match obj.get("intensity") {
                None => defaults.intensity,
                Some(v) => clamp_intensity(coerce_number(v)),
            },
            site_exceptions: obj
                .get("siteExceptions")
                .and_then(Value::as_object)
                .map(|m| {
                    m.iter()
                        .map(|(host, v)| (host.clone(), v.as_bool().unwrap_or(false)))
                        .collect()
                })
                .unwrap_or(defaults.site_exceptions),
            temporary_off_until: obj
                .get("temporaryOffUntil")
                .and_then(Value::as_i64)
                .unwrap_or(defaults.temporary_off_until),
            daily_off: DailyOff {
                enabled: daily
                    .and_then(|d| d.get("enabled"))
                    .and_then(Value::as_bool)
                    .unwrap_or(daily_defaults.enabled),
                start: daily
                    .and_then(|d| d.get("start"))
                    .and_then(Value::as_str)
                    .map(str::to_owned)
                    .unwrap_or(daily_defaults.start),
                end: daily
                    .and_then(|d| d.get("end"))
                    .and_then(Value::as_str)
                    .map(str::to_owned)
                    .unwrap_or(daily_defaults.end),
            },
        }
    }

    /// Snapshot as a raw JSON value (the wire/persisted shape)
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn str_field(
    obj: &serde_json::Map<String, Value>,
    key: &str,
    default: String,
) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or(default)
}

/// JSON numbers and numeric strings count as numbers; anything else is 0
fn coerce_number(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

pub fn clamp_intensity(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, MAX_INTENSITY)
}
