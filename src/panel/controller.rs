//! Mutation pipeline for the control panel.
//!
//! Every change goes through the same path: clone the current record,
//! apply one mutation, re-clamp, broadcast a preview to the daemon,
//! and schedule a debounced write to the store. Continuous gestures
//! (an intensity drag) suspend the write and flush it on release via
//! [`Controller::commit`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::constants::timing;
use crate::debounce::Debouncer;
use crate::ipc::{self, DaemonClient, DaemonResponse, PanelRequest, PushError};
use crate::presets::{self, CUSTOM_KEY};
use crate::settings::{DailyOff, Settings, clamp_intensity};
use crate::store::SettingsStore;

/// Outbound realtime channel toward the shade daemon
pub trait PreviewPush {
    fn push(&self, settings: &Settings);
}

/// The real channel: a best-effort preview over the daemon socket.
/// An absent daemon is normal and stays quiet; anything else is
/// logged and swallowed.
pub struct IpcPreviewPush {
    socket_path: PathBuf,
}

impl IpcPreviewPush {
    pub fn new(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }
}

impl PreviewPush for IpcPreviewPush {
    fn push(&self, settings: &Settings) {
        match ipc::push_preview(&self.socket_path, settings) {
            Ok(()) => {}
            Err(PushError::ReceiverAbsent(e)) => {
                debug!(error = %e, "No shade daemon to preview to");
            }
            Err(PushError::Other(e)) => {
                warn!(error = ?e, "Realtime preview failed");
            }
        }
    }
}

/// Ask the daemon which host it is shading. Any failure means the
/// site controls stay unavailable.
pub fn detect_host(socket_path: &Path) -> Option<String> {
    let reply = DaemonClient::connect_to(socket_path)
        .and_then(|mut client| client.request(PanelRequest::GetHost));
    match reply {
        Ok(DaemonResponse::Host(host)) => host,
        Ok(other) => {
            warn!(response = ?other, "Unexpected reply to host query");
            None
        }
        Err(e) => {
            debug!(error = %e, "Could not query the shaded host");
            None
        }
    }
}

enum Persist {
    Debounced,
    Suspended,
}

pub struct Controller<P: PreviewPush> {
    push: P,
    current: Settings,
    host: Option<String>,
    saver: Debouncer<Settings>,
}

impl<P: PreviewPush> Controller<P> {
    pub fn new(store: SettingsStore, push: P, host: Option<String>) -> Self {
        let store = Arc::new(store);
        let current = store.get();
        let saver_store = store.clone();
        let saver = Debouncer::new(
            Duration::from_millis(timing::PERSIST_DEBOUNCE_MS),
            move |settings: Settings| {
                if let Err(e) = saver_store.set(&settings) {
                    warn!(error = ?e, "Failed to persist settings");
                }
            },
        );
        Self { push, current, host, saver }
    }

    pub fn settings(&self) -> &Settings {
        &self.current
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn status_line(&self, now: DateTime<Local>) -> String {
        super::status::status_line(&self.current, self.host(), now)
    }

    pub fn site_label(&self) -> String {
        super::status::site_label(&self.current, self.host())
    }

    /// One atomic step: draft, mutate, re-clamp, remember, broadcast.
    /// The broadcast always carries the same record a later write will
    /// persist.
    fn update(&mut self, persist: Persist, mutate: impl FnOnce(&mut Settings)) {
        let mut draft = self.current.clone();
        mutate(&mut draft);
        // a typed draft cannot lose fields, so only the range rule
        // needs re-applying
        draft.intensity = clamp_intensity(draft.intensity);
        self.current = draft;
        self.push.push(&self.current);
        if matches!(persist, Persist::Debounced) {
            self.saver.schedule(self.current.clone());
        }
    }

    /// Flush any pending write immediately, e.g. on drag release or
    /// before the process exits
    pub fn commit(&mut self) {
        self.saver.schedule(self.current.clone());
        self.saver.flush();
    }

    /// Turning the shade on or off always clears a running snooze
    pub fn set_enabled(&mut self, enabled: bool) {
        self.update(Persist::Debounced, |s| {
            s.enabled = enabled;
            s.temporary_off_until = 0;
        });
    }

    pub fn select_preset(&mut self, key: &str) -> Result<()> {
        let Some(preset) = presets::find(key) else {
            bail!("unknown preset '{key}'");
        };
        self.update(Persist::Debounced, |s| {
            s.preset_key = preset.key.to_string();
            s.overlay_color = preset.color.to_string();
        });
        Ok(())
    }

    pub fn use_custom_color(&mut self, color: &str) {
        let color = color.to_string();
        self.update(Persist::Debounced, |s| {
            s.preset_key = CUSTOM_KEY.to_string();
            s.custom_color = color.clone();
            s.overlay_color = color;
        });
    }

    /// Continuous slider movement: previews only, no write scheduled
    /// until [`Controller::commit`]
    pub fn drag_intensity(&mut self, value: f64) {
        self.update(Persist::Suspended, |s| s.intensity = value);
    }

    pub fn set_intensity(&mut self, value: f64) {
        self.update(Persist::Debounced, |s| s.intensity = value);
    }

    /// Snoozing re-enables the shade so that resuming later comes
    /// back on without a second toggle
    pub fn snooze(&mut self, minutes: u32, now: DateTime<Local>) {
        let until = now.timestamp_millis() + i64::from(minutes) * 60_000;
        self.update(Persist::Debounced, |s| {
            s.enabled = true;
            s.temporary_off_until = until;
        });
    }

    pub fn resume(&mut self) {
        self.update(Persist::Debounced, |s| {
            s.enabled = true;
            s.temporary_off_until = 0;
        });
    }

    /// Toggle the exception for the shaded host. A cleared exception
    /// is removed outright rather than stored as `false`. Returns
    /// false when no host is known, in which case nothing changes.
    pub fn toggle_site_exception(&mut self) -> bool {
        let Some(host) = self.host.clone() else {
            return false;
        };
        self.update(Persist::Debounced, |s| {
            if s.site_exceptions.get(&host).copied().unwrap_or(false) {
                s.site_exceptions.remove(&host);
            } else {
                s.site_exceptions.insert(host, true);
            }
        });
        true
    }

    pub fn set_daily_off_enabled(&mut self, enabled: bool) {
        self.update(Persist::Debounced, |s| s.daily_off.enabled = enabled);
    }

    /// Empty fields fall back to the stock window
    pub fn set_daily_off_window(&mut self, start: &str, end: &str) {
        let stock = DailyOff::default();
        let start = if start.is_empty() { stock.start } else { start.to_string() };
        let end = if end.is_empty() { stock.end } else { end.to_string() };
        self.update(Persist::Debounced, |s| {
            s.daily_off.start = start;
            s.daily_off.end = end;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread;

    struct RecordingPush {
        pushed: Arc<Mutex<Vec<Settings>>>,
    }

    impl PreviewPush for RecordingPush {
        fn push(&self, settings: &Settings) {
            self.pushed.lock().unwrap().push(settings.clone());
        }
    }

    fn controller_at(
        name: &str,
    ) -> (Controller<RecordingPush>, Arc<Mutex<Vec<Settings>>>, PathBuf) {
        let path = std::env::temp_dir().join(format!(
            "eyeshade-panel-{}-{}.json",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let pushed = Arc::new(Mutex::new(Vec::new()));
        let push = RecordingPush { pushed: pushed.clone() };
        let controller = Controller::new(SettingsStore::open(path.clone()), push, None);
        (controller, pushed, path)
    }

    #[test]
    fn every_mutation_broadcasts_a_clamped_record() {
        let (mut c, pushed, path) = controller_at("clamp");
        c.drag_intensity(0.9);
        let pushed = pushed.lock().unwrap();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].intensity, 0.75);
        assert_eq!(c.settings().intensity, 0.75);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn rapid_changes_persist_once_with_the_final_value() {
        let (mut c, pushed, path) = controller_at("rapid");
        for value in [0.1, 0.2, 0.3, 0.4, 0.5] {
            c.set_intensity(value);
        }
        // still inside the debounce window
        assert!(!path.exists());
        thread::sleep(Duration::from_millis(400));
        let stored = SettingsStore::open(path.clone()).get();
        assert_eq!(stored.intensity, 0.5);
        assert_eq!(pushed.lock().unwrap().len(), 5);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn drag_previews_without_writing_until_commit() {
        let (mut c, pushed, path) = controller_at("drag");
        c.drag_intensity(0.2);
        c.drag_intensity(0.3);
        thread::sleep(Duration::from_millis(300));
        assert!(!path.exists());
        assert_eq!(pushed.lock().unwrap().len(), 2);

        c.commit();
        let stored = SettingsStore::open(path.clone()).get();
        assert_eq!(stored.intensity, 0.3);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn preset_selection_paints_the_overlay_color() {
        let (mut c, _pushed, path) = controller_at("preset");
        c.select_preset("night").unwrap();
        assert_eq!(c.settings().preset_key, "night");
        assert_eq!(c.settings().overlay_color, "#1f2535");
        assert!(c.select_preset("nope").is_err());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn custom_color_switches_the_preset_key() {
        let (mut c, _pushed, path) = controller_at("custom");
        c.use_custom_color("#123456");
        assert_eq!(c.settings().preset_key, CUSTOM_KEY);
        assert_eq!(c.settings().overlay_color, "#123456");
        assert_eq!(c.settings().custom_color, "#123456");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn snooze_enables_and_resume_clears() {
        let (mut c, _pushed, path) = controller_at("snooze");
        c.set_enabled(false);
        let now = Local::now();
        c.snooze(15, now);
        assert!(c.settings().enabled);
        assert_eq!(
            c.settings().temporary_off_until,
            now.timestamp_millis() + 15 * 60_000
        );
        c.resume();
        assert!(c.settings().enabled);
        assert_eq!(c.settings().temporary_off_until, 0);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn toggling_enabled_clears_a_snooze() {
        let (mut c, _pushed, path) = controller_at("toggle-clears");
        c.snooze(15, Local::now());
        c.set_enabled(false);
        assert_eq!(c.settings().temporary_off_until, 0);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn site_toggle_requires_a_host_and_removes_on_clear() {
        let (mut c, pushed, path) = controller_at("site-none");
        assert!(!c.toggle_site_exception());
        assert!(pushed.lock().unwrap().is_empty());
        assert!(c.settings().site_exceptions.is_empty());
        // nothing changed, so nothing gets scheduled for persistence
        thread::sleep(Duration::from_millis(300));
        assert!(!path.exists());
        let _ = std::fs::remove_file(path);

        let (mut c, _pushed, path) = controller_at("site-some");
        c.host = Some("example.com".to_string());
        assert!(c.toggle_site_exception());
        assert_eq!(
            c.settings().site_exceptions.get("example.com"),
            Some(&true)
        );
        assert!(c.toggle_site_exception());
        assert!(!c.settings().site_exceptions.contains_key("example.com"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn empty_daily_fields_fall_back_to_the_stock_window() {
        let (mut c, _pushed, path) = controller_at("daily");
        c.set_daily_off_window("23:15", "");
        assert_eq!(c.settings().daily_off.start, "23:15");
        assert_eq!(c.settings().daily_off.end, "07:00");
        c.set_daily_off_enabled(true);
        assert!(c.settings().daily_off.enabled);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn preview_and_store_settle_on_the_same_record() {
        let (mut c, pushed, path) = controller_at("settle");
        c.select_preset("forest").unwrap();
        c.set_intensity(0.5);
        thread::sleep(Duration::from_millis(400));
        let stored = SettingsStore::open(path.clone()).get();
        let last = pushed.lock().unwrap().last().cloned().unwrap();
        assert_eq!(stored, last);
        let _ = std::fs::remove_file(path);
    }
}
