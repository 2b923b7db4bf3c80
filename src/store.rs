//! Durable settings persistence
//!
//! Exactly one record lives in one JSON file. Reads never fail: a
//! missing or corrupt file falls back to normalized defaults. Change
//! notification is a polling watcher thread delivering the raw new
//! value; receivers normalize it themselves, since any collaborator may
//! have written the file.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

use crate::constants::{config, timing};
use crate::settings::Settings;

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn open(path: PathBuf) -> Self {
        Self { path }
    }

    /// Well-known location under the user config dir
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw persisted value, if a readable one exists
    pub fn get_raw(&self) -> Option<Value> {
        let contents = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Settings file unreadable, using defaults");
                None
            }
        }
    }

    /// Current settings, normalized; defaults when nothing usable is stored
    pub fn get(&self) -> Settings {
        match self.get_raw() {
            Some(raw) => Settings::normalize(&raw),
            None => Settings::default(),
        }
    }

    /// Persist the record verbatim as one unit
    pub fn set(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory {}", parent.display()))?;
        }
        let contents =
            serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
        // Rename over the target so a concurrent reader sees either the
        // old record or the new one, never a torn write
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, contents)
            .with_context(|| format!("Failed to write settings to {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("Failed to move settings into place at {}", self.path.display()))?;
        debug!(path = %self.path.display(), "Settings persisted");
        Ok(())
    }

    /// Watch the file for rewrites, handing the raw new value to
    /// `notify`. The callback returns whether to keep watching; there
    /// is no other shutdown handshake.
    pub fn spawn_watcher<F>(&self, notify: F) -> JoinHandle<()>
    where
        F: FnMut(Value) -> bool + Send + 'static,
    {
        let path = self.path.clone();
        thread::spawn(move || watch_loop(&path, notify))
    }
}

fn fingerprint(path: &Path) -> Option<(SystemTime, u64)> {
    let meta = fs::metadata(path).ok()?;
    Some((meta.modified().ok()?, meta.len()))
}

fn watch_loop<F>(path: &Path, mut notify: F)
where
    F: FnMut(Value) -> bool,
{
    let mut last = fingerprint(path);
    loop {
        thread::sleep(Duration::from_millis(timing::STORE_POLL_INTERVAL_MS));
        let current = fingerprint(path);
        if current == last {
            continue;
        }
        last = current;
        let raw = fs::read_to_string(path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or(Value::Null);
        if !notify(raw) {
            break;
        }
    }
}
