//! Shade daemon - the consuming context that renders the tint
//!
//! One mpsc event loop reconciles the overlay against whichever update
//! arrives last: a persisted-record rewrite, an unpersisted preview
//! push, or the periodic wall-clock tick. The two update channels can
//! race; last-write-wins is the accepted model, there is no sequencing.

mod ipc_handler;
mod state;

pub use state::ShadeState;

use anyhow::Result;
use chrono::Local;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::timing;
use crate::ipc::DaemonServer;
use crate::overlay::LogSink;
use crate::store::SettingsStore;

pub enum ShadeEvent {
    /// The persisted record was rewritten by some writer (raw value)
    StoreChanged(Value),
    /// Preview snapshot from the panel; applied, never persisted here
    Preview(Value),
    /// Periodic wall-clock re-evaluation
    Tick,
    Shutdown,
}

/// Best-effort machine host identity for site-exception evaluation
pub fn detect_host() -> Option<String> {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn run_shade_daemon(
    host: Option<String>,
    socket_path: PathBuf,
    store_path: PathBuf,
) -> Result<()> {
    let store = SettingsStore::open(store_path);
    let mut sink = LogSink;
    let mut state = ShadeState::new(host.clone().unwrap_or_default());

    info!(
        host = %state.host(),
        store = %store.path().display(),
        "Shade daemon starting"
    );

    // Initial load → normalize → evaluate → apply
    let raw = store.get_raw().unwrap_or(Value::Null);
    state.apply_value(&raw, Local::now(), &mut sink);

    let (tx, rx) = mpsc::channel();

    // Persisted-record change notifications
    let store_tx = tx.clone();
    let _watcher = store.spawn_watcher(move |raw| store_tx.send(ShadeEvent::StoreChanged(raw)).is_ok());

    // Periodic re-evaluation; each tick is independent, nothing queues
    let tick_tx = tx.clone();
    let _ticker = thread::spawn(move || {
        loop {
            thread::sleep(Duration::from_secs(timing::RECHECK_INTERVAL_SECS));
            if tick_tx.send(ShadeEvent::Tick).is_err() {
                break;
            }
        }
    });

    // Realtime previews from the panel
    let server = DaemonServer::bind_to(socket_path)?;
    let _ipc = ipc_handler::spawn_ipc_listener(server, host, tx);

    info!("Shade daemon running");

    for event in rx {
        match event {
            ShadeEvent::StoreChanged(raw) => {
                debug!("Persisted settings changed");
                state.apply_value(&raw, Local::now(), &mut sink);
            }
            ShadeEvent::Preview(raw) => {
                debug!("Preview received");
                state.apply_value(&raw, Local::now(), &mut sink);
            }
            ShadeEvent::Tick => {
                state.reapply(Local::now(), &mut sink);
            }
            ShadeEvent::Shutdown => {
                info!("Shade daemon shutting down");
                break;
            }
        }
    }

    Ok(())
}
