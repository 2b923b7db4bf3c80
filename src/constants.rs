//! Application-wide constants
//!
//! Single source of truth for the magic numbers and string literals
//! shared by the shade daemon and the control panel.

/// Settings persistence constants
pub mod config {
    /// Directory under the user config dir holding eyeshade state
    pub const APP_DIR: &str = "eyeshade";

    /// Filename of the single settings record
    pub const FILENAME: &str = "settings.json";
}

/// Tint/overlay constants
pub mod overlay {
    /// Upper bound for the overlay intensity (opacity)
    pub const MAX_INTENSITY: f64 = 0.75;

    /// How strongly intensity pulls down page brightness
    pub const BRIGHTNESS_FACTOR: f64 = 0.35;

    /// Floor for the derived brightness filter
    pub const MIN_BRIGHTNESS: f64 = 0.35;
}

/// Timing constants for the reconciliation loops
pub mod timing {
    /// Period of the daemon's wall-clock re-evaluation tick
    pub const RECHECK_INTERVAL_SECS: u64 = 60;

    /// Quiet window for coalescing settings writes
    pub const PERSIST_DEBOUNCE_MS: u64 = 120;

    /// Poll period of the settings-file watcher
    pub const STORE_POLL_INTERVAL_MS: u64 = 250;
}

/// IPC constants
pub mod ipc {
    /// Maximum message size (10 MB) to prevent DoS via memory exhaustion
    pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

    /// Socket filename under the runtime dir
    pub const SOCKET_FILENAME: &str = "eyeshade/shade.sock";

    /// How long a preview push waits for its no-payload ack
    pub const ACK_TIMEOUT_MS: u64 = 500;
}
