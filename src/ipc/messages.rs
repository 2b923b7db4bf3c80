//! IPC message types for panel ↔ shade daemon communication

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Requests sent from the control panel to the shade daemon
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum PanelRequest {
    /// Full settings snapshot for immediate preview, independent of and
    /// faster than persistence. Carried raw; the daemon normalizes.
    Preview { settings: Value },

    /// Ask which host identity the daemon is shading
    GetHost,

    /// Health check
    Ping,

    /// Request graceful shutdown
    Shutdown,
}

/// Responses sent from the shade daemon to the panel
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum DaemonResponse {
    /// Receipt acknowledgment; deliberately carries no payload
    Ack,

    /// Host identity (response to GetHost)
    Host(Option<String>),

    /// Health check response
    Pong,
}
