//! IPC between the control panel and the shade daemon
//!
//! Length-prefixed JSON over Unix domain sockets. The panel's preview
//! push is best-effort: a missing receiver is an expected condition,
//! classified separately from real delivery failures so callers can
//! swallow it silently.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod messages;
pub use messages::{DaemonResponse, PanelRequest};

use crate::constants::ipc::{ACK_TIMEOUT_MS, MAX_MESSAGE_SIZE, SOCKET_FILENAME};
use crate::settings::Settings;

/// Get default socket path (XDG_RUNTIME_DIR with fallback to cache)
pub fn default_socket_path() -> Result<PathBuf> {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return Ok(PathBuf::from(runtime_dir).join(SOCKET_FILENAME));
    }

    let cache = dirs::cache_dir()
        .context("Failed to determine cache directory (no XDG_RUNTIME_DIR or HOME)")?;
    Ok(cache.join(SOCKET_FILENAME))
}

/// Why a preview push did not arrive
#[derive(Debug)]
pub enum PushError {
    /// The daemon is not there to receive: socket file absent,
    /// connection refused, or the peer hung up before acknowledging.
    /// Expected and silently tolerated by callers.
    ReceiverAbsent(anyhow::Error),
    /// Any other delivery failure; logged as a warning, never fatal
    Other(anyhow::Error),
}

/// Client connection to the shade daemon (used by the panel)
pub struct DaemonClient {
    stream: UnixStream,
}

impl DaemonClient {
    pub fn connect_to(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path)
            .with_context(|| format!("Failed to connect to shade daemon at {}", path.display()))?;
        Ok(Self { stream })
    }

    pub fn send_request(&mut self, req: &PanelRequest) -> Result<()> {
        write_message(&mut self.stream, req)
    }

    /// Receive a response from the daemon (blocking)
    pub fn recv_response(&mut self) -> Result<DaemonResponse> {
        read_message(&mut self.stream)
    }

    /// Send a request and wait for its response
    pub fn request(&mut self, req: PanelRequest) -> Result<DaemonResponse> {
        self.send_request(&req)?;
        self.recv_response()
    }
}

/// Fire a settings snapshot at the daemon for immediate preview.
///
/// The Ack carries no payload and is read only to bound the call; it is
/// waited on with a timeout, never indefinitely.
pub fn push_preview(path: &Path, settings: &Settings) -> Result<(), PushError> {
    let attempt = (|| -> Result<()> {
        let mut client = DaemonClient::connect_to(path)?;
        client
            .stream
            .set_read_timeout(Some(Duration::from_millis(ACK_TIMEOUT_MS)))
            .context("Failed to set ack timeout")?;
        client.send_request(&PanelRequest::Preview {
            settings: settings.to_value(),
        })?;
        match client.recv_response()? {
            DaemonResponse::Ack => Ok(()),
            other => Err(anyhow!("Unexpected preview response: {other:?}")),
        }
    })();
    attempt.map_err(classify_push_error)
}

fn classify_push_error(err: anyhow::Error) -> PushError {
    use std::io::ErrorKind;
    let receiver_absent = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<std::io::Error>())
        .any(|io| {
            matches!(
                io.kind(),
                ErrorKind::NotFound
                    | ErrorKind::ConnectionRefused
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
                    | ErrorKind::UnexpectedEof
            )
        });
    if receiver_absent {
        PushError::ReceiverAbsent(err)
    } else {
        PushError::Other(err)
    }
}

/// Server listener for the shade daemon
pub struct DaemonServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl DaemonServer {
    pub fn bind_to(socket_path: PathBuf) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {}", parent.display()))?;
        }

        // Remove stale socket if exists
        if socket_path.exists() {
            std::fs::remove_file(&socket_path)
                .with_context(|| format!("Failed to remove stale socket: {}", socket_path.display()))?;
        }

        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("Failed to bind socket at {}", socket_path.display()))?;

        // Owner-only permissions
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o700))
                .context("Failed to set socket permissions")?;
        }

        Ok(Self {
            listener,
            socket_path,
        })
    }

    /// Accept an incoming panel connection (blocking)
    pub fn accept(&self) -> Result<PanelConnection> {
        let (stream, _addr) = self
            .listener
            .accept()
            .context("Failed to accept IPC connection")?;
        Ok(PanelConnection { stream })
    }

    pub fn path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for DaemonServer {
    fn drop(&mut self) {
        // Clean up socket file
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Daemon-side handle for a single connected panel
pub struct PanelConnection {
    stream: UnixStream,
}

impl PanelConnection {
    pub fn recv_request(&mut self) -> Result<PanelRequest> {
        read_message(&mut self.stream)
    }

    pub fn send_response(&mut self, resp: &DaemonResponse) -> Result<()> {
        write_message(&mut self.stream, resp)
    }
}

/// Write length-prefixed message to stream
fn write_message<T: Serialize>(stream: &mut UnixStream, msg: &T) -> Result<()> {
    let json = serde_json::to_vec(msg).context("Failed to serialize message to JSON")?;

    let len = json.len() as u32;
    stream
        .write_all(&len.to_le_bytes())
        .context("Failed to write message length")?;
    stream
        .write_all(&json)
        .context("Failed to write message payload")?;
    stream.flush().context("Failed to flush stream")?;

    Ok(())
}

/// Read length-prefixed message from stream
fn read_message<T: for<'de> Deserialize<'de>>(stream: &mut UnixStream) -> Result<T> {
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .context("Failed to read message length")?;
    let len = u32::from_le_bytes(len_buf) as usize;

    // Sanity check (prevent DoS via huge allocation)
    if len > MAX_MESSAGE_SIZE {
        return Err(anyhow!("Message too large: {} bytes (max: {})", len, MAX_MESSAGE_SIZE));
    }

    let mut json_buf = vec![0u8; len];
    stream
        .read_exact(&mut json_buf)
        .context("Failed to read message payload")?;

    serde_json::from_slice(&json_buf).context("Failed to deserialize message from JSON")
}
