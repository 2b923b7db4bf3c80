//! IPC accept loop for the shade daemon

use anyhow::Result;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::ipc::{DaemonResponse, DaemonServer, PanelRequest};

use super::ShadeEvent;

/// Spawn the listener thread that feeds panel requests into the main loop
pub fn spawn_ipc_listener(
    server: DaemonServer,
    host: Option<String>,
    tx: Sender<ShadeEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        if let Err(e) = run_ipc_loop(&server, host.as_deref(), &tx) {
            error!(error = ?e, "IPC listener thread crashed");
        }
    })
}

fn run_ipc_loop(
    server: &DaemonServer,
    host: Option<&str>,
    tx: &Sender<ShadeEvent>,
) -> Result<()> {
    info!(socket = ?server.path(), "IPC listener started");

    loop {
        // Blocks until a panel connects
        let mut conn = server.accept()?;
        debug!("Panel connected");

        loop {
            match conn.recv_request() {
                Ok(PanelRequest::Preview { settings }) => {
                    // Ack first; it carries no payload and the panel
                    // does not depend on it
                    if let Err(e) = conn.send_response(&DaemonResponse::Ack) {
                        warn!(error = ?e, "Failed to ack preview");
                    }
                    if tx.send(ShadeEvent::Preview(settings)).is_err() {
                        return Ok(());
                    }
                }

                Ok(PanelRequest::GetHost) => {
                    // A reply failure means this panel left; it must
                    // not take the listener down with it
                    if let Err(e) = conn.send_response(&DaemonResponse::Host(host.map(str::to_owned))) {
                        debug!(error = ?e, "Panel left before host reply");
                        break;
                    }
                }

                Ok(PanelRequest::Ping) => {
                    if let Err(e) = conn.send_response(&DaemonResponse::Pong) {
                        debug!(error = ?e, "Panel left before pong");
                        break;
                    }
                }

                Ok(PanelRequest::Shutdown) => {
                    info!("Received shutdown request via IPC");
                    let _ = conn.send_response(&DaemonResponse::Ack);
                    let _ = tx.send(ShadeEvent::Shutdown);
                    return Ok(());
                }

                Err(e) => {
                    debug!(error = ?e, "Panel disconnected");
                    break; // back to accepting the next panel
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::DaemonClient;
    use std::path::PathBuf;
    use std::sync::mpsc;
    use std::time::Duration;

    fn temp_socket(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "eyeshade-shade-ipc-test-{}-{name}.sock",
            std::process::id()
        ))
    }

    #[test]
    fn listener_outlives_a_panel_that_hangs_up_mid_request() {
        let path = temp_socket("hangup");
        let server = DaemonServer::bind_to(path.clone()).unwrap();
        let (tx, rx) = mpsc::channel();
        let listener = spawn_ipc_listener(server, Some("example.com".to_string()), tx);

        // First panel sends a request and leaves without reading the reply
        {
            let mut client = DaemonClient::connect_to(&path).unwrap();
            client.send_request(&PanelRequest::GetHost).unwrap();
        }

        // The listener must still serve the next panel
        let mut attempts = 0;
        let response = loop {
            match DaemonClient::connect_to(&path)
                .and_then(|mut client| client.request(PanelRequest::Ping))
            {
                Ok(resp) => break resp,
                Err(_) if attempts < 50 => {
                    attempts += 1;
                    thread::sleep(Duration::from_millis(20));
                }
                Err(e) => panic!("listener stopped accepting panels: {e:?}"),
            }
        };
        assert!(matches!(response, DaemonResponse::Pong));

        let mut client = DaemonClient::connect_to(&path).unwrap();
        client.request(PanelRequest::Shutdown).unwrap();
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(3)),
            Ok(ShadeEvent::Shutdown)
        ));
        listener.join().unwrap();
        assert!(!path.exists());
    }
}
