//! Debounced commit scheduling for settings persistence
//!
//! Rapid successive `schedule` calls coalesce into one commit of the
//! final value after a quiet window; each new call replaces the pending
//! value and restarts the window. `flush` is the immediate-commit path
//! for discrete events (drag release, one-shot CLI commands). Dropping
//! the handle stops the worker without committing anything pending.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

enum Msg<T> {
    Schedule(T),
    Flush(Sender<()>),
}

pub struct Debouncer<T: Send + 'static> {
    tx: Sender<Msg<T>>,
    _worker: thread::JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(wait: Duration, mut commit: impl FnMut(T) + Send + 'static) -> Self {
        let (tx, rx) = mpsc::channel::<Msg<T>>();
        let worker = thread::spawn(move || {
            let mut pending: Option<(T, Instant)> = None;
            loop {
                match pending.take() {
                    None => match rx.recv() {
                        Ok(Msg::Schedule(v)) => pending = Some((v, Instant::now() + wait)),
                        Ok(Msg::Flush(ack)) => {
                            let _ = ack.send(());
                        }
                        Err(_) => break,
                    },
                    Some((v, deadline)) => {
                        let now = Instant::now();
                        if now >= deadline {
                            commit(v);
                            continue;
                        }
                        match rx.recv_timeout(deadline - now) {
                            Ok(Msg::Schedule(next)) => {
                                // Replaces the pending value and restarts the window
                                pending = Some((next, Instant::now() + wait));
                            }
                            Ok(Msg::Flush(ack)) => {
                                commit(v);
                                let _ = ack.send(());
                            }
                            Err(RecvTimeoutError::Timeout) => commit(v),
                            Err(RecvTimeoutError::Disconnected) => break,
                        }
                    }
                }
            }
        });
        Self { tx, _worker: worker }
    }

    /// Schedule a commit of `value` after the quiet window, superseding
    /// any not-yet-committed value.
    pub fn schedule(&self, value: T) {
        let _ = self.tx.send(Msg::Schedule(value));
    }

    /// Commit the pending value now, if any, and wait until the worker
    /// has done so.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.tx.send(Msg::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}
