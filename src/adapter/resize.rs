//! Resize debouncing, mirroring `config::config_watcher`'s "block for the
//! first event, then drain whatever piles up during the debounce window
//! and act on the last one" shape.

use crate::session::{SessionHost, SessionId};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

pub struct ResizeDebouncer {
    tx: Sender<(u16, u16)>,
}

impl ResizeDebouncer {
    pub fn spawn(sessions: SessionHost, session_id: SessionId, debounce_ms: u64) -> Self {
        let (tx, rx) = mpsc::channel::<(u16, u16)>();

        thread::Builder::new()
            .name(format!("resize-debounce-{session_id}"))
            .spawn(move || {
                while let Ok(mut latest) = rx.recv() {
                    while let Ok(next) = rx.recv_timeout(Duration::from_millis(debounce_ms)) {
                        latest = next;
                    }
                    sessions.resize(&session_id, latest.0, latest.1).ok();
                }
            })
            .ok();

        Self { tx }
    }

    pub fn request(&self, cols: u16, rows: u16) {
        self.tx.send((cols, rows)).ok();
    }
}
