//! Front-of-house adapter boundary. This crate never renders
//! anything itself; it only defines the contract a UI-side emulator
//! widget must satisfy and the glue that wires one to a session —
//! subscribe, replay backlog, forward input, debounce resize. The demo
//! binary's ratatui/crossterm loop is one possible implementer.

mod resize;

pub use resize::ResizeDebouncer;

use crate::session::{SessionError, SessionEvent, SessionHost, SessionId, SubscriptionKind};
use std::sync::mpsc::Receiver;

/// What an external emulator widget must offer so the adapter can wire it
/// to a session. The crate never implements this trait itself
/// — it's the seam a UI crate fills in.
pub trait EmulatorWidget {
    fn write(&mut self, bytes: &[u8]);
    fn focus(&mut self);
    fn dispose(&mut self);
}

/// Binds one visible pane to its session: subscribes to the bus, exposes
/// the replay backlog once, and lets the caller pump further output and
/// forward input/resize without holding the widget itself (the widget
/// usually isn't `Send`, so this type never touches it directly — the
/// caller's own event loop does).
pub struct PaneAttachment {
    session_id: SessionId,
    sessions: SessionHost,
    rx: Receiver<SessionEvent>,
    backlog: Option<Vec<u8>>,
    resize: ResizeDebouncer,
}

impl PaneAttachment {
    pub fn attach(sessions: SessionHost, session_id: SessionId, resize_debounce_ms: u64) -> Result<Self, SessionError> {
        let (rx, backlog) = sessions.subscribe(&session_id, SubscriptionKind::All)?;
        sessions.set_visible(&session_id, true);
        let resize = ResizeDebouncer::spawn(sessions.clone(), session_id.clone(), resize_debounce_ms);
        Ok(Self { session_id, sessions, rx, backlog: Some(backlog), resize })
    }

    /// Takes the buffered-output replay exactly once — call this
    /// immediately after `attach` and feed the result to the widget
    /// before draining any further events with `poll`.
    pub fn take_backlog(&mut self) -> Vec<u8> {
        self.backlog.take().unwrap_or_default()
    }

    /// Drains every event currently queued without blocking. The caller
    /// forwards `Output` payloads to its widget and reacts to lifecycle
    /// events (`Disconnected`, `Reconnected`, `Closed`) as it sees fit.
    pub fn poll(&self) -> Vec<SessionEvent> {
        self.rx.try_iter().collect()
    }

    pub fn forward_input(&self, bytes: &[u8]) -> Result<(), SessionError> {
        self.sessions.write(&self.session_id, bytes)
    }

    /// Queues a resize; the debouncer coalesces bursts and applies only
    /// the last size once the pane has been quiet for the configured
    /// window, roughly 100ms by default.
    pub fn request_resize(&self, cols: u16, rows: u16) {
        self.resize.request(cols, rows);
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

impl Drop for PaneAttachment {
    /// Losing visibility doesn't close the session — the host keeps
    /// buffering per its backpressure rules; this just marks the
    /// session non-visible for eviction ordering.
    fn drop(&mut self) {
        self.sessions.set_visible(&self.session_id, false);
    }
}
