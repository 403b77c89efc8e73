//! Session Host — the process-wide owner of every local PTY and SSH
//! session. Grounded on `color-ssh`'s `session_manager.rs`,
//! which already centralized spawn/registry/broadcast for PTY children
//! under a single `Mutex<HashMap<..>>`; this module keeps that shape and
//! adds the second backend, the backpressure ceiling, and reconnect.

mod backpressure;
mod events;
mod pty;
mod ssh;
pub mod ssh_config;
mod types;

pub use events::{SessionEvent, SubscriptionKind};
pub use ssh_config::{ResolvedHost, SshConfigLookup};
pub use types::{LocalConfig, SessionId, SessionKind, SessionMetadata, SessionState, SshConfig};

use crate::log_debug;
use backpressure::OutputBuffer;
use events::EventBus;
use secrecy::SecretString;
use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const DEFAULT_COLS: u16 = 80;
const DEFAULT_ROWS: u16 = 24;

/// Why an SSH dial failed. Carried on `SessionError::Connect` so the
/// adapter can render a precise message instead of a bare string.
#[derive(Debug, Clone)]
pub enum ConnectErrorKind {
    AuthFailed,
    NetworkError,
    HostUnreachable,
    HandshakeFailed(String),
    Timeout,
}

impl fmt::Display for ConnectErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectErrorKind::AuthFailed => write!(f, "authentication failed"),
            ConnectErrorKind::NetworkError => write!(f, "network error"),
            ConnectErrorKind::HostUnreachable => write!(f, "host unreachable"),
            ConnectErrorKind::HandshakeFailed(detail) => write!(f, "handshake failed: {detail}"),
            ConnectErrorKind::Timeout => write!(f, "connection timed out"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionError {
    NotFound(SessionId),
    Spawn(String),
    Io(String),
    Connect(ConnectErrorKind),
    WrongKind { session_id: SessionId, expected: &'static str },
    AlreadyClosed(SessionId),
    InvalidOperation(&'static str),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotFound(id) => write!(f, "no session with id {id}"),
            SessionError::Spawn(detail) => write!(f, "failed to spawn session: {detail}"),
            SessionError::Io(detail) => write!(f, "session I/O error: {detail}"),
            SessionError::Connect(kind) => write!(f, "failed to connect: {kind}"),
            SessionError::WrongKind { session_id, expected } => write!(f, "session {session_id} is not a {expected} session"),
            SessionError::AlreadyClosed(id) => write!(f, "session {id} is already closed"),
            SessionError::InvalidOperation(reason) => write!(f, "invalid operation: {reason}"),
        }
    }
}

impl std::error::Error for SessionError {}

enum Backend {
    Local(pty::LocalHandle),
    Ssh(ssh::SshHandle),
}

struct SessionEntry {
    metadata: SessionMetadata,
    backend: Option<Backend>,
    buffer: OutputBuffer,
    cols: u16,
    rows: u16,
}

struct Inner {
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
    bus: Arc<EventBus>,
    output_buffer_bytes: usize,
    output_buffer_chunks: usize,
    max_process_bytes: usize,
}

/// The Session Host: owns every session's I/O handle and output buffer,
/// and is the only thing allowed to touch them. Everything
/// above it — Layout Engine, Controller, adapter — talks to sessions only
/// through this API and the event bus. Cloning a `SessionHost` shares the
/// same underlying registry (it's an `Arc` handle).
#[derive(Clone)]
pub struct SessionHost {
    inner: Arc<Inner>,
}

impl SessionHost {
    pub fn new(output_buffer_bytes: usize, output_buffer_chunks: usize, process_memory_ceiling_bytes: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                sessions: Mutex::new(HashMap::new()),
                bus: Arc::new(EventBus::new()),
                output_buffer_bytes,
                output_buffer_chunks,
                max_process_bytes: process_memory_ceiling_bytes,
            }),
        }
    }

    pub fn from_settings(settings: &crate::config::Settings) -> Self {
        Self::new(settings.output_buffer_bytes, settings.output_buffer_chunks, settings.process_memory_ceiling_bytes)
    }

    /// A local shell exiting on its own — like an explicit `close` — has
    /// nothing to reconnect to, so its reader's exit transitions straight
    /// to `Closed`.
    pub fn open_local(&self, title: impl Into<String>, config: LocalConfig) -> Result<SessionId, SessionError> {
        let session_id = SessionId::new();
        let bus = self.inner.bus.clone();
        let inner = self.inner.clone();
        let closing_id = session_id.clone();
        let handle = pty::spawn(session_id.clone(), &config, bus, move || {
            mark_closed(&inner, &closing_id);
        })?;

        self.insert(session_id.clone(), title.into(), SessionKind::Local(config), Backend::Local(handle));
        Ok(session_id)
    }

    /// An SSH reader exiting on its own — remote EOF, broken pipe, channel
    /// error — drops the session to `Disconnected` and keeps it registered
    /// so `reconnect` can dial again; it never closes the pane outright.
    pub fn open_ssh(&self, title: impl Into<String>, config: SshConfig, connect_timeout: Duration) -> Result<SessionId, SessionError> {
        let session_id = SessionId::new();
        let bus = self.inner.bus.clone();
        let inner = self.inner.clone();
        let closing_id = session_id.clone();
        let handle = ssh::connect(session_id.clone(), &config, connect_timeout, bus, move || {
            mark_disconnected(&inner, &closing_id);
        })?;

        self.insert(session_id.clone(), title.into(), SessionKind::Ssh(config), Backend::Ssh(handle));
        Ok(session_id)
    }

    fn insert(&self, session_id: SessionId, title: String, kind: SessionKind, backend: Backend) {
        let title = self.dedupe_title(title);
        let mut sessions = self.lock();
        sessions.insert(
            session_id.clone(),
            SessionEntry {
                metadata: SessionMetadata { id: session_id.clone(), title, kind, created_at: chrono::Local::now(), state: SessionState::Active },
                backend: Some(backend),
                buffer: OutputBuffer::new(self.inner.output_buffer_bytes, self.inner.output_buffer_chunks),
                cols: DEFAULT_COLS,
                rows: DEFAULT_ROWS,
            },
        );
        drop(sessions);
        self.spawn_recorder(session_id);
    }

    /// Every session gets one internal `OutputOnly` subscriber whose sole
    /// job is to feed bytes into the replay buffer and trip the
    /// process-wide ceiling sweep. This is separate from whatever
    /// subscriber the adapter attaches via `subscribe`.
    fn spawn_recorder(&self, session_id: SessionId) {
        let rx = self.inner.bus.subscribe(&session_id, SubscriptionKind::OutputOnly);
        let inner = self.inner.clone();
        std::thread::spawn(move || {
            for event in rx {
                if let SessionEvent::Output { data, .. } = event {
                    record_output(&inner, &session_id, data);
                }
            }
        });
    }

    /// If a session titled `host` (or `host_N`) already exists, the new
    /// one is suffixed `_1`, `_2`, ...
    fn dedupe_title(&self, title: String) -> String {
        let sessions = self.lock();
        let taken: std::collections::HashSet<&str> = sessions.values().map(|entry| entry.metadata.title.as_str()).collect();
        if !taken.contains(title.as_str()) {
            return title;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{title}_{n}");
            if !taken.contains(candidate.as_str()) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn write(&self, session_id: &SessionId, bytes: &[u8]) -> Result<(), SessionError> {
        let sessions = self.lock();
        let entry = sessions.get(session_id).ok_or_else(|| SessionError::NotFound(session_id.clone()))?;
        match &entry.backend {
            Some(Backend::Local(handle)) => handle.write(bytes),
            Some(Backend::Ssh(handle)) => handle.write(bytes),
            None => Err(SessionError::AlreadyClosed(session_id.clone())),
        }
    }

    pub fn resize(&self, session_id: &SessionId, cols: u16, rows: u16) -> Result<(), SessionError> {
        if cols < 2 || rows < 2 {
            return Err(SessionError::InvalidOperation("resize requires cols and rows >= 2"));
        }
        let started = Instant::now();
        let mut sessions = self.lock();
        let entry = sessions.get_mut(session_id).ok_or_else(|| SessionError::NotFound(session_id.clone()))?;
        entry.cols = cols;
        entry.rows = rows;
        let result = match &entry.backend {
            Some(Backend::Local(handle)) => handle.resize(cols, rows),
            Some(Backend::Ssh(handle)) => handle.resize(cols, rows),
            None => Ok(()),
        };
        drop(sessions);
        log_debug!("session {session_id} resize to {cols}x{rows} took {:?}", started.elapsed());
        result
    }

    /// Opens an SSH session from a bare host alias, filling in whatever
    /// `overrides` left unset from `lookup`'s `~/.ssh/config` entry.
    /// `overrides` fields always win over the file.
    pub fn open_ssh_alias(
        &self,
        title: impl Into<String>,
        alias: &str,
        overrides: ResolvedHost,
        password: Option<SecretString>,
        lookup: &SshConfigLookup,
        connect_timeout: Duration,
    ) -> Result<SessionId, SessionError> {
        let resolved = lookup.resolve(alias, overrides);
        let host = resolved.hostname.unwrap_or_else(|| alias.to_string());
        let username = resolved.user.ok_or_else(|| SessionError::Spawn(format!("no username resolved for ssh alias '{alias}'")))?;
        let config = SshConfig { host, port: resolved.port.unwrap_or(22), username, password, private_key: resolved.identity_file };
        self.open_ssh(title, config, connect_timeout)
    }

    pub fn close(&self, session_id: &SessionId) -> Result<(), SessionError> {
        let mut sessions = self.lock();
        let entry = sessions.get_mut(session_id).ok_or_else(|| SessionError::NotFound(session_id.clone()))?;
        match entry.backend.take() {
            Some(Backend::Local(mut handle)) => handle.kill(),
            Some(Backend::Ssh(handle)) => handle.close(),
            None => return Err(SessionError::AlreadyClosed(session_id.clone())),
        }
        entry.metadata.state = SessionState::Closed;
        self.inner.bus.drop_session(session_id);
        Ok(())
    }

    /// Reopen a new backend for an existing SSH session's config, carrying
    /// the old session id forward so the Layout Engine's pane references
    /// stay valid. Only valid when the session is currently `Disconnected`;
    /// a second call while already `Active` is a no-op error rather than
    /// replacing a live backend.
    pub fn reconnect(&self, session_id: &SessionId, connect_timeout: Duration) -> Result<(), SessionError> {
        let (config, cols, rows) = {
            let sessions = self.lock();
            let entry = sessions.get(session_id).ok_or_else(|| SessionError::NotFound(session_id.clone()))?;
            if entry.metadata.state != SessionState::Disconnected {
                return Err(SessionError::InvalidOperation("reconnect is only valid on a disconnected session"));
            }
            match &entry.metadata.kind {
                SessionKind::Ssh(config) => (config.clone(), entry.cols, entry.rows),
                SessionKind::Local(_) => return Err(SessionError::WrongKind { session_id: session_id.clone(), expected: "ssh" }),
            }
        };

        let bus = self.inner.bus.clone();
        let inner = self.inner.clone();
        let closing_id = session_id.clone();
        let handle = ssh::connect(session_id.clone(), &config, connect_timeout, bus, move || {
            mark_disconnected(&inner, &closing_id);
        })?;
        handle.resize(cols, rows).ok();

        let mut sessions = self.lock();
        if let Some(entry) = sessions.get_mut(session_id) {
            entry.backend = Some(Backend::Ssh(handle));
            entry.metadata.state = SessionState::Active;
        }
        drop(sessions);
        // The session's recorder thread (subscribed by id, not by backend)
        // is still alive from the original `open_ssh` and keeps working.
        self.inner.bus.publish(SessionEvent::Reconnected { session_id: session_id.clone() });
        Ok(())
    }

    /// Opens a fresh session from an existing one's recipe — same shell/cwd
    /// for a local session, same host/credentials for an SSH one. Does not
    /// copy the original's output buffer or session id.
    pub fn duplicate(&self, session_id: &SessionId, connect_timeout: Duration) -> Result<SessionId, SessionError> {
        let (title, kind) = {
            let sessions = self.lock();
            let entry = sessions.get(session_id).ok_or_else(|| SessionError::NotFound(session_id.clone()))?;
            (entry.metadata.title.clone(), entry.metadata.kind.clone())
        };
        match kind {
            SessionKind::Local(config) => self.open_local(title, config),
            SessionKind::Ssh(config) => self.open_ssh(title, config, connect_timeout),
        }
    }

    pub fn subscribe(&self, session_id: &SessionId, kind: SubscriptionKind) -> Result<(Receiver<SessionEvent>, Vec<u8>), SessionError> {
        let sessions = self.lock();
        let entry = sessions.get(session_id).ok_or_else(|| SessionError::NotFound(session_id.clone()))?;
        let backlog = entry.buffer.snapshot();
        drop(sessions);
        Ok((self.inner.bus.subscribe(session_id, kind), backlog))
    }

    pub fn metadata(&self, session_id: &SessionId) -> Result<SessionMetadata, SessionError> {
        let sessions = self.lock();
        sessions.get(session_id).map(|entry| entry.metadata.clone()).ok_or_else(|| SessionError::NotFound(session_id.clone()))
    }

    pub fn list(&self) -> Vec<SessionMetadata> {
        self.lock().values().map(|entry| entry.metadata.clone()).collect()
    }

    /// Marks a session visible/hidden for eviction ordering. Called by the
    /// adapter on tab switch / window minimize.
    pub fn set_visible(&self, session_id: &SessionId, visible: bool) {
        let mut sessions = self.lock();
        if let Some(entry) = sessions.get_mut(session_id) {
            entry.buffer.set_visible(visible);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, SessionEntry>> {
        self.inner.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Non-user-initiated drop of an SSH channel: state goes to `Disconnected`,
/// the entry stays registered, and `ReconnectNeeded` follows `Disconnected`
/// so the UI can offer a reconnect. A no-op if the session was already
/// `Closed` by an explicit `close` racing the same reader thread.
fn mark_disconnected(inner: &Arc<Inner>, session_id: &SessionId) {
    let mut sessions = inner.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let Some(entry) = sessions.get_mut(session_id) else { return };
    if entry.metadata.state == SessionState::Closed {
        return;
    }
    entry.metadata.state = SessionState::Disconnected;
    drop(sessions);
    inner.bus.publish(SessionEvent::Disconnected { session_id: session_id.clone() });
    inner.bus.publish(SessionEvent::ReconnectNeeded { session_id: session_id.clone() });
}

/// A local shell exiting on its own: nothing to reconnect to, so this goes
/// straight to `Closed`, same as an explicit `close`. A no-op if something
/// already closed the session first.
fn mark_closed(inner: &Arc<Inner>, session_id: &SessionId) {
    let mut sessions = inner.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let Some(entry) = sessions.get_mut(session_id) else { return };
    if entry.metadata.state == SessionState::Closed {
        return;
    }
    entry.metadata.state = SessionState::Closed;
    drop(sessions);
    inner.bus.drop_session(session_id);
    inner.bus.publish(SessionEvent::Closed { session_id: session_id.clone() });
}

/// Feeds an observed output chunk into the session's replay buffer, then
/// sweeps the process-wide ceiling if it's been exceeded. Driven by each
/// session's internal recorder thread (see `SessionHost::spawn_recorder`).
fn record_output(inner: &Inner, session_id: &SessionId, chunk: Vec<u8>) {
    let mut sessions = inner.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(entry) = sessions.get_mut(session_id) {
        entry.buffer.push(chunk);
    }
    drop(sessions);
    enforce_process_ceiling(inner);
}

/// Evicts oldest chunks from the oldest-hidden session first until the
/// process-wide ceiling is satisfied.
fn enforce_process_ceiling(inner: &Inner) {
    let mut sessions = inner.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    loop {
        let total: usize = sessions.values().map(|entry| entry.buffer.total_bytes()).sum();
        if total <= inner.max_process_bytes {
            break;
        }
        let victim = sessions.iter_mut().filter(|(_, entry)| !entry.buffer.is_visible()).min_by_key(|(_, entry)| entry.buffer.non_visible_since());
        match victim {
            Some((_, entry)) => {
                if entry.buffer.evict_oldest() > 0 {
                    continue;
                } else {
                    break;
                }
            }
            None => break,
        }
    }
}

impl Default for SessionHost {
    fn default() -> Self {
        let settings = crate::config::settings();
        Self::from_settings(&settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_title_suffixes_on_collision() {
        let host = SessionHost::new(1024, 100, 1024 * 1024);
        let first = host.open_local("myhost", LocalConfig::default());
        // Spawning a real shell may not be available in a sandboxed test
        // runner; only assert the naming behaviour when it succeeds.
        if let Ok(first_id) = first {
            let second = host.open_local("myhost", LocalConfig::default()).expect("second spawn");
            let first_meta = host.metadata(&first_id).unwrap();
            let second_meta = host.metadata(&second).unwrap();
            assert_eq!(first_meta.title, "myhost");
            assert_eq!(second_meta.title, "myhost_1");
            host.close(&first_id).ok();
            host.close(&second).ok();
        }
    }

    #[test]
    fn unknown_session_operations_report_not_found() {
        let host = SessionHost::new(1024, 100, 1024 * 1024);
        let bogus = SessionId::new();
        assert!(matches!(host.write(&bogus, b"x"), Err(SessionError::NotFound(_))));
        assert!(matches!(host.resize(&bogus, 80, 24), Err(SessionError::NotFound(_))));
        assert!(matches!(host.close(&bogus), Err(SessionError::NotFound(_))));
    }

    #[test]
    fn resize_rejects_dimensions_below_two() {
        let host = SessionHost::new(1024, 100, 1024 * 1024);
        let bogus = SessionId::new();
        assert!(matches!(host.resize(&bogus, 1, 24), Err(SessionError::InvalidOperation(_))));
        assert!(matches!(host.resize(&bogus, 80, 1), Err(SessionError::InvalidOperation(_))));
    }

    #[test]
    fn reconnect_on_an_active_session_is_a_no_op_error() {
        let host = SessionHost::new(1024, 100, 1024 * 1024);
        if let Ok(id) = host.open_local("shell", LocalConfig::default()) {
            let err = host.reconnect(&id, Duration::from_secs(1)).unwrap_err();
            assert!(matches!(err, SessionError::InvalidOperation(_)));
            host.close(&id).ok();
        }
    }

    #[test]
    fn mark_disconnected_keeps_the_session_registered() {
        let host = SessionHost::new(1024, 100, 1024 * 1024);
        // Exercises the same state transition an SSH reader's own exit
        // would trigger, without needing a real network connection.
        if let Ok(id) = host.open_local("shell", LocalConfig::default()) {
            mark_disconnected(&host.inner, &id);
            let meta = host.metadata(&id).expect("session stays registered after a non-user disconnect");
            assert_eq!(meta.state, SessionState::Disconnected);
            host.close(&id).ok();
        }
    }
}
