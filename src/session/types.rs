//! Session identity, configuration and state.

use chrono::{DateTime, Local};
use secrecy::SecretString;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Stable opaque session identifier, assigned at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    pub(crate) fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Configuration needed to (re)open a local PTY session.
#[derive(Debug, Clone, Default)]
pub struct LocalConfig {
    pub shell: Option<String>,
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
}

/// Configuration needed to (re)open an SSH session. This is the source of
/// truth `reconnect` reuses to dial again.
#[derive(Debug, Clone)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Option<SecretString>,
    pub private_key: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum SessionKind {
    Local(LocalConfig),
    Ssh(SshConfig),
}

impl SessionKind {
    pub fn is_local(&self) -> bool {
        matches!(self, SessionKind::Local(_))
    }

    pub fn is_ssh(&self) -> bool {
        matches!(self, SessionKind::Ssh(_))
    }
}

/// Session lifecycle state. Monotonic except the explicit
/// `Disconnected -> Active` transition performed by `reconnect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Disconnected,
    Closed,
}

/// A snapshot of a session's externally-visible metadata — what
/// `Session Host::metadata` returns. Carries no I/O handles; those stay
/// owned exclusively by the host's internal registry.
#[derive(Debug, Clone)]
pub struct SessionMetadata {
    pub id: SessionId,
    pub title: String,
    pub kind: SessionKind,
    pub created_at: DateTime<Local>,
    pub state: SessionState,
}
