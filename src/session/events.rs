//! The Session Host's event bus.
//!
//! Multi-consumer, ordered per session, unordered across sessions.
//! Subscribers come and go freely — a pane detaching because it went
//! invisible simply drops its receiver; nothing on the publish side needs
//! to know.

use super::types::SessionId;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Output { session_id: SessionId, data: Vec<u8> },
    Disconnected { session_id: SessionId },
    ReconnectNeeded { session_id: SessionId },
    Reconnected { session_id: SessionId },
    Closed { session_id: SessionId },
}

impl SessionEvent {
    pub fn session_id(&self) -> &SessionId {
        match self {
            SessionEvent::Output { session_id, .. }
            | SessionEvent::Disconnected { session_id }
            | SessionEvent::ReconnectNeeded { session_id }
            | SessionEvent::Reconnected { session_id }
            | SessionEvent::Closed { session_id } => session_id,
        }
    }
}

/// Which events a subscriber cares about. `All` is the common case for the
/// front-of-house adapter; a UI status strip might subscribe to
/// `Lifecycle` only to avoid paying for byte copies it will never render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionKind {
    All,
    OutputOnly,
    LifecycleOnly,
}

impl SubscriptionKind {
    fn accepts(self, event: &SessionEvent) -> bool {
        match self {
            SubscriptionKind::All => true,
            SubscriptionKind::OutputOnly => matches!(event, SessionEvent::Output { .. }),
            SubscriptionKind::LifecycleOnly => !matches!(event, SessionEvent::Output { .. }),
        }
    }
}

struct Subscriber {
    kind: SubscriptionKind,
    tx: Sender<SessionEvent>,
}

#[derive(Default)]
pub(crate) struct EventBus {
    subscribers: Mutex<HashMap<SessionId, Vec<Subscriber>>>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscribe(&self, session_id: &SessionId, kind: SubscriptionKind) -> Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.entry(session_id.clone()).or_default().push(Subscriber { kind, tx });
        rx
    }

    /// Publish an event to every live subscriber for its session. Dead
    /// (disconnected) subscribers are pruned on the way through.
    pub(crate) fn publish(&self, event: SessionEvent) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(list) = subscribers.get_mut(event.session_id()) {
            list.retain(|subscriber| !subscriber.kind.accepts(&event) || subscriber.tx.send(event.clone()).is_ok());
        }
    }

    pub(crate) fn drop_session(&self, session_id: &SessionId) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.remove(session_id);
    }
}
