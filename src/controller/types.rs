//! Tab and drag-and-drop types for the Controller.

use crate::layout::{Node, PaneId};
use crate::session::SessionError;
use std::fmt;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(String);

impl TabId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct Tab {
    pub id: TabId,
    pub title: String,
    pub layout: Node,
    pub(super) last_active_pane: Option<PaneId>,
}

impl Tab {
    pub(crate) fn new(title: impl Into<String>, layout: Node) -> Self {
        let root_pane = layout.pane_ids().into_iter().next();
        Self { id: TabId::new(), title: title.into(), layout, last_active_pane: root_pane }
    }
}

#[derive(Debug, Clone)]
pub enum ControllerError {
    Session(SessionError),
    Layout(crate::layout::LayoutError),
    TabNotFound(TabId),
    PaneNotFound(PaneId),
    InvalidOperation(&'static str),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::Session(err) => write!(f, "{err}"),
            ControllerError::Layout(err) => write!(f, "{err}"),
            ControllerError::TabNotFound(id) => write!(f, "no tab with id {id}"),
            ControllerError::PaneNotFound(id) => write!(f, "no pane with id {id}"),
            ControllerError::InvalidOperation(reason) => write!(f, "invalid operation: {reason}"),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<SessionError> for ControllerError {
    fn from(err: SessionError) -> Self {
        ControllerError::Session(err)
    }
}

impl From<crate::layout::LayoutError> for ControllerError {
    fn from(err: crate::layout::LayoutError) -> Self {
        ControllerError::Layout(err)
    }
}

/// What's being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Tab,
    Pane,
}

/// A stable reference to whatever a drag started from or is currently
/// hovering over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragRef {
    Tab(TabId),
    Pane(TabId, PaneId),
}

#[derive(Debug, Clone)]
pub struct DropPreview {
    pub target: DragRef,
    pub direction: Option<crate::layout::Direction>,
    pub insertion_index: Option<usize>,
}

/// Drag-and-drop reducer state. `Idle -> DragStart -> DragOver*
/// -> (Drop | Cancel)`.
#[derive(Debug, Clone)]
pub enum DragState {
    Idle,
    DragStart { kind: DragKind, source: DragRef },
    DragOver { kind: DragKind, source: DragRef, preview: DropPreview, hover_started_at: Instant, auto_switched: bool },
}

impl Default for DragState {
    fn default() -> Self {
        DragState::Idle
    }
}
