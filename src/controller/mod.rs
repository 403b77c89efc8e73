//! Tab/Workspace Controller — turns user intents into Session Host calls
//! and Layout Engine transformations, and keeps the `World`'s tab/focus
//! invariants. Grounded on `color-ssh`'s `AppState`, which
//! plays the same "one struct, one method per intent" role for its flat
//! tab list; `World` generalizes that to the tree-shaped layout.

mod types;

pub use types::{ControllerError, DragKind, DragRef, DropPreview, DragState, Tab, TabId};

use crate::config;
use crate::layout::{self, Direction, Node, PaneId};
use crate::session::{LocalConfig, SessionHost, SessionId, SshConfig};
use std::time::{Duration, Instant};

/// What kind of session a new pane should open (used by `split_pane`,
/// `new_local_tab`/`new_ssh_tab`).
pub enum NewSessionSpec {
    Local(LocalConfig),
    Ssh(SshConfig, Duration),
}

impl NewSessionSpec {
    fn open(&self, sessions: &SessionHost, title: impl Into<String>) -> Result<SessionId, ControllerError> {
        match self {
            NewSessionSpec::Local(config) => Ok(sessions.open_local(title, config.clone())?),
            NewSessionSpec::Ssh(config, timeout) => Ok(sessions.open_ssh(title, config.clone(), *timeout)?),
        }
    }
}

/// Owns the tab list and drag state; delegates session I/O to the
/// `Session Host` it was built with and tree edits to the Layout Engine.
/// Not internally synchronized — a caller sharing a `World` across threads
/// holds it behind its own single lock.
pub struct World {
    pub sessions: SessionHost,
    pub tabs: Vec<Tab>,
    pub active_tab: Option<TabId>,
    pub active_pane: Option<PaneId>,
    /// Drives a connecting-overlay UI affordance while a dial is in
    /// flight. `open_local`/`open_ssh` are currently synchronous, so a
    /// caller that wants the overlay to show must set this itself before
    /// issuing the call and clear it after; nothing here sets it yet.
    pub connecting_session_id: Option<SessionId>,
    drag: DragState,
}

impl World {
    pub fn new(sessions: SessionHost) -> Self {
        Self { sessions, tabs: Vec::new(), active_tab: None, active_pane: None, connecting_session_id: None, drag: DragState::Idle }
    }

    fn tab_index(&self, tab_id: &TabId) -> Result<usize, ControllerError> {
        self.tabs.iter().position(|tab| &tab.id == tab_id).ok_or_else(|| ControllerError::TabNotFound(tab_id.clone()))
    }

    fn find_owning_tab(&self, pane_id: &PaneId) -> Option<usize> {
        self.tabs.iter().position(|tab| layout::find(&tab.layout, pane_id.as_str()).is_some())
    }

    fn pane_session_id(&self, tab: &Tab, pane_id: &PaneId) -> Result<SessionId, ControllerError> {
        let (_, node) = layout::find(&tab.layout, pane_id.as_str()).ok_or_else(|| ControllerError::PaneNotFound(pane_id.clone()))?;
        match node {
            Node::Pane { session_id, .. } => Ok(session_id.clone()),
            Node::Split { .. } => Err(ControllerError::InvalidOperation("target id names a split, not a pane")),
        }
    }

    fn focus(&mut self, tab_id: TabId, pane_id: Option<PaneId>) {
        if let Ok(index) = self.tab_index(&tab_id) {
            self.tabs[index].last_active_pane = pane_id.clone();
        }
        self.active_tab = Some(tab_id);
        self.active_pane = pane_id;
    }

    /// Picks a successor tab after one is removed: next by index, else
    /// previous, else none.
    fn activate_neighbor(&mut self, removed_index: usize) {
        let next = if removed_index < self.tabs.len() {
            Some(removed_index)
        } else if removed_index > 0 {
            Some(removed_index - 1)
        } else {
            None
        };
        match next.and_then(|index| self.tabs.get(index)) {
            Some(tab) => {
                let id = tab.id.clone();
                let pane = tab.last_active_pane.clone();
                self.focus(id, pane);
            }
            None => {
                self.active_tab = None;
                self.active_pane = None;
            }
        }
    }

    // ---- intents --------------------------------------------------

    pub fn new_local_tab(&mut self, title: impl Into<String>, config: LocalConfig) -> Result<TabId, ControllerError> {
        let title = title.into();
        let session_id = self.sessions.open_local(title.clone(), config)?;
        self.push_single_pane_tab(title, session_id)
    }

    pub fn new_ssh_tab(&mut self, title: impl Into<String>, config: SshConfig, connect_timeout: Duration) -> Result<TabId, ControllerError> {
        let title = title.into();
        let session_id = self.sessions.open_ssh(title.clone(), config, connect_timeout)?;
        self.push_single_pane_tab(title, session_id)
    }

    fn push_single_pane_tab(&mut self, title: String, session_id: SessionId) -> Result<TabId, ControllerError> {
        let tab = Tab::new(title, Node::pane(session_id));
        let tab_id = tab.id.clone();
        let pane = tab.last_active_pane.clone();
        self.tabs.push(tab);
        self.focus(tab_id.clone(), pane);
        Ok(tab_id)
    }

    pub fn close_tab(&mut self, tab_id: &TabId) -> Result<(), ControllerError> {
        let index = self.tab_index(tab_id)?;
        for session_id in self.tabs[index].layout.session_ids() {
            self.sessions.close(&session_id).ok();
        }
        self.tabs.remove(index);
        if self.active_tab.as_ref() == Some(tab_id) {
            self.activate_neighbor(index);
        }
        Ok(())
    }

    pub fn set_active_tab(&mut self, tab_id: &TabId) -> Result<(), ControllerError> {
        let index = self.tab_index(tab_id)?;
        let pane = self.tabs[index].last_active_pane.clone();
        self.focus(tab_id.clone(), pane);
        Ok(())
    }

    pub fn set_active_pane(&mut self, pane_id: &PaneId) -> Result<(), ControllerError> {
        let index = self.find_owning_tab(pane_id).ok_or_else(|| ControllerError::PaneNotFound(pane_id.clone()))?;
        let tab_id = self.tabs[index].id.clone();
        self.focus(tab_id, Some(pane_id.clone()));
        Ok(())
    }

    pub fn rename_tab(&mut self, tab_id: &TabId, title: impl Into<String>) -> Result<(), ControllerError> {
        let index = self.tab_index(tab_id)?;
        self.tabs[index].title = title.into();
        Ok(())
    }

    pub fn reorder_tabs(&mut self, from_index: usize, to_index: usize) -> Result<(), ControllerError> {
        if from_index >= self.tabs.len() || to_index >= self.tabs.len() {
            return Err(ControllerError::InvalidOperation("reorder index out of bounds"));
        }
        let tab = self.tabs.remove(from_index);
        self.tabs.insert(to_index, tab);
        Ok(())
    }

    /// Only single-pane tabs can be duplicated; duplicating a tab whose
    /// layout root is a split is rejected rather than guessing at a
    /// semantics for it.
    pub fn duplicate_tab(&mut self, tab_id: &TabId) -> Result<TabId, ControllerError> {
        let index = self.tab_index(tab_id)?;
        let Node::Pane { session_id, .. } = &self.tabs[index].layout else {
            return Err(ControllerError::InvalidOperation("duplicating a multi-pane tab is not supported"));
        };
        let title = self.tabs[index].title.clone();
        let new_session_id = self.sessions.duplicate(session_id, default_connect_timeout())?;
        self.push_single_pane_tab(title, new_session_id)
    }

    pub fn split_pane(&mut self, tab_id: &TabId, pane_id: &PaneId, direction: Direction, new_session: NewSessionSpec) -> Result<PaneId, ControllerError> {
        let index = self.tab_index(tab_id)?;
        if layout::find(&self.tabs[index].layout, pane_id.as_str()).is_none() {
            return Err(ControllerError::PaneNotFound(pane_id.clone()));
        }
        let session_id = new_session.open(&self.sessions, self.tabs[index].title.clone())?;
        let new_node = Node::pane(session_id);
        let new_pane_id = new_node.pane_ids().remove(0);
        self.tabs[index].layout = layout::move_into(&self.tabs[index].layout, pane_id.as_str(), new_node, direction);
        self.focus(tab_id.clone(), Some(new_pane_id.clone()));
        Ok(new_pane_id)
    }

    pub fn close_pane(&mut self, tab_id: &TabId, pane_id: &PaneId, skip_backend_close: bool) -> Result<(), ControllerError> {
        let index = self.tab_index(tab_id)?;
        let session_id = self.pane_session_id(&self.tabs[index], pane_id)?;
        if !skip_backend_close {
            self.sessions.close(&session_id).ok();
        }

        match layout::remove(&self.tabs[index].layout, pane_id.as_str()) {
            Some(new_layout) => {
                self.tabs[index].layout = new_layout;
                let remaining_pane = self.tabs[index].layout.pane_ids().into_iter().next();
                if self.active_pane.as_ref() == Some(pane_id) {
                    let tid = self.tabs[index].id.clone();
                    self.focus(tid, remaining_pane);
                } else if self.tabs[index].last_active_pane.as_ref() == Some(pane_id) {
                    self.tabs[index].last_active_pane = remaining_pane;
                }
            }
            None => {
                self.tabs.remove(index);
                if self.active_tab.as_ref() == Some(tab_id) {
                    self.activate_neighbor(index);
                }
            }
        }
        Ok(())
    }

    pub fn move_pane(&mut self, source_tab: &TabId, source_pane: &PaneId, target_tab: &TabId, target_pane: &PaneId, direction: Direction) -> Result<(), ControllerError> {
        if source_tab == target_tab && source_pane == target_pane {
            return Ok(());
        }

        let source_index = self.tab_index(source_tab)?;
        let session_id = self.pane_session_id(&self.tabs[source_index], source_pane)?;

        if source_tab == target_tab {
            let detached = layout::remove(&self.tabs[source_index].layout, source_pane.as_str()).ok_or(ControllerError::InvalidOperation("moving the only pane in a tab onto itself"))?;
            let moved_node = Node::Pane { id: source_pane.clone(), session_id };
            self.tabs[source_index].layout = layout::move_into(&detached, target_pane.as_str(), moved_node, direction);
            self.focus(target_tab.clone(), Some(source_pane.clone()));
            return Ok(());
        }

        let target_index = self.tab_index(target_tab)?;
        let detached = layout::remove(&self.tabs[source_index].layout, source_pane.as_str());
        let moved_node = Node::pane(session_id);
        let new_pane_id = moved_node.pane_ids().remove(0);
        self.tabs[target_index].layout = layout::move_into(&self.tabs[target_index].layout, target_pane.as_str(), moved_node, direction);

        match detached {
            Some(layout) => self.tabs[source_index].layout = layout,
            None => {
                self.tabs.remove(source_index);
            }
        }
        self.focus(target_tab.clone(), Some(new_pane_id));
        Ok(())
    }

    pub fn extract_pane_to_new_tab(&mut self, source_tab: &TabId, pane_id: &PaneId) -> Result<TabId, ControllerError> {
        let source_index = self.tab_index(source_tab)?;
        let (_, node) = layout::find(&self.tabs[source_index].layout, pane_id.as_str()).ok_or_else(|| ControllerError::PaneNotFound(pane_id.clone()))?;
        let extracted = node.clone();
        let title = self.tabs[source_index].title.clone();

        match layout::remove(&self.tabs[source_index].layout, pane_id.as_str()) {
            Some(remaining) => self.tabs[source_index].layout = remaining,
            None => {
                self.tabs.remove(source_index);
            }
        }

        let new_tab = Tab::new(title, extracted);
        let new_tab_id = new_tab.id.clone();
        let pane = new_tab.last_active_pane.clone();
        self.tabs.push(new_tab);
        self.focus(new_tab_id.clone(), pane);
        Ok(new_tab_id)
    }

    pub fn merge_tab(&mut self, source_tab: &TabId, target_tab: &TabId, target_pane: &PaneId, direction: Direction) -> Result<(), ControllerError> {
        let source_index = self.tab_index(source_tab)?;
        let target_index = self.tab_index(target_tab)?;
        let source_layout = self.tabs[source_index].layout.clone();

        self.tabs[target_index].layout = layout::move_into(&self.tabs[target_index].layout, target_pane.as_str(), source_layout, direction);
        self.tabs.remove(source_index);
        let target_pane_for_focus = self.tabs[self.tab_index(target_tab)?].last_active_pane.clone();
        self.focus(target_tab.clone(), target_pane_for_focus);
        Ok(())
    }

    pub fn resize_split(&mut self, tab_id: &TabId, split_id: &str, sizes: Vec<f64>) -> Result<(), ControllerError> {
        let index = self.tab_index(tab_id)?;
        let min_size_percent = config::settings().min_split_size_percent;
        self.tabs[index].layout = layout::resize_split(&self.tabs[index].layout, split_id, sizes, min_size_percent)?;
        Ok(())
    }

    /// Reacts to `SessionEvent::Closed` from the event bus: finds the pane
    /// still referencing that session and closes it without re-issuing a
    /// backend close.
    pub fn handle_session_closed(&mut self, session_id: &SessionId) {
        let owner = self.tabs.iter().find_map(|tab| {
            tab.layout.pane_ids().into_iter().find(|pane_id| self.pane_session_id(tab, pane_id).map(|sid| &sid == session_id).unwrap_or(false)).map(|pane_id| (tab.id.clone(), pane_id))
        });
        if let Some((tab_id, pane_id)) = owner {
            self.close_pane(&tab_id, &pane_id, true).ok();
        }
    }

    // ---- drag and drop ---------------------------------------------

    pub fn drag_start(&mut self, kind: DragKind, source: DragRef) {
        self.drag = DragState::DragStart { kind, source };
    }

    pub fn drag_over(&mut self, target: DragRef, pointer: (f64, f64), rect: (f64, f64)) {
        let (kind, source) = match &self.drag {
            DragState::DragStart { kind, source } => (*kind, source.clone()),
            DragState::DragOver { kind, source, .. } => (*kind, source.clone()),
            DragState::Idle => return,
        };

        let same_target_as_before = matches!(&self.drag, DragState::DragOver { preview, .. } if preview.target == target);
        let hover_started_at = match &self.drag {
            DragState::DragOver { hover_started_at, .. } if same_target_as_before => *hover_started_at,
            _ => Instant::now(),
        };
        let mut auto_switched = matches!(&self.drag, DragState::DragOver { auto_switched, .. } if same_target_as_before && *auto_switched);

        let direction = match &target {
            DragRef::Pane(..) => Some(Direction::from_drop_point(pointer.0, pointer.1, rect.0, rect.1)),
            DragRef::Tab(_) => None,
        };

        if let DragRef::Tab(tab_id) = &target
            && !auto_switched
            && hover_started_at.elapsed() >= Duration::from_millis(config::settings().tab_hover_activate_ms)
        {
            self.set_active_tab(tab_id).ok();
            auto_switched = true;
        }

        self.drag = DragState::DragOver { kind, source, preview: DropPreview { target, direction, insertion_index: None }, hover_started_at, auto_switched };
    }

    pub fn drop_drag(&mut self) -> Result<(), ControllerError> {
        let DragState::DragOver { source, preview, .. } = std::mem::replace(&mut self.drag, DragState::Idle) else {
            return Ok(());
        };
        let direction = preview.direction.unwrap_or(Direction::Right);

        match (source, preview.target) {
            (DragRef::Tab(from), DragRef::Tab(to)) => {
                let from_index = self.tab_index(&from)?;
                let to_index = self.tab_index(&to)?;
                self.reorder_tabs(from_index, to_index)
            }
            (DragRef::Tab(source_tab), DragRef::Pane(target_tab, target_pane)) => self.merge_tab(&source_tab, &target_tab, &target_pane, direction),
            (DragRef::Pane(source_tab, source_pane), DragRef::Tab(_)) => self.extract_pane_to_new_tab(&source_tab, &source_pane).map(|_| ()),
            (DragRef::Pane(source_tab, source_pane), DragRef::Pane(target_tab, target_pane)) => self.move_pane(&source_tab, &source_pane, &target_tab, &target_pane, direction),
        }
    }

    pub fn cancel_drag(&mut self) {
        self.drag = DragState::Idle;
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(config::settings().ssh_connect_timeout_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionHost;

    fn world() -> World {
        World::new(SessionHost::new(1024, 100, 1024 * 1024))
    }

    #[test]
    fn close_tab_on_unknown_id_reports_not_found() {
        let mut world = world();
        let bogus = TabId::new();
        assert!(matches!(world.close_tab(&bogus), Err(ControllerError::TabNotFound(_))));
    }

    #[test]
    fn reorder_tabs_rejects_out_of_bounds_indices() {
        let mut world = world();
        assert!(matches!(world.reorder_tabs(0, 1), Err(ControllerError::InvalidOperation(_))));
    }

    #[test]
    fn duplicate_tab_rejects_multi_pane_layout() {
        let mut world = world();
        let tab = Tab::new("demo", layout::Node::Split { id: layout::SplitId::new(), orientation: layout::Orientation::Vertical, children: vec![Node::pane(SessionId::new()), Node::pane(SessionId::new())], sizes: vec![50.0, 50.0] });
        let tab_id = tab.id.clone();
        world.tabs.push(tab);
        assert!(matches!(world.duplicate_tab(&tab_id), Err(ControllerError::InvalidOperation(_))));
    }

    #[test]
    fn move_pane_within_same_tab_keeps_the_pane_id() {
        let mut world = world();
        let source = Node::pane(SessionId::new());
        let Node::Pane { id: source_pane, .. } = &source else { unreachable!() };
        let source_pane = source_pane.clone();
        let target = Node::pane(SessionId::new());
        let Node::Pane { id: target_pane, .. } = &target else { unreachable!() };
        let target_pane = target_pane.clone();

        let tab = Tab::new("demo", layout::Node::Split { id: layout::SplitId::new(), orientation: layout::Orientation::Vertical, children: vec![source, target], sizes: vec![50.0, 50.0] });
        let tab_id = tab.id.clone();
        world.tabs.push(tab);

        world.move_pane(&tab_id, &source_pane, &tab_id, &target_pane, Direction::Right).expect("move within tab");

        let tab = &world.tabs[world.tab_index(&tab_id).unwrap()];
        assert!(layout::find(&tab.layout, source_pane.as_str()).is_some(), "moved pane should keep referencing the same PaneId");
    }
}
