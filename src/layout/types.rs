//! Layout tree node types.

use crate::session::SessionId;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaneId(String);

impl PaneId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PaneId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SplitId(String);

impl SplitId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SplitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SplitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// "Horizontal" stacks children vertically (a horizontal divider between
/// them); "Vertical" sits children side by side — naming the divider's
/// orientation, not the more common screen-reader meaning of the words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Top,
    Bottom,
    Left,
    Right,
}

impl Direction {
    pub fn orientation_placement(self) -> (Orientation, Placement) {
        match self {
            Direction::Top => (Orientation::Horizontal, Placement::Before),
            Direction::Bottom => (Orientation::Horizontal, Placement::After),
            Direction::Left => (Orientation::Vertical, Placement::Before),
            Direction::Right => (Orientation::Vertical, Placement::After),
        }
    }

    /// Picks the edge with the smallest distance from `(x, y)` inside a
    /// `(w, h)` rectangle. Ties broken top, bottom, left, right.
    pub fn from_drop_point(x: f64, y: f64, w: f64, h: f64) -> Direction {
        let to_top = y;
        let to_bottom = h - y;
        let to_left = x;
        let to_right = w - x;
        let candidates = [(Direction::Top, to_top), (Direction::Bottom, to_bottom), (Direction::Left, to_left), (Direction::Right, to_right)];
        candidates.into_iter().min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal)).map(|(direction, _)| direction).unwrap_or(Direction::Top)
    }
}

/// A layout tree node: either a leaf pane hosting one session, or a split
/// holding two or more children and a matching size vector (percentages
/// summing to 100).
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Pane { id: PaneId, session_id: SessionId },
    Split { id: SplitId, orientation: Orientation, children: Vec<Node>, sizes: Vec<f64> },
}

impl Node {
    pub fn pane(session_id: SessionId) -> Node {
        Node::Pane { id: PaneId::new(), session_id }
    }

    pub fn is_pane(&self) -> bool {
        matches!(self, Node::Pane { .. })
    }

    /// Every pane id reachable from this node, in depth-first order.
    pub fn pane_ids(&self) -> Vec<PaneId> {
        match self {
            Node::Pane { id, .. } => vec![id.clone()],
            Node::Split { children, .. } => children.iter().flat_map(Node::pane_ids).collect(),
        }
    }

    /// Every session id reachable from this node, in depth-first order.
    pub fn session_ids(&self) -> Vec<SessionId> {
        match self {
            Node::Pane { session_id, .. } => vec![session_id.clone()],
            Node::Split { children, .. } => children.iter().flat_map(Node::session_ids).collect(),
        }
    }
}
