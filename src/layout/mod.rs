//! Layout Engine — pure, total transformations over pane/split trees.
//! Nothing in here touches the Session Host or does I/O;
//! identifiers are supplied by, or generated purely within, these
//! functions and never by a side channel.

mod ops;
mod types;

pub use ops::{LayoutError, MIN_SIZE_PERCENT, find, move_into, remove, replace, resize_split, split};
pub use types::{Direction, Node, Orientation, PaneId, Placement, SplitId};
