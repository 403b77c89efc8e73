//! Pure total transformations over layout trees. Every
//! function takes a tree by reference and returns a new tree; nothing
//! here mutates in place or performs I/O.

use super::types::{Direction, Node, Orientation, Placement};
use std::fmt;

pub const MIN_SIZE_PERCENT: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    NotFound(String),
    SizeCountMismatch { expected: usize, got: usize },
    SizeTooSmall(f64),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::NotFound(id) => write!(f, "no node with id {id}"),
            LayoutError::SizeCountMismatch { expected, got } => write!(f, "expected {expected} sizes, got {got}"),
            LayoutError::SizeTooSmall(value) => write!(f, "size {value} is below the minimum"),
        }
    }
}

impl std::error::Error for LayoutError {}

fn node_id(node: &Node) -> &str {
    match node {
        Node::Pane { id, .. } => id.as_str(),
        Node::Split { id, .. } => id.as_str(),
    }
}

/// Locates the child-index path from `root` down to the node whose id is
/// `target_id`. Empty path means `root` itself.
pub fn find<'a>(root: &'a Node, target_id: &str) -> Option<(Vec<usize>, &'a Node)> {
    fn walk<'a>(node: &'a Node, target_id: &str, path: &mut Vec<usize>) -> Option<&'a Node> {
        if node_id(node) == target_id {
            return Some(node);
        }
        if let Node::Split { children, .. } = node {
            for (index, child) in children.iter().enumerate() {
                path.push(index);
                if let Some(found) = walk(child, target_id, path) {
                    return Some(found);
                }
                path.pop();
            }
        }
        None
    }

    let mut path = Vec::new();
    let found = walk(root, target_id, &mut path)?;
    Some((path, found))
}

/// Rescales a size vector so it sums to exactly 100, preserving relative
/// proportions. Falls back to equal shares if the input sums to zero.
fn renormalize(sizes: &mut [f64]) {
    let total: f64 = sizes.iter().sum();
    if total <= 0.0 {
        let share = 100.0 / sizes.len().max(1) as f64;
        sizes.iter_mut().for_each(|size| *size = share);
        return;
    }
    sizes.iter_mut().for_each(|size| *size = *size / total * 100.0);
}

/// Substitutes the node with id `target_id` for `replacement`, wherever it
/// occurs. Total: if `target_id` isn't found, returns `root` unchanged.
pub fn replace(root: &Node, target_id: &str, replacement: Node) -> Node {
    if node_id(root) == target_id {
        return replacement;
    }
    match root {
        Node::Pane { .. } => root.clone(),
        Node::Split { id, orientation, children, sizes } => {
            Node::Split { id: id.clone(), orientation: *orientation, children: children.iter().map(|child| replace(child, target_id, replacement.clone())).collect(), sizes: sizes.clone() }
        }
    }
}

/// Removes the subtree rooted at `target_id`. If the parent split is left
/// with one child, that child replaces the split (collapse). If the whole
/// tree is the target, returns `None`.
pub fn remove(root: &Node, target_id: &str) -> Option<Node> {
    if find(root, target_id).is_none() {
        return Some(root.clone());
    }
    if node_id(root) == target_id {
        return None;
    }
    match root {
        Node::Pane { .. } => Some(root.clone()),
        Node::Split { id, orientation, children, sizes } => {
            let mut new_children = Vec::with_capacity(children.len());
            let mut new_sizes = Vec::with_capacity(sizes.len());

            for (child, size) in children.iter().zip(sizes.iter()) {
                if node_id(child) == target_id {
                    continue;
                }
                if let Some(surviving) = remove(child, target_id) {
                    new_children.push(surviving);
                    new_sizes.push(*size);
                }
            }

            if new_children.is_empty() {
                return None;
            }
            if new_children.len() == 1 {
                return Some(new_children.into_iter().next().unwrap());
            }
            renormalize(&mut new_sizes);
            Some(Node::Split { id: id.clone(), orientation: *orientation, children: new_children, sizes: new_sizes })
        }
    }
}

/// Wraps the pane `target_pane_id` in a new split containing it and
/// `new_node`, ordered by `placement`. Total: a missing target id leaves
/// `root` unchanged.
pub fn split(root: &Node, target_pane_id: &str, orientation: Orientation, new_node: Node, placement: Placement) -> Node {
    if node_id(root) == target_pane_id {
        let (first, second) = match placement {
            Placement::Before => (new_node, root.clone()),
            Placement::After => (root.clone(), new_node),
        };
        return Node::Split { id: super::types::SplitId::new(), orientation, children: vec![first, second], sizes: vec![50.0, 50.0] };
    }
    match root {
        Node::Pane { .. } => root.clone(),
        Node::Split { id, orientation: split_orientation, children, sizes } => Node::Split {
            id: id.clone(),
            orientation: *split_orientation,
            children: children.iter().map(|child| split(child, target_pane_id, orientation, new_node.clone(), placement)).collect(),
            sizes: sizes.clone(),
        },
    }
}

/// Convenience over `split`: maps `direction` to orientation + placement.
pub fn move_into(root: &Node, target_pane_id: &str, subtree: Node, direction: Direction) -> Node {
    let (orientation, placement) = direction.orientation_placement();
    split(root, target_pane_id, orientation, subtree, placement)
}

/// Sets a split's size vector. No-op (returns `root` unchanged) if the
/// length doesn't match the split's child count or any entry is below
/// `min_size_percent`; otherwise rescales to sum to 100.
pub fn resize_split(root: &Node, target_split_id: &str, mut sizes: Vec<f64>, min_size_percent: f64) -> Result<Node, LayoutError> {
    let Some((_, found)) = find(root, target_split_id) else {
        return Err(LayoutError::NotFound(target_split_id.to_string()));
    };
    let Node::Split { children, .. } = found else {
        return Err(LayoutError::NotFound(target_split_id.to_string()));
    };
    if sizes.len() != children.len() {
        return Err(LayoutError::SizeCountMismatch { expected: children.len(), got: sizes.len() });
    }
    renormalize(&mut sizes);
    if let Some(&too_small) = sizes.iter().find(|&&size| size < min_size_percent) {
        return Err(LayoutError::SizeTooSmall(too_small));
    }

    fn apply(node: &Node, target_split_id: &str, sizes: &[f64]) -> Node {
        match node {
            Node::Pane { .. } => node.clone(),
            Node::Split { id, orientation, children, sizes: existing_sizes } => {
                if id.as_str() == target_split_id {
                    Node::Split { id: id.clone(), orientation: *orientation, children: children.clone(), sizes: sizes.to_vec() }
                } else {
                    Node::Split { id: id.clone(), orientation: *orientation, children: children.iter().map(|child| apply(child, target_split_id, sizes)).collect(), sizes: existing_sizes.clone() }
                }
            }
        }
    }

    Ok(apply(root, target_split_id, &sizes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionId;

    fn pane() -> Node {
        Node::pane(SessionId::new())
    }

    #[test]
    fn find_locates_nested_pane() {
        let leaf = pane();
        let leaf_id = node_id(&leaf).to_string();
        let root = Node::Split { id: super::super::types::SplitId::new(), orientation: Orientation::Vertical, children: vec![pane(), leaf], sizes: vec![50.0, 50.0] };
        let (path, found) = find(&root, &leaf_id).expect("pane should be found");
        assert_eq!(path, vec![1]);
        assert_eq!(node_id(found), leaf_id);
    }

    #[test]
    fn split_wraps_target_and_starts_fifty_fifty() {
        let original = pane();
        let original_id = node_id(&original).to_string();
        let new_node = pane();
        let result = split(&original, &original_id, Orientation::Vertical, new_node, Placement::After);
        match result {
            Node::Split { children, sizes, .. } => {
                assert_eq!(children.len(), 2);
                assert_eq!(sizes, vec![50.0, 50.0]);
                assert_eq!(node_id(&children[0]), original_id);
            }
            Node::Pane { .. } => panic!("expected split"),
        }
    }

    #[test]
    fn remove_collapses_split_with_one_surviving_child() {
        let a = pane();
        let a_id = node_id(&a).to_string();
        let b = pane();
        let b_id = node_id(&b).to_string();
        let root = Node::Split { id: super::super::types::SplitId::new(), orientation: Orientation::Horizontal, children: vec![a, b], sizes: vec![50.0, 50.0] };

        let result = remove(&root, &b_id).expect("one child should survive");
        assert_eq!(node_id(&result), a_id);
        assert!(result.is_pane());
    }

    #[test]
    fn remove_whole_tree_returns_none() {
        let only = pane();
        let only_id = node_id(&only).to_string();
        assert!(remove(&only, &only_id).is_none());
    }

    #[test]
    fn remove_renormalizes_sizes_of_survivors() {
        let children: Vec<Node> = (0..3).map(|_| pane()).collect();
        let victim_id = node_id(&children[1]).to_string();
        let root = Node::Split { id: super::super::types::SplitId::new(), orientation: Orientation::Vertical, children, sizes: vec![20.0, 60.0, 20.0] };

        let result = remove(&root, &victim_id).expect("two children remain");
        match result {
            Node::Split { sizes, children, .. } => {
                assert_eq!(children.len(), 2);
                let sum: f64 = sizes.iter().sum();
                assert!((sum - 100.0).abs() < 0.01);
            }
            Node::Pane { .. } => panic!("expected split with two survivors"),
        }
    }

    #[test]
    fn resize_split_rejects_count_mismatch() {
        let root = Node::Split { id: super::super::types::SplitId::new(), orientation: Orientation::Vertical, children: vec![pane(), pane()], sizes: vec![50.0, 50.0] };
        let split_id = node_id(&root).to_string();
        let err = resize_split(&root, &split_id, vec![30.0], MIN_SIZE_PERCENT).unwrap_err();
        assert_eq!(err, LayoutError::SizeCountMismatch { expected: 2, got: 1 });
    }

    #[test]
    fn resize_split_rejects_sizes_below_minimum() {
        let root = Node::Split { id: super::super::types::SplitId::new(), orientation: Orientation::Vertical, children: vec![pane(), pane()], sizes: vec![50.0, 50.0] };
        let split_id = node_id(&root).to_string();
        let err = resize_split(&root, &split_id, vec![1.0, 99.0], MIN_SIZE_PERCENT).unwrap_err();
        assert_eq!(err, LayoutError::SizeTooSmall(1.0));
    }

    #[test]
    fn resize_split_rejects_sizes_below_minimum_after_renormalizing() {
        // Neither input is individually below the minimum, but they sum to
        // 210, not 100; rescaled to sum 100 the second entry drops to
        // ~4.76%, below MIN_SIZE_PERCENT. The minimum check must see the
        // rescaled value, not the raw input.
        let root = Node::Split { id: super::super::types::SplitId::new(), orientation: Orientation::Vertical, children: vec![pane(), pane()], sizes: vec![50.0, 50.0] };
        let split_id = node_id(&root).to_string();
        let err = resize_split(&root, &split_id, vec![200.0, 10.0], MIN_SIZE_PERCENT).unwrap_err();
        assert!(matches!(err, LayoutError::SizeTooSmall(_)));
    }

    #[test]
    fn resize_split_rescales_to_one_hundred() {
        let root = Node::Split { id: super::super::types::SplitId::new(), orientation: Orientation::Vertical, children: vec![pane(), pane()], sizes: vec![50.0, 50.0] };
        let split_id = node_id(&root).to_string();
        let result = resize_split(&root, &split_id, vec![30.0, 30.0], MIN_SIZE_PERCENT).expect("valid resize");
        match result {
            Node::Split { sizes, .. } => {
                let sum: f64 = sizes.iter().sum();
                assert!((sum - 100.0).abs() < 0.01);
                assert!((sizes[0] - 50.0).abs() < 0.01);
            }
            Node::Pane { .. } => panic!("expected split"),
        }
    }

    #[test]
    fn direction_mapping_matches_spec_table() {
        assert_eq!(Direction::Top.orientation_placement(), (Orientation::Horizontal, Placement::Before));
        assert_eq!(Direction::Bottom.orientation_placement(), (Orientation::Horizontal, Placement::After));
        assert_eq!(Direction::Left.orientation_placement(), (Orientation::Vertical, Placement::Before));
        assert_eq!(Direction::Right.orientation_placement(), (Orientation::Vertical, Placement::After));
    }

    #[test]
    fn drop_zone_breaks_ties_top_bottom_left_right() {
        // Exact center of a square: all four distances equal, Top wins.
        assert_eq!(Direction::from_drop_point(50.0, 50.0, 100.0, 100.0), Direction::Top);
    }

    #[test]
    fn save_then_load_round_trip_preserves_shape() {
        let left = pane();
        let right = pane();
        let root = Node::Split { id: super::super::types::SplitId::new(), orientation: Orientation::Vertical, children: vec![left, right], sizes: vec![40.0, 60.0] };
        let cloned = root.clone();
        assert_eq!(root.pane_ids().len(), cloned.pane_ids().len());
    }
}
