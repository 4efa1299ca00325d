//! Shadow nodes mirroring the expanded portion of the model.

use slotmap::new_key_type;

use crate::geometry::Rect;
use crate::model::TreePath;

new_key_type! {
    /// Arena handle of a cached node.
    pub(crate) struct NodeKey;
}

/// Cached layout state for one model value.
///
/// A preferred height of zero marks the size as stale; it is recomputed the
/// next time the node is measured.
pub(crate) struct ShadowNode<V> {
    pub(crate) value: V,
    pub(crate) path: TreePath<V>,
    pub(crate) parent: Option<NodeKey>,
    /// Loaded children in model order; populated iff `ever_expanded`.
    pub(crate) children: Vec<NodeKey>,
    pub(crate) expanded: bool,
    pub(crate) ever_expanded: bool,
    /// Index in the visible row list, `None` when not shown.
    pub(crate) row: Option<usize>,
    pub(crate) x_origin: i32,
    pub(crate) y_origin: i32,
    pub(crate) preferred_width: i32,
    pub(crate) preferred_height: i32,
}

impl<V: Clone> ShadowNode<V> {
    pub(crate) fn new(path: TreePath<V>, parent: Option<NodeKey>) -> Self {
        Self {
            value: path.last().clone(),
            path,
            parent,
            children: Vec::new(),
            expanded: false,
            ever_expanded: false,
            row: None,
            x_origin: 0,
            y_origin: 0,
            preferred_width: 0,
            preferred_height: 0,
        }
    }
}

impl<V> ShadowNode<V> {
    pub(crate) fn depth(&self) -> usize {
        self.path.depth()
    }

    pub(crate) fn has_valid_size(&self) -> bool {
        self.preferred_height != 0
    }

    pub(crate) fn mark_size_invalid(&mut self) {
        self.preferred_height = 0;
    }

    /// Applies a measurement; `None` or a zero height leaves the node stale.
    ///
    /// Returns `false` when the node could not be measured.
    pub(crate) fn apply_bounds(&mut self, bounds: Option<Rect>, fixed_height: Option<i32>) -> bool {
        match bounds {
            Some(rect) if rect.height != 0 => {
                self.x_origin = rect.x;
                self.preferred_width = rect.width;
                self.preferred_height = fixed_height.unwrap_or(rect.height);
                true
            }
            _ => {
                self.x_origin = 0;
                self.preferred_width = 0;
                self.preferred_height = 0;
                false
            }
        }
    }
}
