//! Model change handlers.
//!
//! Each handler patches the cached nodes and rows for one kind of model
//! notification, leaving the rest of the cache untouched.

use arbor_core::logging::{span_names, targets};

use super::cache::VariableHeightLayoutCache;
use super::node::NodeKey;
use crate::model::{TreeModel, TreeModelEvent, TreeModelEventKind};

/// Returns the indices ascending and de-duplicated, warning when the
/// sender did not provide them that way.
fn normalized_indices(indices: &[usize], kind: TreeModelEventKind) -> Vec<usize> {
    let mut sorted = indices.to_vec();
    if sorted.windows(2).any(|pair| pair[0] >= pair[1]) {
        tracing::warn!(
            target: targets::MODEL,
            ?kind,
            ?indices,
            "child indices not strictly ascending; normalizing"
        );
        sorted.sort_unstable();
        sorted.dedup();
    }
    sorted
}

impl<M: TreeModel> VariableHeightLayoutCache<M> {
    /// Dispatches `event` to the handler for `kind`.
    pub fn process_event(&mut self, kind: TreeModelEventKind, event: &TreeModelEvent<M::Value>) {
        let _span = tracing::trace_span!(
            target: targets::LAYOUT,
            span_names::MODEL_EVENT,
            ?kind,
            path = ?event.path
        )
        .entered();
        match kind {
            TreeModelEventKind::NodesChanged => self.tree_nodes_changed(event),
            TreeModelEventKind::NodesInserted => self.tree_nodes_inserted(event),
            TreeModelEventKind::NodesRemoved => self.tree_nodes_removed(event),
            TreeModelEventKind::StructureChanged => self.tree_structure_changed(event),
        }
    }

    /// Handles changed attributes of the children at `event.child_indices`
    /// of `event.path` (or of the root itself when no indices are given).
    ///
    /// Sizes are re-measured; positions in the tree do not change.
    pub fn tree_nodes_changed(&mut self, event: &TreeModelEvent<M::Value>) {
        let Some(parent) = self.resolve(&event.path, false) else {
            tracing::debug!(target: targets::LAYOUT, path = ?event.path, "change for uncached path dropped");
            return;
        };
        let Some(model) = self.model.clone() else {
            return;
        };

        self.refresh_size(parent);
        if self.nodes[parent].ever_expanded && !event.child_indices.is_empty() {
            let parent_value = self.nodes[parent].value.clone();
            for index in normalized_indices(&event.child_indices, TreeModelEventKind::NodesChanged) {
                let Some(&child) = self.nodes[parent].children.get(index) else {
                    tracing::debug!(target: targets::LAYOUT, index, "changed index past cached children");
                    continue;
                };
                if let Some(value) = model.child(&parent_value, index) {
                    if value != self.nodes[child].value {
                        self.reset_value(child, value);
                    }
                }
                self.refresh_size(child);
            }
        }

        if !self.is_fixed_row_height() {
            self.refresh_y_after(parent);
        }
        self.emit_rows_changed();
    }

    /// Handles children inserted under `event.path` at
    /// `event.child_indices` (positions after insertion).
    pub fn tree_nodes_inserted(&mut self, event: &TreeModelEvent<M::Value>) {
        if event.child_indices.is_empty() {
            return;
        }
        let Some(parent) = self.resolve(&event.path, false) else {
            tracing::debug!(target: targets::LAYOUT, path = ?event.path, "insert under uncached path dropped");
            return;
        };
        let Some(model) = self.model.clone() else {
            return;
        };
        let indices = normalized_indices(&event.child_indices, TreeModelEventKind::NodesInserted);

        if !self.nodes[parent].ever_expanded {
            // Only the expander of a parent that just got its first children changes.
            let count = model.child_count(&self.nodes[parent].value);
            if count == indices.len() {
                self.refresh_size(parent);
                if !self.is_fixed_row_height() && self.is_visible(parent) {
                    self.refresh_y_after(parent);
                }
            }
            return;
        }

        let old_child_count = self.nodes[parent].children.len();
        let make_visible = self.shows_children(parent);
        for index in indices {
            self.create_node_at(parent, index);
        }
        if old_child_count == 0 {
            self.refresh_size(parent);
        }
        if let Some(selection) = &self.selection_model {
            selection.reset_row_selection();
        }

        let first_children_shown = old_child_count == 0 && self.is_visible(parent);
        if !self.is_fixed_row_height() && (make_visible || first_children_shown) {
            self.refresh_y_after(parent);
            self.emit_rows_changed();
        } else if make_visible {
            self.emit_rows_changed();
        }
    }

    /// Handles children removed from `event.path`; `event.child_indices`
    /// are the positions they had before removal.
    pub fn tree_nodes_removed(&mut self, event: &TreeModelEvent<M::Value>) {
        if event.child_indices.is_empty() {
            return;
        }
        let Some(parent) = self.resolve(&event.path, false) else {
            tracing::debug!(target: targets::LAYOUT, path = ?event.path, "removal under uncached path dropped");
            return;
        };
        let Some(model) = self.model.clone() else {
            return;
        };

        if !self.nodes[parent].ever_expanded {
            if model.child_count(&self.nodes[parent].value) == 0 {
                self.refresh_size(parent);
                if !self.is_fixed_row_height() && self.is_visible(parent) {
                    self.refresh_y_after(parent);
                }
            }
            return;
        }

        let make_invisible = self.shows_children(parent);
        let indices = normalized_indices(&event.child_indices, TreeModelEventKind::NodesRemoved);
        for &index in indices.iter().rev() {
            let Some(&child) = self.nodes[parent].children.get(index) else {
                tracing::debug!(target: targets::LAYOUT, index, "removed index past cached children");
                continue;
            };
            if self.nodes[child].expanded {
                self.collapse_node(child, false);
            }
            if make_invisible {
                if let Some(row) = self.nodes[child].row {
                    self.rows.remove(row);
                    self.nodes[child].row = None;
                    self.reindex_rows_from(row);
                    if let Some(selection) = &self.selection_model {
                        selection.remove_selection_path(&self.nodes[child].path);
                    }
                }
            }
            self.remove_child_at(parent, index);
        }

        let now_childless = self.nodes[parent].children.is_empty();
        if now_childless {
            self.refresh_size(parent);
        }
        if let Some(selection) = &self.selection_model {
            selection.reset_row_selection();
        }

        let parent_shown_childless = now_childless && self.is_visible(parent);
        if !self.is_fixed_row_height() && (make_invisible || parent_shown_childless) {
            self.refresh_y_after(parent);
            self.emit_rows_changed();
        } else if make_invisible {
            self.emit_rows_changed();
        }
    }

    /// Handles an arbitrary change of the subtree at `event.path`.
    ///
    /// A change at the root (or any single-component path) rebuilds the
    /// whole cache; otherwise the node is dropped and recreated in place,
    /// expanded again if it was visible and expanded.
    pub fn tree_structure_changed(&mut self, event: &TreeModelEvent<M::Value>) {
        let changed = match self.resolve(&event.path, false) {
            Some(key) => Some(key),
            None if event.path.len() == 1 => self.root,
            None => None,
        };
        let Some(changed) = changed else {
            if event.path.len() == 1 {
                // No cached root yet; the model may have just gained one.
                self.rebuild();
            } else {
                tracing::debug!(target: targets::LAYOUT, path = ?event.path, "structure change for uncached path dropped");
            }
            return;
        };

        let Some(parent) = self.nodes[changed].parent else {
            tracing::debug!(target: targets::LAYOUT, "tree structure replaced; rebuilding");
            self.rebuild();
            return;
        };

        let was_expanded = self.nodes[changed].expanded;
        let old_row = self.nodes[changed].row;
        let Some(index) = self.nodes[parent].children.iter().position(|&c| c == changed) else {
            return;
        };

        if old_row.is_some() && was_expanded {
            self.collapse_node(changed, false);
        }
        if let Some(row) = old_row {
            self.rows.remove(row);
            self.nodes[changed].row = None;
            self.reindex_rows_from(row);
        }
        self.remove_child_at(parent, index);

        let new_node = self.create_node_at(parent, index);
        if let Some(new_node) = new_node {
            if old_row.is_some() && was_expanded {
                self.expand_node(new_node, false);
            }
        }

        let Some(old_row) = old_row else {
            return;
        };
        if !self.is_fixed_row_height() {
            let new_row = new_node
                .and_then(|key| self.nodes[key].row)
                .unwrap_or(old_row);
            if new_row == 0 {
                if let Some(&first) = self.rows.first() {
                    self.nodes[first].y_origin = 0;
                }
            }
            self.update_y_origins_from(new_row.saturating_sub(1));
        }
        self.emit_rows_changed();
    }

    /// Returns `true` if the children of `key` occupy rows: it is expanded
    /// and shown, or it is the hidden root.
    fn shows_children(&self, key: NodeKey) -> bool {
        let node = &self.nodes[key];
        let hidden_root = Some(key) == self.root && !self.root_visible;
        hidden_root || (node.row.is_some() && node.expanded)
    }

    fn refresh_size(&mut self, key: NodeKey) {
        let row = self.nodes[key].row;
        self.update_preferred_size(key, row);
    }

    /// Re-flows the y-origins of every row after `parent`, starting over
    /// from y = 0 when `parent` is the hidden root.
    fn refresh_y_after(&mut self, parent: NodeKey) {
        match self.nodes[parent].row {
            Some(row) => self.update_y_origins_from(row),
            None if Some(parent) == self.root => {
                if let Some(&first) = self.rows.first() {
                    self.nodes[first].y_origin = 0;
                    self.ensure_valid_size(first);
                }
                self.update_y_origins_from(0);
            }
            None => {}
        }
    }
}
