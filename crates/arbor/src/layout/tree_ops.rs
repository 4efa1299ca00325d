//! Expansion, collapse and lazy loading of cached nodes.

use arbor_core::logging::targets;

use super::cache::VariableHeightLayoutCache;
use super::node::NodeKey;
use crate::model::{TreeModel, TreePath};

impl<M: TreeModel> VariableHeightLayoutCache<M> {
    /// Expands `key`, loading its children on first use.
    ///
    /// For a visible node the newly visible descendants are spliced in
    /// right after its row and every following row moves down. A node that
    /// is not visible only records the new state.
    pub(super) fn expand_node(&mut self, key: NodeKey, adjust_tree: bool) {
        let Some(model) = self.model.clone() else {
            return;
        };
        if self.nodes[key].expanded || model.is_leaf(&self.nodes[key].value) {
            return;
        }

        let fixed = self.is_fixed_row_height();
        let start_height = self.node_height(key);
        let original_row = self.nodes[key].row;

        self.nodes[key].expanded = true;
        self.update_preferred_size(key, original_row);
        if !self.nodes[key].ever_expanded {
            self.load_children(key);
        }

        let is_root = Some(key) == self.root;
        if original_row.is_none() && !is_root {
            tracing::trace!(target: targets::LAYOUT, path = ?self.nodes[key].path, "expanded hidden node");
            return;
        }

        let descendants = self.visible_descendants(key);
        let insert_at = original_row.map_or(0, |row| row + 1);
        let mut y = match original_row {
            Some(_) if !fixed => self.node_y(key) + self.node_height(key),
            _ => 0,
        };
        if !fixed {
            for (offset, &child) in descendants.iter().enumerate() {
                if !self.nodes[child].has_valid_size() {
                    self.update_preferred_size(child, Some(insert_at + offset));
                }
                self.nodes[child].y_origin = y;
                y += self.node_height(child);
            }
        }

        let inserted = descendants.len();
        self.rows.splice(insert_at..insert_at, descendants);
        self.reindex_rows_from(insert_at);
        tracing::trace!(
            target: targets::LAYOUT,
            path = ?self.nodes[key].path,
            inserted,
            "expanded node"
        );

        if adjust_tree && (inserted > 0 || self.node_height(key) != start_height) {
            let next = insert_at + inserted;
            if !fixed && next < self.rows.len() {
                let old_y = self.nodes[self.rows[next]].y_origin;
                self.shift_y_origins(next, y - old_y);
            }
            self.emit_rows_changed();
        }

        if let Some(selection) = &self.selection_model {
            selection.reset_row_selection();
        }
    }

    /// Collapses `key`, removing its visible descendants from the rows.
    ///
    /// The collapsed subtree stays cached. Selected paths that disappear
    /// are deselected and the collapsed node is selected in their place.
    pub(super) fn collapse_node(&mut self, key: NodeKey, adjust_tree: bool) {
        if !self.nodes[key].expanded {
            return;
        }

        let fixed = self.is_fixed_row_height();
        let start_height = self.node_height(key);
        let my_row = self.nodes[key].row;
        let is_root = Some(key) == self.root;
        let shown = if my_row.is_some() || is_root {
            self.visible_descendants(key)
        } else {
            Vec::new()
        };

        self.nodes[key].expanded = false;
        match my_row {
            None => self.nodes[key].mark_size_invalid(),
            Some(row) if adjust_tree => self.update_preferred_size(key, Some(row)),
            Some(_) => {}
        }

        let start = my_row.map_or(0, |row| row + 1);
        let removed = shown.len();
        let selected: Vec<TreePath<M::Value>> = match &self.selection_model {
            Some(selection) => shown
                .iter()
                .map(|&child| &self.nodes[child].path)
                .filter(|path| selection.is_path_selected(path))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        for child in self.rows.drain(start..start + removed) {
            self.nodes[child].row = None;
        }
        self.reindex_rows_from(start);
        tracing::trace!(
            target: targets::LAYOUT,
            path = ?self.nodes[key].path,
            removed,
            "collapsed node"
        );

        let Some(row) = my_row else {
            if removed > 0 {
                self.emit_rows_changed();
            }
            return;
        };

        if adjust_tree && (removed > 0 || self.node_height(key) != start_height) {
            let next = row + 1;
            if !fixed && next < self.rows.len() {
                let expected = self.node_y(key) + self.node_height(key);
                let old_y = self.nodes[self.rows[next]].y_origin;
                self.shift_y_origins(next, expected - old_y);
            }
            self.emit_rows_changed();
        }

        if removed > 0 {
            if let Some(selection) = &self.selection_model {
                if selected.is_empty() {
                    selection.reset_row_selection();
                } else {
                    selection.remove_selection_paths(&selected);
                    selection.add_selection_path(&self.nodes[key].path);
                }
            }
        }
    }

    /// Loads the children of `key` from the model, once.
    pub(super) fn load_children(&mut self, key: NodeKey) {
        let Some(model) = self.model.clone() else {
            return;
        };
        if self.nodes[key].ever_expanded {
            return;
        }
        self.nodes[key].ever_expanded = true;

        let value = self.nodes[key].value.clone();
        let parent_path = self.nodes[key].path.clone();
        let first_row = self.nodes[key].row.map(|row| row + 1);
        let count = model.child_count(&value);
        for index in 0..count {
            let Some(child_value) = model.child(&value, index) else {
                tracing::warn!(
                    target: targets::MODEL,
                    parent = ?value,
                    index,
                    count,
                    "model reported a child it cannot return"
                );
                break;
            };
            let child = self.create_node(Some(key), parent_path.child(child_value));
            self.nodes[key].children.push(child);
            self.update_preferred_size(child, first_row.map(|row| row + index));
        }
    }

    /// Creates the node for child `index` of `parent`, inserting it into
    /// the rows when the parent's children are shown.
    ///
    /// Neither row origins nor the selection are updated.
    pub(super) fn create_node_at(&mut self, parent: NodeKey, index: usize) -> Option<NodeKey> {
        let model = self.model.clone()?;
        let sibling_count = self.nodes[parent].children.len();
        if index > sibling_count {
            tracing::warn!(
                target: targets::LAYOUT,
                path = ?self.nodes[parent].path,
                index,
                sibling_count,
                "insertion index past the cached children"
            );
            return None;
        }
        let value = model.child(&self.nodes[parent].value, index)?;
        let path = self.nodes[parent].path.child(value);
        let key = self.create_node(Some(parent), path);
        self.nodes[parent].children.insert(index, key);

        let parent_row = self.nodes[parent].row;
        let is_root = Some(parent) == self.root;
        let mut row_hint = None;
        if self.nodes[parent].expanded && (parent_row.is_some() || is_root) {
            let after_parent = parent_row.map_or(0, |row| row + 1);
            let new_row = if index == 0 {
                after_parent
            } else {
                let previous = self.nodes[parent].children[index - 1];
                let last = self.last_visible_node(previous);
                self.nodes[last].row.map_or(after_parent, |row| row + 1)
            };
            self.rows.insert(new_row, key);
            self.reindex_rows_from(new_row);
            row_hint = Some(new_row);
        }
        self.update_preferred_size(key, row_hint);
        Some(key)
    }

    /// Removes child `index` of `parent` from the cache, freeing its
    /// subtree. The child must already be out of the rows.
    pub(super) fn remove_child_at(&mut self, parent: NodeKey, index: usize) {
        let child = self.nodes[parent].children.remove(index);
        self.free_subtree(child);
    }

    /// Replaces the value of `key` and re-keys its cached subtree.
    pub(super) fn reset_value(&mut self, key: NodeKey, value: M::Value) {
        self.nodes[key].value = value;
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            let new_path = match self.nodes[current].parent {
                Some(parent) => self.nodes[parent]
                    .path
                    .child(self.nodes[current].value.clone()),
                None => TreePath::root(self.nodes[current].value.clone()),
            };
            let old_path = std::mem::replace(&mut self.nodes[current].path, new_path.clone());
            if self.path_map.get(&old_path) == Some(&current) {
                self.path_map.remove(&old_path);
            }
            self.path_map.insert(new_path, current);
            stack.extend(self.nodes[current].children.iter().copied());
        }
    }

    /// Visible descendants of `key` in row order, if `key` is expanded.
    pub(super) fn visible_descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        if !self.nodes[key].expanded {
            return out;
        }
        let mut stack: Vec<NodeKey> = self.nodes[key].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            let node = &self.nodes[current];
            if node.expanded {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// The deepest last visible descendant of `key`, or `key` itself.
    pub(super) fn last_visible_node(&self, key: NodeKey) -> NodeKey {
        let mut current = key;
        while self.nodes[current].expanded {
            match self.nodes[current].children.last() {
                Some(&last) => current = last,
                None => break,
            }
        }
        current
    }

    pub(super) fn visible_child_count_of(&self, key: NodeKey) -> usize {
        self.visible_descendants(key).len()
    }

    /// Expands every ancestor of `key`, top-down.
    pub(super) fn make_visible(&mut self, key: NodeKey) {
        if let Some(parent) = self.nodes[key].parent {
            self.expand_parent_and_receiver(parent);
        }
    }

    fn expand_parent_and_receiver(&mut self, key: NodeKey) {
        let mut chain = vec![key];
        let mut current = key;
        while let Some(parent) = self.nodes[current].parent {
            chain.push(parent);
            current = parent;
        }
        for &ancestor in chain.iter().rev() {
            self.expand_node(ancestor, true);
        }
    }

    /// Makes `path` visible, expanding it too when `expand_last` is set.
    ///
    /// A leaf cannot be expanded, so for a leaf path its parent is expanded
    /// instead.
    pub(super) fn ensure_path_is_expanded(&mut self, path: &TreePath<M::Value>, expand_last: bool) {
        let Some(model) = self.model.clone() else {
            return;
        };
        let (target, expand_last) = if model.is_leaf(path.last()) {
            (path.parent(), true)
        } else {
            (Some(path.clone()), expand_last)
        };
        let Some(target) = target else {
            return;
        };
        if let Some(key) = self.resolve_or_create(&target) {
            self.make_visible(key);
            if expand_last {
                self.expand_node(key, true);
            }
        }
    }
}
