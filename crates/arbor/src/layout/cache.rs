//! The variable-height visible-row layout cache.

use std::collections::HashMap;
use std::sync::Arc;

use arbor_core::logging::{span_names, targets};
use arbor_core::{PerfSpan, Signal, TreeDebug, TreeDebugSource, TreeFormatOptions};
use slotmap::SlotMap;

use super::dimensions::NodeDimensions;
use super::node::{NodeKey, ShadowNode};
use crate::config::LayoutConfig;
use crate::geometry::Rect;
use crate::model::{TreeModel, TreePath, TreeSelectionModel};

/// Incremental layout of the visible rows of a lazily loaded tree.
///
/// The cache mirrors only the part of the model that has been expanded at
/// least once. Each visible node occupies one row; rows are laid out top to
/// bottom, either with a fixed row height or with per-node heights reported
/// by a [`NodeDimensions`] provider. Model notifications (see the
/// `tree_*` handlers) patch the cached rows in place instead of rebuilding.
///
/// Read-only queries take `&self`. Queries that may first have to measure
/// stale nodes (`bounds`, `preferred_width`, `path_closest_to`) take
/// `&mut self`.
///
/// # Signals
///
/// - `visible_rows_changed`: emitted after the row count, row order or row
///   geometry changed. Slots must not lock the cache they observe.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use arbor::config::LayoutConfig;
/// use arbor::layout::VariableHeightLayoutCache;
/// use arbor::model::{TreePath, TreeStore};
///
/// let store = Arc::new(TreeStore::new());
/// let root = store.set_root("Root");
/// let a = store.add_child(root, "A").unwrap();
///
/// let mut cache = VariableHeightLayoutCache::with_config(&LayoutConfig::default());
/// cache.set_model(Some(store.clone()));
///
/// assert_eq!(cache.row_count(), 2);
/// let path = TreePath::root(root).child(a);
/// assert_eq!(cache.row_for_path(&path), Some(1));
/// assert_eq!(cache.bounds(&path).map(|r| r.y), Some(18));
/// ```
pub struct VariableHeightLayoutCache<M: TreeModel> {
    pub(super) model: Option<Arc<M>>,
    pub(super) nodes: SlotMap<NodeKey, ShadowNode<M::Value>>,
    pub(super) root: Option<NodeKey>,
    /// Visible nodes in display order.
    pub(super) rows: Vec<NodeKey>,
    pub(super) path_map: HashMap<TreePath<M::Value>, NodeKey>,
    pub(super) root_visible: bool,
    pub(super) row_height: i32,
    pub(super) node_dimensions: Option<Box<dyn NodeDimensions<M::Value>>>,
    pub(super) selection_model: Option<Arc<dyn TreeSelectionModel<M::Value>>>,
    /// Set when a node could not be measured; the next geometry query
    /// re-lays every row first.
    pub(super) update_node_sizes: bool,
    /// Emitted after the visible rows changed.
    pub visible_rows_changed: Signal<()>,
}

impl<M: TreeModel> Default for VariableHeightLayoutCache<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: TreeModel> VariableHeightLayoutCache<M> {
    /// Creates an empty cache with a visible root and variable row heights.
    pub fn new() -> Self {
        Self {
            model: None,
            nodes: SlotMap::with_key(),
            root: None,
            rows: Vec::new(),
            path_map: HashMap::new(),
            root_visible: true,
            row_height: 0,
            node_dimensions: None,
            selection_model: None,
            update_node_sizes: false,
            visible_rows_changed: Signal::new(),
        }
    }

    /// Creates an empty cache configured from `config`, measuring nodes
    /// with the configuration's uniform dimensions.
    pub fn with_config(config: &LayoutConfig) -> Self {
        let mut cache = Self::new();
        cache.row_height = config.row_height;
        cache.root_visible = config.root_visible;
        cache.node_dimensions = Some(Box::new(config.uniform_dimensions()));
        cache
    }

    // =========================================================================
    // Collaborators
    // =========================================================================

    /// The model the cache mirrors.
    pub fn model(&self) -> Option<&Arc<M>> {
        self.model.as_ref()
    }

    /// Replaces the model and rebuilds the cache from its root.
    pub fn set_model(&mut self, model: Option<Arc<M>>) {
        self.model = model;
        self.rebuild();
    }

    /// Replaces the node measurer and re-measures every cached node.
    pub fn set_node_dimensions(&mut self, dimensions: Option<Box<dyn NodeDimensions<M::Value>>>) {
        self.node_dimensions = dimensions;
        self.invalidate_sizes();
        self.emit_rows_changed();
    }

    /// The selection model told about visibility changes.
    pub fn selection_model(&self) -> Option<&Arc<dyn TreeSelectionModel<M::Value>>> {
        self.selection_model.as_ref()
    }

    /// Sets the selection model told about visibility changes.
    pub fn set_selection_model(&mut self, selection: Option<Arc<dyn TreeSelectionModel<M::Value>>>) {
        self.selection_model = selection;
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Returns `true` if the model root is shown as row 0.
    pub fn is_root_visible(&self) -> bool {
        self.root_visible
    }

    /// Shows or hides the model root.
    ///
    /// Hiding the root deselects it; every other row moves up by one.
    pub fn set_root_visible(&mut self, visible: bool) {
        if self.root_visible == visible {
            return;
        }
        self.root_visible = visible;
        let Some(root) = self.root else {
            return;
        };

        if visible {
            self.update_preferred_size(root, Some(0));
            self.rows.insert(0, root);
            self.reindex_rows_from(0);
        } else if !self.rows.is_empty() {
            self.rows.remove(0);
            self.nodes[root].row = None;
            self.reindex_rows_from(0);
            if let Some(selection) = &self.selection_model {
                selection.remove_selection_path(&self.nodes[root].path);
            }
        }
        if let Some(selection) = &self.selection_model {
            selection.reset_row_selection();
        }
        if let Some(&first) = self.rows.first() {
            self.nodes[first].y_origin = 0;
        }
        self.update_y_origins_from(0);
        self.emit_rows_changed();
    }

    /// The fixed row height; zero or negative means variable heights.
    pub fn row_height(&self) -> i32 {
        self.row_height
    }

    /// Returns `true` if every row has the same height.
    pub fn is_fixed_row_height(&self) -> bool {
        self.row_height > 0
    }

    /// Switches between fixed (`height > 0`) and variable row heights.
    pub fn set_row_height(&mut self, height: i32) {
        if self.row_height != height {
            self.row_height = height;
            self.invalidate_sizes();
            self.emit_rows_changed();
        }
    }

    // =========================================================================
    // Expansion
    // =========================================================================

    /// Expands or collapses the node at `path`.
    ///
    /// Expanding also expands every ancestor. Collapsing expands every
    /// ancestor too, so the collapsed node is left visible.
    pub fn set_expanded_state(&mut self, path: &TreePath<M::Value>, expanded: bool) {
        if expanded {
            self.ensure_path_is_expanded(path, true);
            return;
        }
        if let Some(key) = self.resolve_or_create(path) {
            self.make_visible(key);
            self.collapse_node(key, true);
        }
    }

    /// Flips the expansion state of the node at `path`.
    ///
    /// A node expanded below a collapsed ancestor counts as expanded.
    pub fn toggle_expanded(&mut self, path: &TreePath<M::Value>) {
        let expanded = self
            .resolve(path, false)
            .is_some_and(|key| self.nodes[key].expanded);
        self.set_expanded_state(path, !expanded);
    }

    /// Returns `true` if the node at `path` is visible and expanded.
    pub fn expanded_state(&self, path: &TreePath<M::Value>) -> bool {
        self.is_expanded(path)
    }

    /// Returns `true` if the node at `path` is expanded. Nodes below a
    /// collapsed ancestor report `false`.
    pub fn is_expanded(&self, path: &TreePath<M::Value>) -> bool {
        self.resolve(path, true)
            .is_some_and(|key| self.nodes[key].expanded)
    }

    // =========================================================================
    // Row queries
    // =========================================================================

    /// Number of visible rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The path shown at `row`.
    pub fn path_for_row(&self, row: usize) -> Option<TreePath<M::Value>> {
        self.rows.get(row).map(|&key| self.nodes[key].path.clone())
    }

    /// The row showing `path`, or `None` if it is not visible.
    pub fn row_for_path(&self, path: &TreePath<M::Value>) -> Option<usize> {
        self.resolve(path, true).and_then(|key| self.nodes[key].row)
    }

    /// Maps each path to its row.
    pub fn rows_for_paths(&self, paths: &[TreePath<M::Value>]) -> Vec<Option<usize>> {
        paths.iter().map(|path| self.row_for_path(path)).collect()
    }

    /// Number of descendants of `path` that are visible when it is
    /// expanded, counting through expanded children. Zero for nodes below a
    /// collapsed ancestor.
    pub fn visible_child_count(&self, path: &TreePath<M::Value>) -> usize {
        self.resolve(path, true)
            .map_or(0, |key| self.visible_child_count_of(key))
    }

    /// Number of nodes currently cached.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// The bounds of the row showing `path`, or `None` if it is not shown.
    pub fn bounds(&mut self, path: &TreePath<M::Value>) -> Option<Rect> {
        let key = self.resolve(path, true)?;
        if self.update_node_sizes {
            self.update_node_sizes(false);
        }
        self.nodes[key].row?;
        Some(self.node_bounds(key))
    }

    /// The path whose row contains `y`, clamped to the first or last row.
    ///
    /// `x` does not take part in the lookup: every row spans the full width.
    pub fn path_closest_to(&mut self, _x: i32, y: i32) -> Option<TreePath<M::Value>> {
        if self.rows.is_empty() {
            return None;
        }
        if self.update_node_sizes {
            self.update_node_sizes(false);
        }
        self.row_for_y_location(y)
            .and_then(|row| self.path_for_row(row))
    }

    /// The widest `x + width` over all visible rows.
    pub fn preferred_width(&mut self) -> i32 {
        if self.update_node_sizes {
            self.update_node_sizes(false);
        }
        self.max_node_width()
    }

    /// Total height of all visible rows.
    pub fn preferred_height(&mut self) -> i32 {
        let Some(&last) = self.rows.last() else {
            return 0;
        };
        if self.update_node_sizes {
            self.update_node_sizes(false);
        }
        let bounds = self.node_bounds(last);
        bounds.bottom()
    }

    /// Marks the size of the node at `path` stale and re-flows the rows
    /// below it.
    pub fn invalidate_path_bounds(&mut self, path: &TreePath<M::Value>) {
        let Some(key) = self.resolve(path, true) else {
            return;
        };
        self.nodes[key].mark_size_invalid();
        if let Some(row) = self.nodes[key].row {
            self.update_y_origins_from(row);
            self.emit_rows_changed();
        }
    }

    /// Marks every cached size stale.
    ///
    /// With variable heights the visible rows are re-measured immediately.
    pub fn invalidate_sizes(&mut self) {
        for node in self.nodes.values_mut() {
            node.mark_size_invalid();
        }
        if !self.is_fixed_row_height() && !self.rows.is_empty() {
            self.update_node_sizes(true);
        }
    }

    // =========================================================================
    // Debugging
    // =========================================================================

    /// Dumps the cached nodes with their rows, origins and sizes.
    pub fn debug_tree(&self) -> String {
        self.debug_tree_with(TreeFormatOptions::detailed())
    }

    /// Dumps the cached nodes using custom formatting options.
    pub fn debug_tree_with(&self, options: TreeFormatOptions) -> String {
        TreeDebug::with_options(options).format(&CacheDebugSource { cache: self })
    }

    // =========================================================================
    // Internals shared by the handlers and tree operations
    // =========================================================================

    /// Discards every cached node and starts over from the model root.
    pub(super) fn rebuild(&mut self) {
        self.path_map.clear();
        self.nodes.clear();
        self.rows.clear();
        self.root = None;
        self.update_node_sizes = false;

        if let Some(root_value) = self.model.as_ref().and_then(|model| model.root()) {
            let root = self.create_node(None, TreePath::root(root_value));
            self.root = Some(root);
            self.update_preferred_size(root, Some(0));
            if self.root_visible {
                self.rows.push(root);
                self.reindex_rows_from(0);
            }
            self.expand_node(root, true);
        }
        tracing::debug!(
            target: targets::LAYOUT,
            rows = self.rows.len(),
            nodes = self.nodes.len(),
            "layout cache rebuilt"
        );

        if let Some(selection) = &self.selection_model {
            selection.clear_selection();
        }
        self.emit_rows_changed();
    }

    pub(super) fn emit_rows_changed(&self) {
        self.visible_rows_changed.emit(());
    }

    /// Allocates a node for `path` and maps it.
    pub(super) fn create_node(&mut self, parent: Option<NodeKey>, path: TreePath<M::Value>) -> NodeKey {
        let key = self.nodes.insert(ShadowNode::new(path.clone(), parent));
        if let Some(previous) = self.path_map.insert(path, key) {
            tracing::warn!(
                target: targets::LAYOUT,
                path = ?self.nodes[key].path,
                ?previous,
                "duplicate path in cache; older node shadowed"
            );
        }
        key
    }

    /// Unmaps and frees `key` and all its cached descendants.
    ///
    /// The caller detaches `key` from its parent and from the rows.
    pub(super) fn free_subtree(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.remove(current) else {
                continue;
            };
            if self.path_map.get(&node.path) == Some(&current) {
                self.path_map.remove(&node.path);
            }
            stack.extend(node.children);
        }
    }

    /// Returns `true` if the node is the root or every ancestor is expanded.
    pub(super) fn is_visible(&self, key: NodeKey) -> bool {
        let mut current = key;
        loop {
            if Some(current) == self.root {
                return true;
            }
            match self.nodes[current].parent {
                Some(parent) if self.nodes[parent].expanded => current = parent,
                _ => return false,
            }
        }
    }

    /// Rewrites the cached row index of every row from `start` on.
    pub(super) fn reindex_rows_from(&mut self, start: usize) {
        for (index, &key) in self.rows.iter().enumerate().skip(start) {
            self.nodes[key].row = Some(index);
        }
    }

    /// Measures `key` with the dimension provider.
    pub(super) fn update_preferred_size(&mut self, key: NodeKey, row: Option<usize>) {
        let fixed = self.is_fixed_row_height().then_some(self.row_height);
        let bounds = self.node_dimensions.as_ref().and_then(|dimensions| {
            let node = &self.nodes[key];
            dimensions.node_bounds(&node.value, row, node.depth(), node.expanded)
        });
        if !self.nodes[key].apply_bounds(bounds, fixed) {
            self.update_node_sizes = true;
        }
    }

    /// Measures `key` if its size is stale.
    pub(super) fn ensure_valid_size(&mut self, key: NodeKey) {
        if !self.nodes[key].has_valid_size() {
            let row = self.nodes[key].row;
            self.update_preferred_size(key, row);
        }
    }

    pub(super) fn node_height(&mut self, key: NodeKey) -> i32 {
        if self.is_fixed_row_height() {
            return self.row_height;
        }
        self.ensure_valid_size(key);
        self.nodes[key].preferred_height
    }

    pub(super) fn node_y(&self, key: NodeKey) -> i32 {
        if self.is_fixed_row_height() {
            return self.nodes[key]
                .row
                .map_or(-1, |row| self.row_height.saturating_mul(row as i32));
        }
        self.nodes[key].y_origin
    }

    pub(super) fn node_bounds(&mut self, key: NodeKey) -> Rect {
        self.ensure_valid_size(key);
        let height = self.node_height(key);
        let node = &self.nodes[key];
        Rect::new(node.x_origin, self.node_y(key), node.preferred_width, height)
    }

    /// Recomputes the y-origin of every row after `location`.
    pub(super) fn update_y_origins_from(&mut self, location: usize) {
        if self.is_fixed_row_height() || location >= self.rows.len() {
            return;
        }
        let first = self.rows[location];
        let mut y = self.node_y(first) + self.node_height(first);
        for index in location + 1..self.rows.len() {
            let key = self.rows[index];
            self.nodes[key].y_origin = y;
            y += self.node_height(key);
        }
    }

    /// Moves every row from `start` on down by `delta`.
    pub(super) fn shift_y_origins(&mut self, start: usize, delta: i32) {
        if delta == 0 {
            return;
        }
        for &key in self.rows.iter().skip(start) {
            self.nodes[key].y_origin += delta;
        }
    }

    /// Re-lays every row from y = 0, measuring stale (or all) nodes.
    pub(super) fn update_node_sizes(&mut self, update_all: bool) {
        let _perf = PerfSpan::new(span_names::SIZE_PASS);
        self.update_node_sizes = false;
        let fixed = self.is_fixed_row_height();
        let mut y = 0;
        for index in 0..self.rows.len() {
            let key = self.rows[index];
            self.nodes[key].y_origin = y;
            if update_all || !self.nodes[key].has_valid_size() {
                self.update_preferred_size(key, Some(index));
            }
            y += if fixed {
                self.row_height
            } else {
                self.nodes[key].preferred_height
            };
        }
        tracing::trace!(target: targets::LAYOUT, rows = self.rows.len(), update_all, "size pass");
    }

    /// The row whose vertical span contains `y`.
    ///
    /// Past the last row yields the last row; above the first yields row 0.
    pub(super) fn row_for_y_location(&self, y: i32) -> Option<usize> {
        let last = self.rows.len().checked_sub(1)?;
        if self.is_fixed_row_height() {
            let row = (y / self.row_height).max(0) as usize;
            return Some(row.min(last));
        }
        let after = self
            .rows
            .partition_point(|&key| self.nodes[key].y_origin <= y);
        Some(after.saturating_sub(1).min(last))
    }

    pub(super) fn max_node_width(&mut self) -> i32 {
        let mut max_width = 0;
        for index in 0..self.rows.len() {
            let key = self.rows[index];
            self.ensure_valid_size(key);
            let node = &self.nodes[key];
            max_width = max_width.max(node.x_origin + node.preferred_width);
        }
        max_width
    }
}

static_assertions::assert_impl_all!(
    VariableHeightLayoutCache<crate::model::TreeStore<String>>: Send, Sync
);

struct CacheDebugSource<'a, M: TreeModel> {
    cache: &'a VariableHeightLayoutCache<M>,
}

impl<M: TreeModel> TreeDebugSource for CacheDebugSource<'_, M> {
    type Id = NodeKey;

    fn roots(&self) -> Vec<NodeKey> {
        self.cache.root.into_iter().collect()
    }

    fn children(&self, id: NodeKey) -> Vec<NodeKey> {
        self.cache.nodes[id].children.clone()
    }

    fn label(&self, id: NodeKey) -> String {
        format!("{:?}", self.cache.nodes[id].value)
    }

    fn details(&self, id: NodeKey) -> Option<String> {
        let node = &self.cache.nodes[id];
        let row = node.row.map_or_else(|| "-".to_string(), |row| row.to_string());
        let state = match (node.expanded, node.ever_expanded) {
            (true, _) => "expanded",
            (false, true) => "collapsed",
            (false, false) => "unloaded",
        };
        Some(format!(
            "row={row} y={} {}x{} {state}",
            self.cache.node_y(id),
            node.preferred_width,
            node.preferred_height
        ))
    }
}
