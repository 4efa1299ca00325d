//! Path-based selection for tree views.
//!
//! The layout cache tells a [`TreeSelectionModel`] when selected paths stop
//! being visible and when the row order changes. [`PathSelectionModel`] is
//! the stock implementation.
//!
//! # Example
//!
//! ```
//! use arbor::model::{PathSelectionModel, TreePath, TreeSelectionModel};
//!
//! let selection = PathSelectionModel::new();
//! let path = TreePath::root("R").child("A");
//!
//! selection.add_selection_path(&path);
//! assert!(selection.is_path_selected(&path));
//!
//! selection.selection_changed.connect(|(added, removed)| {
//!     println!("selection changed: +{} -{}", added.len(), removed.len());
//! });
//! ```

use std::fmt;
use std::hash::Hash;

use arbor_core::Signal;
use arbor_core::logging::targets;
use parking_lot::RwLock;

use super::path::TreePath;

/// Selection collaborator driven by the layout cache.
///
/// All methods take `&self`; implementations use interior mutability so the
/// cache can share one selection model with the rest of a view.
pub trait TreeSelectionModel<V>: Send + Sync {
    /// Returns `true` if `path` is selected.
    fn is_path_selected(&self, path: &TreePath<V>) -> bool;

    /// Adds `path` to the selection.
    fn add_selection_path(&self, path: &TreePath<V>);

    /// Removes `path` from the selection.
    fn remove_selection_path(&self, path: &TreePath<V>);

    /// Removes every path in `paths` from the selection.
    fn remove_selection_paths(&self, paths: &[TreePath<V>]) {
        for path in paths {
            self.remove_selection_path(path);
        }
    }

    /// Called after visible rows moved; row-based caches must be rebuilt.
    fn reset_row_selection(&self);

    /// Deselects everything.
    fn clear_selection(&self);
}

/// How many paths may be selected at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeSelectionMode {
    /// At most one path; adding a path replaces the selection.
    SingleSelection,
    /// Any set of paths (default).
    #[default]
    MultiSelection,
}

struct SelectionState<V> {
    mode: TreeSelectionMode,
    paths: Vec<TreePath<V>>,
    lead: Option<TreePath<V>>,
    row_resets: usize,
}

/// Default [`TreeSelectionModel`] storing selected paths in insertion order.
///
/// # Signals
///
/// - `selection_changed`: emitted with `(added, removed)` paths whenever the
///   selected set changes
pub struct PathSelectionModel<V: 'static> {
    state: RwLock<SelectionState<V>>,
    /// Emitted after the selection changed, with `(added, removed)`.
    pub selection_changed: Signal<(Vec<TreePath<V>>, Vec<TreePath<V>>)>,
}

impl<V> Default for PathSelectionModel<V>
where
    V: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PathSelectionModel<V>
where
    V: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
{
    /// Creates an empty selection in multi-selection mode.
    pub fn new() -> Self {
        Self::with_mode(TreeSelectionMode::default())
    }

    /// Creates an empty selection with the given mode.
    pub fn with_mode(mode: TreeSelectionMode) -> Self {
        Self {
            state: RwLock::new(SelectionState {
                mode,
                paths: Vec::new(),
                lead: None,
                row_resets: 0,
            }),
            selection_changed: Signal::new(),
        }
    }

    /// The current selection mode.
    pub fn selection_mode(&self) -> TreeSelectionMode {
        self.state.read().mode
    }

    /// Changes the selection mode, trimming to the lead path when switching
    /// to single selection.
    pub fn set_selection_mode(&self, mode: TreeSelectionMode) {
        let removed = {
            let mut state = self.state.write();
            state.mode = mode;
            if mode == TreeSelectionMode::SingleSelection && state.paths.len() > 1 {
                let keep = state.lead.clone().or_else(|| state.paths.last().cloned());
                let removed: Vec<_> = state
                    .paths
                    .iter()
                    .filter(|p| Some(*p) != keep.as_ref())
                    .cloned()
                    .collect();
                state.paths.retain(|p| Some(p) == keep.as_ref());
                removed
            } else {
                Vec::new()
            }
        };
        if !removed.is_empty() {
            self.selection_changed.emit((Vec::new(), removed));
        }
    }

    /// The selected paths in the order they were added.
    pub fn selection_paths(&self) -> Vec<TreePath<V>> {
        self.state.read().paths.clone()
    }

    /// The most recently added path that is still selected.
    pub fn lead_selection_path(&self) -> Option<TreePath<V>> {
        self.state.read().lead.clone()
    }

    /// Number of selected paths.
    pub fn selection_count(&self) -> usize {
        self.state.read().paths.len()
    }

    /// Returns `true` if nothing is selected.
    pub fn is_selection_empty(&self) -> bool {
        self.state.read().paths.is_empty()
    }

    /// How many times the row mapping was reset.
    pub fn row_reset_count(&self) -> usize {
        self.state.read().row_resets
    }

    fn remove_paths(&self, paths: &[TreePath<V>]) {
        let removed = {
            let mut state = self.state.write();
            let mut removed = Vec::new();
            state.paths.retain(|p| {
                if paths.contains(p) {
                    removed.push(p.clone());
                    false
                } else {
                    true
                }
            });
            if state.lead.as_ref().is_some_and(|lead| paths.contains(lead)) {
                state.lead = state.paths.last().cloned();
            }
            removed
        };
        if !removed.is_empty() {
            tracing::trace!(target: targets::SELECTION, count = removed.len(), "paths deselected");
            self.selection_changed.emit((Vec::new(), removed));
        }
    }
}

impl<V> TreeSelectionModel<V> for PathSelectionModel<V>
where
    V: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
{
    fn is_path_selected(&self, path: &TreePath<V>) -> bool {
        self.state.read().paths.contains(path)
    }

    fn add_selection_path(&self, path: &TreePath<V>) {
        let removed = {
            let mut state = self.state.write();
            if state.paths.contains(path) {
                return;
            }
            let removed = if state.mode == TreeSelectionMode::SingleSelection {
                std::mem::take(&mut state.paths)
            } else {
                Vec::new()
            };
            state.paths.push(path.clone());
            state.lead = Some(path.clone());
            removed
        };
        tracing::trace!(target: targets::SELECTION, ?path, "path selected");
        self.selection_changed.emit((vec![path.clone()], removed));
    }

    fn remove_selection_path(&self, path: &TreePath<V>) {
        self.remove_paths(std::slice::from_ref(path));
    }

    fn remove_selection_paths(&self, paths: &[TreePath<V>]) {
        self.remove_paths(paths);
    }

    fn reset_row_selection(&self) {
        self.state.write().row_resets += 1;
    }

    fn clear_selection(&self) {
        let removed = {
            let mut state = self.state.write();
            state.lead = None;
            std::mem::take(&mut state.paths)
        };
        if !removed.is_empty() {
            self.selection_changed.emit((Vec::new(), removed));
        }
    }
}
