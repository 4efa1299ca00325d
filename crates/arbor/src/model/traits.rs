//! Core traits for the tree model the layout cache mirrors.
//!
//! This module defines the read interface a hierarchical data source
//! implements and the change notifications it emits.

use std::fmt;
use std::hash::Hash;

use arbor_core::Signal;

use super::path::TreePath;

/// A hierarchical data source.
///
/// The layout cache reads the model through this trait and never mutates it.
/// Values are opaque handles: they must identify a node for as long as it
/// stays in the tree, and compare/hash cheaply because the cache keys its
/// path map with them.
///
/// The hierarchy must stay stable for the duration of one notification
/// handler; mutate the model, then deliver the matching event.
///
/// # Example
///
/// ```ignore
/// use arbor::model::TreeModel;
///
/// struct Fs { /* ... */ }
///
/// impl TreeModel for Fs {
///     type Value = u64;
///
///     fn root(&self) -> Option<u64> { Some(0) }
///     fn child_count(&self, parent: &u64) -> usize { /* ... */ }
///     fn child(&self, parent: &u64, index: usize) -> Option<u64> { /* ... */ }
///     fn is_leaf(&self, value: &u64) -> bool { /* ... */ }
/// }
/// ```
pub trait TreeModel: Send + Sync {
    /// Handle identifying one node of the model.
    type Value: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// The root value, or `None` for an empty model.
    fn root(&self) -> Option<Self::Value>;

    /// Number of children under `parent`.
    fn child_count(&self, parent: &Self::Value) -> usize;

    /// The child of `parent` at `index`, or `None` when out of range.
    fn child(&self, parent: &Self::Value, index: usize) -> Option<Self::Value>;

    /// Returns `true` if `value` can never have children.
    ///
    /// The default treats childless nodes as leaves.
    fn is_leaf(&self, value: &Self::Value) -> bool {
        self.child_count(value) == 0
    }

    /// Position of `child` under `parent`, or `None` if it is not a child.
    ///
    /// The default scans the children; override it when the model can
    /// answer directly.
    fn index_of_child(&self, parent: &Self::Value, child: &Self::Value) -> Option<usize> {
        (0..self.child_count(parent)).find(|&i| self.child(parent, i).as_ref() == Some(child))
    }
}

/// The kind of change a [`TreeModelEvent`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeModelEventKind {
    /// Attributes of existing nodes changed; positions did not.
    NodesChanged,
    /// Children were inserted under the event's path.
    NodesInserted,
    /// Children were removed from under the event's path.
    NodesRemoved,
    /// The subtree rooted at the event's path changed arbitrarily.
    StructureChanged,
}

/// A change notification scoped to one parent path.
///
/// For inserts, removals and changes, `path` is the parent of the affected
/// nodes and `child_indices` their positions (ascending). For removals the
/// indices are the positions the nodes had before removal. For structure
/// changes `path` names the changed node itself and the indices are empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeModelEvent<V> {
    /// Parent path (or the changed node for structure changes).
    pub path: TreePath<V>,
    /// Affected child positions.
    pub child_indices: Vec<usize>,
    /// The affected child values, parallel to `child_indices`, when known.
    pub children: Vec<V>,
}

impl<V> TreeModelEvent<V> {
    /// An event for the given path and child positions.
    pub fn new(path: TreePath<V>, child_indices: Vec<usize>) -> Self {
        Self {
            path,
            child_indices,
            children: Vec::new(),
        }
    }

    /// An event that also carries the affected child values.
    pub fn with_children(path: TreePath<V>, child_indices: Vec<usize>, children: Vec<V>) -> Self {
        Self {
            path,
            child_indices,
            children,
        }
    }

    /// An event about the node at `path` with no child positions.
    pub fn for_path(path: TreePath<V>) -> Self {
        Self::new(path, Vec::new())
    }
}

/// Signals a model emits after it has changed.
///
/// Views connect to these to keep their caches in sync; see
/// [`ModelBinding`](crate::layout::ModelBinding).
pub struct TreeModelSignals<V: 'static> {
    /// Emitted after node attributes changed.
    pub nodes_changed: Signal<TreeModelEvent<V>>,
    /// Emitted after children were inserted.
    pub nodes_inserted: Signal<TreeModelEvent<V>>,
    /// Emitted after children were removed.
    pub nodes_removed: Signal<TreeModelEvent<V>>,
    /// Emitted after a subtree was replaced.
    pub structure_changed: Signal<TreeModelEvent<V>>,
}

impl<V: 'static> Default for TreeModelSignals<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: 'static> TreeModelSignals<V> {
    /// Creates a set of signals with no connections.
    pub fn new() -> Self {
        Self {
            nodes_changed: Signal::new(),
            nodes_inserted: Signal::new(),
            nodes_removed: Signal::new(),
            structure_changed: Signal::new(),
        }
    }

    /// The signal matching `kind`.
    pub fn signal(&self, kind: TreeModelEventKind) -> &Signal<TreeModelEvent<V>> {
        match kind {
            TreeModelEventKind::NodesChanged => &self.nodes_changed,
            TreeModelEventKind::NodesInserted => &self.nodes_inserted,
            TreeModelEventKind::NodesRemoved => &self.nodes_removed,
            TreeModelEventKind::StructureChanged => &self.structure_changed,
        }
    }

    /// Emits `event` on the signal matching `kind`.
    pub fn emit(&self, kind: TreeModelEventKind, event: TreeModelEvent<V>) {
        self.signal(kind).emit(event);
    }
}

/// A model that announces its own changes.
pub trait ObservableTreeModel: TreeModel {
    /// The model's change signals.
    fn signals(&self) -> &TreeModelSignals<Self::Value>;
}
