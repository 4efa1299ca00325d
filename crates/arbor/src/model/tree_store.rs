//! In-memory hierarchical tree model.
//!
//! `TreeStore` keeps arbitrary node data in a single-rooted tree and emits a
//! [`TreeModelEvent`] after every mutation, which makes it a ready-made
//! source for the layout cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use arbor_core::logging::targets;
use parking_lot::RwLock;

use super::path::TreePath;
use super::traits::{
    ObservableTreeModel, TreeModel, TreeModelEvent, TreeModelEventKind, TreeModelSignals,
};
use crate::error::{Error, Result};

/// Identifies a node in a [`TreeStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// The raw numeric id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Counter for generating unique node IDs.
static NODE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_node_id() -> NodeId {
    NodeId(NODE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// A node in the tree structure.
struct TreeNode<T> {
    data: T,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// Internal storage for tree nodes.
struct TreeStorage<T> {
    nodes: HashMap<NodeId, TreeNode<T>>,
    root: Option<NodeId>,
}

impl<T> TreeStorage<T> {
    fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            root: None,
        }
    }

    fn node(&self, id: NodeId) -> Result<&TreeNode<T>> {
        self.nodes.get(&id).ok_or(Error::NoSuchNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut TreeNode<T>> {
        self.nodes.get_mut(&id).ok_or(Error::NoSuchNode(id))
    }

    fn insert_child(&mut self, parent_id: NodeId, index: usize, data: T) -> Result<NodeId> {
        let len = self.node(parent_id)?.children.len();
        if index > len {
            return Err(Error::IndexOutOfRange { index, len });
        }

        let id = next_node_id();
        self.nodes.insert(
            id,
            TreeNode {
                data,
                children: Vec::new(),
                parent: Some(parent_id),
            },
        );
        self.node_mut(parent_id)?.children.insert(index, id);
        Ok(id)
    }

    fn remove_subtree(&mut self, id: NodeId) -> Option<T> {
        let node = self.nodes.remove(&id)?;
        for child_id in node.children {
            self.remove_subtree(child_id);
        }
        Some(node.data)
    }

    fn row_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.nodes.get(&id)?.parent?;
        self.nodes
            .get(&parent)?
            .children
            .iter()
            .position(|&child| child == id)
    }

    fn path_of(&self, id: NodeId) -> Option<TreePath<NodeId>> {
        let mut components = vec![id];
        let mut current = self.nodes.get(&id)?.parent;
        while let Some(parent) = current {
            components.push(parent);
            current = self.nodes.get(&parent)?.parent;
        }
        components.reverse();
        TreePath::from_components(components)
    }
}

/// A single-rooted, in-memory tree model.
///
/// Every mutation updates the storage first and then emits the matching
/// signal, so listeners always observe the post-change hierarchy.
///
/// # Example
///
/// ```
/// use arbor::model::{TreeModel, TreeStore};
///
/// let store = TreeStore::new();
/// let root = store.set_root("Documents".to_string());
/// let notes = store.add_child(root, "notes.txt".to_string()).unwrap();
///
/// assert_eq!(store.child_count(&root), 1);
/// assert_eq!(store.child(&root, 0), Some(notes));
/// assert!(store.is_leaf(&notes));
/// ```
pub struct TreeStore<T> {
    storage: RwLock<TreeStorage<T>>,
    signals: TreeModelSignals<NodeId>,
}

impl<T: Send + Sync + 'static> Default for TreeStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> TreeStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            storage: RwLock::new(TreeStorage::new()),
            signals: TreeModelSignals::new(),
        }
    }

    /// Replaces the whole tree with a single root node.
    ///
    /// Emits `structure_changed` for the new root path.
    pub fn set_root(&self, data: T) -> NodeId {
        let id = next_node_id();
        {
            let mut storage = self.storage.write();
            storage.nodes.clear();
            storage.nodes.insert(
                id,
                TreeNode {
                    data,
                    children: Vec::new(),
                    parent: None,
                },
            );
            storage.root = Some(id);
        }
        tracing::debug!(target: targets::MODEL, root = ?id, "tree root replaced");
        self.signals.emit(
            TreeModelEventKind::StructureChanged,
            TreeModelEvent::for_path(TreePath::root(id)),
        );
        id
    }

    /// Appends a child to `parent`.
    pub fn add_child(&self, parent: NodeId, data: T) -> Result<NodeId> {
        let index = self.storage.read().node(parent)?.children.len();
        self.insert_child(parent, index, data)
    }

    /// Inserts a child of `parent` at position `index`.
    ///
    /// Emits `nodes_inserted` with the parent's path.
    pub fn insert_child(&self, parent: NodeId, index: usize, data: T) -> Result<NodeId> {
        let (id, parent_path) = {
            let mut storage = self.storage.write();
            let id = storage.insert_child(parent, index, data)?;
            let parent_path = storage.path_of(parent).ok_or(Error::NoSuchNode(parent))?;
            (id, parent_path)
        };
        self.signals.emit(
            TreeModelEventKind::NodesInserted,
            TreeModelEvent::with_children(parent_path, vec![index], vec![id]),
        );
        Ok(id)
    }

    /// Appends several children to `parent` and emits a single
    /// `nodes_inserted` event covering all of them.
    pub fn add_children(&self, parent: NodeId, items: Vec<T>) -> Result<Vec<NodeId>> {
        let (ids, indices, parent_path) = {
            let mut storage = self.storage.write();
            let start = storage.node(parent)?.children.len();
            let mut ids = Vec::with_capacity(items.len());
            let mut indices = Vec::with_capacity(items.len());
            for (offset, data) in items.into_iter().enumerate() {
                ids.push(storage.insert_child(parent, start + offset, data)?);
                indices.push(start + offset);
            }
            let parent_path = storage.path_of(parent).ok_or(Error::NoSuchNode(parent))?;
            (ids, indices, parent_path)
        };
        if !ids.is_empty() {
            self.signals.emit(
                TreeModelEventKind::NodesInserted,
                TreeModelEvent::with_children(parent_path, indices, ids.clone()),
            );
        }
        Ok(ids)
    }

    /// Removes a node and all its descendants, returning its data.
    ///
    /// Removing the root empties the store and emits `structure_changed`;
    /// any other node emits `nodes_removed` on its former parent.
    pub fn remove(&self, id: NodeId) -> Result<T> {
        let mut storage = self.storage.write();
        if storage.root == Some(id) {
            let data = storage.remove_subtree(id).ok_or(Error::NoSuchNode(id))?;
            storage.root = None;
            drop(storage);
            self.signals.emit(
                TreeModelEventKind::StructureChanged,
                TreeModelEvent::for_path(TreePath::root(id)),
            );
            return Ok(data);
        }

        let parent = storage.node(id)?.parent.ok_or(Error::NoSuchNode(id))?;
        let row = storage.row_of(id).ok_or(Error::NoSuchNode(id))?;
        let parent_path = storage.path_of(parent).ok_or(Error::NoSuchNode(parent))?;
        storage.node_mut(parent)?.children.remove(row);
        let data = storage.remove_subtree(id).ok_or(Error::NoSuchNode(id))?;
        drop(storage);

        self.signals.emit(
            TreeModelEventKind::NodesRemoved,
            TreeModelEvent::with_children(parent_path, vec![row], vec![id]),
        );
        Ok(data)
    }

    /// Removes the children of `parent` at `indices` and emits a single
    /// `nodes_removed` event. Indices refer to positions before removal.
    pub fn remove_children(&self, parent: NodeId, indices: &[usize]) -> Result<Vec<T>> {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut storage = self.storage.write();
        let children = storage.node(parent)?.children.clone();
        if let Some(&bad) = sorted.iter().find(|&&i| i >= children.len()) {
            return Err(Error::IndexOutOfRange {
                index: bad,
                len: children.len(),
            });
        }
        let parent_path = storage.path_of(parent).ok_or(Error::NoSuchNode(parent))?;
        let removed_ids: Vec<NodeId> = sorted.iter().map(|&i| children[i]).collect();

        storage
            .node_mut(parent)?
            .children
            .retain(|child| !removed_ids.contains(child));
        let data = removed_ids
            .iter()
            .filter_map(|&id| storage.remove_subtree(id))
            .collect();
        drop(storage);

        if !sorted.is_empty() {
            self.signals.emit(
                TreeModelEventKind::NodesRemoved,
                TreeModelEvent::with_children(parent_path, sorted, removed_ids),
            );
        }
        Ok(data)
    }

    /// Replaces every child of `id` with freshly created nodes and emits
    /// `structure_changed` for `id`.
    pub fn replace_children(&self, id: NodeId, items: Vec<T>) -> Result<Vec<NodeId>> {
        let (ids, path) = {
            let mut storage = self.storage.write();
            let old = std::mem::take(&mut storage.node_mut(id)?.children);
            for child in old {
                storage.remove_subtree(child);
            }
            let mut ids = Vec::with_capacity(items.len());
            for (index, data) in items.into_iter().enumerate() {
                ids.push(storage.insert_child(id, index, data)?);
            }
            let path = storage.path_of(id).ok_or(Error::NoSuchNode(id))?;
            (ids, path)
        };
        self.signals.emit(
            TreeModelEventKind::StructureChanged,
            TreeModelEvent::for_path(path),
        );
        Ok(ids)
    }

    /// Provides mutable access to a node's data and emits `nodes_changed`.
    pub fn modify<F, R>(&self, id: NodeId, f: F) -> Result<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let (result, event) = {
            let mut storage = self.storage.write();
            let result = f(&mut storage.node_mut(id)?.data);
            let event = match storage.node(id)?.parent {
                Some(parent) => {
                    let row = storage.row_of(id).ok_or(Error::NoSuchNode(id))?;
                    let parent_path =
                        storage.path_of(parent).ok_or(Error::NoSuchNode(parent))?;
                    TreeModelEvent::with_children(parent_path, vec![row], vec![id])
                }
                None => TreeModelEvent::for_path(TreePath::root(id)),
            };
            (result, event)
        };
        self.signals.emit(TreeModelEventKind::NodesChanged, event);
        Ok(result)
    }

    /// Provides read access to a node's data.
    pub fn with_node<F, R>(&self, id: NodeId, f: F) -> Option<R>
    where
        F: FnOnce(&T) -> R,
    {
        self.storage.read().nodes.get(&id).map(|node| f(&node.data))
    }

    /// The root node, if any.
    pub fn root_id(&self) -> Option<NodeId> {
        self.storage.read().root
    }

    /// The children of `id` in order (empty for unknown ids).
    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.storage
            .read()
            .nodes
            .get(&id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// The path from the root to `id`.
    pub fn path_of(&self, id: NodeId) -> Option<TreePath<NodeId>> {
        self.storage.read().path_of(id)
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.storage.read().nodes.len()
    }

    /// Returns `true` if the store has no root.
    pub fn is_empty(&self) -> bool {
        self.storage.read().root.is_none()
    }
}

impl<T: Send + Sync + 'static> TreeModel for TreeStore<T> {
    type Value = NodeId;

    fn root(&self) -> Option<NodeId> {
        self.storage.read().root
    }

    fn child_count(&self, parent: &NodeId) -> usize {
        self.storage
            .read()
            .nodes
            .get(parent)
            .map_or(0, |node| node.children.len())
    }

    fn child(&self, parent: &NodeId, index: usize) -> Option<NodeId> {
        self.storage
            .read()
            .nodes
            .get(parent)
            .and_then(|node| node.children.get(index).copied())
    }

    fn index_of_child(&self, parent: &NodeId, child: &NodeId) -> Option<usize> {
        let storage = self.storage.read();
        if storage.nodes.get(child)?.parent != Some(*parent) {
            return None;
        }
        storage.row_of(*child)
    }
}

impl<T: Send + Sync + 'static> ObservableTreeModel for TreeStore<T> {
    fn signals(&self) -> &TreeModelSignals<NodeId> {
        &self.signals
    }
}
