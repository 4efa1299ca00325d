//! Mapping tree paths to cached nodes.

use super::cache::VariableHeightLayoutCache;
use super::node::NodeKey;
use crate::model::{TreeModel, TreePath};

impl<M: TreeModel> VariableHeightLayoutCache<M> {
    /// Finds the cached node for `path` without loading anything.
    ///
    /// With `only_if_visible`, nodes below a collapsed ancestor are
    /// rejected.
    pub(super) fn resolve(&self, path: &TreePath<M::Value>, only_if_visible: bool) -> Option<NodeKey> {
        if let Some(&key) = self.path_map.get(path) {
            return (!only_if_visible || self.is_visible(key)).then_some(key);
        }

        let (mut key, pending) = self.nearest_mapped_ancestor(path)?;
        for value in &pending {
            if only_if_visible && !self.is_visible(key) {
                return None;
            }
            key = self.cached_child(key, value)?;
        }
        (!only_if_visible || self.is_visible(key)).then_some(key)
    }

    /// Finds the node for `path`, loading the children of every ancestor
    /// on the way that has not been loaded yet.
    pub(super) fn resolve_or_create(&mut self, path: &TreePath<M::Value>) -> Option<NodeKey> {
        if let Some(&key) = self.path_map.get(path) {
            return Some(key);
        }

        let (mut key, pending) = self.nearest_mapped_ancestor(path)?;
        for value in &pending {
            self.load_children(key);
            key = self.cached_child(key, value)?;
        }
        Some(key)
    }

    /// Walks up from `path` to the closest mapped ancestor, returning it
    /// with the path components below it, shallowest first.
    fn nearest_mapped_ancestor(&self, path: &TreePath<M::Value>) -> Option<(NodeKey, Vec<M::Value>)> {
        let mut pending = vec![path.last().clone()];
        let mut current = path.parent();
        while let Some(ancestor) = current {
            if let Some(&key) = self.path_map.get(&ancestor) {
                pending.reverse();
                return Some((key, pending));
            }
            pending.push(ancestor.last().clone());
            current = ancestor.parent();
        }
        // Different root: the path does not belong to this tree.
        None
    }

    /// The cached child of `parent` holding `value`, located through the
    /// model's child index.
    ///
    /// The model may already be ahead of the cache, so the slot at that
    /// index is only trusted if it holds `value`; otherwise the cached
    /// children are scanned.
    fn cached_child(&self, parent: NodeKey, value: &M::Value) -> Option<NodeKey> {
        let model = self.model.as_ref()?;
        let node = &self.nodes[parent];
        let holds_value = |&child: &NodeKey| self.nodes[child].value == *value;
        model
            .index_of_child(&node.value, value)
            .and_then(|index| node.children.get(index).copied())
            .filter(holds_value)
            .or_else(|| node.children.iter().copied().find(holds_value))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::layout::{UniformDimensions, VariableHeightLayoutCache};
    use crate::model::{TreeModel, TreePath, TreeStore};

    #[test]
    fn test_resolution_loads_only_when_creating() {
        let store = Arc::new(TreeStore::new());
        let root = store.set_root("R");
        let a = store.add_child(root, "A").unwrap();
        let a1 = store.add_child(a, "A1").unwrap();
        let a1x = store.add_child(a1, "A1x").unwrap();

        let mut cache: VariableHeightLayoutCache<TreeStore<&str>> = VariableHeightLayoutCache::new();
        cache.set_node_dimensions(Some(Box::new(UniformDimensions::new(0, 10, 10))));
        cache.set_model(Some(store.clone()));
        let deep = TreePath::root(root).child(a).child(a1).child(a1x);

        assert_eq!(cache.resolve(&deep, false), None);
        assert_eq!(cache.node_count(), 2);

        let key = cache.resolve_or_create(&deep).unwrap();
        assert_eq!(cache.nodes[key].value, a1x);
        assert_eq!(cache.node_count(), 4);
        assert_eq!(cache.resolve(&deep, false), Some(key));
        assert_eq!(cache.resolve(&deep, true), None);

        // Loading is idempotent.
        assert_eq!(cache.resolve_or_create(&deep), Some(key));
        assert_eq!(cache.node_count(), 4);
        assert_eq!(cache.row_count(), 2);
    }

    #[test]
    fn test_resolution_ignores_shifted_model_index() {
        let store = Arc::new(TreeStore::new());
        let root = store.set_root("R");
        let b = store.add_child(root, "B").unwrap();
        let b1 = store.add_child(b, "b1").unwrap();
        store.add_child(b, "b2").unwrap();

        // Not bound: the cache never hears about the insertion below.
        let mut cache: VariableHeightLayoutCache<TreeStore<&str>> = VariableHeightLayoutCache::new();
        cache.set_model(Some(store.clone()));
        let b_path = TreePath::root(root).child(b);
        cache.set_expanded_state(&b_path, true);
        assert_eq!(cache.node_count(), 4);

        let b0 = store.insert_child(b, 0, "b0").unwrap();
        assert_eq!(store.index_of_child(&b, &b0), Some(0));

        let stale = b_path.child(b0);
        assert_eq!(cache.resolve(&stale, false), None);
        assert_eq!(cache.resolve_or_create(&stale), None);
        let key = cache.resolve(&b_path.child(b1), true).unwrap();
        assert_eq!(cache.nodes[key].value, b1);
    }

    #[test]
    fn test_foreign_root_and_unknown_child() {
        let store = Arc::new(TreeStore::new());
        let root = store.set_root("R");
        let a = store.add_child(root, "A").unwrap();
        let other = TreeStore::new();
        let stranger = other.set_root("X");

        let mut cache = VariableHeightLayoutCache::new();
        cache.set_model(Some(store.clone()));

        assert_eq!(cache.resolve(&TreePath::root(stranger).child(a), false), None);
        assert_eq!(cache.resolve_or_create(&TreePath::root(root).child(stranger)), None);
        assert_eq!(store.index_of_child(&root, &stranger), None);
        assert!(cache.resolve(&TreePath::root(root), true).is_some());
    }
}
