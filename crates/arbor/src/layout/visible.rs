//! Forward iteration over visible paths.

use std::iter::FusedIterator;

use super::cache::VariableHeightLayoutCache;
use super::node::NodeKey;
use crate::model::{TreeModel, TreePath};

/// Depth-first iterator over the visible paths, in row order, starting at
/// a given path.
///
/// Created by [`VariableHeightLayoutCache::visible_paths_from`]. The
/// iterator borrows the cache, so the cache cannot change while it is in
/// use; start a new iterator after a mutation.
pub struct VisiblePaths<'a, M: TreeModel> {
    cache: &'a VariableHeightLayoutCache<M>,
    /// Node whose children are being walked; `None` once exhausted.
    parent: Option<NodeKey>,
    /// Next child of `parent` to yield; `None` yields `parent` itself.
    next_index: Option<usize>,
}

impl<M: TreeModel> VariableHeightLayoutCache<M> {
    /// Iterates the visible paths from `path` (inclusive) to the last row.
    ///
    /// Returns `None` if `path` is not visible. A hidden root is skipped
    /// when iteration starts there.
    pub fn visible_paths_from(&self, path: &TreePath<M::Value>) -> Option<VisiblePaths<'_, M>> {
        let key = self.resolve(path, true)?;
        let mut iter = VisiblePaths {
            cache: self,
            parent: Some(key),
            next_index: None,
        };
        if self.nodes[key].row.is_none() {
            iter.advance();
        }
        Some(iter)
    }
}

impl<M: TreeModel> VisiblePaths<'_, M> {
    fn advance(&mut self) {
        if !self.update_next_index() {
            self.find_next_valid_parent();
        }
    }

    /// Steps to the next child of `parent`, descending into it if it is
    /// expanded. Returns `false` when `parent` has no further children.
    fn update_next_index(&mut self) -> bool {
        let Some(parent) = self.parent else {
            return false;
        };
        let node = &self.cache.nodes[parent];
        if self.next_index.is_none() && !node.expanded {
            return false;
        }
        let index = self.next_index.map_or(0, |i| i + 1);
        let Some(&child) = node.children.get(index) else {
            return false;
        };
        if self.cache.nodes[child].expanded {
            self.parent = Some(child);
            self.next_index = None;
        } else {
            self.next_index = Some(index);
        }
        true
    }

    /// Climbs until an ancestor with a following child is found.
    fn find_next_valid_parent(&mut self) {
        while let Some(current) = self.parent {
            if Some(current) == self.cache.root {
                self.parent = None;
                return;
            }
            let Some(up) = self.cache.nodes[current].parent else {
                self.parent = None;
                return;
            };
            self.next_index = self.cache.nodes[up]
                .children
                .iter()
                .position(|&child| child == current);
            self.parent = Some(up);
            if self.next_index.is_none() {
                self.parent = None;
                return;
            }
            if self.update_next_index() {
                return;
            }
        }
    }
}

impl<M: TreeModel> Iterator for VisiblePaths<'_, M> {
    type Item = TreePath<M::Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let parent = self.parent?;
        let key = match self.next_index {
            None => parent,
            Some(index) => self.cache.nodes[parent].children[index],
        };
        let path = self.cache.nodes[key].path.clone();
        self.advance();
        Some(path)
    }
}

impl<M: TreeModel> FusedIterator for VisiblePaths<'_, M> {}
