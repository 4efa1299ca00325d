//! Hierarchical paths from the model root to a node.

use std::fmt;
use std::sync::Arc;

/// An immutable path of model values, starting at the model root.
///
/// Paths are cheap to clone (the components are shared) and hash by
/// value, so they can key the layout cache's path map directly.
///
/// # Example
///
/// ```
/// use arbor::model::TreePath;
///
/// let root = TreePath::root("R");
/// let child = root.child("A");
///
/// assert_eq!(child.len(), 2);
/// assert_eq!(child.last(), &"A");
/// assert_eq!(child.parent(), Some(root));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TreePath<V> {
    components: Arc<[V]>,
}

impl<V: Clone> TreePath<V> {
    /// A path containing only the root value.
    pub fn root(value: V) -> Self {
        Self {
            components: Arc::from(vec![value]),
        }
    }

    /// Builds a path from its components.
    ///
    /// Returns `None` for an empty component list; every path names at
    /// least the root.
    pub fn from_components(components: Vec<V>) -> Option<Self> {
        if components.is_empty() {
            return None;
        }
        Some(Self {
            components: Arc::from(components),
        })
    }

    /// Returns a new path with `value` appended.
    pub fn child(&self, value: V) -> Self {
        let mut components = Vec::with_capacity(self.components.len() + 1);
        components.extend_from_slice(&self.components);
        components.push(value);
        Self {
            components: Arc::from(components),
        }
    }

    /// The path of the parent node, or `None` for a root path.
    pub fn parent(&self) -> Option<Self> {
        let len = self.components.len();
        if len <= 1 {
            return None;
        }
        Some(Self {
            components: Arc::from(&self.components[..len - 1]),
        })
    }

    /// Returns a copy of this path with the last component replaced.
    pub fn with_last(&self, value: V) -> Self {
        let mut components = self.components.to_vec();
        if let Some(last) = components.last_mut() {
            *last = value;
        }
        Self {
            components: Arc::from(components),
        }
    }
}

impl<V> TreePath<V> {
    /// The value this path points at.
    pub fn last(&self) -> &V {
        // Construction guarantees at least one component.
        &self.components[self.components.len() - 1]
    }

    /// The root value of this path.
    pub fn first(&self) -> &V {
        &self.components[0]
    }

    /// Number of components, the root included.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// All components from the root down.
    pub fn components(&self) -> &[V] {
        &self.components
    }

    /// Depth of the node below the root (the root has depth 0).
    pub fn depth(&self) -> usize {
        self.components.len() - 1
    }
}

impl<V: PartialEq> TreePath<V> {
    /// Returns `true` if `self` is `ancestor` or lies below it.
    pub fn is_descendant_of(&self, ancestor: &TreePath<V>) -> bool {
        self.components.len() >= ancestor.components.len()
            && self.components[..ancestor.components.len()] == ancestor.components[..]
    }
}

impl<V: fmt::Debug> fmt::Debug for TreePath<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.components.iter()).finish()
    }
}
