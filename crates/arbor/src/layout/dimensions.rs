//! Node measurement.
//!
//! The layout cache never measures nodes itself; it asks a
//! [`NodeDimensions`] provider for the rectangle each value needs.

use crate::geometry::Rect;

/// Computes the preferred bounds of a node.
///
/// Only `x`, `width` and `height` of the returned rectangle are used; the
/// cache assigns `y` itself. Returning `None` (or a zero height) means the
/// node cannot be measured yet, and the cache will ask again later.
pub trait NodeDimensions<V>: Send + Sync {
    /// Measures `value` shown at `row` (if known) and `depth`.
    fn node_bounds(&self, value: &V, row: Option<usize>, depth: usize, expanded: bool)
    -> Option<Rect>;
}

/// Adapts a closure into a [`NodeDimensions`] provider.
///
/// # Example
///
/// ```
/// use arbor::geometry::Rect;
/// use arbor::layout::{FnNodeDimensions, NodeDimensions};
///
/// let dims = FnNodeDimensions::new(|label: &&str, _row: Option<usize>, depth: usize, _expanded: bool| {
///     Some(Rect::new(depth as i32 * 16, 0, label.len() as i32 * 7, 18))
/// });
/// assert_eq!(dims.node_bounds(&"abc", Some(0), 1, false), Some(Rect::new(16, 0, 21, 18)));
/// ```
pub struct FnNodeDimensions<F> {
    f: F,
}

impl<F> FnNodeDimensions<F> {
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<V, F> NodeDimensions<V> for FnNodeDimensions<F>
where
    F: Fn(&V, Option<usize>, usize, bool) -> Option<Rect> + Send + Sync,
{
    fn node_bounds(
        &self,
        value: &V,
        row: Option<usize>,
        depth: usize,
        expanded: bool,
    ) -> Option<Rect> {
        (self.f)(value, row, depth, expanded)
    }
}

/// Gives every node the same size, indented by depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformDimensions {
    /// Horizontal offset per depth level.
    pub indent: i32,
    /// Width of every node.
    pub width: i32,
    /// Height of every node.
    pub height: i32,
}

impl UniformDimensions {
    pub fn new(indent: i32, width: i32, height: i32) -> Self {
        Self {
            indent,
            width,
            height,
        }
    }
}

impl<V> NodeDimensions<V> for UniformDimensions {
    fn node_bounds(&self, _value: &V, _row: Option<usize>, depth: usize, _expanded: bool) -> Option<Rect> {
        let depth = i32::try_from(depth).unwrap_or(i32::MAX);
        Some(Rect::new(
            self.indent.saturating_mul(depth),
            0,
            self.width,
            self.height,
        ))
    }
}
