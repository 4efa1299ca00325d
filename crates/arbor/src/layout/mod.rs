//! Visible-row layout for tree views.
//!
//! [`VariableHeightLayoutCache`] keeps the geometry of every visible row of
//! a tree up to date while the model changes underneath it. Only the
//! expanded portion of the model is mirrored; children are loaded the first
//! time their parent is expanded or a path below it is resolved.
//!
//! # Core Types
//!
//! - `VariableHeightLayoutCache`: The cache itself
//! - `NodeDimensions`: Measures nodes (`FnNodeDimensions`, `UniformDimensions`)
//! - `VisiblePaths`: Row-order iterator over visible paths
//! - `ModelBinding`: Feeds an observable model's signals into a shared cache
//!
//! # Row Height Modes
//!
//! With a positive row height every row has that height and `y = row *
//! row_height`. Otherwise each row takes the height its measurer reports and
//! the cache keeps a running y-origin per row.

mod binding;
mod cache;
mod dimensions;
mod handlers;
mod node;
mod resolve;
mod tree_ops;
mod visible;

pub use binding::ModelBinding;
pub use cache::VariableHeightLayoutCache;
pub use dimensions::{FnNodeDimensions, NodeDimensions, UniformDimensions};
pub use visible::VisiblePaths;
