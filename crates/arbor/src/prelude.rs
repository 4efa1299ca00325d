//! Prelude module for Arbor.
//!
//! ```ignore
//! use arbor::prelude::*;
//! ```

// ============================================================================
// Signals
// ============================================================================

pub use arbor_core::{ConnectionId, Signal};

// ============================================================================
// Model
// ============================================================================

pub use crate::model::{
    NodeId, ObservableTreeModel, PathSelectionModel, TreeModel, TreeModelEvent,
    TreeModelEventKind, TreePath, TreeSelectionModel, TreeStore,
};

// ============================================================================
// Layout
// ============================================================================

pub use crate::config::LayoutConfig;
pub use crate::geometry::Rect;
pub use crate::layout::{
    FnNodeDimensions, ModelBinding, NodeDimensions, UniformDimensions, VariableHeightLayoutCache,
};
