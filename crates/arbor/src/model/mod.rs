//! Tree model layer for Arbor.
//!
//! This module provides the read interface the layout cache consumes, the
//! change notifications models emit, and the selection collaborator.
//!
//! # Core Types
//!
//! - `TreeModel`: The trait hierarchical data sources implement
//! - `TreePath`: Immutable root-to-node path of model values
//! - `TreeModelEvent`: A change notification scoped to one parent path
//! - `TreeModelSignals`: Signals an observable model emits
//! - `TreeSelectionModel`: Selection collaborator driven by the layout cache
//!
//! # Model Implementations
//!
//! - `TreeStore`: In-memory single-rooted tree with change signals
//! - `PathSelectionModel`: Default selection model
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────────┐
//! │    Model    │────>│   Signals   │────>│   Layout cache   │
//! │ (TreeModel) │     │             │     │ (visible rows)   │
//! └─────────────┘     └─────────────┘     └──────────────────┘
//!                                                  │
//!                                         ┌────────┴────────┐
//!                                         │ Selection model │
//!                                         └─────────────────┘
//! ```

mod path;
pub mod selection;
mod traits;
mod tree_store;

pub use path::TreePath;
pub use selection::{PathSelectionModel, TreeSelectionMode, TreeSelectionModel};
pub use traits::{
    ObservableTreeModel, TreeModel, TreeModelEvent, TreeModelEventKind, TreeModelSignals,
};
pub use tree_store::{NodeId, TreeStore};
