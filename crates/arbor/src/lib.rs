//! Arbor - incremental visible-row layout for tree views.
//!
//! Arbor maintains the row geometry of a lazily loaded, partially expanded
//! tree shown in a scrolling list, and keeps it consistent as the
//! underlying model reports insertions, removals, changes and structural
//! replacements.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use arbor::prelude::*;
//!
//! let store = Arc::new(TreeStore::new());
//! let root = store.set_root("Projects");
//! let crate_dir = store.add_child(root, "arbor").unwrap();
//! store.add_child(crate_dir, "Cargo.toml").unwrap();
//!
//! let mut cache = VariableHeightLayoutCache::with_config(&LayoutConfig::default());
//! cache.set_model(Some(store.clone()));
//! assert_eq!(cache.row_count(), 2);
//!
//! cache.set_expanded_state(&store.path_of(crate_dir).unwrap(), true);
//! assert_eq!(cache.row_count(), 3);
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod prelude;

pub use error::{Error, Result};
