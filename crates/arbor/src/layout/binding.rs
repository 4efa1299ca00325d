//! Keeping a shared layout cache in sync with an observable model.

use std::sync::{Arc, Weak};

use arbor_core::ConnectionId;
use arbor_core::logging::targets;
use parking_lot::Mutex;

use super::cache::VariableHeightLayoutCache;
use crate::model::{ObservableTreeModel, TreeModelEventKind};

const EVENT_KINDS: [TreeModelEventKind; 4] = [
    TreeModelEventKind::NodesChanged,
    TreeModelEventKind::NodesInserted,
    TreeModelEventKind::NodesRemoved,
    TreeModelEventKind::StructureChanged,
];

/// Routes a model's change signals into a shared layout cache.
///
/// Each notification locks the cache for the duration of one handler, so
/// notifications are applied one at a time in emission order. The binding
/// holds the cache weakly; dropping the binding disconnects it.
///
/// Do not mutate the model while holding the cache lock: the handler for
/// the resulting notification would wait on that lock.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use arbor::layout::{ModelBinding, VariableHeightLayoutCache};
/// use arbor::model::TreeStore;
///
/// let store = Arc::new(TreeStore::new());
/// let root = store.set_root("Root");
/// store.add_child(root, "first").unwrap();
/// let cache = Arc::new(Mutex::new(VariableHeightLayoutCache::new()));
/// let _binding = ModelBinding::new(store.clone(), &cache);
/// assert_eq!(cache.lock().row_count(), 2);
///
/// store.add_child(root, "second").unwrap();
/// assert_eq!(cache.lock().row_count(), 3);
/// ```
pub struct ModelBinding<M: ObservableTreeModel + 'static> {
    model: Arc<M>,
    connections: Vec<(TreeModelEventKind, ConnectionId)>,
}

impl<M: ObservableTreeModel + 'static> ModelBinding<M> {
    /// Installs `model` in `cache` and connects its signals.
    pub fn new(model: Arc<M>, cache: &Arc<Mutex<VariableHeightLayoutCache<M>>>) -> Self {
        cache.lock().set_model(Some(model.clone()));

        let connections = EVENT_KINDS
            .iter()
            .map(|&kind| {
                let weak: Weak<Mutex<VariableHeightLayoutCache<M>>> = Arc::downgrade(cache);
                let id = model.signals().signal(kind).connect(move |event| {
                    if let Some(cache) = weak.upgrade() {
                        cache.lock().process_event(kind, event);
                    }
                });
                (kind, id)
            })
            .collect();
        tracing::debug!(target: targets::MODEL, "model bound to layout cache");

        Self { model, connections }
    }

    /// The bound model.
    pub fn model(&self) -> &Arc<M> {
        &self.model
    }

    /// Disconnects from the model's signals. Also done on drop.
    pub fn disconnect(&mut self) {
        for (kind, id) in self.connections.drain(..) {
            self.model.signals().signal(kind).disconnect(id);
        }
    }
}

impl<M: ObservableTreeModel + 'static> Drop for ModelBinding<M> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
