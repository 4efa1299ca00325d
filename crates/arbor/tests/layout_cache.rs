//! Integration tests for the variable-height layout cache.
//!
//! Each test drives the cache the way a tree view would: through a model
//! that emits change signals, with rows and geometry checked afterwards.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};

use arbor::prelude::*;
use arbor_core::TreeFormatOptions;
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

type StoreCache = VariableHeightLayoutCache<TreeStore<&'static str>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A cache bound to `store`, measuring every node `height` tall.
fn bound_cache(
    store: &Arc<TreeStore<&'static str>>,
    height: i32,
) -> (Arc<Mutex<StoreCache>>, ModelBinding<TreeStore<&'static str>>) {
    init_tracing();
    let cache: Arc<Mutex<StoreCache>> = Arc::new(Mutex::new(VariableHeightLayoutCache::new()));
    cache
        .lock()
        .set_node_dimensions(Some(Box::new(UniformDimensions::new(0, 10, height))));
    let binding = ModelBinding::new(store.clone(), &cache);
    (cache, binding)
}

fn row_paths(cache: &StoreCache) -> Vec<TreePath<NodeId>> {
    (0..cache.row_count())
        .map(|row| cache.path_for_row(row).unwrap())
        .collect()
}

// ============================================================================
// Model changes
// ============================================================================

#[test]
fn test_insert_between_siblings_shifts_following_rows() {
    let store = Arc::new(TreeStore::new());
    let r = store.set_root("R");
    let a = store.add_child(r, "A").unwrap();
    let b = store.add_child(r, "B").unwrap();
    let (cache, _binding) = bound_cache(&store, 20);

    let changes = Arc::new(AtomicUsize::new(0));
    let counter = changes.clone();
    cache.lock().visible_rows_changed.connect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let x = store.insert_child(r, 1, "X").unwrap();

    let root = TreePath::root(r);
    let mut cache = cache.lock();
    assert_eq!(
        row_paths(&cache),
        vec![root.clone(), root.child(a), root.child(x), root.child(b)]
    );
    assert_eq!(cache.bounds(&root.child(x)).map(|r| r.y), Some(40));
    assert_eq!(cache.bounds(&root.child(b)).map(|r| r.y), Some(60));
    assert_eq!(cache.preferred_height(), 80);
    assert!(changes.load(Ordering::SeqCst) >= 1);
}

#[test]
fn test_remove_expanded_child_frees_its_subtree() {
    let store = Arc::new(TreeStore::new());
    let r = store.set_root("R");
    let a = store.add_child(r, "A").unwrap();
    let a1 = store.add_child(a, "a1").unwrap();
    store.add_child(a, "a2").unwrap();
    let b = store.add_child(r, "B").unwrap();
    let c = store.add_child(r, "C").unwrap();
    let (cache, _binding) = bound_cache(&store, 20);

    let root = TreePath::root(r);
    cache.lock().set_expanded_state(&root.child(a), true);
    assert_eq!(cache.lock().row_count(), 6);

    store.remove(a).unwrap();

    let mut cache = cache.lock();
    assert_eq!(row_paths(&cache), vec![root.clone(), root.child(b), root.child(c)]);
    assert_eq!(cache.row_for_path(&root.child(a).child(a1)), None);
    assert_eq!(cache.node_count(), 3);
    assert_eq!(cache.bounds(&root.child(b)).map(|r| r.y), Some(20));
    assert_eq!(cache.bounds(&root.child(c)).map(|r| r.y), Some(40));
}

#[test]
fn test_structure_change_reexpands_replaced_node() {
    let store = Arc::new(TreeStore::new());
    let r = store.set_root("R");
    let a = store.add_child(r, "A").unwrap();
    store.add_child(a, "old").unwrap();
    let b = store.add_child(r, "B").unwrap();
    let (cache, _binding) = bound_cache(&store, 20);

    let root = TreePath::root(r);
    cache.lock().set_expanded_state(&root.child(a), true);
    assert_eq!(cache.lock().row_count(), 4);

    let fresh = store.replace_children(a, vec!["n1", "n2"]).unwrap();

    let mut cache = cache.lock();
    assert_eq!(
        row_paths(&cache),
        vec![
            root.clone(),
            root.child(a),
            root.child(a).child(fresh[0]),
            root.child(a).child(fresh[1]),
            root.child(b),
        ]
    );
    assert!(cache.expanded_state(&root.child(a)));
    assert_eq!(cache.bounds(&root.child(b)).map(|r| r.y), Some(80));
}

#[test]
fn test_changed_node_is_remeasured() {
    let store = Arc::new(TreeStore::new());
    let r = store.set_root("R");
    let a = store.add_child(r, "A").unwrap();
    let b = store.add_child(r, "B").unwrap();

    let cache: Arc<Mutex<StoreCache>> = Arc::new(Mutex::new(VariableHeightLayoutCache::new()));
    let labels = store.clone();
    cache.lock().set_node_dimensions(Some(Box::new(FnNodeDimensions::new(
        move |id: &NodeId, _row: Option<usize>, _depth: usize, _expanded: bool| {
            let len = labels.with_node(*id, |label| label.len()).unwrap_or(1);
            Some(Rect::new(0, 0, 10, 10 * len as i32))
        },
    ))));
    let _binding = ModelBinding::new(store.clone(), &cache);

    let root = TreePath::root(r);
    assert_eq!(cache.lock().bounds(&root.child(b)).map(|r| r.y), Some(20));

    store.modify(a, |label| *label = "AAA").unwrap();

    let mut cache = cache.lock();
    assert_eq!(cache.bounds(&root.child(a)).map(|r| r.height), Some(30));
    assert_eq!(cache.bounds(&root.child(b)).map(|r| r.y), Some(40));
}

// ============================================================================
// Expansion
// ============================================================================

/// A fixed model that counts how often it is asked for children.
struct CountingModel {
    children: HashMap<u32, Vec<u32>>,
    child_calls: AtomicUsize,
}

impl CountingModel {
    fn new(edges: Vec<(u32, Vec<u32>)>) -> Self {
        Self {
            children: edges.into_iter().collect(),
            child_calls: AtomicUsize::new(0),
        }
    }

    fn child_calls(&self) -> usize {
        self.child_calls.load(Ordering::SeqCst)
    }
}

impl TreeModel for CountingModel {
    type Value = u32;

    fn root(&self) -> Option<u32> {
        Some(0)
    }

    fn child_count(&self, parent: &u32) -> usize {
        self.children.get(parent).map_or(0, Vec::len)
    }

    fn child(&self, parent: &u32, index: usize) -> Option<u32> {
        self.child_calls.fetch_add(1, Ordering::SeqCst);
        self.children.get(parent)?.get(index).copied()
    }
}

#[test]
fn test_collapse_keeps_loaded_children() {
    init_tracing();
    let model = Arc::new(CountingModel::new(vec![(0, vec![1, 2]), (1, vec![10, 11])]));
    let mut cache: VariableHeightLayoutCache<CountingModel> = VariableHeightLayoutCache::new();
    cache.set_node_dimensions(Some(Box::new(UniformDimensions::new(4, 10, 10))));
    cache.set_model(Some(model.clone()));
    assert_eq!(model.child_calls(), 2);

    let one = TreePath::root(0).child(1);
    cache.set_expanded_state(&one, true);
    assert_eq!(cache.row_count(), 5);
    assert_eq!(model.child_calls(), 4);

    cache.set_expanded_state(&one, false);
    assert_eq!(cache.row_count(), 3);
    assert_eq!(cache.node_count(), 5);
    assert_eq!(cache.row_for_path(&one.child(10)), None);
    assert_eq!(cache.visible_child_count(&one), 0);

    cache.toggle_expanded(&one);
    assert_eq!(model.child_calls(), 4);
    assert_eq!(cache.row_for_path(&one.child(11)), Some(3));
    assert_eq!(cache.visible_child_count(&one), 2);
    assert_eq!(cache.bounds(&one.child(11)), Some(Rect::new(8, 30, 10, 10)));
}

#[test]
fn test_expanding_deep_path_expands_ancestors() {
    let model = Arc::new(CountingModel::new(vec![
        (0, vec![1]),
        (1, vec![2]),
        (2, vec![3]),
        (3, vec![4]),
    ]));
    let mut cache: VariableHeightLayoutCache<CountingModel> = VariableHeightLayoutCache::new();
    cache.set_node_dimensions(Some(Box::new(UniformDimensions::new(0, 10, 10))));
    cache.set_model(Some(model));

    let deep = TreePath::from_components(vec![0, 1, 2, 3]).unwrap();
    cache.set_expanded_state(&deep, true);

    assert_eq!(cache.row_count(), 5);
    assert!(cache.expanded_state(&deep));
    assert_eq!(cache.row_for_path(&deep.child(4)), Some(4));
    assert_eq!(cache.preferred_height(), 50);
}

#[test]
fn test_collapse_moves_selection_to_collapsed_node() {
    let store = Arc::new(TreeStore::new());
    let r = store.set_root("R");
    let a = store.add_child(r, "A").unwrap();
    let a1 = store.add_child(a, "a1").unwrap();
    let (cache, _binding) = bound_cache(&store, 10);

    let selection: Arc<PathSelectionModel<NodeId>> = Arc::new(PathSelectionModel::new());
    let mut cache = cache.lock();
    cache.set_selection_model(Some(selection.clone()));

    let path_a = TreePath::root(r).child(a);
    cache.set_expanded_state(&path_a, true);
    selection.add_selection_path(&path_a.child(a1));

    cache.set_expanded_state(&path_a, false);
    assert_eq!(selection.selection_paths(), vec![path_a.clone()]);
    assert!(!selection.is_path_selected(&path_a.child(a1)));
}

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn test_fixed_row_height_without_measurements() {
    let store = Arc::new(TreeStore::new());
    let r = store.set_root("R");
    for label in ["A", "B", "C", "D"] {
        store.add_child(r, label).unwrap();
    }

    let mut cache = VariableHeightLayoutCache::new();
    cache.set_row_height(20);
    cache.set_model(Some(store.clone()));
    assert!(cache.is_fixed_row_height());
    assert_eq!(cache.row_count(), 5);

    let third = cache.path_for_row(3).unwrap();
    let bounds = cache.bounds(&third).unwrap();
    assert_eq!((bounds.y, bounds.height), (60, 20));
    assert_eq!(cache.preferred_height(), 100);
    assert_eq!(cache.path_closest_to(0, 65), Some(third));
}

#[test]
fn test_hidden_root() {
    let store = Arc::new(TreeStore::new());
    let r = store.set_root("R");
    let a = store.add_child(r, "A").unwrap();
    let b = store.add_child(r, "B").unwrap();

    let cache: Arc<Mutex<StoreCache>> = Arc::new(Mutex::new(VariableHeightLayoutCache::new()));
    {
        let mut guard = cache.lock();
        guard.set_root_visible(false);
        guard.set_node_dimensions(Some(Box::new(UniformDimensions::new(0, 10, 20))));
    }
    let _binding = ModelBinding::new(store.clone(), &cache);

    let root = TreePath::root(r);
    {
        let mut guard = cache.lock();
        assert_eq!(row_paths(&guard), vec![root.child(a), root.child(b)]);
        assert_eq!(guard.row_for_path(&root), None);
        assert_eq!(guard.bounds(&root), None);
        assert_eq!(guard.bounds(&root.child(a)).map(|r| r.y), Some(0));
        assert_eq!(guard.preferred_height(), 40);
    }

    let c = store.add_child(r, "C").unwrap();
    {
        let mut guard = cache.lock();
        assert_eq!(guard.row_for_path(&root.child(c)), Some(2));
        assert_eq!(guard.bounds(&root.child(c)).map(|r| r.y), Some(40));
    }

    let mut guard = cache.lock();
    guard.set_root_visible(true);
    assert_eq!(guard.row_count(), 4);
    assert_eq!(guard.row_for_path(&root), Some(0));
    assert_eq!(guard.bounds(&root.child(a)).map(|r| r.y), Some(20));
    assert_eq!(guard.preferred_height(), 80);
}

#[test]
fn test_path_closest_to_clamps_to_rows() {
    let store = Arc::new(TreeStore::new());
    let r = store.set_root("R");
    let a = store.add_child(r, "A").unwrap();
    let b = store.add_child(r, "B").unwrap();
    let (cache, _binding) = bound_cache(&store, 10);

    let root = TreePath::root(r);
    let mut cache = cache.lock();
    assert_eq!(cache.path_closest_to(0, -5), Some(root.clone()));
    assert_eq!(cache.path_closest_to(0, 15), Some(root.child(a)));
    assert_eq!(cache.path_closest_to(500, 20), Some(root.child(b)));
    assert_eq!(cache.path_closest_to(0, 1000), Some(root.child(b)));

    let mut empty: StoreCache = VariableHeightLayoutCache::new();
    assert_eq!(empty.path_closest_to(0, 0), None);
    assert_eq!(empty.preferred_height(), 0);
    assert_eq!(empty.preferred_width(), 0);
}

#[test]
fn test_invalidation_and_row_height_switches() {
    let store = Arc::new(TreeStore::new());
    let r = store.set_root("R");
    let a = store.add_child(r, "A").unwrap();
    store.add_child(r, "B").unwrap();

    let height = Arc::new(AtomicI32::new(10));
    let measured = height.clone();
    let mut cache: StoreCache = VariableHeightLayoutCache::new();
    cache.set_node_dimensions(Some(Box::new(FnNodeDimensions::new(
        move |_: &NodeId, _row: Option<usize>, _depth: usize, _expanded: bool| {
            Some(Rect::new(0, 0, 50, measured.load(Ordering::SeqCst)))
        },
    ))));
    cache.set_model(Some(store.clone()));
    assert_eq!(cache.preferred_height(), 30);
    assert_eq!(cache.preferred_width(), 50);

    height.store(15, Ordering::SeqCst);
    assert_eq!(cache.preferred_height(), 30);

    cache.invalidate_path_bounds(&TreePath::root(r).child(a));
    assert_eq!(cache.preferred_height(), 35);

    cache.invalidate_sizes();
    assert_eq!(cache.preferred_height(), 45);

    cache.set_row_height(20);
    assert_eq!(cache.preferred_height(), 60);

    cache.set_row_height(0);
    assert!(!cache.is_fixed_row_height());
    assert_eq!(cache.preferred_height(), 45);
}

#[test]
fn test_unmeasurable_nodes_are_laid_out_once_measurable() {
    let store = Arc::new(TreeStore::new());
    let r = store.set_root("R");
    let a = store.add_child(r, "AB").unwrap();
    let x = store.add_child(a, "x").unwrap();
    let c = store.add_child(r, "CDE").unwrap();

    let ready = Arc::new(AtomicBool::new(false));
    let gate = ready.clone();
    let labels = store.clone();
    let cache: Arc<Mutex<StoreCache>> = Arc::new(Mutex::new(VariableHeightLayoutCache::new()));
    cache.lock().set_node_dimensions(Some(Box::new(FnNodeDimensions::new(
        move |id: &NodeId, _row: Option<usize>, _depth: usize, _expanded: bool| {
            if !gate.load(Ordering::SeqCst) {
                return None;
            }
            let len = labels.with_node(*id, |label| label.len())?;
            Some(Rect::new(0, 0, 10, 10 * len as i32))
        },
    ))));
    let _binding = ModelBinding::new(store.clone(), &cache);

    let root = TreePath::root(r);
    {
        let mut guard = cache.lock();
        guard.set_expanded_state(&root.child(a), true);
        assert_eq!(guard.row_count(), 4);
        assert_eq!(guard.preferred_height(), 0);
    }

    ready.store(true, Ordering::SeqCst);

    let mut guard = cache.lock();
    let ys: Vec<i32> = row_paths(&guard)
        .iter()
        .map(|path| guard.bounds(path).unwrap().y)
        .collect();
    assert_eq!(ys, vec![0, 10, 30, 40]);
    assert_eq!(guard.bounds(&root.child(a).child(x)).map(|r| r.height), Some(10));
    assert_eq!(guard.bounds(&root.child(c)).map(|r| r.height), Some(30));
    assert_eq!(guard.preferred_height(), 70);
}

#[test]
fn test_collapsing_hidden_node_through_binding() {
    let store = Arc::new(TreeStore::new());
    let r = store.set_root("R");
    let a = store.add_child(r, "A").unwrap();
    let a1 = store.add_child(a, "A1").unwrap();
    store.add_child(a1, "A1x").unwrap();
    let (cache, _binding) = bound_cache(&store, 10);

    let root = TreePath::root(r);
    let a1_path = root.child(a).child(a1);
    let mut cache = cache.lock();
    cache.set_expanded_state(&a1_path, true);
    cache.set_expanded_state(&root.child(a), false);
    assert_eq!(cache.row_count(), 2);

    cache.set_expanded_state(&a1_path, false);

    assert_eq!(row_paths(&cache), vec![root.clone(), root.child(a), a1_path.clone()]);
    assert!(!cache.expanded_state(&a1_path));
    assert_eq!(cache.preferred_height(), 30);
}

#[test]
fn test_config_driven_cache() {
    let config = LayoutConfig::from_toml_str("row_height = 24\nindent = 20\nroot_visible = false\n").unwrap();
    let store = Arc::new(TreeStore::new());
    let r = store.set_root("R");
    let a = store.add_child(r, "A").unwrap();
    let a1 = store.add_child(a, "a1").unwrap();

    let mut cache = VariableHeightLayoutCache::with_config(&config);
    cache.set_model(Some(store.clone()));
    let path = TreePath::root(r).child(a).child(a1);
    cache.set_expanded_state(&path, true);

    assert!(!cache.is_root_visible());
    assert_eq!(cache.row_for_path(&path), Some(1));
    let bounds = cache.bounds(&path).unwrap();
    assert_eq!((bounds.x, bounds.y, bounds.height), (40, 24, 24));
}

// ============================================================================
// Iteration and debugging
// ============================================================================

#[test]
fn test_visible_paths_follow_row_order() {
    let store = Arc::new(TreeStore::new());
    let r = store.set_root("R");
    let a = store.add_child(r, "A").unwrap();
    let a1 = store.add_child(a, "a1").unwrap();
    let b = store.add_child(r, "B").unwrap();
    let (cache, _binding) = bound_cache(&store, 10);

    let mut cache = cache.lock();
    let root = TreePath::root(r);
    cache.set_expanded_state(&root.child(a), true);

    let paths: Vec<_> = cache.visible_paths_from(&root.child(a)).unwrap().collect();
    assert_eq!(paths, vec![root.child(a), root.child(a).child(a1), root.child(b)]);
    assert_eq!(
        cache.rows_for_paths(&paths),
        vec![Some(1), Some(2), Some(3)]
    );
}

#[test]
fn test_debug_tree_lists_cached_nodes() {
    let store = Arc::new(TreeStore::new());
    let r = store.set_root("R");
    let a = store.add_child(r, "A").unwrap();
    store.add_child(a, "a1").unwrap();
    store.add_child(r, "B").unwrap();
    let (cache, _binding) = bound_cache(&store, 10);

    let cache = cache.lock();
    let dump = cache.debug_tree();
    assert_eq!(dump.lines().count(), 3);
    assert!(dump.lines().next().unwrap().contains("row=0 y=0 10x10 expanded"));
    assert!(dump.contains("unloaded"));

    let minimal = cache.debug_tree_with(TreeFormatOptions::minimal());
    assert!(!minimal.contains("row="));
    assert_eq!(minimal.lines().count(), 3);
}
