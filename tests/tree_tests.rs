//! Tests for BTree
//!
//! These tests verify:
//! - Search hits and misses
//! - Insert with proactive splitting (exact tree shapes)
//! - Duplicate inserts are ignored
//! - Delete: leaf removal, predecessor/successor replacement, rotation,
//!   merge, root collapse
//! - Free-list reuse of merged-away nodes
//! - Persistence across close/reopen
//! - Randomized workloads checked against std::collections::BTreeMap

use std::collections::BTreeMap;
use std::io::Cursor;

use atlastree::{AtlasError, BTree, Config, Item, Key, Offset};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

type MemTree = BTree<Cursor<Vec<u8>>>;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_tree(order: u32) -> MemTree {
    BTree::create(Cursor::new(Vec::new()), order).unwrap()
}

fn tree_with_keys(order: u32, keys: &[Key]) -> MemTree {
    let mut tree = setup_tree(order);
    for &key in keys {
        assert!(tree.insert(key, key).unwrap());
    }
    tree
}

fn keys_of(tree: &mut MemTree) -> Vec<Key> {
    tree.entries().unwrap().iter().map(|item| item.key).collect()
}

fn reopen(tree: MemTree) -> MemTree {
    BTree::open(tree.into_inner()).unwrap()
}

// =============================================================================
// Search Tests
// =============================================================================

#[test]
fn test_search_empty_tree() {
    let mut tree = setup_tree(2);
    assert_eq!(tree.search(1).unwrap(), None);
    assert_eq!(tree.verify().unwrap().key_count, 0);
}

#[test]
fn test_search_hits_and_misses() {
    let mut tree = setup_tree(3);
    for key in (0..200).step_by(2) {
        tree.insert(key, key * 10).unwrap();
    }

    for key in (0..200).step_by(2) {
        assert_eq!(tree.search(key).unwrap(), Some(key * 10));
    }
    for key in (1..200).step_by(2) {
        assert_eq!(tree.search(key).unwrap(), None);
    }
    assert_eq!(tree.search(-1).unwrap(), None);
    assert_eq!(tree.search(1000).unwrap(), None);
}

#[test]
fn test_negative_and_extreme_keys() {
    let keys = [Key::MIN, -5, 0, 5, Key::MAX];
    let mut tree = setup_tree(2);
    for &key in &keys {
        tree.insert(key, key.wrapping_mul(3)).unwrap();
    }

    for &key in &keys {
        assert_eq!(tree.search(key).unwrap(), Some(key.wrapping_mul(3)));
    }
    assert_eq!(keys_of(&mut tree), keys.to_vec());
}

// =============================================================================
// Insert Tests
// =============================================================================

#[test]
fn test_insert_into_root_leaf() {
    let mut tree = tree_with_keys(2, &[3, 1, 2]);

    assert_eq!(tree.levels().unwrap(), vec![vec![vec![1, 2, 3]]]);
    assert_eq!(tree.node_count(), 1);
}

#[test]
fn test_insert_splits_full_root_before_descending() {
    let mut tree = tree_with_keys(2, &[1, 2, 3, 4]);

    assert_eq!(
        tree.levels().unwrap(),
        vec![vec![vec![2]], vec![vec![1], vec![3, 4]]]
    );
    assert_eq!(tree.node_count(), 3);
}

#[test]
fn test_insert_one_through_seven_order_two() {
    let mut tree = tree_with_keys(2, &[1, 2, 3, 4, 5, 6, 7]);

    assert_eq!(
        tree.levels().unwrap(),
        vec![vec![vec![2, 4]], vec![vec![1], vec![3], vec![5, 6, 7]]]
    );

    let stats = tree.verify().unwrap();
    assert_eq!(stats.depth, 2);
    assert_eq!(stats.node_count, 4);
    assert_eq!(stats.key_count, 7);
}

#[test]
fn test_insert_grows_root_when_full_on_deeper_tree() {
    // Root [2 4 6] fills after key 8; key 9 forces a second root split
    let mut tree = tree_with_keys(2, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

    let levels = tree.levels().unwrap();
    assert_eq!(levels.len(), 3);
    assert_eq!(levels[0], vec![vec![4]]);
    tree.verify().unwrap();
}

#[test]
fn test_insert_duplicate_is_ignored() {
    let mut tree = tree_with_keys(2, &[10, 20, 30]);
    let before = *tree.header();

    assert!(!tree.insert(20, 999).unwrap());

    assert_eq!(tree.search(20).unwrap(), Some(20));
    assert_eq!(keys_of(&mut tree), vec![10, 20, 30]);
    assert_eq!(*tree.header(), before);
}

#[test]
fn test_insert_duplicate_of_internal_key() {
    let mut tree = tree_with_keys(2, &[1, 2, 3, 4, 5, 6, 7]);

    // 2 and 4 live in the root
    assert!(!tree.insert(4, 0).unwrap());
    assert!(!tree.insert(2, 0).unwrap());
    assert_eq!(tree.search(4).unwrap(), Some(4));
    assert_eq!(tree.verify().unwrap().key_count, 7);
}

#[test]
fn test_insert_descending_and_larger_orders() {
    for order in [2, 3, 5, 8] {
        let keys: Vec<Key> = (0..300).rev().collect();
        let mut tree = tree_with_keys(order, &keys);

        assert_eq!(keys_of(&mut tree), (0..300).collect::<Vec<_>>());
        assert_eq!(tree.verify().unwrap().key_count, 300);
    }
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_from_leaf() {
    let mut tree = tree_with_keys(2, &[1, 2, 3]);

    assert!(tree.delete(2).unwrap());
    assert_eq!(tree.search(2).unwrap(), None);
    assert_eq!(tree.levels().unwrap(), vec![vec![vec![1, 3]]]);
}

#[test]
fn test_delete_missing_key_is_noop() {
    let mut tree = tree_with_keys(2, &[1, 2, 3, 4, 5, 6, 7]);
    let before = tree.entries().unwrap();

    assert!(!tree.delete(100).unwrap());
    // The descent may still merge minimal nodes on its way down
    assert!(!tree.delete(0).unwrap());

    assert_eq!(tree.entries().unwrap(), before);
    tree.verify().unwrap();
}

#[test]
fn test_delete_from_empty_tree() {
    let mut tree = setup_tree(3);
    assert!(!tree.delete(1).unwrap());
    assert_eq!(tree.node_count(), 1);
}

#[test]
fn test_delete_then_search_scenario() {
    let mut tree = tree_with_keys(2, &[10, 20, 5, 6, 12, 30, 7, 17]);

    assert!(tree.delete(6).unwrap());

    assert_eq!(tree.search(6).unwrap(), None);
    assert_eq!(tree.search(7).unwrap(), Some(7));
    assert_eq!(keys_of(&mut tree), vec![5, 7, 10, 12, 17, 20, 30]);
    tree.verify().unwrap();
}

#[test]
fn test_delete_internal_key_uses_predecessor() {
    // root [2 4], leaves [1] [3] [5 6 7]
    let mut tree = tree_with_keys(2, &[1, 2, 3, 4, 5, 6, 7]);
    tree.insert(0, 0).unwrap();
    // leaves [0 1] [3] [5 6 7]: left child of 2 can spare its predecessor
    assert!(tree.delete(2).unwrap());

    assert_eq!(
        tree.levels().unwrap(),
        vec![vec![vec![1, 4]], vec![vec![0], vec![3], vec![5, 6, 7]]]
    );
    tree.verify().unwrap();
}

#[test]
fn test_delete_internal_key_uses_successor() {
    // root [2 4], leaves [1] [3] [5 6 7]: left child of 4 is minimal
    let mut tree = tree_with_keys(2, &[1, 2, 3, 4, 5, 6, 7]);

    assert!(tree.delete(4).unwrap());

    assert_eq!(
        tree.levels().unwrap(),
        vec![vec![vec![2, 5]], vec![vec![1], vec![3], vec![6, 7]]]
    );
    tree.verify().unwrap();
}

#[test]
fn test_delete_internal_key_merges_children() {
    // root [2 4], leaves [1] [3] [5 6 7]: both children of 2 are minimal
    let mut tree = tree_with_keys(2, &[1, 2, 3, 4, 5, 6, 7]);
    let nodes = tree.node_count();

    assert!(tree.delete(2).unwrap());

    assert_eq!(
        tree.levels().unwrap(),
        vec![vec![vec![4]], vec![vec![1, 3], vec![5, 6, 7]]]
    );
    assert_eq!(tree.node_count(), nodes - 1);
    assert!(!tree.free_head().is_nil());
    tree.verify().unwrap();
}

#[test]
fn test_delete_rotates_from_right_sibling() {
    // root [2], leaves [1] [3 4]
    let mut tree = tree_with_keys(2, &[1, 2, 3, 4]);

    assert!(tree.delete(1).unwrap());

    assert_eq!(
        tree.levels().unwrap(),
        vec![vec![vec![3]], vec![vec![2], vec![4]]]
    );
    assert_eq!(tree.node_count(), 3);
    tree.verify().unwrap();
}

#[test]
fn test_delete_rotates_from_left_sibling() {
    let mut tree = tree_with_keys(2, &[1, 2, 3, 4, 5, 6, 7]);
    tree.insert(0, 0).unwrap();
    // leaves [0 1] [3] [5 6 7]; descending into [3] borrows from [0 1]
    assert!(tree.delete(3).unwrap());

    assert_eq!(
        tree.levels().unwrap(),
        vec![vec![vec![1, 4]], vec![vec![0], vec![2], vec![5, 6, 7]]]
    );
    tree.verify().unwrap();
}

#[test]
fn test_delete_collapses_root() {
    // root [2], leaves [1] [3]: merging empties the root
    let mut tree = tree_with_keys(2, &[1, 2, 3, 4]);
    tree.delete(4).unwrap();
    assert_eq!(
        tree.levels().unwrap(),
        vec![vec![vec![2]], vec![vec![1], vec![3]]]
    );
    let old_root = tree.root_offset();

    assert!(tree.delete(1).unwrap());

    assert_eq!(tree.levels().unwrap(), vec![vec![vec![2, 3]]]);
    assert_ne!(tree.root_offset(), old_root);
    assert_eq!(tree.node_count(), 1);
    tree.verify().unwrap();
}

#[test]
fn test_delete_everything_leaves_empty_root() {
    let keys: Vec<Key> = (1..=100).collect();
    let mut tree = tree_with_keys(3, &keys);

    for &key in &keys {
        assert!(tree.delete(key).unwrap(), "key {} should be present", key);
    }

    assert_eq!(tree.entries().unwrap(), Vec::<Item>::new());
    assert_eq!(tree.node_count(), 1);
    let stats = tree.verify().unwrap();
    assert_eq!(stats.depth, 1);
    assert_eq!(stats.key_count, 0);
}

// =============================================================================
// Free List Tests
// =============================================================================

#[test]
fn test_freed_offsets_are_reused_before_extending_file() {
    // root [2], leaves [1] [3 4]
    let mut tree = tree_with_keys(2, &[1, 2, 3, 4]);
    let end = tree.next_offset();

    // Merge [1 2 3] back into one leaf: frees the root and the right leaf
    tree.delete(4).unwrap();
    tree.delete(1).unwrap();
    assert_eq!(tree.node_count(), 1);
    let head = tree.free_head();
    assert!(!head.is_nil());

    // Fill the lone leaf and force a root split: both new nodes come from
    // the free list, most recently freed first
    tree.insert(4, 4).unwrap();
    tree.insert(5, 5).unwrap();
    assert_eq!(tree.root_offset(), head);
    assert!(tree.free_head().is_nil());
    assert_eq!(tree.next_offset(), end);
    assert_eq!(tree.node_count(), 3);
    tree.verify().unwrap();
}

#[test]
fn test_file_size_stable_under_churn() {
    let mut tree = setup_tree(2);
    for round in 0..5 {
        for key in 0..200 {
            tree.insert(key, key + round).unwrap();
        }
        for key in 0..200 {
            assert!(tree.delete(key).unwrap());
        }
    }
    let end = tree.next_offset();

    for key in 0..200 {
        tree.insert(key, key).unwrap();
    }
    assert!(tree.next_offset() <= end);
    tree.verify().unwrap();
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_reopen_in_memory_medium() {
    let keys: Vec<Key> = (0..500).map(|k| k * 7 % 1000).collect();
    let mut tree = tree_with_keys(3, &keys);
    for key in (0..500).step_by(3) {
        tree.delete(key * 7 % 1000).unwrap();
    }
    let expected = tree.entries().unwrap();
    let header = *tree.header();

    let mut reopened = reopen(tree);

    assert_eq!(*reopened.header(), header);
    assert_eq!(reopened.entries().unwrap(), expected);
    for item in &expected {
        assert_eq!(reopened.search(item.key).unwrap(), Some(item.value));
    }
    reopened.verify().unwrap();
}

#[test]
fn test_reopen_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .path(temp_dir.path().join("tree.bt"))
        .order(4)
        .build();

    {
        let mut tree = BTree::create_path(&config).unwrap();
        for key in 0..1000 {
            tree.insert(key, key * 2).unwrap();
        }
        for key in (0..1000).step_by(5) {
            tree.delete(key).unwrap();
        }
    }

    let mut tree = BTree::open_path(&config.path).unwrap();
    assert_eq!(tree.order(), 4);
    for key in 0..1000 {
        let expected = if key % 5 == 0 { None } else { Some(key * 2) };
        assert_eq!(tree.search(key).unwrap(), expected);
    }
    tree.verify().unwrap();
}

#[test]
fn test_open_or_create_keeps_existing_order() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("tree.bt");

    let config = Config::builder().path(&path).order(5).build();
    {
        let mut tree = BTree::open_or_create(&config).unwrap();
        tree.insert(1, 1).unwrap();
    }

    let other = Config::builder().path(&path).order(2).build();
    let mut tree = BTree::open_or_create(&other).unwrap();
    assert_eq!(tree.order(), 5);
    assert_eq!(tree.search(1).unwrap(), Some(1));
}

#[test]
fn test_open_missing_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let result = BTree::open_path(&temp_dir.path().join("missing.bt"));
    assert!(matches!(result, Err(AtlasError::Io(_))));
}

#[test]
fn test_create_rejects_small_order() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .path(temp_dir.path().join("tree.bt"))
        .order(1)
        .build();

    assert!(matches!(BTree::create_path(&config), Err(AtlasError::Config(_))));
    assert!(matches!(
        BTree::create(Cursor::new(Vec::new()), 1),
        Err(AtlasError::Config(_))
    ));
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_corrupt_child_offset_is_reported() {
    let mut tree = tree_with_keys(2, &[1, 2, 3, 4]);
    let root = tree.root_offset();
    let mut bytes = tree.into_inner().into_inner();

    // First child slot of the root: count (4) + 3 items (48)
    let slot = root.get() as usize + 4 + 48;
    bytes[slot..slot + 8].copy_from_slice(&9_999_999u64.to_ne_bytes());

    let mut tree = BTree::open(Cursor::new(bytes)).unwrap();
    let result = tree.search(1);
    assert!(matches!(
        result,
        Err(AtlasError::CorruptNode { offset, .. }) if offset == Offset::new(9_999_999)
    ));
}

#[test]
fn test_verify_detects_count_mismatch() {
    let tree = tree_with_keys(2, &[1, 2, 3, 4]);
    let mut bytes = tree.into_inner().into_inner();
    // count_nodes is the second header field
    bytes[4..8].copy_from_slice(&7u32.to_ne_bytes());

    let mut tree = BTree::open(Cursor::new(bytes)).unwrap();
    assert!(matches!(tree.verify(), Err(AtlasError::InvariantViolation(_))));
}

// =============================================================================
// Randomized Model Tests
// =============================================================================

fn run_model(order: u32, seed: u64, ops: usize, key_space: Key) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tree = setup_tree(order);
    let mut model: BTreeMap<Key, i64> = BTreeMap::new();

    for step in 0..ops {
        let key = rng.random_range(0..key_space);
        if rng.random_range(0..3) < 2 {
            let value = rng.random_range(-1000..1000);
            let inserted = tree.insert(key, value).unwrap();
            assert_eq!(inserted, !model.contains_key(&key), "step {}", step);
            model.entry(key).or_insert(value);
        } else {
            let deleted = tree.delete(key).unwrap();
            assert_eq!(deleted, model.remove(&key).is_some(), "step {}", step);
        }

        if step % 50 == 0 {
            let stats = tree.verify().unwrap();
            assert_eq!(stats.key_count, model.len());
        }
    }

    let expected: Vec<Item> = model.iter().map(|(&k, &v)| Item::new(k, v)).collect();
    assert_eq!(tree.entries().unwrap(), expected);
    for key in 0..key_space {
        assert_eq!(tree.search(key).unwrap(), model.get(&key).copied());
    }

    let mut reopened = reopen(tree);
    assert_eq!(reopened.entries().unwrap(), expected);
    reopened.verify().unwrap();
}

#[test]
fn test_random_workload_order_two() {
    run_model(2, 7, 4000, 300);
}

#[test]
fn test_random_workload_order_three() {
    run_model(3, 42, 4000, 500);
}

#[test]
fn test_random_workload_order_six() {
    run_model(6, 1234, 6000, 2000);
}

#[test]
fn test_shuffled_insert_then_delete_all() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut keys: Vec<Key> = (0..1000).collect();
    keys.shuffle(&mut rng);

    let mut tree = tree_with_keys(2, &keys);
    assert_eq!(keys_of(&mut tree), (0..1000).collect::<Vec<_>>());

    keys.shuffle(&mut rng);
    for (n, &key) in keys.iter().enumerate() {
        assert!(tree.delete(key).unwrap());
        assert_eq!(tree.search(key).unwrap(), None);
        if n % 100 == 0 {
            assert_eq!(tree.verify().unwrap().key_count, 999 - n);
        }
    }
    assert_eq!(tree.node_count(), 1);
}
