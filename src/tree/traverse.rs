//! Enumeration and structural checks
//!
//! Read-only walks over the tree used by the operator `P` command, tests,
//! and diagnostics.

use std::collections::{HashSet, VecDeque};

use crate::error::{AtlasError, Result};
use crate::storage::{Item, Key, Offset, Storage};

use super::BTree;

/// Shape summary returned by `BTree::verify`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    /// Number of levels (1 for a lone root)
    pub depth: usize,
    /// Nodes reachable from the root
    pub node_count: usize,
    /// Items stored across all nodes
    pub key_count: usize,
}

impl<S: Storage> BTree<S> {
    /// Keys of every node, grouped by level, left to right
    pub fn levels(&mut self) -> Result<Vec<Vec<Vec<Key>>>> {
        let mut levels: Vec<Vec<Vec<Key>>> = Vec::new();
        let mut queue = VecDeque::from([(self.store.root(), 0usize)]);

        while let Some((offset, depth)) = queue.pop_front() {
            let node = self.store.read(offset)?;
            if levels.len() == depth {
                levels.push(Vec::new());
            }
            levels[depth].push(node.keys().collect());
            queue.extend(node.children().iter().map(|&child| (child, depth + 1)));
        }

        Ok(levels)
    }

    /// All items in ascending key order
    pub fn entries(&mut self) -> Result<Vec<Item>> {
        let mut out = Vec::new();
        self.collect_in_order(self.store.root(), &mut out)?;
        Ok(out)
    }

    fn collect_in_order(&mut self, offset: Offset, out: &mut Vec<Item>) -> Result<()> {
        let node = self.store.read(offset)?;
        if node.is_leaf() {
            out.extend_from_slice(node.items());
            return Ok(());
        }
        for (i, &child) in node.children().iter().enumerate() {
            self.collect_in_order(child, out)?;
            if let Some(item) = node.items().get(i) {
                out.push(*item);
            }
        }
        Ok(())
    }

    /// Walk the whole tree and check the B-tree invariants:
    /// - keys strictly ascending and within the separator bounds
    /// - non-root nodes hold `t-1..=2t-1` items, the root `0..=2t-1`
    /// - an internal root holds at least one item
    /// - every leaf at the same depth
    /// - no node reachable twice, and the header node count matches
    pub fn verify(&mut self) -> Result<TreeStats> {
        let mut walk = Walk {
            seen: HashSet::new(),
            leaf_depth: None,
            stats: TreeStats::default(),
        };
        self.verify_node(self.store.root(), None, None, 1, &mut walk)?;

        let recorded = self.store.header().count_nodes as usize;
        if walk.stats.node_count != recorded {
            return Err(AtlasError::InvariantViolation(format!(
                "header records {} nodes, {} reachable",
                recorded, walk.stats.node_count
            )));
        }

        Ok(walk.stats)
    }

    fn verify_node(
        &mut self,
        offset: Offset,
        lower: Option<Key>,
        upper: Option<Key>,
        depth: usize,
        walk: &mut Walk,
    ) -> Result<()> {
        if !walk.seen.insert(offset) {
            return Err(AtlasError::InvariantViolation(format!(
                "node {} is reachable more than once",
                offset
            )));
        }

        let node = self.store.read(offset)?;
        let layout = *self.store.layout();
        let is_root = offset == self.store.root();

        if !is_root && node.len() < layout.min_keys() {
            return Err(AtlasError::InvariantViolation(format!(
                "node {} holds {} items, minimum is {}",
                offset,
                node.len(),
                layout.min_keys()
            )));
        }
        if is_root && !node.is_leaf() && node.is_empty() {
            return Err(AtlasError::InvariantViolation(format!(
                "internal root {} holds no items",
                offset
            )));
        }
        for key in node.keys() {
            let above = lower.map_or(true, |low| key > low);
            let below = upper.map_or(true, |high| key < high);
            if !above || !below {
                return Err(AtlasError::InvariantViolation(format!(
                    "key {} in node {} is outside ({:?}, {:?})",
                    key, offset, lower, upper
                )));
            }
        }

        walk.stats.node_count += 1;
        walk.stats.key_count += node.len();
        walk.stats.depth = walk.stats.depth.max(depth);

        if node.is_leaf() {
            match walk.leaf_depth {
                Some(expected) if expected != depth => {
                    return Err(AtlasError::InvariantViolation(format!(
                        "leaf {} at depth {}, other leaves at {}",
                        offset, depth, expected
                    )));
                }
                _ => walk.leaf_depth = Some(depth),
            }
            return Ok(());
        }

        for (i, &child) in node.children().iter().enumerate() {
            let low = if i == 0 { lower } else { Some(node.items()[i - 1].key) };
            let high = node.items().get(i).map(|item| item.key).or(upper);
            self.verify_node(child, low, high, depth + 1, walk)?;
        }
        Ok(())
    }
}

struct Walk {
    seen: HashSet<Offset>,
    leaf_depth: Option<usize>,
    stats: TreeStats,
}
