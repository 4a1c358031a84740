//! Deletion
//!
//! Single top-down pass. Before stepping into a child the engine makes sure
//! the child holds at least `t` items, borrowing one from a sibling
//! (rotation) or merging with a sibling when neither can spare one. Removal
//! at the bottom therefore never underflows a node.
//!
//! Handles that are merged away are consumed by `PageStore::free`; the
//! surviving node is returned to the caller as a fresh handle.

use crate::error::{AtlasError, Result};
use crate::storage::{Item, Key, Node, Storage};

use super::BTree;

impl<S: Storage> BTree<S> {
    /// Remove `key`. Returns `false` if it was not present.
    pub fn delete(&mut self, key: Key) -> Result<bool> {
        let root = self.store.read(self.store.root())?;
        let found = self.delete_from(root, key)?;
        self.commit()?;

        if found {
            tracing::trace!("Deleted key {}", key);
        }
        Ok(found)
    }

    /// Delete `key` from the subtree rooted at `x`, which either is the root
    /// or holds at least `t` items.
    fn delete_from(&mut self, mut x: Node, key: Key) -> Result<bool> {
        let t = self.store.layout().order();

        let i = match x.search(key) {
            Ok(i) if x.is_leaf() => {
                x.items.remove(i);
                self.store.write(&x)?;
                return Ok(true);
            }
            Ok(i) => return self.delete_internal(x, i, key),
            Err(_) if x.is_leaf() => return Ok(false),
            Err(i) => i,
        };

        let child = self.store.read(x.children[i])?;
        let child = if child.len() >= t {
            child
        } else {
            self.fill_child(x, child, i)?
        };
        self.delete_from(child, key)
    }

    /// `key` sits at item `i` of the internal node `x`
    fn delete_internal(&mut self, mut x: Node, i: usize, key: Key) -> Result<bool> {
        let t = self.store.layout().order();

        let y = self.store.read(x.children[i])?;
        if y.len() >= t {
            let pred = self.max_item(&y)?;
            x.items[i] = pred;
            self.store.write(&x)?;
            return self.delete_from(y, pred.key);
        }

        let z = self.store.read(x.children[i + 1])?;
        if z.len() >= t {
            let succ = self.min_item(&z)?;
            x.items[i] = succ;
            self.store.write(&x)?;
            return self.delete_from(z, succ.key);
        }

        let merged = self.merge(x, y, z, i)?;
        self.delete_from(merged, key)
    }

    /// Bring `child` (at `x.children[i]`, holding `t-1` items) up to `t`
    /// items and return the handle to descend into.
    fn fill_child(&mut self, mut x: Node, mut child: Node, i: usize) -> Result<Node> {
        let t = self.store.layout().order();

        let left = match i.checked_sub(1) {
            Some(j) => Some(self.store.read(x.children[j])?),
            None => None,
        };
        let left = match left {
            Some(left) if left.len() >= t => {
                self.rotate_right(&mut x, left, &mut child, i - 1)?;
                return Ok(child);
            }
            other => other,
        };

        let right = match x.children.get(i + 1).copied() {
            Some(offset) => Some(self.store.read(offset)?),
            None => None,
        };
        let right = match right {
            Some(right) if right.len() >= t => {
                self.rotate_left(&mut x, &mut child, right, i)?;
                return Ok(child);
            }
            other => other,
        };

        match (left, right) {
            (Some(left), _) => self.merge(x, left, child, i - 1),
            (None, Some(right)) => self.merge(x, child, right, i),
            (None, None) => Err(AtlasError::corrupt(
                x.offset(),
                format!("child {} has no sibling", i),
            )),
        }
    }

    /// Fold `x.items[i]` and all of `z` into `y` (`y` and `z` are
    /// `x.children[i]` and `x.children[i + 1]`). `z` is freed. If `x` is the
    /// root and ends up empty it is freed too and `y` becomes the root.
    fn merge(&mut self, mut x: Node, mut y: Node, mut z: Node, i: usize) -> Result<Node> {
        let separator = x.items.remove(i);
        x.children.remove(i + 1);

        y.items.push(separator);
        y.items.append(&mut z.items);
        y.children.append(&mut z.children);

        tracing::debug!(
            "Merged node {} into {} around key {} (parent {})",
            z.offset(),
            y.offset(),
            separator.key,
            x.offset()
        );

        if x.is_empty() && x.offset() == self.store.root() {
            self.store.set_root(y.offset());
            self.store.free(x)?;
        } else {
            self.store.write(&x)?;
        }
        self.store.free(z)?;
        self.store.write(&y)?;

        Ok(y)
    }

    /// Move one item from the right sibling `z` through `x.items[i]` into `y`
    fn rotate_left(&mut self, x: &mut Node, y: &mut Node, mut z: Node, i: usize) -> Result<()> {
        if z.is_empty() {
            return Err(AtlasError::corrupt(z.offset(), "rotation from an empty sibling"));
        }

        y.items.push(x.items[i]);
        if !z.is_leaf() {
            y.children.push(z.children.remove(0));
        }
        x.items[i] = z.items.remove(0);

        tracing::debug!(
            "Rotated key {} from {} into {} (parent {})",
            x.items[i].key,
            z.offset(),
            y.offset(),
            x.offset()
        );

        self.store.write(x)?;
        self.store.write(y)?;
        self.store.write(&z)?;
        Ok(())
    }

    /// Move one item from the left sibling `y` through `x.items[i]` into `z`
    fn rotate_right(&mut self, x: &mut Node, mut y: Node, z: &mut Node, i: usize) -> Result<()> {
        let borrowed = y
            .items
            .pop()
            .ok_or_else(|| AtlasError::corrupt(y.offset(), "rotation from an empty sibling"))?;

        z.items.insert(0, x.items[i]);
        if let Some(child) = y.children.pop() {
            z.children.insert(0, child);
        }
        x.items[i] = borrowed;

        tracing::debug!(
            "Rotated key {} from {} into {} (parent {})",
            borrowed.key,
            y.offset(),
            z.offset(),
            x.offset()
        );

        self.store.write(x)?;
        self.store.write(&y)?;
        self.store.write(z)?;
        Ok(())
    }

    /// Rightmost item in the subtree rooted at `node` (in-order predecessor
    /// of the separator to its right)
    fn max_item(&mut self, node: &Node) -> Result<Item> {
        let mut at = node.offset();
        let mut item = node.items.last().copied();
        let mut next = node.children.last().copied();

        while let Some(child) = next {
            let n = self.store.read(child)?;
            at = n.offset();
            item = n.items.last().copied();
            next = n.children.last().copied();
        }

        item.ok_or_else(|| AtlasError::corrupt(at, "empty leaf on predecessor path"))
    }

    /// Leftmost item in the subtree rooted at `node`
    fn min_item(&mut self, node: &Node) -> Result<Item> {
        let mut at = node.offset();
        let mut item = node.items.first().copied();
        let mut next = node.children.first().copied();

        while let Some(child) = next {
            let n = self.store.read(child)?;
            at = n.offset();
            item = n.items.first().copied();
            next = n.children.first().copied();
        }

        item.ok_or_else(|| AtlasError::corrupt(at, "empty leaf on successor path"))
    }
}
