//! Insertion with proactive top-down splitting
//!
//! Every node on the descent path is guaranteed to have room before the
//! engine steps into it, so a leaf insert never needs to propagate upward.

use crate::error::{AtlasError, Result};
use crate::storage::{Item, Key, Node, Storage, Value};

use super::BTree;

impl<S: Storage> BTree<S> {
    /// Insert `key` with `value`.
    ///
    /// Returns `false` and leaves the tree untouched when `key` is already
    /// present; existing values are never overwritten.
    pub fn insert(&mut self, key: Key, value: Value) -> Result<bool> {
        if self.search(key)?.is_some() {
            tracing::trace!("Insert of existing key {} ignored", key);
            return Ok(false);
        }

        let mut root = self.store.read(self.store.root())?;

        if root.is_full(self.store.layout()) {
            let mut new_root = self.store.allocate_node()?;
            new_root.children.push(root.offset());
            self.split_child(&mut new_root, 0, root)?;
            self.store.set_root(new_root.offset());
            root = new_root;
        }

        self.insert_nonfull(root, Item::new(key, value))?;
        self.commit()?;
        Ok(true)
    }

    /// Split the full child `y` sitting at `parent.children[i]`.
    ///
    /// The upper `t-1` items (and upper `t` children) move to a new sibling,
    /// the median moves up into `parent`. All three nodes are persisted.
    fn split_child(&mut self, parent: &mut Node, i: usize, mut y: Node) -> Result<()> {
        let t = self.store.layout().order();
        let mut z = self.store.allocate_node()?;

        z.items.extend(y.items.drain(t..));
        if !y.is_leaf() {
            z.children.extend(y.children.drain(t..));
        }
        let median = y.items.pop().ok_or_else(|| {
            AtlasError::corrupt(y.offset(), "split of a node with no median")
        })?;

        parent.items.insert(i, median);
        parent.children.insert(i + 1, z.offset());

        tracing::debug!(
            "Split node {} at key {}: new sibling {}, parent {}",
            y.offset(),
            median.key,
            z.offset(),
            parent.offset()
        );

        self.store.write(parent)?;
        self.store.write(&y)?;
        self.store.write(&z)?;
        Ok(())
    }

    /// Insert into a subtree whose root `node` is known not to be full
    fn insert_nonfull(&mut self, mut node: Node, item: Item) -> Result<()> {
        loop {
            let mut i = match node.search(item.key) {
                Ok(_) => return Ok(()),
                Err(i) => i,
            };

            if node.is_leaf() {
                node.items.insert(i, item);
                return self.store.write(&node);
            }

            let child = self.store.read(node.children[i])?;
            if !child.is_full(self.store.layout()) {
                node = child;
                continue;
            }

            self.split_child(&mut node, i, child)?;
            if item.key > node.items[i].key {
                i += 1;
            }
            // The split rewrote the child; fetch whichever half we descend into.
            node = self.store.read(node.children[i])?;
        }
    }
}
