//! Point lookup

use crate::error::Result;
use crate::storage::{Key, Storage, Value};

use super::BTree;

impl<S: Storage> BTree<S> {
    /// Look up `key`, descending one node per level.
    ///
    /// A miss is `Ok(None)`, not an error.
    pub fn search(&mut self, key: Key) -> Result<Option<Value>> {
        let mut node = self.store.read(self.store.root())?;

        loop {
            match node.search(key) {
                Ok(i) => return Ok(Some(node.items[i].value)),
                Err(_) if node.is_leaf() => return Ok(None),
                Err(i) => {
                    let child = node.children[i];
                    node = self.store.read(child)?;
                }
            }
        }
    }

    pub fn contains(&mut self, key: Key) -> Result<bool> {
        Ok(self.search(key)?.is_some())
    }
}
