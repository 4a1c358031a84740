//! Node records
//!
//! In-memory form of a node and its fixed-size on-disk encoding.

use bytes::{Buf, BufMut};

use crate::error::{AtlasError, Result};

use super::{try_vec, Offset, HEADER_SIZE};

pub type Key = i64;
pub type Value = i64;

const COUNT_WIDTH: usize = 4;
const ITEM_WIDTH: usize = 16;
const CHILD_WIDTH: usize = 8;

/// A key with its associated value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub key: Key,
    pub value: Value,
}

impl Item {
    pub fn new(key: Key, value: Value) -> Self {
        Self { key, value }
    }
}

/// Sizes derived once from the minimum degree `t`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLayout {
    order: usize,
    node_size: usize,
}

impl NodeLayout {
    /// Returns `None` when `t < 2` or the record size would overflow.
    pub fn new(order: u32) -> Option<Self> {
        if order < 2 {
            return None;
        }
        let order = usize::try_from(order).ok()?;
        let fanout = order.checked_mul(2)?;
        // count_keys is stored as a u32
        u32::try_from(fanout - 1).ok()?;

        let node_size = (fanout - 1)
            .checked_mul(ITEM_WIDTH)?
            .checked_add(fanout.checked_mul(CHILD_WIDTH)?)?
            .checked_add(COUNT_WIDTH)?;
        u64::try_from(node_size).ok()?;

        Some(Self { order, node_size })
    }

    /// Minimum degree `t`
    pub fn order(&self) -> usize {
        self.order
    }

    /// Maximum fanout `M = 2t`
    pub fn max_children(&self) -> usize {
        2 * self.order
    }

    /// `M - 1`
    pub fn max_keys(&self) -> usize {
        2 * self.order - 1
    }

    /// `t - 1`, the least a non-root node may hold
    pub fn min_keys(&self) -> usize {
        self.order - 1
    }

    pub fn node_size(&self) -> usize {
        self.node_size
    }

    /// True if `offset` is the start of a slot below the allocation cursor `end`
    pub fn is_slot(&self, offset: Offset, end: Offset) -> bool {
        let raw = offset.get();
        raw >= HEADER_SIZE
            && raw < end.get()
            && (raw - HEADER_SIZE) % self.node_size as u64 == 0
    }
}

/// A node handle materialized from the page store.
///
/// A handle is a private copy: mutating it changes nothing on disk until it
/// is passed to `PageStore::write`. It is deliberately not `Clone`, so the
/// only way to get a second view of the same offset is to read it again.
#[derive(Debug)]
pub struct Node {
    offset: Offset,
    pub(crate) items: Vec<Item>,
    /// Empty for a leaf, `items.len() + 1` entries otherwise
    pub(crate) children: Vec<Offset>,
}

impl Node {
    pub(crate) fn empty(offset: Offset, layout: &NodeLayout) -> Result<Self> {
        Ok(Self {
            offset,
            items: try_vec(layout.max_keys())?,
            children: try_vec(layout.max_children())?,
        })
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn children(&self) -> &[Offset] {
        &self.children
    }

    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.items.iter().map(|item| item.key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_full(&self, layout: &NodeLayout) -> bool {
        self.items.len() == layout.max_keys()
    }

    /// `Ok(i)` if `key` sits at item `i`, otherwise `Err(i)` with the child
    /// index to descend into.
    pub fn search(&self, key: Key) -> std::result::Result<usize, usize> {
        self.items.binary_search_by_key(&key, |item| item.key)
    }

    /// Encode into a full record; unused item and child slots are zeroed.
    pub(crate) fn encode(&self, layout: &NodeLayout) -> Result<Vec<u8>> {
        if self.items.len() > layout.max_keys() || self.children.len() > layout.max_children() {
            return Err(AtlasError::corrupt(
                self.offset,
                format!(
                    "node holds {} items and {} children, layout allows {} and {}",
                    self.items.len(),
                    self.children.len(),
                    layout.max_keys(),
                    layout.max_children()
                ),
            ));
        }

        let mut buf: Vec<u8> = try_vec(layout.node_size())?;
        buf.put_u32_ne(self.items.len() as u32);
        for item in &self.items {
            buf.put_i64_ne(item.key);
            buf.put_i64_ne(item.value);
        }
        buf.put_bytes(0, (layout.max_keys() - self.items.len()) * ITEM_WIDTH);
        for child in &self.children {
            buf.put_u64_ne(child.get());
        }
        buf.put_bytes(0, (layout.max_children() - self.children.len()) * CHILD_WIDTH);

        Ok(buf)
    }

    /// Decode a record read from `offset`. Leaf-ness is inferred from the
    /// first child slot.
    pub(crate) fn decode(offset: Offset, record: &[u8], layout: &NodeLayout) -> Result<Self> {
        if record.len() != layout.node_size() {
            return Err(AtlasError::corrupt(
                offset,
                format!("record is {} bytes, expected {}", record.len(), layout.node_size()),
            ));
        }

        let mut input = record;
        let count = input.get_u32_ne() as usize;
        if count > layout.max_keys() {
            return Err(AtlasError::corrupt(
                offset,
                format!("count_keys {} exceeds {}", count, layout.max_keys()),
            ));
        }

        let mut node = Node::empty(offset, layout)?;
        for _ in 0..count {
            let key = input.get_i64_ne();
            let value = input.get_i64_ne();
            if node.items.last().is_some_and(|prev| prev.key >= key) {
                return Err(AtlasError::corrupt(offset, "keys are not strictly ascending"));
            }
            node.items.push(Item { key, value });
        }
        input.advance((layout.max_keys() - count) * ITEM_WIDTH);

        let first = Offset::new(input.get_u64_ne());
        if !first.is_nil() {
            node.children.push(first);
            for _ in 0..count {
                let child = Offset::new(input.get_u64_ne());
                if child.is_nil() {
                    return Err(AtlasError::corrupt(offset, "internal node has a missing child"));
                }
                node.children.push(child);
            }
        }

        Ok(node)
    }
}
