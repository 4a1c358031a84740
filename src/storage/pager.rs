//! Page Store
//!
//! Owns the storage medium and the header, and is the only component that
//! materializes, persists, or retires node records.
//!
//! ## Handle discipline
//! - `read` hands out an owned copy of the record
//! - `write` persists a handle back to its own offset
//! - `free` consumes the handle, so a retired node cannot be written again
//!
//! Two handles to the same offset can exist only if the caller reads it
//! twice; after any structural change made through one of them, the other
//! must be re-read.

use std::io::{Read, Seek, SeekFrom, Write};

use bytes::Buf;

use crate::error::{AtlasError, Result};

use super::{try_vec, Header, Node, NodeLayout, Offset, Storage};

/// Width of the free-list link stored at the start of a free slot
const FREE_LINK_WIDTH: usize = 8;

/// Translates node offsets to fixed-size records and manages the free list
pub struct PageStore<S> {
    /// Backing medium (file or in-memory buffer)
    storage: S,
    /// In-memory copy of the header; persisted by `store_header`
    header: Header,
    /// Record sizes derived from the header's order
    layout: NodeLayout,
}

impl<S: Storage> PageStore<S> {
    /// Initialize a fresh tree on `storage`: header plus one empty leaf root.
    ///
    /// Any existing content at the header and first slot is overwritten.
    pub fn create(storage: S, order: u32) -> Result<Self> {
        let layout = NodeLayout::new(order).ok_or_else(|| {
            AtlasError::Config(format!("unsupported order t={}", order))
        })?;

        let mut store = Self {
            storage,
            header: Header::new(order),
            layout,
        };

        let root = store.allocate_node()?;
        store.write(&root)?;
        store.header.root_offset = root.offset();
        store.store_header()?;

        tracing::debug!(
            "Created tree: t={}, node_size={}, root={}",
            order,
            layout.node_size(),
            root.offset()
        );
        Ok(store)
    }

    /// Open an existing tree by loading and validating its header
    pub fn open(mut storage: S) -> Result<Self> {
        let header = Header::load(&mut storage)?;
        let layout = header.validate()?;

        tracing::debug!(
            "Opened tree: t={}, nodes={}, root={}, next_offset={}, next_free={}",
            header.order,
            header.count_nodes,
            header.root_offset,
            header.next_offset,
            header.next_free
        );
        Ok(Self {
            storage,
            header,
            layout,
        })
    }

    // =========================================================================
    // Header
    // =========================================================================

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn layout(&self) -> &NodeLayout {
        &self.layout
    }

    pub fn root(&self) -> Offset {
        self.header.root_offset
    }

    pub(crate) fn set_root(&mut self, offset: Offset) {
        tracing::debug!("Root moved: {} -> {}", self.header.root_offset, offset);
        self.header.root_offset = offset;
    }

    /// Persist the in-memory header
    pub fn store_header(&mut self) -> Result<()> {
        self.header.store(&mut self.storage)
    }

    /// Force everything written so far down to durable storage
    pub fn sync(&mut self) -> Result<()> {
        self.storage.sync()?;
        Ok(())
    }

    /// Give back the storage medium
    pub fn into_inner(self) -> S {
        self.storage
    }

    // =========================================================================
    // Slot Management
    // =========================================================================

    /// Hand out a slot: the free-list head if there is one, otherwise the
    /// slot at the allocation cursor.
    pub fn allocate(&mut self) -> Result<Offset> {
        let offset = if self.header.next_free.is_nil() {
            let offset = self.header.next_offset;
            self.header.next_offset = Offset::new(offset.get() + self.layout.node_size() as u64);
            offset
        } else {
            let offset = self.header.next_free;
            let next = self.read_free_link(offset)?;
            self.header.next_free = next;
            tracing::trace!("Reusing free slot {}, next free {}", offset, next);
            offset
        };

        self.header.count_nodes += 1;
        tracing::trace!("Allocated node {}", offset);
        Ok(offset)
    }

    /// Allocate a slot and return an empty leaf handle for it
    pub fn allocate_node(&mut self) -> Result<Node> {
        let offset = self.allocate()?;
        Node::empty(offset, &self.layout)
    }

    /// Retire a node: zero its slot, link it onto the free list, and drop
    /// the node count.
    pub fn free(&mut self, node: Node) -> Result<()> {
        let offset = node.offset();
        self.check_offset(offset)?;

        let mut record: Vec<u8> = try_vec(self.layout.node_size())?;
        record.extend_from_slice(&self.header.next_free.get().to_ne_bytes());
        record.resize(self.layout.node_size(), 0);

        self.storage.seek(SeekFrom::Start(offset.get()))?;
        self.storage.write_all(&record)?;

        self.header.next_free = offset;
        self.header.count_nodes = self.header.count_nodes.saturating_sub(1);
        tracing::trace!("Freed node {}", offset);
        Ok(())
    }

    // =========================================================================
    // Node I/O
    // =========================================================================

    /// Materialize the node stored at `offset`
    pub fn read(&mut self, offset: Offset) -> Result<Node> {
        self.check_offset(offset)?;

        let mut record: Vec<u8> = try_vec(self.layout.node_size())?;
        record.resize(self.layout.node_size(), 0);
        self.storage.seek(SeekFrom::Start(offset.get()))?;
        self.storage.read_exact(&mut record)?;

        tracing::trace!("Read node {}", offset);
        Node::decode(offset, &record, &self.layout)
    }

    /// Persist a node back to its own offset
    pub fn write(&mut self, node: &Node) -> Result<()> {
        let offset = node.offset();
        self.check_offset(offset)?;

        let record = node.encode(&self.layout)?;
        self.storage.seek(SeekFrom::Start(offset.get()))?;
        self.storage.write_all(&record)?;

        tracing::trace!("Wrote node {} ({} items)", offset, node.len());
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn check_offset(&self, offset: Offset) -> Result<()> {
        if self.layout.is_slot(offset, self.header.next_offset) {
            Ok(())
        } else {
            Err(AtlasError::corrupt(
                offset,
                format!(
                    "outside allocated range [{}, {}) or off a node boundary",
                    super::HEADER_SIZE,
                    self.header.next_offset
                ),
            ))
        }
    }

    fn read_free_link(&mut self, offset: Offset) -> Result<Offset> {
        self.check_offset(offset)?;

        let mut link = [0u8; FREE_LINK_WIDTH];
        self.storage.seek(SeekFrom::Start(offset.get()))?;
        self.storage.read_exact(&mut link)?;
        let next = Offset::new((&link[..]).get_u64_ne());

        if !next.is_nil() && !self.layout.is_slot(next, self.header.next_offset) {
            return Err(AtlasError::corrupt(
                offset,
                format!("free slot links to invalid offset {}", next),
            ));
        }
        Ok(next)
    }
}
