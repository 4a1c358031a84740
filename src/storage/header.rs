//! Tree header
//!
//! Tree-wide parameters stored in the first bytes of the file.

use std::io::{Read, Seek, SeekFrom, Write};

use bytes::{Buf, BufMut};

use crate::error::{AtlasError, Result};

use super::{NodeLayout, Offset, Storage};

/// Size of the header in bytes: t (4) + count_nodes (4) + three offsets (8 each)
pub const HEADER_SIZE: u64 = 32;

/// Persisted tree metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Minimum degree `t`
    pub order: u32,
    /// Number of live nodes (free slots excluded)
    pub count_nodes: u32,
    /// End-of-file allocation cursor
    pub next_offset: Offset,
    /// Offset of the root node
    pub root_offset: Offset,
    /// Head of the free list (NIL when empty)
    pub next_free: Offset,
}

impl Header {
    /// Header for a brand new file with no nodes allocated yet
    pub fn new(order: u32) -> Self {
        Self {
            order,
            count_nodes: 0,
            next_offset: Offset::new(HEADER_SIZE),
            root_offset: Offset::NIL,
            next_free: Offset::NIL,
        }
    }

    /// Read the header from the start of the storage medium
    pub fn load<S: Storage>(storage: &mut S) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE as usize];
        storage.seek(SeekFrom::Start(0))?;
        storage.read_exact(&mut buf)?;
        Ok(Self::decode(&buf))
    }

    /// Write the header back in a single sequential write
    pub fn store<S: Storage>(&self, storage: &mut S) -> Result<()> {
        storage.seek(SeekFrom::Start(0))?;
        storage.write_all(&self.encode())?;
        Ok(())
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE as usize] {
        let mut buf = [0u8; HEADER_SIZE as usize];
        let mut out = &mut buf[..];
        out.put_u32_ne(self.order);
        out.put_u32_ne(self.count_nodes);
        out.put_u64_ne(self.next_offset.get());
        out.put_u64_ne(self.root_offset.get());
        out.put_u64_ne(self.next_free.get());
        buf
    }

    pub fn decode(buf: &[u8; HEADER_SIZE as usize]) -> Self {
        let mut input = &buf[..];
        Self {
            order: input.get_u32_ne(),
            count_nodes: input.get_u32_ne(),
            next_offset: Offset::new(input.get_u64_ne()),
            root_offset: Offset::new(input.get_u64_ne()),
            next_free: Offset::new(input.get_u64_ne()),
        }
    }

    /// Check a loaded header for internal consistency and derive its node layout
    pub fn validate(&self) -> Result<NodeLayout> {
        let layout = NodeLayout::new(self.order).ok_or_else(|| {
            AtlasError::InvalidHeader(format!("unsupported order t={}", self.order))
        })?;

        let end = self.next_offset.get();
        if end < HEADER_SIZE || (end - HEADER_SIZE) % layout.node_size() as u64 != 0 {
            return Err(AtlasError::InvalidHeader(format!(
                "allocation cursor {} is not on a node boundary",
                end
            )));
        }
        if !layout.is_slot(self.root_offset, self.next_offset) {
            return Err(AtlasError::InvalidHeader(format!(
                "root offset {} is not an allocated node",
                self.root_offset
            )));
        }
        if !self.next_free.is_nil() && !layout.is_slot(self.next_free, self.next_offset) {
            return Err(AtlasError::InvalidHeader(format!(
                "free list head {} is not an allocated slot",
                self.next_free
            )));
        }
        if self.count_nodes == 0 {
            return Err(AtlasError::InvalidHeader(
                "node count is zero but a root is recorded".to_string(),
            ));
        }

        Ok(layout)
    }
}
