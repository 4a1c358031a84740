//! Storage Module
//!
//! Paged node I/O over a single flat file.
//!
//! ## Responsibilities
//! - Persist tree-wide metadata at a fixed file prefix
//! - Translate node offsets to fixed-size records
//! - Allocate node slots (free list first, then file extension)
//! - Reclaim slots onto a LIFO free list threaded through the slots themselves
//!
//! ## File Format
//! All fields are fixed width, native byte order.
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ Header (32 bytes, offset 0)                                │
//! │   t: u32 | count_nodes: u32 | next_offset: u64             │
//! │   root_offset: u64 | next_free: u64                        │
//! ├────────────────────────────────────────────────────────────┤
//! │ Node record (node_size bytes, offset = 32 + n * node_size) │
//! │   count_keys: u32                                          │
//! │   M-1 items:   [key: i64][value: i64]                      │
//! │   M children:  [offset: u64]      (children[0] == 0: leaf) │
//! ├────────────────────────────────────────────────────────────┤
//! │ Free slot (same size as a node record)                     │
//! │   next_free: u64 | zeroes ...                              │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Offset 0 is occupied by the header, so it doubles as the NIL sentinel for
//! "no child" and "free list empty".

mod header;
mod node;
mod pager;

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, Write};

use crate::error::{AtlasError, Result};

pub use header::{Header, HEADER_SIZE};
pub use node::{Item, Key, Node, NodeLayout, Value};
pub use pager::PageStore;

/// Byte offset of a node record inside the tree file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Offset(u64);

impl Offset {
    /// "No node" sentinel (the header lives at offset 0)
    pub const NIL: Offset = Offset(0);

    pub const fn new(raw: u64) -> Self {
        Offset(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn is_nil(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backing medium for a tree: anything seekable that can be read and written
pub trait Storage: Read + Write + Seek {
    /// Force written data down to durable storage
    fn sync(&mut self) -> io::Result<()>;
}

impl Storage for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

impl Storage for Cursor<Vec<u8>> {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Allocate an empty Vec with room for `len` elements, reporting failure
/// instead of aborting the process.
pub(crate) fn try_vec<T>(len: usize) -> Result<Vec<T>> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(len).map_err(|_| AtlasError::AllocationFailure {
        bytes: len.saturating_mul(std::mem::size_of::<T>()),
    })?;
    Ok(vec)
}
