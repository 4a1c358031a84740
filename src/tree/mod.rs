//! Tree Module
//!
//! The B-tree engine on top of the page store.
//!
//! ## Responsibilities
//! - Point lookup by key
//! - Insert with proactive top-down splitting
//! - Delete with predecessor/successor replacement, rotation, and merge
//! - Level-order and in-order enumeration, structural verification
//!
//! ## Operation Protocol
//! Every public operation starts by reading the root, recurses through child
//! offsets fetched on demand, writes each touched node back, and stores the
//! header once at the end of a mutating call. There is no commit boundary: an
//! I/O failure part way through a split or merge can leave the file
//! inconsistent.

mod delete;
mod insert;
mod search;
mod traverse;

use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::config::{Config, SyncStrategy};
use crate::error::Result;
use crate::storage::{Header, NodeLayout, Offset, PageStore, Storage};

pub use traverse::TreeStats;

/// A disk-backed B-tree of `i64` keys and values.
///
/// The handle owns the storage medium; all state shared between operations
/// (root offset, allocation cursor, free list, node count) lives in its page
/// store and reaches disk through the header.
pub struct BTree<S = File> {
    store: PageStore<S>,
    sync_strategy: SyncStrategy,
}

impl<S: Storage> BTree<S> {
    /// Create a new, empty tree of minimum degree `order` on `storage`
    pub fn create(storage: S, order: u32) -> Result<Self> {
        Ok(Self {
            store: PageStore::create(storage, order)?,
            sync_strategy: SyncStrategy::Never,
        })
    }

    /// Open a tree previously created on `storage`
    pub fn open(storage: S) -> Result<Self> {
        Ok(Self {
            store: PageStore::open(storage)?,
            sync_strategy: SyncStrategy::Never,
        })
    }

    pub fn with_sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.sync_strategy = strategy;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Minimum degree `t`
    pub fn order(&self) -> u32 {
        self.store.header().order
    }

    /// Number of live nodes
    pub fn node_count(&self) -> u32 {
        self.store.header().count_nodes
    }

    pub fn root_offset(&self) -> Offset {
        self.store.root()
    }

    /// End-of-file allocation cursor
    pub fn next_offset(&self) -> Offset {
        self.store.header().next_offset
    }

    /// Head of the free list (NIL when empty)
    pub fn free_head(&self) -> Offset {
        self.store.header().next_free
    }

    pub fn header(&self) -> &Header {
        self.store.header()
    }

    pub fn layout(&self) -> &NodeLayout {
        self.store.layout()
    }

    /// Flush the header and force all writes to durable storage
    pub fn sync(&mut self) -> Result<()> {
        self.store.store_header()?;
        self.store.sync()
    }

    /// Close the tree and give back the storage medium
    pub fn into_inner(self) -> S {
        self.store.into_inner()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// End-of-operation bookkeeping: store the header, sync if configured
    fn commit(&mut self) -> Result<()> {
        self.store.store_header()?;
        if self.sync_strategy == SyncStrategy::EveryOperation {
            self.store.sync()?;
        }
        Ok(())
    }
}

impl BTree<File> {
    /// Create (or truncate) the file at `config.path` and initialize a tree
    pub fn create_path(config: &Config) -> Result<Self> {
        config.validate()?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&config.path)?;

        Ok(Self::create(file, config.order)?.with_sync_strategy(config.sync_strategy))
    }

    /// Open an existing tree file
    pub fn open_path(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Self::open(file)
    }

    /// Open the file at `config.path` if it holds a tree, otherwise create one
    pub fn open_or_create(config: &Config) -> Result<Self> {
        let exists = config.path.exists() && std::fs::metadata(&config.path)?.len() > 0;
        if exists {
            Ok(Self::open_path(&config.path)?.with_sync_strategy(config.sync_strategy))
        } else {
            Self::create_path(config)
        }
    }
}
