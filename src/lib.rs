//! # AtlasTree
//!
//! A disk-backed B-tree storage engine with:
//! - Fixed-size node records addressed by byte offset in a single flat file
//! - Free-list reuse of reclaimed node slots
//! - Proactive top-down split on insert
//! - Full delete (predecessor/successor replacement, rotation, merge,
//!   root collapse)
//! - A line-oriented operator protocol (`I`, `S`, `D`, `P`, `Q`)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Operator Protocol                          │
//! │               (I / S / D / P / Q tokens)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Engine                                │
//! │              (command → tree operation)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        BTree                                 │
//! │        (search / insert / delete / levels / verify)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Header    │          │  PageStore  │
//!   │ (offset 0)  │          │ (node I/O,  │
//!   └─────────────┘          │  free list) │
//!                            └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod tree;
pub mod protocol;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{AtlasError, Result};
pub use config::{Config, SyncStrategy};
pub use engine::Engine;
pub use storage::{Item, Key, Offset, Storage, Value};
pub use tree::{BTree, TreeStats};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of AtlasTree
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
