//! Error types for AtlasTree
//!
//! Provides a unified error type for all operations.
//!
//! Search and delete misses are not errors; they come back as `Option`/`bool`.
//! Every variant here aborts the operation in progress. There is no rollback:
//! a failure in the middle of a split or merge can leave the file with some
//! nodes written and others not.

use thiserror::Error;

use crate::storage::Offset;

/// Result type alias using AtlasError
pub type Result<T> = std::result::Result<T, AtlasError>;

/// Unified error type for AtlasTree operations
#[derive(Debug, Error)]
pub enum AtlasError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt node at offset {offset}: {reason}")]
    CorruptNode { offset: Offset, reason: String },

    #[error("Allocation of {bytes} bytes failed")]
    AllocationFailure { bytes: usize },

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Tree invariant violated: {0}")]
    InvariantViolation(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AtlasError {
    pub(crate) fn corrupt(offset: Offset, reason: impl Into<String>) -> Self {
        AtlasError::CorruptNode {
            offset,
            reason: reason.into(),
        }
    }
}
