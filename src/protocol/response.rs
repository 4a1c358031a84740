//! Response definitions
//!
//! Represents the outcome of a command.

use crate::storage::{Key, Value};

/// The result of executing one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Insert stored a new key
    Inserted,

    /// Insert found the key already present and did nothing
    Duplicate,

    /// Search found the key
    Hit { value: Value },

    /// Search did not find the key
    Miss { key: Key },

    /// Delete removed the key
    Deleted,

    /// Delete did not find the key
    NotFound { key: Key },

    /// Keys of every node, grouped by level
    Levels(Vec<Vec<Vec<Key>>>),

    /// Session ended
    Bye,
}

impl Response {
    /// True if the command found what it was looking for
    pub fn is_hit(&self) -> bool {
        matches!(
            self,
            Response::Inserted | Response::Hit { .. } | Response::Deleted
        )
    }
}
