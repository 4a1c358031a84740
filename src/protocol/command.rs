//! Command definitions
//!
//! Represents operator commands.

use crate::storage::{Key, Value};

/// Command types, keyed by their op code letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Insert = b'I',
    Search = b'S',
    Delete = b'D',
    Print = b'P',
    Quit = b'Q',
}

impl CommandType {
    /// Map an op code letter to its command type
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'I' => Some(CommandType::Insert),
            'S' => Some(CommandType::Search),
            'D' => Some(CommandType::Delete),
            'P' => Some(CommandType::Print),
            'Q' => Some(CommandType::Quit),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        self as u8 as char
    }

    /// Number of integer arguments following the op code
    pub fn arity(self) -> usize {
        match self {
            CommandType::Insert => 2,
            CommandType::Search | CommandType::Delete => 1,
            CommandType::Print | CommandType::Quit => 0,
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Insert a key-value pair
    Insert { key: Key, value: Value },

    /// Look up a key
    Search { key: Key },

    /// Delete a key
    Delete { key: Key },

    /// Print the tree level by level
    Print,

    /// End the session
    Quit,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Insert { .. } => CommandType::Insert,
            Command::Search { .. } => CommandType::Search,
            Command::Delete { .. } => CommandType::Delete,
            Command::Print => CommandType::Print,
            Command::Quit => CommandType::Quit,
        }
    }

    /// True for commands that change the tree
    pub fn is_mutation(&self) -> bool {
        matches!(self, Command::Insert { .. } | Command::Delete { .. })
    }
}
