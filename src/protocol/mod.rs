//! Protocol Module
//!
//! The operator protocol: single-letter op codes read as whitespace-separated
//! text, one reply line per query.
//!
//! ## Commands
//! ```text
//! I <key> <value>   insert (ignored if the key exists)
//! S <key>           search
//! D <key>           delete
//! P                 print the tree level by level
//! Q                 quit
//! ```
//!
//! ## Replies
//! - `S`: `HIT VALUE <value>` or `MISS KEY <key>`
//! - `P`: one line per level, each node rendered as `[ k1 k2 ... ] `
//! - `I`, `D`, `Q`: nothing
//!
//! An op code may be glued to its first argument (`I5 50`).

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::Response;
pub use codec::{decode_command, encode_command, encode_response, write_response, CommandReader};
