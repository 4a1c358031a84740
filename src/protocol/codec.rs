//! Protocol codec
//!
//! Encoding and decoding functions for the operator protocol.
//!
//! Input is a stream of whitespace-separated tokens; line breaks carry no
//! meaning, so `I 1 2 S 1` on one line is two commands.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::error::{AtlasError, Result};
use crate::storage::Key;

use super::{Command, CommandType, Response};

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command as a single protocol line (without newline)
pub fn encode_command(command: &Command) -> String {
    let code = command.command_type().code();
    match command {
        Command::Insert { key, value } => format!("{} {} {}", code, key, value),
        Command::Search { key } | Command::Delete { key } => format!("{} {}", code, key),
        Command::Print | Command::Quit => code.to_string(),
    }
}

/// Decode exactly one command from a string
pub fn decode_command(text: &str) -> Result<Command> {
    let mut reader = CommandReader::new(text.as_bytes());
    let command = reader
        .read_command()?
        .ok_or_else(|| AtlasError::Protocol("empty command".to_string()))?;

    if let Some(extra) = reader.next_token()? {
        return Err(AtlasError::Protocol(format!(
            "unexpected trailing input '{}'",
            extra
        )));
    }
    Ok(command)
}

/// Reads commands from a buffered text stream
pub struct CommandReader<R> {
    reader: R,
    /// Tokens of the current line not consumed yet
    pending: VecDeque<String>,
}

impl<R: BufRead> CommandReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
        }
    }

    /// Read the next command.
    ///
    /// Returns `Ok(None)` at end of input. On a protocol error the offending
    /// token has been consumed, so the caller may keep reading.
    pub fn read_command(&mut self) -> Result<Option<Command>> {
        let token = match self.next_token()? {
            Some(token) => token,
            None => return Ok(None),
        };

        let mut chars = token.chars();
        let code = chars.next().unwrap_or_default();
        let command_type = CommandType::from_code(code)
            .ok_or_else(|| AtlasError::Protocol(format!("unknown op code '{}'", token)))?;

        // Op code glued to its first argument, e.g. "S42"
        let rest = chars.as_str();
        if !rest.is_empty() {
            if command_type.arity() == 0 {
                return Err(AtlasError::Protocol(format!("unknown op code '{}'", token)));
            }
            self.pending.push_front(rest.to_string());
        }

        let command = match command_type {
            CommandType::Insert => Command::Insert {
                key: self.next_int(command_type)?,
                value: self.next_int(command_type)?,
            },
            CommandType::Search => Command::Search {
                key: self.next_int(command_type)?,
            },
            CommandType::Delete => Command::Delete {
                key: self.next_int(command_type)?,
            },
            CommandType::Print => Command::Print,
            CommandType::Quit => Command::Quit,
        };
        Ok(Some(command))
    }

    fn next_int(&mut self, command_type: CommandType) -> Result<Key> {
        let token = self.next_token()?.ok_or_else(|| {
            AtlasError::Protocol(format!(
                "'{}' expects {} argument(s), input ended",
                command_type.code(),
                command_type.arity()
            ))
        })?;

        token.parse().map_err(|_| {
            AtlasError::Protocol(format!(
                "'{}' expects an integer, got '{}'",
                command_type.code(),
                token
            ))
        })
    }

    fn next_token(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        while self.pending.is_empty() {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_string));
        }
        Ok(self.pending.pop_front())
    }
}

impl<R: BufRead> Iterator for CommandReader<R> {
    type Item = Result<Command>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_command().transpose()
    }
}

// =============================================================================
// Response Encoding
// =============================================================================

/// Render a response as protocol text. Silent responses render as "".
pub fn encode_response(response: &Response) -> String {
    match response {
        Response::Hit { value } => format!("HIT VALUE {}\n", value),
        Response::Miss { key } => format!("MISS KEY {}\n", key),
        Response::Levels(levels) => {
            let mut out = String::new();
            for level in levels {
                for keys in level {
                    out.push_str("[ ");
                    for key in keys {
                        out.push_str(&key.to_string());
                        out.push(' ');
                    }
                    out.push_str("] ");
                }
                out.push('\n');
            }
            out
        }
        Response::Inserted
        | Response::Duplicate
        | Response::Deleted
        | Response::NotFound { .. }
        | Response::Bye => String::new(),
    }
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let text = encode_response(response);
    if !text.is_empty() {
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
    }
    Ok(())
}
