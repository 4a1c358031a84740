//! Engine Module
//!
//! Binds a file-backed tree to the operator protocol.
//!
//! ## Responsibilities
//! - Open or create the tree file from a `Config`
//! - Route protocol commands to tree operations
//! - Drive a read-eval session over any text input/output pair

use std::io::{BufRead, Write};
use std::path::Path;

use crate::config::Config;
use crate::error::{AtlasError, Result};
use crate::protocol::{write_response, Command, CommandReader, Response};
use crate::tree::BTree;

/// Counters for one operator session
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Commands executed successfully
    pub commands: u64,
    /// Input tokens rejected as malformed
    pub rejected: u64,
}

/// The storage engine
///
/// ## Concurrency Model
/// Single-threaded and blocking: every operation runs to completion (root to
/// leaf plus all node writes) before the next begins. The engine takes
/// `&mut self` for every command, so the borrow checker enforces this.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// The tree file
    tree: BTree,
}

impl Engine {
    /// Open the tree at `config.path`, creating it if the file is missing or empty
    pub fn open(config: Config) -> Result<Self> {
        let tree = BTree::open_or_create(&config)?;
        tracing::info!(
            "Opened {} (t={}, {} nodes)",
            config.path.display(),
            tree.order(),
            tree.node_count()
        );
        Ok(Self { config, tree })
    }

    /// Create a fresh tree at `config.path`, truncating any existing file
    pub fn create(config: Config) -> Result<Self> {
        let tree = BTree::create_path(&config)?;
        tracing::info!("Created {} (t={})", config.path.display(), tree.order());
        Ok(Self { config, tree })
    }

    /// Open an existing tree file; fails if it does not exist
    pub fn open_existing(config: Config) -> Result<Self> {
        let tree = BTree::open_path(&config.path)?.with_sync_strategy(config.sync_strategy);
        tracing::info!(
            "Opened {} (t={}, {} nodes)",
            config.path.display(),
            tree.order(),
            tree.node_count()
        );
        Ok(Self { config, tree })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified file path
    pub fn open_path(path: &Path) -> Result<Self> {
        let mut config = Config::default();
        config.path = path.to_path_buf();
        Self::open(config)
    }

    /// Execute a command
    pub fn execute(&mut self, command: Command) -> Result<Response> {
        tracing::trace!("Executing {:?}", command);
        let response = match command {
            Command::Insert { key, value } => {
                if self.tree.insert(key, value)? {
                    Response::Inserted
                } else {
                    Response::Duplicate
                }
            }
            Command::Search { key } => match self.tree.search(key)? {
                Some(value) => Response::Hit { value },
                None => Response::Miss { key },
            },
            Command::Delete { key } => {
                if self.tree.delete(key)? {
                    Response::Deleted
                } else {
                    Response::NotFound { key }
                }
            }
            Command::Print => Response::Levels(self.tree.levels()?),
            Command::Quit => Response::Bye,
        };
        Ok(response)
    }

    /// Run commands from `input` until `Q` or end of input, writing replies
    /// to `output`.
    ///
    /// Malformed input is logged and skipped; storage errors end the session.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, output: &mut W) -> Result<SessionStats> {
        let mut stats = SessionStats::default();

        for command in CommandReader::new(input) {
            let command = match command {
                Ok(command) => command,
                Err(AtlasError::Protocol(message)) => {
                    tracing::warn!("Skipping malformed input: {}", message);
                    stats.rejected += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let response = self.execute(command)?;
            write_response(output, &response)?;
            stats.commands += 1;

            if response == Response::Bye {
                break;
            }
        }

        Ok(stats)
    }

    /// Close the engine, storing the header and syncing the file
    pub fn close(mut self) -> Result<()> {
        self.tree.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the tree file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn tree(&self) -> &BTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut BTree {
        &mut self.tree
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
