//! Configuration for AtlasTree
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{AtlasError, Result};

/// Smallest minimum degree a tree may be created with
pub const MIN_ORDER: u32 = 2;

/// Main configuration for an AtlasTree file
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the tree file (header + node records)
    pub path: PathBuf,

    /// Sync strategy: when to fsync the tree file
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Tree Configuration
    // -------------------------------------------------------------------------
    /// Minimum degree `t` used when creating a new tree.
    /// Ignored when opening an existing file (the header wins).
    pub order: u32,
}

/// Sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Never fsync explicitly; rely on the OS to write back
    Never,

    /// fsync after the header store of every insert/delete
    EveryOperation,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./atlastree.db"),
            sync_strategy: SyncStrategy::Never,
            order: 3,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the config describes a tree that can be created
    pub fn validate(&self) -> Result<()> {
        if self.order < MIN_ORDER {
            return Err(AtlasError::Config(format!(
                "order must be at least {}, got {}",
                MIN_ORDER, self.order
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the tree file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the minimum degree for newly created trees
    pub fn order(mut self, order: u32) -> Self {
        self.config.order = order;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
