//! Store configuration
//!
//! Configuration can be built in code or loaded from TOML:
//!
//! ```toml
//! cleanup = "eager"
//! sync_writes = true
//!
//! [backend]
//! type = "rocksdb"
//! path = "/var/lib/quads"
//! ```

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the store keeps its data
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Volatile in-process storage
    #[default]
    Memory,
    /// RocksDB database directory
    RocksDb {
        /// Database directory, created if missing
        path: PathBuf,
    },
}

/// When dictionary entries of removed statements are released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupPolicy {
    /// Release terms as soon as the last statement using them is removed
    #[default]
    Eager,
    /// Keep terms until an explicit compaction or collection deletion
    Never,
}

/// Quad store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Storage backend
    pub backend: BackendConfig,
    /// Dictionary cleanup on statement removal
    pub cleanup: CleanupPolicy,
    /// Fsync every commit (durable backends only)
    pub sync_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            backend: BackendConfig::Memory,
            cleanup: CleanupPolicy::Eager,
            sync_writes: true,
        }
    }
}

impl StoreConfig {
    /// In-memory configuration
    pub fn memory() -> Self {
        Self::default()
    }

    /// RocksDB configuration rooted at `path`
    pub fn rocksdb<P: Into<PathBuf>>(path: P) -> Self {
        StoreConfig {
            backend: BackendConfig::RocksDb { path: path.into() },
            ..Self::default()
        }
    }

    /// Set the cleanup policy
    pub fn with_cleanup(mut self, cleanup: CleanupPolicy) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Set whether commits are synced to disk
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), ?config, "loaded store configuration");
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Check the configuration for obvious mistakes
    pub fn validate(&self) -> Result<()> {
        match &self.backend {
            BackendConfig::Memory => Ok(()),
            BackendConfig::RocksDb { path } if path.as_os_str().is_empty() => Err(
                StoreError::Config("rocksdb backend requires a non-empty path".to_string()),
            ),
            BackendConfig::RocksDb { path } => {
                if path.is_file() {
                    return Err(StoreError::Config(format!(
                        "rocksdb path {} is a file",
                        path.display()
                    )));
                }
                if cfg!(feature = "rocksdb") {
                    Ok(())
                } else {
                    Err(StoreError::Config(
                        "rocksdb backend requires the `rocksdb` feature".to_string(),
                    ))
                }
            }
        }
    }
}
