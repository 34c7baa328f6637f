//! Storage Configuration
//!
//! ## StoreConfig
//!
//! Controls how the segment store writes and verifies data:
//!
//! - **compression**: payload block format, `lz4` or `none` (default: lz4)
//! - **chunk_size**: split appends into segments of at most this many rows,
//!   0 disables splitting (default: 0)
//! - **skip_already_written**: drop leading rows whose time index is not newer
//!   than the last stored one (default: true)
//! - **verify_segment_hashes**: check each segment's integrity hash on read
//!   (default: true)
//!
//! ## Usage
//!
//! ```ignore
//! use framehouse_storage::StoreConfig;
//!
//! let config = StoreConfig {
//!     chunk_size: 100_000,
//!     ..Default::default()
//! };
//!
//! // Or from a TOML file; missing keys take their defaults
//! let config = StoreConfig::load("framehouse.toml")?;
//! ```

use std::path::Path;

use framehouse_core::Compression;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Payload block format (default: lz4)
    #[serde(default)]
    pub compression: Compression,

    /// Maximum rows per segment, 0 = one segment per append (default: 0)
    #[serde(default)]
    pub chunk_size: usize,

    /// Skip rows already covered by the stored time index (default: true)
    #[serde(default = "default_true")]
    pub skip_already_written: bool,

    /// Verify segment integrity hashes on read (default: true)
    #[serde(default = "default_true")]
    pub verify_segment_hashes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            chunk_size: 0,
            skip_already_written: default_true(),
            verify_segment_hashes: default_true(),
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

fn default_true() -> bool {
    true
}
