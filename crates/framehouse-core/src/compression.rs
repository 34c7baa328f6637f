//! Payload compression choice.
//!
//! Segment payloads are stored as length-prefixed blocks; this enum selects how
//! the bytes after the 4-byte length are produced.
//!
//! - **None**: raw bytes (the segment's `compressed` flag is false)
//! - **Lz4**: LZ4 block format, the default

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u16)]
pub enum Compression {
    None = 0,
    #[default]
    Lz4 = 1,
}

impl Compression {
    pub fn is_compressed(self) -> bool {
        !matches!(self, Compression::None)
    }
}
