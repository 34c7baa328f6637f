//! Length-prefixed payload blocks.
//!
//! ```text
//! ┌──────────────────────────┬──────────────────────────────┐
//! │ uncompressed len (u32 LE)│ payload (LZ4 block or raw)   │
//! └──────────────────────────┴──────────────────────────────┘
//! ```
//!
//! The LZ4 form is exactly what `lz4_flex::compress_prepend_size` produces.
//! Both forms carry the header, so an empty input is still a 4-byte block.

use framehouse_core::Compression;

use crate::error::{Error, Result};

pub const HEADER_LEN: usize = 4;

/// Upper bound on how much an LZ4 block can expand.
const MAX_LZ4_RATIO: usize = 255;

fn header_for(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::BlockTooLarge { len })
}

pub fn compress(bytes: &[u8], compression: Compression) -> Result<Vec<u8>> {
    let declared = header_for(bytes.len())?;

    Ok(match compression {
        Compression::Lz4 => lz4_flex::compress_prepend_size(bytes),
        Compression::None => {
            let mut block = Vec::with_capacity(HEADER_LEN + bytes.len());
            block.extend_from_slice(&declared.to_le_bytes());
            block.extend_from_slice(bytes);
            block
        }
    })
}

pub fn decompress(block: &[u8], compression: Compression) -> Result<Vec<u8>> {
    let declared = declared_len(block)?;
    let payload = &block[HEADER_LEN..];

    let bytes = match compression {
        Compression::None => payload.to_vec(),
        Compression::Lz4 => {
            if declared > payload.len().saturating_mul(MAX_LZ4_RATIO) + MAX_LZ4_RATIO {
                return Err(Error::Decompression(format!(
                    "declared size {declared} is implausible for a {} byte payload",
                    payload.len()
                )));
            }
            lz4_flex::decompress_size_prepended(block)
                .map_err(|e| Error::Decompression(e.to_string()))?
        }
    };

    if bytes.len() != declared {
        return Err(Error::Decompression(format!(
            "declared size {declared}, got {} bytes",
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Uncompressed size recorded in a block header
pub fn declared_len(block: &[u8]) -> Result<usize> {
    match block.get(..HEADER_LEN) {
        Some(header) => {
            let mut len = [0u8; HEADER_LEN];
            len.copy_from_slice(header);
            Ok(u32::from_le_bytes(len) as usize)
        }
        None => Err(Error::Decompression(format!(
            "block of {} bytes is shorter than its header",
            block.len()
        ))),
    }
}

/// Block format recorded by a segment's `compressed` flag
pub fn compression_for(compressed: bool) -> Compression {
    if compressed {
        Compression::Lz4
    } else {
        Compression::None
    }
}
