//! Segment Index for Date-Range Reads
//!
//! ## The Problem
//!
//! Segments are keyed by ending row offset, but readers ask for time ranges.
//! Without a mapping from time to offsets, every range read has to fetch and
//! decompress the whole chain.
//!
//! ## The Solution
//!
//! Each time-indexed append records one entry on the version document:
//! the last index value it wrote and the ending row offset it reached.
//!
//! ```text
//! stream (uncompressed), 16 bytes per entry, little-endian:
//! ┌────────────────────────┬────────────────────────┐
//! │ i64 last index (ns)    │ i64 end offset (up_to-1)│  ← append 1
//! ├────────────────────────┼────────────────────────┤
//! │ ...                    │ ...                    │  ← append n
//! └────────────────────────┴────────────────────────┘
//! ```
//!
//! The stream is stored as one LZ4 block. An empty stream is stored as zero
//! bytes (no header), which is what non-time-indexed symbols carry.
//!
//! ## Lookups
//!
//! - **Replay detection**: `last()` gives the newest index value already stored
//! - **Range narrowing**: `rows_overlapping()` maps a time range to the
//!   inclusive row span whose segments can contain it

use bytes::{Buf, BufMut, BytesMut};
use framehouse_core::Compression;

use crate::block;
use crate::error::{Error, Result};

/// Bytes per encoded entry
pub const ENTRY_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Last index value written by the append, ns since the epoch
    pub last_index_ns: i64,
    /// Ending row offset reached by the append
    pub end_offset: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentIndex {
    entries: Vec<IndexEntry>,
}

impl SegmentIndex {
    /// Decode an uncompressed stream
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() % ENTRY_LEN != 0 {
            return Err(Error::CorruptSegmentIndex(format!(
                "{} bytes is not a multiple of {ENTRY_LEN}",
                raw.len()
            )));
        }

        let mut buf = raw;
        let mut entries = Vec::with_capacity(raw.len() / ENTRY_LEN);
        while buf.has_remaining() {
            let last_index_ns = buf.get_i64_le();
            let end_offset = buf.get_i64_le();
            let end_offset = u64::try_from(end_offset).map_err(|_| {
                Error::CorruptSegmentIndex(format!("negative end offset {end_offset}"))
            })?;
            entries.push(IndexEntry {
                last_index_ns,
                end_offset,
            });
        }
        Ok(Self { entries })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.entries.len() * ENTRY_LEN);
        for entry in &self.entries {
            buf.put_i64_le(entry.last_index_ns);
            buf.put_i64_le(entry.end_offset as i64);
        }
        buf.to_vec()
    }

    /// Decode the form stored on a version document
    pub fn from_block(stored: &[u8]) -> Result<Self> {
        if stored.is_empty() {
            return Ok(Self::default());
        }
        let raw = block::decompress(stored, Compression::Lz4)
            .map_err(|e| Error::CorruptSegmentIndex(e.to_string()))?;
        Self::decode(&raw)
    }

    /// Encode to the form stored on a version document
    pub fn to_block(&self) -> Result<Vec<u8>> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        block::compress(&self.encode(), Compression::Lz4)
    }

    pub fn push(&mut self, last_index_ns: i64, end_offset: u64) {
        self.entries.push(IndexEntry {
            last_index_ns,
            end_offset,
        });
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<IndexEntry> {
        self.entries.last().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inclusive row span `(first_row, last_row)` of the appends that can hold
    /// index values in `[start_ns, end_ns]`.
    ///
    /// An append covers the rows after the previous entry's end offset, and
    /// its index values are not less than the previous entry's last value,
    /// so an append may start on a value equal to `end_ns`.
    /// Returns `None` when no append can overlap the range.
    pub fn rows_overlapping(&self, start_ns: i64, end_ns: i64) -> Option<(u64, u64)> {
        if start_ns > end_ns {
            return None;
        }

        let first = self
            .entries
            .iter()
            .position(|e| e.last_index_ns >= start_ns)?;
        let last = self.entries[first..]
            .iter()
            .position(|e| e.last_index_ns > end_ns)
            .map_or(self.entries.len() - 1, |i| first + i);

        let first_row = if first == 0 {
            0
        } else {
            self.entries[first - 1].end_offset + 1
        };

        tracing::debug!(
            entries = self.entries.len(),
            first_row,
            last_row = self.entries[last].end_offset,
            "Narrowed date range with segment index"
        );
        Some((first_row, self.entries[last].end_offset))
    }
}
