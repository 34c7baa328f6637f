//! Metadata Type Definitions
//!
//! ## Types Overview
//!
//! ### VersionDoc
//! The live head of a symbol: its schema, row count, append counters and the
//! compressed segment index. Exactly one per symbol; every append replaces it.
//!
//! ### SegmentDoc
//! One immutable, compressed slice of packed rows. Segments are linked to a
//! version chain through `parent` and ordered by their ending row offset
//! (`segment`).
//!
//! ### SegmentFilter
//! Selection passed to `MetadataStore::find_segments()`.
//!
//! ## Design Decisions
//!
//! - All documents are Serialize/Deserialize; binary payloads are hex strings
//!   in their JSON form
//! - Row counts and offsets are u64
//! - Ids are random v4 UUIDs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Document kind recorded on every version written by the segment store.
pub const DATAFRAME_KIND: &str = "dataframe";

/// Column naming recorded alongside a version's descriptor.
///
/// `index` holds the name of the index column (one entry); `columns` holds all
/// column names in descriptor order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DtypeMetadata {
    pub index: Vec<String>,
    pub columns: Vec<String>,
}

/// Live head of a symbol.
///
/// # Fields
///
/// * `id` - Unique id of this version document
/// * `version` - Number allocated by `next_version_number()`; gaps are allowed
/// * `dtype` - Canonical descriptor text, e.g. `[('ts', '<M8[ns]'), ('px', '<f8')]`
/// * `up_to` - Total rows reachable through the segment chain
/// * `segment_index` - LZ4 block of 16-byte `(last index ns, end offset)` records
/// * `sha` - Hex SHA-256 of the first encoded payload of the chain
/// * `base_version_id` - Id of the version that started the segment chain
///
/// # Examples
///
/// ```ignore
/// let head = store.latest_version("AAPL").await?.unwrap();
/// println!("{} v{}: {} rows", head.symbol, head.version, head.up_to);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionDoc {
    pub id: Uuid,
    pub symbol: String,
    pub version: u64,
    pub dtype: String,
    pub dtype_metadata: DtypeMetadata,
    pub shape: Vec<i64>,
    #[serde(rename = "type")]
    pub kind: String,
    pub segment_count: u64,
    pub append_count: u64,
    pub up_to: u64,
    #[serde(with = "hex_bytes")]
    pub segment_index: Vec<u8>,
    pub sha: Option<String>,
    pub base_version_id: Option<Uuid>,
}

impl VersionDoc {
    /// Id shared by every segment of this version's chain.
    pub fn chain_id(&self) -> Uuid {
        self.base_version_id.unwrap_or(self.id)
    }

    /// Name of the index column, if recorded.
    pub fn index_name(&self) -> Option<&str> {
        self.dtype_metadata.index.first().map(String::as_str)
    }
}

/// Immutable compressed payload of one append.
///
/// # Fields
///
/// * `segment` - Ending row offset covered by this payload (`up_to - 1`)
/// * `parent` - Version ids this segment belongs to (new version, chain base)
/// * `compressed` - Whether `data` is an LZ4 block (otherwise a raw block)
/// * `sha` - Hex integrity hash over the segment's canonical fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentDoc {
    pub id: Uuid,
    pub symbol: String,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    pub compressed: bool,
    pub segment: u64,
    pub parent: Vec<Uuid>,
    pub sha: String,
}

/// Selection for `find_segments()`. Bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentFilter {
    pub symbol: String,
    pub parent: Option<Uuid>,
    pub min_segment: Option<u64>,
    pub max_segment: Option<u64>,
}

impl SegmentFilter {
    pub fn for_symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent: Uuid) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_segment_range(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.min_segment = min;
        self.max_segment = max;
        self
    }

    /// Whether `segment` passes this filter
    pub fn matches(&self, segment: &SegmentDoc) -> bool {
        segment.symbol == self.symbol
            && self.parent.map_or(true, |p| segment.parent.contains(&p))
            && self.min_segment.map_or(true, |min| segment.segment >= min)
            && self.max_segment.map_or(true, |max| segment.segment <= max)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}
