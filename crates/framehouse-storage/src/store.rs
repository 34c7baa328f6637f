//! Segment Store
//!
//! Versioned, chunked, compressed persistence of dataframes on top of a
//! `MetadataStore`.
//!
//! ## Documents
//!
//! ```text
//! VersionDoc (one per symbol, replaced by every append)
//!   id, version, dtype, up_to, segment_index, base_version_id
//!        │
//!        │ chain id = base_version_id (or id for the first version)
//!        ▼
//! SegmentDoc  SegmentDoc  SegmentDoc ...   (immutable, parent ∋ chain id)
//!   rows 0..=9  10..=19     20..=29         segment = ending row offset
//! ```
//!
//! Writes go segment first, version second. Reads start at the version's
//! ending offset and walk the chain backwards, so a segment whose version
//! write never landed (or lost a race) is simply not reached.
//!
//! ## Usage
//!
//! ```ignore
//! let metadata = Arc::new(SqliteMetadataStore::new("framehouse.db").await?);
//! let store = SegmentStore::new(metadata, StoreConfig::default());
//!
//! store.append("AAPL", &df).await?;
//! let all = store.read("AAPL").await?;
//! let june = store
//!     .read_with("AAPL", ReadOptions::default().with_range(DateRange::between(start, end)))
//!     .await?;
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use framehouse_metadata::{MetadataStore, VersionDoc};

use crate::config::StoreConfig;
use crate::error::Result;

/// Per-call write options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOptions {
    /// Maximum rows per segment, 0 = no splitting
    pub chunk_size: usize,
    /// Drop rows already covered by the stored time index
    pub skip_already_written: bool,
}

impl From<&StoreConfig> for AppendOptions {
    fn from(config: &StoreConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            skip_already_written: config.skip_already_written,
        }
    }
}

/// Inclusive time range for reads. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn from(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn until(end: DateTime<Utc>) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    /// Bounds in ns since the epoch, clamped to the representable range
    pub(crate) fn bounds_ns(&self) -> (i64, i64) {
        let start = self.start.map_or(i64::MIN, |t| {
            t.timestamp_nanos_opt()
                .unwrap_or(if t.timestamp() < 0 { i64::MIN } else { i64::MAX })
        });
        let end = self.end.map_or(i64::MAX, |t| {
            t.timestamp_nanos_opt()
                .unwrap_or(if t.timestamp() < 0 { i64::MIN } else { i64::MAX })
        });
        (start, end)
    }
}

/// Per-call read options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Keep only rows whose index lies in this range
    pub range: Option<DateRange>,
    /// Expected live version number
    pub version: Option<u64>,
}

impl ReadOptions {
    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }
}

pub struct SegmentStore {
    pub(crate) metadata: Arc<dyn MetadataStore>,
    pub(crate) config: StoreConfig,
}

impl SegmentStore {
    pub fn new(metadata: Arc<dyn MetadataStore>, config: StoreConfig) -> Self {
        Self { metadata, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn metadata(&self) -> &Arc<dyn MetadataStore> {
        &self.metadata
    }

    /// Live version of `symbol`, if any
    pub async fn read_version(&self, symbol: &str) -> Result<Option<VersionDoc>> {
        Ok(self.metadata.latest_version(symbol).await?)
    }

    /// Symbols with a live version, sorted
    pub async fn list_symbols(&self) -> Result<Vec<String>> {
        Ok(self.metadata.list_symbols().await?)
    }

    /// Remove every segment and version of `symbol`.
    ///
    /// Returns the number of documents removed. Segments are removed before
    /// the version; an interrupted delete leaves a version whose reads fail
    /// with `NoSegmentsFound`. The version counter is kept, so a re-created
    /// symbol continues numbering.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, symbol: &str) -> Result<u64> {
        let segments = self.metadata.delete_segments(symbol).await?;
        let versions = self.metadata.delete_versions(symbol).await?;

        tracing::info!(symbol, segments, versions, "Deleted symbol");
        Ok(segments + versions)
    }
}
