//! framehouse Metadata Store
//!
//! This crate implements the document store the segment store persists into.
//!
//! ## Purpose
//!
//! Two kinds of documents are tracked per symbol:
//! - **Versions**: one live head per symbol holding the schema, row count,
//!   append counters and the segment index
//! - **Segments**: immutable compressed payloads, one per accepted append,
//!   linked to their version chain through a `parent` list
//!
//! Plus one atomic counter per symbol that hands out version numbers.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ SegmentStore │
//! └──────┬───────┘
//!        │ Arc<dyn MetadataStore>
//!        ▼
//! ┌──────────────────────────────┐
//! │        MetadataStore         │ ◄── You are here
//! ├──────────────┬───────────────┤
//! │  In-memory   │    SQLite     │
//! └──────────────┴───────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ```ignore
//! use framehouse_metadata::{MetadataStore, SegmentFilter, SqliteMetadataStore};
//!
//! let store = SqliteMetadataStore::new("framehouse.db").await?;
//!
//! let number = store.next_version_number("AAPL").await?;
//! let head = store.latest_version("AAPL").await?;
//!
//! let segments = store
//!     .find_segments(&SegmentFilter::for_symbol("AAPL").with_parent(chain_id))
//!     .await?;
//! ```
//!
//! ## Consistency
//!
//! No operation spans more than one document. Callers that need ordering
//! across documents (insert a segment, then replace the version) rely on the
//! atomic counter and single-document replace only; a writer that loses a
//! race leaves an orphan segment behind.

pub mod error;
pub mod memory;
pub mod store;
pub mod types;

pub use error::{MetadataError, Result};
pub use memory::InMemoryMetadataStore;
pub use store::SqliteMetadataStore;
pub use types::*;

use async_trait::async_trait;

/// Document store contract used by the segment store.
///
/// ## Implementations
///
/// - **InMemoryMetadataStore**: process-local maps behind a `tokio` RwLock
/// - **SqliteMetadataStore**: SQLite through an `sqlx` pool
///
/// ## Thread Safety
///
/// All implementations must be Send + Sync, allowing safe sharing across async tasks
/// via `Arc<dyn MetadataStore>`.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    // ============================================================
    // VERSION OPERATIONS
    // ============================================================

    /// Atomically increment the per-symbol counter and return its new value.
    ///
    /// The counter is created on first use, so the first call for a symbol
    /// returns 1. Values are never reused, even after `delete_versions()`.
    async fn next_version_number(&self, symbol: &str) -> Result<u64>;

    /// Live head of `symbol`, or `None` if it has never been written (or was deleted).
    async fn latest_version(&self, symbol: &str) -> Result<Option<VersionDoc>>;

    /// Version `version` of `symbol`.
    ///
    /// Only the live head is retained, so this returns `Some` only when the
    /// head carries that number.
    async fn find_version(&self, symbol: &str, version: u64) -> Result<Option<VersionDoc>> {
        Ok(self
            .latest_version(symbol)
            .await?
            .filter(|v| v.version == version))
    }

    /// Replace the live head of `version.symbol` (insert if absent).
    async fn upsert_version(&self, version: VersionDoc) -> Result<()>;

    /// Remove the version documents of `symbol`.
    ///
    /// # Returns
    ///
    /// Number of documents removed.
    async fn delete_versions(&self, symbol: &str) -> Result<u64>;

    /// Symbols with a live version, sorted.
    async fn list_symbols(&self) -> Result<Vec<String>>;

    // ============================================================
    // SEGMENT OPERATIONS
    // ============================================================

    /// Store a new immutable segment.
    async fn insert_segment(&self, segment: SegmentDoc) -> Result<()>;

    /// Segments matching `filter`, in arrival order.
    async fn find_segments(&self, filter: &SegmentFilter) -> Result<Vec<SegmentDoc>>;

    /// Remove every segment of `symbol`.
    ///
    /// # Returns
    ///
    /// Number of documents removed.
    async fn delete_segments(&self, symbol: &str) -> Result<u64>;
}
