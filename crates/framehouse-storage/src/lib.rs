//! framehouse Storage Layer
//!
//! Versioned, incremental, idempotent persistence of dataframes.
//!
//! ## Write Path
//!
//! ```text
//! Dataframe ──► ColumnCodec::encode ──► block::compress ──► SegmentDoc
//!                                                            │ insert
//!                                                            ▼
//!                                           MetadataStore ◄── VersionDoc (upsert)
//! ```
//!
//! ## Read Path
//!
//! ```text
//! VersionDoc ──► find_segments(chain id) ──► walk back from up_to - 1
//!            ──► verify + block::decompress ──► ColumnCodec::decode ──► Dataframe
//! ```
//!
//! ## Modules
//!
//! - `block`: u32-length-prefixed LZ4 or raw payload blocks
//! - `segment_index`: per-append `(last index ns, end offset)` stream
//! - `checksum`: content and segment integrity hashes
//! - `config`: `StoreConfig`, loadable from TOML
//! - `store`: `SegmentStore` with append, read and delete
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use framehouse_metadata::InMemoryMetadataStore;
//! use framehouse_storage::{SegmentStore, StoreConfig};
//!
//! let store = SegmentStore::new(Arc::new(InMemoryMetadataStore::new()), StoreConfig::default());
//! store.append("AAPL", &df).await?;
//! store.append("AAPL", &df).await?; // replay: nothing new, returns None
//! assert_eq!(store.read("AAPL").await?.len(), df.len());
//! ```

mod append;
pub mod block;
pub mod checksum;
pub mod config;
pub mod error;
mod read;
pub mod segment_index;
pub mod store;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use segment_index::{IndexEntry, SegmentIndex};
pub use store::{AppendOptions, DateRange, ReadOptions, SegmentStore};
