//! In-memory metadata store.
//!
//! Keeps every document in process memory behind a single `tokio` RwLock.
//! Nothing survives a restart; meant for tests and embedders that bring their
//! own persistence.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::Result,
    types::{SegmentDoc, SegmentFilter, VersionDoc},
    MetadataStore,
};

#[derive(Default)]
struct State {
    counters: HashMap<String, u64>,
    versions: BTreeMap<String, VersionDoc>,
    /// Arrival order
    segments: Vec<SegmentDoc>,
}

#[derive(Default)]
pub struct InMemoryMetadataStore {
    state: RwLock<State>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total segments held, across all symbols
    pub async fn segment_count(&self) -> usize {
        self.state.read().await.segments.len()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn next_version_number(&self, symbol: &str) -> Result<u64> {
        let mut state = self.state.write().await;
        let counter = state.counters.entry(symbol.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn latest_version(&self, symbol: &str) -> Result<Option<VersionDoc>> {
        Ok(self.state.read().await.versions.get(symbol).cloned())
    }

    async fn upsert_version(&self, version: VersionDoc) -> Result<()> {
        let mut state = self.state.write().await;
        state.versions.insert(version.symbol.clone(), version);
        Ok(())
    }

    async fn delete_versions(&self, symbol: &str) -> Result<u64> {
        let mut state = self.state.write().await;
        Ok(state.versions.remove(symbol).map_or(0, |_| 1))
    }

    async fn list_symbols(&self) -> Result<Vec<String>> {
        Ok(self.state.read().await.versions.keys().cloned().collect())
    }

    async fn insert_segment(&self, segment: SegmentDoc) -> Result<()> {
        self.state.write().await.segments.push(segment);
        Ok(())
    }

    async fn find_segments(&self, filter: &SegmentFilter) -> Result<Vec<SegmentDoc>> {
        let state = self.state.read().await;
        Ok(state
            .segments
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    async fn delete_segments(&self, symbol: &str) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.segments.len();
        state.segments.retain(|s| s.symbol != symbol);
        Ok((before - state.segments.len()) as u64)
    }
}
