//! Integration tests for metadata store implementations
//!
//! These tests verify that both backends (in-memory and SQLite) behave
//! identically and correctly implement the MetadataStore trait.

use std::sync::Arc;

use framehouse_metadata::{
    DtypeMetadata, InMemoryMetadataStore, MetadataStore, SegmentDoc, SegmentFilter,
    SqliteMetadataStore, VersionDoc, DATAFRAME_KIND,
};
use uuid::Uuid;

/// Helper to create a version document
fn create_test_version(symbol: &str, version: u64, up_to: u64) -> VersionDoc {
    VersionDoc {
        id: Uuid::new_v4(),
        symbol: symbol.to_string(),
        version,
        dtype: "[('ts', '<M8[ns]'), ('px', '<f8')]".to_string(),
        dtype_metadata: DtypeMetadata {
            index: vec!["ts".to_string()],
            columns: vec!["ts".to_string(), "px".to_string()],
        },
        shape: vec![-1],
        kind: DATAFRAME_KIND.to_string(),
        segment_count: version,
        append_count: version,
        up_to,
        segment_index: vec![1, 2, 3, 4],
        sha: Some("ab".repeat(32)),
        base_version_id: None,
    }
}

/// Helper to create a segment document
fn create_test_segment(symbol: &str, segment: u64, parent: Vec<Uuid>) -> SegmentDoc {
    SegmentDoc {
        id: Uuid::new_v4(),
        symbol: symbol.to_string(),
        data: vec![segment as u8; 16],
        compressed: true,
        segment,
        parent,
        sha: format!("{segment:064x}"),
    }
}

// ============================================================================
// In-memory Tests
// ============================================================================

#[tokio::test]
async fn test_memory_version_workflow() {
    let store = InMemoryMetadataStore::new();
    test_version_workflow(&store).await;
}

#[tokio::test]
async fn test_memory_segment_workflow() {
    let store = InMemoryMetadataStore::new();
    test_segment_workflow(&store).await;
}

#[tokio::test]
async fn test_memory_concurrent_counters() {
    let store = Arc::new(InMemoryMetadataStore::new());
    test_concurrent_counters(store).await;
}

// ============================================================================
// SQLite Tests
// ============================================================================

#[tokio::test]
async fn test_sqlite_version_workflow() {
    let store = SqliteMetadataStore::new_in_memory().await.unwrap();
    test_version_workflow(&store).await;
}

#[tokio::test]
async fn test_sqlite_segment_workflow() {
    let store = SqliteMetadataStore::new_in_memory().await.unwrap();
    test_segment_workflow(&store).await;
}

#[tokio::test]
async fn test_sqlite_concurrent_counters() {
    let store = Arc::new(SqliteMetadataStore::new_in_memory().await.unwrap());
    test_concurrent_counters(store).await;
}

#[tokio::test]
async fn test_sqlite_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("framehouse.db");

    let version = create_test_version("AAPL", 1, 5);
    let chain = version.id;
    {
        let store = SqliteMetadataStore::new(&path).await.unwrap();
        assert_eq!(store.next_version_number("AAPL").await.unwrap(), 1);
        store.upsert_version(version.clone()).await.unwrap();
        store
            .insert_segment(create_test_segment("AAPL", 4, vec![chain]))
            .await
            .unwrap();
    }

    let store = SqliteMetadataStore::new(&path).await.unwrap();
    assert_eq!(store.latest_version("AAPL").await.unwrap(), Some(version));
    assert_eq!(store.next_version_number("AAPL").await.unwrap(), 2);

    let segments = store
        .find_segments(&SegmentFilter::for_symbol("AAPL").with_parent(chain))
        .await
        .unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].data, vec![4u8; 16]);
}

// ============================================================================
// Shared Test Implementations
// ============================================================================

async fn test_version_workflow(store: &dyn MetadataStore) {
    assert_eq!(store.latest_version("AAPL").await.unwrap(), None);
    assert!(store.list_symbols().await.unwrap().is_empty());

    assert_eq!(store.next_version_number("AAPL").await.unwrap(), 1);
    assert_eq!(store.next_version_number("AAPL").await.unwrap(), 2);
    assert_eq!(store.next_version_number("MSFT").await.unwrap(), 1);

    let v1 = create_test_version("AAPL", 1, 10);
    store.upsert_version(v1.clone()).await.unwrap();
    assert_eq!(store.latest_version("AAPL").await.unwrap(), Some(v1.clone()));

    // Replace keeps a single head per symbol
    let mut v2 = create_test_version("AAPL", 2, 20);
    v2.base_version_id = Some(v1.id);
    store.upsert_version(v2.clone()).await.unwrap();
    assert_eq!(store.latest_version("AAPL").await.unwrap(), Some(v2.clone()));
    assert_eq!(store.find_version("AAPL", 2).await.unwrap(), Some(v2));
    assert_eq!(store.find_version("AAPL", 1).await.unwrap(), None);

    store
        .upsert_version(create_test_version("MSFT", 1, 3))
        .await
        .unwrap();
    assert_eq!(
        store.list_symbols().await.unwrap(),
        vec!["AAPL".to_string(), "MSFT".to_string()]
    );

    assert_eq!(store.delete_versions("AAPL").await.unwrap(), 1);
    assert_eq!(store.delete_versions("AAPL").await.unwrap(), 0);
    assert_eq!(store.latest_version("AAPL").await.unwrap(), None);
    assert_eq!(store.list_symbols().await.unwrap(), vec!["MSFT".to_string()]);

    // Counter survives deletion
    assert_eq!(store.next_version_number("AAPL").await.unwrap(), 3);
}

async fn test_segment_workflow(store: &dyn MetadataStore) {
    let chain = Uuid::new_v4();
    let other_chain = Uuid::new_v4();

    for (segment, parent) in [
        (9, vec![Uuid::new_v4(), chain]),
        (19, vec![Uuid::new_v4(), chain]),
        (19, vec![Uuid::new_v4(), other_chain]),
        (29, vec![Uuid::new_v4(), chain]),
    ] {
        store
            .insert_segment(create_test_segment("AAPL", segment, parent))
            .await
            .unwrap();
    }
    store
        .insert_segment(create_test_segment("MSFT", 9, vec![chain]))
        .await
        .unwrap();

    let all = store
        .find_segments(&SegmentFilter::for_symbol("AAPL"))
        .await
        .unwrap();
    assert_eq!(
        all.iter().map(|s| s.segment).collect::<Vec<_>>(),
        vec![9, 19, 19, 29]
    );

    let chained = store
        .find_segments(&SegmentFilter::for_symbol("AAPL").with_parent(chain))
        .await
        .unwrap();
    assert_eq!(
        chained.iter().map(|s| s.segment).collect::<Vec<_>>(),
        vec![9, 19, 29]
    );
    assert!(chained.iter().all(|s| s.parent.contains(&chain)));

    let ranged = store
        .find_segments(
            &SegmentFilter::for_symbol("AAPL")
                .with_parent(chain)
                .with_segment_range(Some(10), Some(29)),
        )
        .await
        .unwrap();
    assert_eq!(
        ranged.iter().map(|s| s.segment).collect::<Vec<_>>(),
        vec![19, 29]
    );

    assert_eq!(store.delete_segments("AAPL").await.unwrap(), 4);
    assert!(store
        .find_segments(&SegmentFilter::for_symbol("AAPL"))
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        store
            .find_segments(&SegmentFilter::for_symbol("MSFT"))
            .await
            .unwrap()
            .len(),
        1
    );
}

async fn test_concurrent_counters(store: Arc<dyn MetadataStore>) {
    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let mut numbers = Vec::new();
            for _ in 0..10 {
                numbers.push(store.next_version_number("AAPL").await.unwrap());
            }
            numbers
        }));
    }

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.await.unwrap());
    }
    all.sort_unstable();
    assert_eq!(all, (1..=100).collect::<Vec<u64>>());
}
