//! SQLite Metadata Store Implementation
//!
//! This module implements the MetadataStore trait using SQLite as the backend.
//!
//! ## Usage
//!
//! ### File-Based
//! ```ignore
//! use framehouse_metadata::{SqliteMetadataStore, MetadataStore};
//!
//! // Creates framehouse.db (or opens it if it exists)
//! let store = SqliteMetadataStore::new("framehouse.db").await?;
//! let symbols = store.list_symbols().await?;
//! ```
//!
//! ### In-Memory (Testing)
//! ```ignore
//! let store = SqliteMetadataStore::new_in_memory().await?;
//! ```
//!
//! ## Schema
//!
//! | Table | Key | Contents |
//! |---|---|---|
//! | `version_counters` | symbol | last allocated version number |
//! | `versions` | symbol | live head as a JSON document |
//! | `segments` | autoincrement `seq` | payload BLOB, parents as a JSON array |
//!
//! - Counter allocation is one `INSERT ... ON CONFLICT DO UPDATE ... RETURNING`
//!   statement, so concurrent writers never observe the same number
//! - `seq` gives arrival order for `find_segments()`
//! - Parent filters use `json_each` over the `parent` column
//!
//! ## Implementation Details
//!
//! - Runtime queries (`sqlx::query`) with manual row mapping
//! - Migrations run on startup via `sqlx::migrate!`
//! - u64 values are stored as SQLite INTEGER (i64)

use crate::{
    error::{MetadataError, Result},
    types::{SegmentDoc, SegmentFilter, VersionDoc},
    MetadataStore,
};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// SQLite-based metadata store implementation
pub struct SqliteMetadataStore {
    pool: SqlitePool,
}

impl SqliteMetadataStore {
    /// Open (or create) the database at `path` and apply migrations
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let options =
            SqliteConnectOptions::from_str(&format!("sqlite://{}", path.as_ref().display()))?
                .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!(path = %path.as_ref().display(), "opened sqlite metadata store");

        Ok(Self { pool })
    }

    /// Create in-memory database (for testing)
    ///
    /// Every pooled connection to `sqlite::memory:` is a separate database, so
    /// the pool is pinned to a single connection.
    pub async fn new_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    fn to_i64(value: u64, what: &str) -> Result<i64> {
        i64::try_from(value)
            .map_err(|_| MetadataError::InvalidDocument(format!("{what} {value} out of range")))
    }

    fn to_u64(value: i64, what: &str) -> Result<u64> {
        u64::try_from(value)
            .map_err(|_| MetadataError::InvalidDocument(format!("negative {what}: {value}")))
    }

    fn segment_from_row(row: &SqliteRow) -> Result<SegmentDoc> {
        let id: String = row.try_get("id")?;
        let parent: String = row.try_get("parent")?;
        let parent: Vec<Uuid> = serde_json::from_str(&parent)?;

        Ok(SegmentDoc {
            id: Uuid::parse_str(&id)?,
            symbol: row.try_get("symbol")?,
            data: row.try_get("data")?,
            compressed: row.try_get("compressed")?,
            segment: Self::to_u64(row.try_get("segment")?, "segment offset")?,
            parent,
            sha: row.try_get("sha")?,
        })
    }
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    async fn next_version_number(&self, symbol: &str) -> Result<u64> {
        let seq: i64 = sqlx::query_scalar(
            "INSERT INTO version_counters (symbol, seq) VALUES (?, 1)
             ON CONFLICT(symbol) DO UPDATE SET seq = seq + 1
             RETURNING seq",
        )
        .bind(symbol)
        .fetch_one(&self.pool)
        .await?;

        Self::to_u64(seq, "version counter")
    }

    async fn latest_version(&self, symbol: &str) -> Result<Option<VersionDoc>> {
        let document: Option<String> =
            sqlx::query_scalar("SELECT document FROM versions WHERE symbol = ?")
                .bind(symbol)
                .fetch_optional(&self.pool)
                .await?;

        match document {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn find_version(&self, symbol: &str, version: u64) -> Result<Option<VersionDoc>> {
        let document: Option<String> =
            sqlx::query_scalar("SELECT document FROM versions WHERE symbol = ? AND version = ?")
                .bind(symbol)
                .bind(Self::to_i64(version, "version")?)
                .fetch_optional(&self.pool)
                .await?;

        match document {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn upsert_version(&self, version: VersionDoc) -> Result<()> {
        let document = serde_json::to_string(&version)?;

        sqlx::query(
            "INSERT INTO versions (symbol, version, document) VALUES (?, ?, ?)
             ON CONFLICT(symbol) DO UPDATE SET
                version = excluded.version,
                document = excluded.document",
        )
        .bind(&version.symbol)
        .bind(Self::to_i64(version.version, "version")?)
        .bind(document)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_versions(&self, symbol: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM versions WHERE symbol = ?")
            .bind(symbol)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_symbols(&self) -> Result<Vec<String>> {
        let symbols: Vec<String> =
            sqlx::query_scalar("SELECT symbol FROM versions ORDER BY symbol")
                .fetch_all(&self.pool)
                .await?;

        Ok(symbols)
    }

    async fn insert_segment(&self, segment: SegmentDoc) -> Result<()> {
        let parent = serde_json::to_string(&segment.parent)?;

        sqlx::query(
            "INSERT INTO segments (id, symbol, segment, compressed, data, sha, parent)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(segment.id.to_string())
        .bind(&segment.symbol)
        .bind(Self::to_i64(segment.segment, "segment offset")?)
        .bind(segment.compressed)
        .bind(&segment.data)
        .bind(&segment.sha)
        .bind(parent)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_segments(&self, filter: &SegmentFilter) -> Result<Vec<SegmentDoc>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, symbol, segment, compressed, data, sha, parent
             FROM segments WHERE symbol = ",
        );
        query.push_bind(filter.symbol.clone());

        if let Some(parent) = filter.parent {
            query.push(
                " AND EXISTS (SELECT 1 FROM json_each(segments.parent) WHERE json_each.value = ",
            );
            query.push_bind(parent.to_string());
            query.push(")");
        }
        if let Some(min) = filter.min_segment {
            query.push(" AND segment >= ");
            query.push_bind(Self::to_i64(min, "segment offset")?);
        }
        if let Some(max) = filter.max_segment {
            query.push(" AND segment <= ");
            query.push_bind(Self::to_i64(max, "segment offset")?);
        }
        query.push(" ORDER BY seq");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(Self::segment_from_row).collect()
    }

    async fn delete_segments(&self, symbol: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM segments WHERE symbol = ?")
            .bind(symbol)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
