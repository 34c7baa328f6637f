//! Metadata Error Types
//!
//! ## Error Categories
//!
//! ### Database Errors
//! - `DatabaseError`: SQLite operation failed (connection, query, etc.)
//! - `MigrationError`: embedded schema migrations could not be applied
//!
//! ### Document Errors
//! - `SerializationError`: a version document failed to (de)serialize as JSON
//! - `InvalidDocument`: a stored row does not describe a valid document
//!   (bad id, bad parent list, negative counter)
//!
//! ## Usage
//!
//! All metadata store operations return `Result<T>` which is aliased to
//! `Result<T, MetadataError>`.
//!
//! ```ignore
//! use framehouse_metadata::{MetadataStore, Result};
//!
//! async fn head_version(store: &dyn MetadataStore) -> Result<u64> {
//!     let version = store.latest_version("AAPL").await?;
//!     Ok(version.map(|v| v.version).unwrap_or(0))
//! }
//! ```

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MetadataError>;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl From<sqlx::migrate::MigrateError> for MetadataError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        MetadataError::MigrationError(e.to_string())
    }
}

impl From<uuid::Error> for MetadataError {
    fn from(e: uuid::Error) -> Self {
        MetadataError::InvalidDocument(format!("bad document id: {e}"))
    }
}
