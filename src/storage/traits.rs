//! Storage traits and error types

use crate::model::MarketResult;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence collaborator for mapped search results
///
/// Implementations must be safe to share between concurrent searches.
pub trait ListingStore: Send + Sync {
    /// Inserts or updates a result, keyed by its URL
    ///
    /// Upserting the same record twice leaves a single row.
    fn upsert(&self, result: &MarketResult) -> StorageResult<()>;

    /// Gets a stored result by URL
    fn get(&self, url: &str) -> StorageResult<Option<MarketResult>>;

    /// Returns the number of stored listings
    fn count(&self) -> StorageResult<usize>;
}
