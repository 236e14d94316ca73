//! Storage module for persisting search results
//!
//! Persistence is an optional side effect of a search: every mapped result
//! is upserted by URL so repeated searches refresh rather than duplicate
//! listings.

mod schema;
mod sqlite;
mod traits;

pub use schema::initialize_schema;
pub use sqlite::SqliteStore;
pub use traits::{ListingStore, StorageError, StorageResult};

use std::path::Path;

/// Opens (creating if needed) a listing database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}
