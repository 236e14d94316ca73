//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ListingStore trait.

use crate::model::MarketResult;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ListingStore, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite storage backend
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// How many times a listing has been upserted
    pub fn seen_count(&self, url: &str) -> StorageResult<Option<u32>> {
        let conn = self.conn()?;
        let count = conn
            .query_row(
                "SELECT seen_count FROM listings WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count)
    }

    /// Most recently seen listings, newest first
    pub fn recent(&self, limit: usize) -> StorageResult<Vec<MarketResult>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT title, price, location, url, published_at, thumbnail, images, description
             FROM listings ORDER BY last_seen_at DESC, id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], read_row)?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row??);
        }
        Ok(results)
    }
}

type RawRow = StorageResult<MarketResult>;

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    let price: i64 = row.get(1)?;
    let published_at: String = row.get(4)?;
    let images: Option<String> = row.get(6)?;

    let date = match DateTime::parse_from_rfc3339(&published_at) {
        Ok(date) => date.with_timezone(&Utc),
        Err(e) => {
            return Ok(Err(StorageError::InvalidRecord(format!(
                "bad date '{}': {}",
                published_at, e
            ))))
        }
    };
    let images = match images.map(|json| serde_json::from_str::<Vec<String>>(&json)) {
        Some(Ok(images)) => Some(images),
        Some(Err(e)) => return Ok(Err(e.into())),
        None => None,
    };

    Ok(Ok(MarketResult {
        title: row.get(0)?,
        price: price.max(0) as u64,
        location: row.get(2)?,
        url: row.get(3)?,
        date,
        thumbnail: row.get(5)?,
        images,
        description: row.get(7)?,
        distance: None,
    }))
}

impl ListingStore for SqliteStore {
    fn upsert(&self, result: &MarketResult) -> StorageResult<()> {
        if result.url.is_empty() {
            return Err(StorageError::InvalidRecord(
                "listing without url".to_string(),
            ));
        }

        let images = result
            .images
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let price = i64::try_from(result.price)
            .map_err(|_| StorageError::InvalidRecord(format!("price {}", result.price)))?;
        let now = Utc::now().to_rfc3339();

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO listings
                (url, title, price, location, published_at, thumbnail, images, description,
                 first_seen_at, last_seen_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                price = excluded.price,
                location = excluded.location,
                published_at = excluded.published_at,
                thumbnail = excluded.thumbnail,
                images = excluded.images,
                description = excluded.description,
                last_seen_at = excluded.last_seen_at,
                seen_count = seen_count + 1",
            params![
                result.url,
                result.title,
                price,
                result.location,
                result.date.to_rfc3339(),
                result.thumbnail,
                images,
                result.description,
                now,
            ],
        )?;
        Ok(())
    }

    fn get(&self, url: &str) -> StorageResult<Option<MarketResult>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT title, price, location, url, published_at, thumbnail, images, description
                 FROM listings WHERE url = ?1",
                params![url],
                read_row,
            )
            .optional()?;
        row.transpose()
    }

    fn count(&self) -> StorageResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
