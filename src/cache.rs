//! "Last results" cache
//!
//! A single slot holding the results of the most recent search. Every
//! search overwrites it wholesale; concurrent searches race and the last
//! write wins. It is a convenience for callers that want to re-read the
//! previous answer, not a store of record.

use crate::model::MarketResult;
use chrono::{DateTime, Duration, Utc};
use std::sync::RwLock;

/// Results stored in the cache
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResults {
    /// The results of the search
    pub results: Vec<MarketResult>,

    /// When the results were stored
    pub stored_at: DateTime<Utc>,
}

impl CachedResults {
    /// Creates a new CachedResults stamped with the current time
    ///
    /// # Arguments
    ///
    /// * `results` - The results to cache
    pub fn new(results: Vec<MarketResult>) -> Self {
        Self {
            results,
            stored_at: Utc::now(),
        }
    }

    /// Returns how long ago the results were stored
    pub fn age(&self) -> Duration {
        Utc::now() - self.stored_at
    }
}

/// A single-slot store for the latest search results
pub trait ResultCache: Send + Sync {
    /// Returns the most recently stored results, if any
    fn get(&self) -> Option<CachedResults>;

    /// Replaces the stored results
    fn set(&self, results: Vec<MarketResult>);
}

/// In-process [`ResultCache`]
#[derive(Debug, Default)]
pub struct MemoryCache {
    slot: RwLock<Option<CachedResults>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the slot
    pub fn clear(&self) {
        if let Ok(mut slot) = self.slot.write() {
            *slot = None;
        }
    }
}

impl ResultCache for MemoryCache {
    fn get(&self) -> Option<CachedResults> {
        // a poisoned lock only means a writer panicked mid-overwrite; the
        // slot still holds a complete value
        match self.slot.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set(&self, results: Vec<MarketResult>) {
        let cached = CachedResults::new(results);
        match self.slot.write() {
            Ok(mut slot) => *slot = Some(cached),
            Err(poisoned) => *poisoned.into_inner() = Some(cached),
        }
    }
}

/// A [`ResultCache`] that never stores anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl ResultCache for NoCache {
    fn get(&self) -> Option<CachedResults> {
        None
    }

    fn set(&self, _results: Vec<MarketResult>) {}
}
