//! car-scout: used-car classifieds search
//!
//! This crate locates listings on a single classifieds marketplace, turns the
//! heterogeneous listing markup into structured records, resolves ambiguous
//! location input (city names vs. postal codes) into a search strategy, and
//! reconciles the results of one or more scraping passes.

pub mod cache;
pub mod config;
pub mod enrich;
pub mod fetch;
pub mod filter;
pub mod index;
pub mod listing;
pub mod model;
pub mod postal;
pub mod price;
pub mod search;
pub mod storage;
pub mod text;

use thiserror::Error;

/// Main error type for car-scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Search index error: {0}")]
    Index(#[from] index::IndexError),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid detail pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for car-scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{ListingCandidate, MarketResult, PostalSuggestion, SearchCriteria};
pub use search::{Orchestrator, SearchOutcome, SearchPath};
