//! Configuration module for car-scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so an empty file is a valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use car_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("car-scout.toml")).unwrap();
//! println!("Enrichment concurrency: {}", config.search.enrich_concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, HttpConfig, IndexConfig, PersistenceConfig, SearchConfig, SourceConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::EXTRACT_LIMIT_RANGE;
