//! Listing extraction
//!
//! Everything needed to go from a search request to listing candidates
//! without touching the network: search URL construction, result page
//! parsing and the ordered selector strategies both share with detail page
//! enrichment.

mod extractor;
mod query;
pub mod strategy;

pub use extractor::{
    extract_listings, extract_listings_at, resolve_url, ListingExtractor, SkipReason,
    DEFAULT_ANCESTOR_DEPTH, DEFAULT_DETAIL_PATTERN, DEFAULT_EXTRACT_LIMIT, DESCRIPTION_SELECTORS,
    LOCATION_SELECTORS, PRICE_SELECTORS, TITLE_ANCHOR_SELECTORS,
};
pub use query::{build_search_url, LocationHint};
pub use strategy::{element_text, first_success, SelectorChain, Strategy};
