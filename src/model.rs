//! Records flowing through the search pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A listing as recovered from a search result page
///
/// Strings are empty when the field could not be found. `title` and `url`
/// are never empty for a candidate that leaves the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingCandidate {
    pub title: String,
    /// Free price text, possibly empty
    pub raw_price: String,
    /// Free location text, possibly empty
    pub raw_location: String,
    /// Absolute detail page URL
    pub url: String,
    pub description: String,
    pub thumbnail_url: String,
    /// Only set by detail page enrichment
    pub postal_code: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl ListingCandidate {
    pub fn new(title: impl Into<String>, url: impl Into<String>, captured_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            raw_price: String::new(),
            raw_location: String::new(),
            url: url.into(),
            description: String::new(),
            thumbnail_url: String::new(),
            postal_code: None,
            captured_at,
        }
    }
}

/// A listing as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketResult {
    pub title: String,
    /// `0` means no confidently parsed price
    pub price: u64,
    pub location: String,
    /// Identity key within one search
    pub url: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Kilometres from the searcher, filled in by callers that know coordinates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// A postal code with the municipality it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostalSuggestion {
    pub code: String,
    pub city: String,
}

/// Input to one orchestrated search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    /// Free text; empty means "match location/source only"
    #[serde(default)]
    pub keywords: String,
    /// Empty, a city name, a postal prefix or a full postal code
    #[serde(default)]
    pub location: String,
    /// Never relax a location filter that produced zero matches
    #[serde(default)]
    pub strict_location: bool,
    /// Requested page size; clamped by [`PageSizePolicy`]
    #[serde(default)]
    pub page_size: Option<usize>,
    /// Hand mapped results to the persistence collaborator
    #[serde(default)]
    pub persist: bool,
}

impl SearchCriteria {
    pub fn new(keywords: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            location: location.into(),
            ..Self::default()
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_location = strict;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn persisted(mut self) -> Self {
        self.persist = true;
        self
    }
}

/// Clamps requested page sizes to a fixed allowed set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSizePolicy {
    allowed: Vec<usize>,
    default: usize,
}

impl PageSizePolicy {
    pub fn new(allowed: Vec<usize>, default: usize) -> Self {
        Self { allowed, default }
    }

    /// The requested size if it is allowed, the default otherwise
    pub fn resolve(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(size) if self.allowed.contains(&size) => size,
            _ => self.default,
        }
    }
}

impl Default for PageSizePolicy {
    fn default() -> Self {
        Self::new(vec![10, 20, 50], 20)
    }
}
