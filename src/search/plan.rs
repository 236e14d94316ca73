//! Search dispatch and stage results

use crate::model::{MarketResult, SearchCriteria};
use crate::postal::{classify_location, postal_target, LocationKind};
use serde::Serialize;

/// How the upstream site is scraped for one search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapePlan {
    /// No location: one unfiltered scrape
    Direct,
    /// Postal input: one scrape filtered on the postal target, which is a
    /// full code when five or more digits were given and a 3-digit prefix
    /// otherwise
    Postal { target: String },
    /// City input: relaxed scrape, then postal post-filter or expansion
    CityRelaxed { city: String },
}

/// Chooses the scrape plan for the given criteria
///
/// ```
/// use car_scout::search::{plan, ScrapePlan};
/// use car_scout::SearchCriteria;
///
/// assert_eq!(plan(&SearchCriteria::new("", "")), ScrapePlan::Direct);
/// assert_eq!(
///     plan(&SearchCriteria::new("", "277 24")),
///     ScrapePlan::Postal { target: "27724".into() }
/// );
/// ```
pub fn plan(criteria: &SearchCriteria) -> ScrapePlan {
    match classify_location(&criteria.location) {
        LocationKind::Empty => ScrapePlan::Direct,
        LocationKind::Postal => ScrapePlan::Postal {
            target: postal_target(&criteria.location),
        },
        LocationKind::City => ScrapePlan::CityRelaxed {
            city: criteria.location.trim().to_string(),
        },
    }
}

/// Result of one pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    Success(Vec<T>),
    Empty,
}

impl<T> StageOutcome<T> {
    /// `Empty` for an empty vector
    pub fn from_vec(items: Vec<T>) -> Self {
        if items.is_empty() {
            Self::Empty
        } else {
            Self::Success(items)
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Success(items) => items,
            Self::Empty => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Success(items) => items.is_empty(),
            Self::Empty => true,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Success(items) => items.len(),
            Self::Empty => 0,
        }
    }
}

impl<T> From<Vec<T>> for StageOutcome<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

/// Which route through the pipeline produced the results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "path", rename_all = "kebab-case")]
pub enum SearchPath {
    /// Answered by the full-text index
    Index,
    Direct,
    Postal { target: String },
    /// City search whose postal post-filter kept a subset
    CityPostFiltered,
    /// City search that kept the relaxed result set
    CityRelaxed,
    /// City search answered by scraping the city's postal codes
    CityExpansion { codes: usize },
}

/// Results of one search together with the route that produced them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub path: SearchPath,
    pub results: Vec<MarketResult>,
}
