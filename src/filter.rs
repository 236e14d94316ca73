//! Result filtering and ranking
//!
//! Every method first removes duplicate URLs, keeping the first occurrence.
//! Items without a URL are dropped here, unlike the orchestrator's internal
//! dedup which still tolerates them.

use crate::model::MarketResult;
use crate::text::normalize_for_match;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Size cap for [`FilterMethod::Random`]
pub const DEFAULT_SAMPLE_SIZE: usize = 20;

/// Bonus for a title containing the keyword phrase
const KEYWORD_BONUS: u32 = 100;

/// Bonus for having any title at all
const TITLE_BONUS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMethod {
    /// Duplicate removal only, order preserved
    #[default]
    Dedupe,
    /// Uniformly shuffled sample
    Random,
    /// Keyword matches first, otherwise input order
    Relevance,
}

impl FromStr for FilterMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dedupe" => Ok(Self::Dedupe),
            "random" => Ok(Self::Random),
            "relevance" => Ok(Self::Relevance),
            other => Err(format!("unknown filter method '{}'", other)),
        }
    }
}

impl fmt::Display for FilterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dedupe => "dedupe",
            Self::Random => "random",
            Self::Relevance => "relevance",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    pub method: FilterMethod,
    pub keywords: String,
    /// Cap for the random sample
    pub sample_size: usize,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            method: FilterMethod::Dedupe,
            keywords: String::new(),
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl FilterOptions {
    pub fn new(method: FilterMethod, keywords: impl Into<String>) -> Self {
        Self {
            method,
            keywords: keywords.into(),
            ..Self::default()
        }
    }
}

/// Removes items without a URL and repeated URLs, keeping first occurrences
pub fn dedupe(items: Vec<MarketResult>) -> Vec<MarketResult> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| !item.url.is_empty() && seen.insert(item.url.clone()))
        .collect()
}

/// Filters results using the thread-local random generator
pub fn filter_results(items: Vec<MarketResult>, options: &FilterOptions) -> Vec<MarketResult> {
    filter_results_with_rng(items, options, &mut rand::thread_rng())
}

/// Filters results, drawing any randomness from `rng`
pub fn filter_results_with_rng<R: Rng + ?Sized>(
    items: Vec<MarketResult>,
    options: &FilterOptions,
    rng: &mut R,
) -> Vec<MarketResult> {
    let mut items = dedupe(items);

    match options.method {
        FilterMethod::Dedupe => items,
        FilterMethod::Random => {
            items.shuffle(rng);
            items.truncate(options.sample_size);
            items
        }
        FilterMethod::Relevance => {
            let keywords = normalize_for_match(&options.keywords);
            // sort_by_key is stable, so equal scores keep their input order
            items.sort_by_key(|item| std::cmp::Reverse(relevance_score(&item.title, &keywords)));
            items
        }
    }
}

/// Scores a title against an already folded keyword phrase
pub fn relevance_score(title: &str, folded_keywords: &str) -> u32 {
    let title = normalize_for_match(title);
    let mut score = 0;
    if !folded_keywords.is_empty() && title.contains(folded_keywords) {
        score += KEYWORD_BONUS;
    }
    if !title.is_empty() {
        score += TITLE_BONUS;
    }
    score
}
