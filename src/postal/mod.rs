//! Postal resolution
//!
//! Maps a city name or partial postal code to postal suggestions and 3-digit
//! prefixes using a static reference table, and classifies raw location
//! input as postal-like, city-like or empty.

mod table;

pub use table::{entries, PostalEntry};

use crate::model::PostalSuggestion;
use crate::text::normalize_for_match;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Maximum suggestions returned for a digits-only query
pub const MAX_NUMERIC_SUGGESTIONS: usize = 5;

/// Length of the coarse geographic prefix
pub const PREFIX_LEN: usize = 3;

/// Length from which a postal code is matched verbatim
pub const FULL_CODE_LEN: usize = 5;

static POSTAL_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{3})\s?(\d{2})\b").expect("postal regex"));

/// What kind of location the user typed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationKind {
    /// Digits only (a full postal code or a prefix)
    Postal,
    /// Anything non-numeric, treated as a city name
    City,
    /// Nothing usable
    Empty,
}

/// Classifies raw location input
///
/// Whitespace is ignored, so `"277 24"` is postal.
///
/// ```
/// use car_scout::postal::{classify_location, LocationKind};
///
/// assert_eq!(classify_location(" 277 24 "), LocationKind::Postal);
/// assert_eq!(classify_location("Mělník"), LocationKind::City);
/// assert_eq!(classify_location("   "), LocationKind::Empty);
/// ```
pub fn classify_location(raw: &str) -> LocationKind {
    let compact = compact(raw);
    if compact.is_empty() {
        LocationKind::Empty
    } else if compact.chars().all(|c| c.is_ascii_digit()) {
        LocationKind::Postal
    } else {
        LocationKind::City
    }
}

/// The postal string a search should use for postal-like input
///
/// Five or more digits are used verbatim; anything shorter is reduced to
/// its 3-digit prefix.
pub fn postal_target(raw: &str) -> String {
    let digits = compact(raw);
    if digits.len() >= FULL_CODE_LEN {
        digits
    } else {
        digits.chars().take(PREFIX_LEN).collect()
    }
}

/// Suggests postal codes for a partial code or a city name
///
/// Digits-only queries return codes starting with the digits, ascending and
/// capped at [`MAX_NUMERIC_SUGGESTIONS`]. City queries are matched on the
/// folded name, first exactly, then by their first word against whole city
/// names, and only when both come up empty are one or two trailing letters
/// stripped to tolerate inflected or mistyped names.
pub fn suggest_postal(query: &str) -> Vec<PostalSuggestion> {
    match classify_location(query) {
        LocationKind::Empty => Vec::new(),
        LocationKind::Postal => {
            let digits = compact(query);
            entries()
                .iter()
                .filter(|entry| entry.code.starts_with(&digits))
                .map(to_suggestion)
                .take(MAX_NUMERIC_SUGGESTIONS)
                .collect()
        }
        LocationKind::City => suggest_for_city(query),
    }
}

fn suggest_for_city(query: &str) -> Vec<PostalSuggestion> {
    let folded = normalize_for_match(query);
    let query_first = first_word(&folded);

    let mut matched: BTreeMap<&'static str, &PostalEntry> = BTreeMap::new();

    for entry in entries().iter().filter(|entry| entry.folded_city == folded) {
        matched.entry(entry.code).or_insert(entry);
    }

    // first word against whole city names: "Praha 5" is Praha
    if matched.is_empty() && query_first != folded {
        for entry in entries().iter().filter(|entry| entry.folded_city == query_first) {
            matched.entry(entry.code).or_insert(entry);
        }
    }

    if matched.is_empty() {
        for strip in 1..=2 {
            let count = folded.chars().count();
            if count <= strip + 2 {
                break;
            }
            let stem: String = folded.chars().take(count - strip).collect();

            for entry in entries() {
                if entry.folded_city.starts_with(&stem)
                    || first_word(&entry.folded_city).starts_with(&stem)
                {
                    matched.entry(entry.code).or_insert(entry);
                }
            }

            if !matched.is_empty() {
                tracing::debug!("Matched '{}' through stem '{}'", query, stem);
                break;
            }
        }
    }

    matched.into_values().map(to_suggestion).collect()
}

/// Returns the 3-digit prefixes for a city, or the prefix of a postal input
pub fn lookup_postal_prefixes(city_or_postal: &str) -> Vec<String> {
    match classify_location(city_or_postal) {
        LocationKind::Empty => Vec::new(),
        LocationKind::Postal => vec![compact(city_or_postal)
            .chars()
            .take(PREFIX_LEN)
            .collect()],
        LocationKind::City => suggest_for_city(city_or_postal)
            .into_iter()
            .map(|s| s.code.chars().take(PREFIX_LEN).collect::<String>())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    }
}

/// Returns every known full postal code for a city, ascending
pub fn postal_codes_for_city(city: &str) -> Vec<String> {
    if classify_location(city) != LocationKind::City {
        return Vec::new();
    }
    suggest_for_city(city).into_iter().map(|s| s.code).collect()
}

/// Reads a postal code (`27601` or `276 01`) out of free text
pub fn extract_postal(text: &str) -> Option<String> {
    POSTAL_IN_TEXT
        .captures(text)
        .map(|caps| format!("{}{}", &caps[1], &caps[2]))
}

/// Returns true if `code` starts with the given postal target
///
/// A full 5-digit target only matches itself; a prefix matches every code
/// beginning with it.
pub fn postal_matches(code: &str, target: &str) -> bool {
    let code = compact(code);
    !target.is_empty() && code.starts_with(target)
}

fn to_suggestion(entry: &PostalEntry) -> PostalSuggestion {
    PostalSuggestion {
        code: entry.code.to_string(),
        city: entry.city.to_string(),
    }
}

fn compact(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

fn first_word(folded: &str) -> &str {
    folded
        .split(|c: char| c.is_whitespace() || c == '-')
        .find(|w| !w.is_empty())
        .unwrap_or("")
}
