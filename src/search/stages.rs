//! Pure building blocks of the search pipeline
//!
//! Everything here works on candidates already in memory, so each fallback
//! rule can be tested without a network.

use crate::listing::LocationHint;
use crate::model::{ListingCandidate, MarketResult};
use crate::postal::{extract_postal, postal_matches};
use crate::price::PriceParser;
use crate::search::plan::StageOutcome;
use crate::text::{contains_normalized, normalize_for_match};
use std::collections::HashSet;

/// Postal code of a candidate, from enrichment or its location text
pub fn candidate_postal(candidate: &ListingCandidate) -> Option<String> {
    candidate
        .postal_code
        .clone()
        .or_else(|| extract_postal(&candidate.raw_location))
}

/// Whether a candidate satisfies the location a scrape was issued for
pub fn matches_hint(candidate: &ListingCandidate, hint: &LocationHint) -> bool {
    match hint {
        LocationHint::None => true,
        LocationHint::Postal(target) => candidate_postal(candidate)
            .map(|code| postal_matches(&code, target))
            .unwrap_or(false),
        LocationHint::City(city) => contains_normalized(&candidate.raw_location, city),
    }
}

/// Filters one scrape's candidates on its location hint
///
/// Strict searches keep only matches, and no match at all is an empty
/// result. Relaxed searches drop the filter when it leaves fewer than
/// `min_acceptable` candidates.
pub fn apply_location_policy(
    candidates: Vec<ListingCandidate>,
    hint: &LocationHint,
    strict: bool,
    min_acceptable: usize,
) -> StageOutcome<ListingCandidate> {
    if hint.is_none() {
        return StageOutcome::from_vec(candidates);
    }

    let total = candidates.len();
    let matched: Vec<ListingCandidate> = candidates
        .iter()
        .filter(|candidate| matches_hint(candidate, hint))
        .cloned()
        .collect();

    if strict {
        tracing::debug!(
            "Strict location '{}': {} of {} candidates match",
            hint.as_query_value(),
            matched.len(),
            total
        );
        return StageOutcome::from_vec(matched);
    }

    if matched.len() < min_acceptable {
        tracing::debug!(
            "Only {} of {} candidates match '{}', keeping all",
            matched.len(),
            total,
            hint.as_query_value()
        );
        return StageOutcome::from_vec(candidates);
    }

    StageOutcome::from_vec(matched)
}

/// Whether a located candidate belongs to a city
///
/// A known postal code decides on its own. Without one the city name is
/// looked for in the location, title and description.
pub fn belongs_to_city(candidate: &ListingCandidate, city: &str, prefixes: &[String]) -> bool {
    match candidate_postal(candidate) {
        Some(code) if !prefixes.is_empty() => {
            prefixes.iter().any(|prefix| code.starts_with(prefix.as_str()))
        }
        _ => {
            contains_normalized(&candidate.raw_location, city)
                || contains_normalized(&candidate.title, city)
                || contains_normalized(&candidate.description, city)
        }
    }
}

/// Keeps the candidates belonging to a city, in order
pub fn post_filter_matches(
    candidates: &[ListingCandidate],
    city: &str,
    prefixes: &[String],
) -> Vec<ListingCandidate> {
    candidates
        .iter()
        .filter(|candidate| belongs_to_city(candidate, city, prefixes))
        .cloned()
        .collect()
}

/// Removes repeated candidates, keeping first occurrences
///
/// The key is the URL; a candidate without one is keyed on its title and
/// position, so it is never merged with another.
pub fn dedup_candidates(candidates: Vec<ListingCandidate>) -> Vec<ListingCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .enumerate()
        .filter(|(index, candidate)| {
            let key = if candidate.url.is_empty() {
                format!("{}#{}", normalize_for_match(&candidate.title), index)
            } else {
                candidate.url.clone()
            };
            seen.insert(key)
        })
        .map(|(_, candidate)| candidate)
        .collect()
}

/// Maps an enriched candidate to the record returned to callers
///
/// A known postal code stands in for an empty location.
pub fn to_market_result(candidate: ListingCandidate, price: &PriceParser) -> MarketResult {
    let location = if candidate.raw_location.trim().is_empty() {
        candidate.postal_code.clone().unwrap_or_default()
    } else {
        candidate.raw_location.clone()
    };
    let thumbnail = Some(candidate.thumbnail_url).filter(|t| !t.is_empty());

    MarketResult {
        price: price.parse_price(&candidate.raw_price),
        title: candidate.title,
        location,
        url: candidate.url,
        date: candidate.captured_at,
        images: thumbnail.clone().map(|t| vec![t]),
        thumbnail,
        description: Some(candidate.description).filter(|d| !d.is_empty()),
        distance: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candidate(id: u32, location: &str) -> ListingCandidate {
        let mut candidate = ListingCandidate::new(
            format!("Auto {}", id),
            format!("https://auto.bazos.cz/inzerat/{}/", id),
            Utc::now(),
        );
        candidate.raw_location = location.to_string();
        candidate
    }

    fn ids(outcome: &StageOutcome<ListingCandidate>) -> Vec<String> {
        match outcome {
            StageOutcome::Success(items) => items.iter().map(|c| c.title.clone()).collect(),
            StageOutcome::Empty => Vec::new(),
        }
    }

    #[test]
    fn test_postal_hint_exact_vs_prefix() {
        let candidates = vec![
            candidate(1, "Vysoká 277 24"),
            candidate(2, "Neratovice 277 11"),
            candidate(3, "Mělník 276 01"),
        ];

        let exact = LocationHint::Postal("27724".to_string());
        assert_eq!(
            ids(&apply_location_policy(candidates.clone(), &exact, true, 3)),
            vec!["Auto 1"]
        );

        let prefix = LocationHint::Postal("277".to_string());
        assert_eq!(
            ids(&apply_location_policy(candidates, &prefix, true, 3)),
            vec!["Auto 1", "Auto 2"]
        );
    }

    #[test]
    fn test_strict_policy_empty_is_authoritative() {
        let candidates = vec![candidate(1, "Brno"), candidate(2, "Plzeň")];
        let hint = LocationHint::City("Kolín".to_string());
        assert_eq!(
            apply_location_policy(candidates, &hint, true, 3),
            StageOutcome::Empty
        );
    }

    #[test]
    fn test_relaxed_policy_abandons_thin_filter() {
        let candidates = vec![
            candidate(1, "Brno"),
            candidate(2, "Kolín"),
            candidate(3, "Plzeň"),
        ];
        let hint = LocationHint::City("kolin".to_string());

        let outcome = apply_location_policy(candidates.clone(), &hint, false, 3);
        assert_eq!(ids(&outcome), vec!["Auto 1", "Auto 2", "Auto 3"]);

        let outcome = apply_location_policy(candidates, &hint, false, 1);
        assert_eq!(ids(&outcome), vec!["Auto 2"]);
    }

    #[test]
    fn test_post_filter_prefers_postal_code() {
        let prefixes = vec!["280".to_string()];
        let mut wrong_code = candidate(1, "Kolín");
        wrong_code.postal_code = Some("60200".to_string());
        let right_code = candidate(2, "Ovčáry 280 02");
        let text_only = {
            let mut c = candidate(3, "");
            c.description = "Auto stojí v Kolíně, Kolín centrum".to_string();
            c
        };

        let kept = post_filter_matches(&[wrong_code, right_code, text_only], "Kolín", &prefixes);
        let titles: Vec<&str> = kept.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Auto 2", "Auto 3"]);
    }

    #[test]
    fn test_dedup_candidates() {
        let mut untitled_a = candidate(9, "");
        untitled_a.url.clear();
        let untitled_b = untitled_a.clone();

        let deduped = dedup_candidates(vec![
            candidate(1, "a"),
            candidate(1, "b"),
            untitled_a,
            untitled_b,
            candidate(2, "c"),
        ]);

        assert_eq!(deduped.len(), 4);
        assert_eq!(deduped[0].raw_location, "a");
        assert_eq!(dedup_candidates(deduped.clone()), deduped);
    }

    #[test]
    fn test_to_market_result() {
        let mut listing = candidate(1, "");
        listing.raw_price = "125 000 Kč".to_string();
        listing.postal_code = Some("27724".to_string());
        listing.thumbnail_url = "https://img.example.cz/1.jpg".to_string();

        let result = to_market_result(listing, &PriceParser::default());
        assert_eq!(result.price, 125_000);
        assert_eq!(result.location, "27724");
        assert_eq!(result.images, Some(vec!["https://img.example.cz/1.jpg".to_string()]));
        assert_eq!(result.description, None);

        let bare = to_market_result(candidate(2, "Brno"), &PriceParser::default());
        assert_eq!(bare.price, 0);
        assert_eq!(bare.location, "Brno");
        assert_eq!(bare.thumbnail, None);
        assert_eq!(bare.images, None);
    }
}
