//! Listing extraction from search result pages
//!
//! A result page is a list of listing blocks, each with a title link to the
//! listing's detail page. Depending on the template, price, location and
//! description sit next to the link, in a sibling column or a few levels up.
//! Extraction therefore starts from every title anchor and walks up its
//! ancestors, stopping at the first level that carries any listing field so
//! that data from neighbouring listings is never pulled in.

use crate::config::{Config, EXTRACT_LIMIT_RANGE};
use crate::listing::strategy::{element_text, SelectorChain};
use crate::model::ListingCandidate;
use crate::price::PriceParser;
use crate::text::normalize_text;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Title anchors, most specific template first
pub const TITLE_ANCHOR_SELECTORS: &[&str] = &[
    "h2.nadpis a[href]",
    "div.inzeratynadpis h2 a[href]",
    ".inzeratynadpis a[href]",
    ".nadpis a[href]",
    "a.nadpis[href]",
    "a[href*='/inzerat/']",
];

pub const PRICE_SELECTORS: &[&str] = &[
    ".inzeratycena",
    ".cena",
    "[class*='price']",
    "[class*='cena']",
];

pub const LOCATION_SELECTORS: &[&str] = &[
    ".inzeratylok",
    ".lokalita",
    "[class*='location']",
    "[class*='lokal']",
];

pub const DESCRIPTION_SELECTORS: &[&str] = &[
    ".popis",
    ".inzeratypopis",
    "[class*='description']",
    "[class*='popis']",
];

/// Attributes that may carry an image URL, lazy-loading ones included
const IMAGE_ATTRS: &[&str] = &["src", "data-src", "data-original"];

pub const DEFAULT_DETAIL_PATTERN: &str = r"/inzerat/\d+";
pub const DEFAULT_ANCESTOR_DEPTH: usize = 6;
pub const DEFAULT_EXTRACT_LIMIT: usize = 20;

static DEFAULT_DETAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_DETAIL_PATTERN).expect("default detail pattern"));

/// Why an anchor did not become a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    EmptyTitle,
    UnresolvableHref(String),
    NotDetailPage(String),
}

/// Fields found around an anchor
#[derive(Debug, Default)]
struct Surroundings {
    price: Option<String>,
    location: Option<String>,
    description: Option<String>,
}

impl Surroundings {
    fn is_empty(&self) -> bool {
        self.price.is_none() && self.location.is_none() && self.description.is_none()
    }
}

/// Compiled selector chains for one extraction pass
struct Chains {
    anchors: SelectorChain,
    price: SelectorChain,
    location: SelectorChain,
    description: SelectorChain,
    image: Selector,
    link: Selector,
}

impl Chains {
    fn new() -> Option<Self> {
        Some(Self {
            anchors: SelectorChain::new(TITLE_ANCHOR_SELECTORS),
            price: SelectorChain::new(PRICE_SELECTORS),
            location: SelectorChain::new(LOCATION_SELECTORS),
            description: SelectorChain::new(DESCRIPTION_SELECTORS),
            image: Selector::parse("img").ok()?,
            link: Selector::parse("a[href]").ok()?,
        })
    }
}

/// Turns result page HTML into [`ListingCandidate`]s
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    detail_pattern: Regex,
    ancestor_depth: usize,
    price: PriceParser,
}

impl Default for ListingExtractor {
    fn default() -> Self {
        Self {
            detail_pattern: DEFAULT_DETAIL_REGEX.clone(),
            ancestor_depth: DEFAULT_ANCESTOR_DEPTH,
            price: PriceParser::default(),
        }
    }
}

impl ListingExtractor {
    pub fn new(
        detail_pattern: &str,
        ancestor_depth: usize,
        price: PriceParser,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            detail_pattern: Regex::new(detail_pattern)?,
            ancestor_depth: ancestor_depth.max(1),
            price,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, regex::Error> {
        Self::new(
            &config.source.detail_pattern,
            config.search.ancestor_depth,
            PriceParser::with_min_bare_price(config.search.min_bare_price),
        )
    }

    /// Returns true if `url` has the shape of a listing detail page
    pub fn is_detail_url(&self, url: &Url) -> bool {
        self.detail_pattern.is_match(url.path())
    }

    /// Extracts up to `limit` candidates, stamped with the current time
    pub fn extract(&self, html: &str, base_url: &Url, limit: usize) -> Vec<ListingCandidate> {
        self.extract_at(html, base_url, limit, Utc::now())
    }

    /// Extracts up to `limit` candidates stamped with `captured_at`
    ///
    /// `limit` is clamped to 5..=50. Anchors are visited in document order;
    /// an anchor that fails to yield both a title and a detail URL is skipped
    /// without affecting the others, and a page without anchors simply
    /// yields nothing.
    pub fn extract_at(
        &self,
        html: &str,
        base_url: &Url,
        limit: usize,
        captured_at: DateTime<Utc>,
    ) -> Vec<ListingCandidate> {
        let limit = limit.clamp(*EXTRACT_LIMIT_RANGE.start(), *EXTRACT_LIMIT_RANGE.end());
        let Some(chains) = Chains::new() else {
            return Vec::new();
        };

        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        let mut skipped = 0usize;

        for anchor in document.select(&chains.link) {
            let Some(pattern) = chains.anchors.matching(&anchor) else {
                continue;
            };

            match self.extract_one(&chains, anchor, base_url, captured_at) {
                Ok(candidate) => {
                    if seen.insert(candidate.url.clone()) {
                        tracing::trace!("'{}' via {}", candidate.title, pattern);
                        candidates.push(candidate);
                        if candidates.len() >= limit {
                            break;
                        }
                    }
                }
                Err(reason) => {
                    skipped += 1;
                    tracing::trace!("Skipped anchor matched by {}: {:?}", pattern, reason);
                }
            }
        }

        tracing::debug!(
            "Extracted {} candidates from {} ({} anchors skipped)",
            candidates.len(),
            base_url,
            skipped
        );
        candidates
    }

    fn extract_one(
        &self,
        chains: &Chains,
        anchor: ElementRef<'_>,
        base_url: &Url,
        captured_at: DateTime<Utc>,
    ) -> Result<ListingCandidate, SkipReason> {
        let title = element_text(&anchor);
        if title.is_empty() {
            return Err(SkipReason::EmptyTitle);
        }

        let href = anchor.value().attr("href").unwrap_or_default();
        let url = resolve_url(href, base_url)
            .ok_or_else(|| SkipReason::UnresolvableHref(href.to_string()))?;
        if !self.is_detail_url(&url) {
            return Err(SkipReason::NotDetailPage(url.to_string()));
        }

        let (found, container) = self.walk_ancestors(chains, anchor);

        let raw_price = match found.price {
            Some(price) => price,
            None => container
                .and_then(|c| self.price.find_currency_price(&element_text(&c)))
                .unwrap_or_default(),
        };

        let thumbnail_url = first_image(&chains.image, anchor, base_url)
            .or_else(|| container.and_then(|c| first_image(&chains.image, c, base_url)))
            .unwrap_or_default();

        Ok(ListingCandidate {
            title,
            raw_price,
            raw_location: found.location.unwrap_or_default(),
            url: url.to_string(),
            description: found.description.unwrap_or_default(),
            thumbnail_url,
            postal_code: None,
            captured_at,
        })
    }

    /// Walks up from the anchor's parent, at most `ancestor_depth` levels,
    /// and stops at the first level carrying any field
    ///
    /// Returns the fields and the container they were found in, or the
    /// anchor's parent when nothing was found.
    fn walk_ancestors<'a>(
        &self,
        chains: &Chains,
        anchor: ElementRef<'a>,
    ) -> (Surroundings, Option<ElementRef<'a>>) {
        let mut levels = anchor
            .ancestors()
            .filter_map(ElementRef::wrap)
            .take(self.ancestor_depth)
            .peekable();
        let parent = levels.peek().copied();

        for level in levels {
            let found = Surroundings {
                price: chains.price.first_text(level),
                location: chains.location.first_text(level),
                description: chains.description.first_text(level),
            };
            if !found.is_empty() {
                return (found, Some(level));
            }
        }

        (Surroundings::default(), parent)
    }
}

/// Resolves an href against the page URL, dropping non-HTTP links and
/// fragments
pub fn resolve_url(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut url = base_url.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

fn first_image(image: &Selector, scope: ElementRef<'_>, base_url: &Url) -> Option<String> {
    scope.select(image).find_map(|img| {
        IMAGE_ATTRS
            .iter()
            .filter_map(|attr| img.value().attr(attr))
            .map(normalize_text)
            .find(|src| !src.is_empty() && !src.starts_with("data:"))
            .and_then(|src| resolve_url(&src, base_url))
            .map(|url| url.to_string())
    })
}

/// Extracts candidates with default selectors, detail pattern and rules
///
/// # Example
///
/// ```
/// use car_scout::listing::extract_listings;
/// use url::Url;
///
/// let html = r#"<div class="inzeraty">
///     <h2 class="nadpis"><a href="/inzerat/1/skoda.php">Škoda Fabia</a></h2>
///     <div class="inzeratycena">79 000 Kč</div>
///     <div class="inzeratylok">Mělník<br>276 01</div>
/// </div>"#;
/// let base = Url::parse("https://auto.bazos.cz/").unwrap();
/// let listings = extract_listings(html, &base, 20);
/// assert_eq!(listings[0].url, "https://auto.bazos.cz/inzerat/1/skoda.php");
/// assert_eq!(listings[0].raw_location, "Mělník 276 01");
/// ```
pub fn extract_listings(html: &str, base_url: &Url, limit: usize) -> Vec<ListingCandidate> {
    ListingExtractor::default().extract(html, base_url, limit)
}

/// [`extract_listings`] with a fixed capture time
pub fn extract_listings_at(
    html: &str,
    base_url: &Url,
    limit: usize,
    captured_at: DateTime<Utc>,
) -> Vec<ListingCandidate> {
    ListingExtractor::default().extract_at(html, base_url, limit, captured_at)
}
