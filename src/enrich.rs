//! Detail page enrichment
//!
//! Result pages often omit the price, the exact location or the picture of a
//! listing. The enricher fetches the listing's own detail page and fills in
//! what is missing. Enrichment is best-effort: a failed fetch or an
//! unparsable page returns the candidate unchanged.

use crate::config::Config;
use crate::fetch::{FetchResult, Fetcher};
use crate::listing::{
    element_text, first_success, resolve_url, SelectorChain, Strategy, LOCATION_SELECTORS,
    PRICE_SELECTORS,
};
use crate::model::ListingCandidate;
use crate::postal::extract_postal;
use crate::price::{self, PriceParser};
use crate::text::{normalize_for_match, normalize_text};
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENRICH_CONCURRENCY: usize = 3;
pub const DEFAULT_DETAIL_TIMEOUT: Duration = Duration::from_secs(10);

/// How far past a "Cena:" label in the meta description the price is looked for
const META_PRICE_WINDOW: usize = 40;

static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("row selector"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("anchor selector"));
static EMPHASIS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("b, strong").expect("emphasis selector"));
static META_DESCRIPTION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[name="description"], meta[property="og:description"]"#)
        .expect("meta description selector")
});
static OG_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).expect("og:image selector"));
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("image selector"));

static META_LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:lokalita|místo|lokace)\s*:\s*([^,;|\n]+)").expect("meta location regex")
});
static META_PRICE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcena\s*:\s*").expect("meta price regex"));

static PRICE_CLASSES: Lazy<SelectorChain> = Lazy::new(|| SelectorChain::new(PRICE_SELECTORS));
static LOCATION_CLASSES: Lazy<SelectorChain> =
    Lazy::new(|| SelectorChain::new(LOCATION_SELECTORS));

/// Fields recovered from a detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub price: Option<String>,
    /// City name
    pub location: Option<String>,
    pub postal_code: Option<String>,
    /// Absolute image URL
    pub thumbnail: Option<String>,
    pub description: Option<String>,
}

const PRICE_STRATEGIES: &[Strategy<Html>] = &[
    Strategy {
        name: "table-row",
        run: table_price,
    },
    Strategy {
        name: "meta-description",
        run: meta_price,
    },
    Strategy {
        name: "css-class",
        run: class_price,
    },
];

const LOCATION_STRATEGIES: &[Strategy<Html>] = &[
    Strategy {
        name: "table-row",
        run: table_city,
    },
    Strategy {
        name: "meta-description",
        run: meta_location,
    },
    Strategy {
        name: "css-class",
        run: class_location,
    },
];

const POSTAL_STRATEGIES: &[Strategy<Html>] = &[
    Strategy {
        name: "table-row",
        run: table_postal,
    },
    Strategy {
        name: "css-class",
        run: class_postal,
    },
];

const THUMBNAIL_STRATEGIES: &[Strategy<Html>] = &[
    Strategy {
        name: "og:image",
        run: og_image,
    },
    Strategy {
        name: "first-image",
        run: first_image,
    },
];

/// Parses a detail page
///
/// Each field is produced by the first strategy in its list that yields a
/// value. Relative image URLs are resolved against `base_url`.
pub fn parse_detail(html: &str, base_url: &Url) -> DetailFields {
    let document = Html::parse_document(html);

    let field = |strategies: &[Strategy<Html>], name: &str| {
        first_success(&document, strategies).map(|(strategy, value)| {
            tracing::trace!("{} from {} on {}", name, strategy, base_url);
            value
        })
    };

    DetailFields {
        price: field(PRICE_STRATEGIES, "price"),
        location: field(LOCATION_STRATEGIES, "location"),
        postal_code: field(POSTAL_STRATEGIES, "postal code"),
        thumbnail: field(THUMBNAIL_STRATEGIES, "thumbnail")
            .and_then(|src| resolve_url(&src, base_url))
            .map(|url| url.to_string()),
        description: meta_description(&document),
    }
}

/// Value cell of the table row whose first cell starts with `label`
///
/// Rows of layout tables that merely contain the labelled row are skipped.
fn labelled_cell<'a>(document: &'a Html, label: &str) -> Option<ElementRef<'a>> {
    document.select(&ROW).find_map(|row| {
        let cells: Vec<ElementRef<'a>> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| matches!(cell.value().name(), "td" | "th"))
            .collect();

        let head = cells.first()?;
        if head.select(&ROW).next().is_some() {
            return None;
        }
        if !normalize_for_match(&element_text(head)).starts_with(label) {
            return None;
        }
        cells.get(1).copied()
    })
}

fn table_price(document: &Html) -> Option<String> {
    let cell = labelled_cell(document, "cena")?;
    let text = cell
        .select(&EMPHASIS)
        .map(|b| element_text(&b))
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| element_text(&cell));
    non_empty(price::extract_price(&text))
}

fn location_anchors(document: &Html) -> Option<(ElementRef<'_>, Vec<String>)> {
    let cell = labelled_cell(document, "lokalita")?;
    let anchors = cell
        .select(&ANCHOR)
        .map(|a| element_text(&a))
        .filter(|text| !text.is_empty())
        .collect();
    Some((cell, anchors))
}

fn is_postal_like(text: &str) -> bool {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    !compact.is_empty() && compact.chars().all(|c| c.is_ascii_digit())
}

fn table_city(document: &Html) -> Option<String> {
    let (cell, anchors) = location_anchors(document)?;
    if let Some(city) = anchors.get(1) {
        return Some(city.clone());
    }
    if let Some(city) = anchors.iter().find(|a| !is_postal_like(a)) {
        return Some(city.clone());
    }

    // plain text cell such as "Mělník 276 01"
    let text = element_text(&cell);
    let city = match extract_postal(&text) {
        Some(_) => text
            .split(|c: char| c.is_ascii_digit())
            .next()
            .unwrap_or_default()
            .trim()
            .to_string(),
        None => text,
    };
    non_empty(city)
}

fn table_postal(document: &Html) -> Option<String> {
    let (cell, anchors) = location_anchors(document)?;
    match anchors.first() {
        Some(first) if is_postal_like(first) => {
            Some(first.chars().filter(|c| !c.is_whitespace()).collect())
        }
        _ => extract_postal(&element_text(&cell)),
    }
}

fn meta_description(document: &Html) -> Option<String> {
    document
        .select(&META_DESCRIPTION)
        .filter_map(|meta| meta.value().attr("content"))
        .map(normalize_text)
        .find(|content| !content.is_empty())
}

fn meta_price(document: &Html) -> Option<String> {
    let content = meta_description(document)?;
    META_PRICE_LABEL.find_iter(&content).find_map(|label| {
        let window: String = content[label.end()..]
            .chars()
            .take(META_PRICE_WINDOW)
            .collect();
        non_empty(price::extract_price(&window))
    })
}

fn meta_location(document: &Html) -> Option<String> {
    let content = meta_description(document)?;
    let caps = META_LOCATION.captures(&content)?;
    non_empty(caps[1].trim().to_string())
}

fn class_price(document: &Html) -> Option<String> {
    let text = PRICE_CLASSES.first_text(document.root_element())?;
    non_empty(price::extract_price(&text))
}

fn class_location(document: &Html) -> Option<String> {
    LOCATION_CLASSES.first_text(document.root_element())
}

fn class_postal(document: &Html) -> Option<String> {
    extract_postal(&LOCATION_CLASSES.first_text(document.root_element())?)
}

fn og_image(document: &Html) -> Option<String> {
    document
        .select(&OG_IMAGE)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|src| !src.is_empty())
        .map(str::to_string)
}

fn first_image(document: &Html) -> Option<String> {
    document.select(&IMAGE).find_map(|img| {
        ["src", "data-src"]
            .iter()
            .filter_map(|attr| img.value().attr(attr))
            .map(str::trim)
            .find(|src| !src.is_empty() && !src.starts_with("data:"))
            .map(str::to_string)
    })
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

/// Fills in missing candidate fields from detail pages
#[derive(Clone)]
pub struct DetailEnricher {
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
    concurrency: usize,
    price: PriceParser,
}

impl DetailEnricher {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            timeout: DEFAULT_DETAIL_TIMEOUT,
            concurrency: DEFAULT_ENRICH_CONCURRENCY,
            price: PriceParser::default(),
        }
    }

    pub fn from_config(config: &Config, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            timeout: Duration::from_millis(config.http.detail_timeout_ms),
            concurrency: config.search.enrich_concurrency.max(1),
            price: PriceParser::with_min_bare_price(config.search.min_bare_price),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// A candidate with a valid price, a location and a thumbnail needs no
    /// detail fetch
    pub fn is_complete(&self, candidate: &ListingCandidate) -> bool {
        self.price.is_valid_price(&candidate.raw_price)
            && !candidate.raw_location.trim().is_empty()
            && !candidate.thumbnail_url.trim().is_empty()
    }

    /// Fetches and parses a candidate's detail page
    ///
    /// Returns `None` when the URL is unusable or the fetch fails.
    pub async fn fetch_details(&self, candidate: &ListingCandidate) -> Option<DetailFields> {
        let url = match Url::parse(&candidate.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Not enriching '{}': {}", candidate.url, e);
                return None;
            }
        };

        match self.fetcher.fetch(url.as_str(), self.timeout).await {
            FetchResult::Success {
                final_url, body, ..
            } => {
                let base = Url::parse(&final_url).unwrap_or(url);
                Some(parse_detail(&body, &base))
            }
            failed => {
                tracing::debug!("Detail fetch failed for {}: {}", url, failed.describe());
                None
            }
        }
    }

    /// Enriches one candidate
    ///
    /// Complete candidates are returned as they are, without any fetch.
    pub async fn enrich(&self, candidate: ListingCandidate) -> ListingCandidate {
        if self.is_complete(&candidate) {
            return candidate;
        }
        self.fetch_and_merge(candidate).await
    }

    async fn fetch_and_merge(&self, candidate: ListingCandidate) -> ListingCandidate {
        match self.fetch_details(&candidate).await {
            Some(details) => self.merge(candidate, details),
            None => candidate,
        }
    }

    /// Applies detail fields to a candidate, then repairs its price
    ///
    /// Price, city and postal code from the detail page are authoritative.
    /// Thumbnail and description only fill gaps.
    pub fn merge(&self, mut candidate: ListingCandidate, details: DetailFields) -> ListingCandidate {
        if let Some(price) = details.price {
            candidate.raw_price = price;
        }
        if let Some(location) = details.location {
            candidate.raw_location = location;
        }
        if details.postal_code.is_some() {
            candidate.postal_code = details.postal_code;
        }
        if candidate.thumbnail_url.is_empty() {
            if let Some(thumbnail) = details.thumbnail {
                candidate.thumbnail_url = thumbnail;
            }
        }
        if candidate.description.is_empty() {
            if let Some(description) = details.description {
                candidate.description = description;
            }
        }

        candidate.raw_price = self.price.repair(&candidate.raw_price);
        candidate
    }

    /// Enriches every incomplete candidate, preserving order
    ///
    /// Incomplete candidates are processed in sequential batches of the
    /// configured concurrency; each batch is awaited as a whole before the
    /// next one starts.
    pub async fn enrich_all(&self, candidates: Vec<ListingCandidate>) -> Vec<ListingCandidate> {
        self.enrich_all_except(candidates, &HashSet::new()).await
    }

    /// Like [`enrich_all`](Self::enrich_all), but never fetches a URL in
    /// `fetched` again
    pub async fn enrich_all_except(
        &self,
        candidates: Vec<ListingCandidate>,
        fetched: &HashSet<String>,
    ) -> Vec<ListingCandidate> {
        let pending: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, candidate)| {
                !self.is_complete(candidate) && !fetched.contains(&candidate.url)
            })
            .map(|(index, _)| index)
            .collect();

        if !pending.is_empty() {
            tracing::info!(
                "Enriching {} of {} candidates ({} at a time)",
                pending.len(),
                candidates.len(),
                self.concurrency
            );
        }
        self.fetch_batched(candidates, pending).await
    }

    /// Gives every candidate a postal code where one can be found
    ///
    /// A code already present in the listing's location text is used as is;
    /// the remaining candidates get their detail page fetched and merged.
    /// Every URL fetched here is added to `fetched`.
    pub async fn locate_all(
        &self,
        candidates: Vec<ListingCandidate>,
        fetched: &mut HashSet<String>,
    ) -> Vec<ListingCandidate> {
        let mut candidates = candidates;
        for candidate in candidates.iter_mut() {
            if candidate.postal_code.is_none() {
                candidate.postal_code = extract_postal(&candidate.raw_location);
            }
        }

        let pending: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, candidate)| candidate.postal_code.is_none())
            .map(|(index, _)| index)
            .collect();

        if !pending.is_empty() {
            tracing::debug!(
                "Fetching details for {} candidates without a postal code",
                pending.len()
            );
        }
        fetched.extend(pending.iter().map(|&index| candidates[index].url.clone()));
        self.fetch_batched(candidates, pending).await
    }

    async fn fetch_batched(
        &self,
        mut candidates: Vec<ListingCandidate>,
        pending: Vec<usize>,
    ) -> Vec<ListingCandidate> {
        for batch in pending.chunks(self.concurrency) {
            let merged = join_all(
                batch
                    .iter()
                    .map(|&index| self.fetch_and_merge(candidates[index].clone())),
            )
            .await;

            for (&index, candidate) in batch.iter().zip(merged) {
                candidates[index] = candidate;
            }
        }

        candidates
    }
}
