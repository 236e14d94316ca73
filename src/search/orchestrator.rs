//! Search orchestration
//!
//! One search walks a fixed route of named stages:
//!
//! 1. the optional full-text index, which answers the search outright when
//!    it has hits;
//! 2. a scrape chosen by [`plan`]: direct, postal, or a relaxed city scrape
//!    followed by a postal post-filter (or, when the relaxed scrape finds
//!    nothing, an expansion over the city's postal codes);
//! 3. dedup, enrichment and mapping to [`MarketResult`];
//! 4. optional persistence and the "last results" cache.
//!
//! No stage failure is fatal. A failed fetch, index query or store write is
//! logged and treated as "nothing from this path".
//!
//! Store writes run on tokio's blocking pool and are not awaited by the
//! search; [`Orchestrator::flush`] waits for the outstanding ones.

use crate::cache::{MemoryCache, ResultCache};
use crate::config::Config;
use crate::enrich::DetailEnricher;
use crate::fetch::{FetchResult, Fetcher, HttpFetcher};
use crate::filter::dedupe;
use crate::index::{IndexError, MeiliIndex, SearchIndex};
use crate::listing::{build_search_url, ListingExtractor, LocationHint};
use crate::model::{ListingCandidate, MarketResult, PageSizePolicy, SearchCriteria};
use crate::postal::{lookup_postal_prefixes, postal_codes_for_city};
use crate::price::PriceParser;
use crate::search::plan::{plan, ScrapePlan, SearchOutcome, SearchPath, StageOutcome};
use crate::search::stages::{
    apply_location_policy, dedup_candidates, post_filter_matches, to_market_result,
};
use crate::storage::{open_store, ListingStore};
use crate::{ConfigError, ScoutError};
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// Coordinates one search across scraping, enrichment and collaborators
pub struct Orchestrator {
    base_url: Url,
    radius_km: u32,
    request_timeout: Duration,
    extract_limit: usize,
    min_acceptable: usize,
    scrape_concurrency: usize,
    expansion_initial: usize,
    expansion_max: usize,
    page_sizes: PageSizePolicy,
    price: PriceParser,
    fetcher: Arc<dyn Fetcher>,
    extractor: ListingExtractor,
    enricher: DetailEnricher,
    index: Option<Arc<dyn SearchIndex>>,
    index_timeout: Duration,
    store: Option<Arc<dyn ListingStore>>,
    pending_writes: Mutex<Vec<JoinHandle<()>>>,
    cache: Arc<dyn ResultCache>,
}

impl Orchestrator {
    /// Creates an orchestrator with no index, no store and an in-memory cache
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `fetcher` - HTML fetch collaborator
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to search
    /// * `Err(ScoutError)` - The base URL or the detail pattern is unusable
    pub fn new(config: &Config, fetcher: Arc<dyn Fetcher>) -> Result<Self, ScoutError> {
        let base_url = Url::parse(&config.source.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.source.base_url, e)))?;
        let extractor = ListingExtractor::from_config(config)?;
        let search = &config.search;

        Ok(Self {
            base_url,
            radius_km: config.source.radius_km,
            request_timeout: Duration::from_millis(config.http.request_timeout_ms),
            extract_limit: search.extract_limit,
            min_acceptable: search.min_acceptable_matches,
            scrape_concurrency: search.scrape_concurrency.max(1),
            expansion_initial: search.expansion_initial,
            expansion_max: search.expansion_max.max(search.expansion_initial),
            page_sizes: PageSizePolicy::new(
                search.allowed_page_sizes.clone(),
                search.default_page_size,
            ),
            price: PriceParser::with_min_bare_price(search.min_bare_price),
            enricher: DetailEnricher::from_config(config, fetcher.clone()),
            fetcher,
            extractor,
            index: None,
            index_timeout: Duration::from_millis(
                config
                    .index
                    .as_ref()
                    .map(|index| index.timeout_ms)
                    .unwrap_or(1_500),
            ),
            store: None,
            pending_writes: Mutex::new(Vec::new()),
            cache: Arc::new(MemoryCache::new()),
        })
    }

    /// Creates an orchestrator with every collaborator the configuration names
    ///
    /// Uses the reqwest fetcher, a Meilisearch index when `[index]` is set
    /// and a SQLite store when `[persistence]` is set.
    pub fn from_config(config: &Config) -> Result<Self, ScoutError> {
        let fetcher = Arc::new(HttpFetcher::new(&config.http)?);
        let mut orchestrator = Self::new(config, fetcher)?;

        if let Some(index) = &config.index {
            tracing::info!("Using search index at {}", index.url);
            orchestrator = orchestrator.with_index(Arc::new(MeiliIndex::new(index)?));
        }

        if let Some(persistence) = &config.persistence {
            let store = open_store(Path::new(&persistence.database_path))?;
            tracing::info!("Persisting results to {}", persistence.database_path);
            orchestrator = orchestrator.with_store(Arc::new(store));
        }

        Ok(orchestrator)
    }

    pub fn with_index(mut self, index: Arc<dyn SearchIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_index_timeout(mut self, timeout: Duration) -> Self {
        self.index_timeout = timeout;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ListingStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_enricher(mut self, enricher: DetailEnricher) -> Self {
        self.enricher = enricher;
        self
    }

    /// The cache holding the latest search results
    pub fn cache(&self) -> &Arc<dyn ResultCache> {
        &self.cache
    }

    /// Runs a search and returns only the results
    pub async fn search_results(&self, criteria: &SearchCriteria) -> Vec<MarketResult> {
        self.search(criteria).await.results
    }

    /// Runs a search
    ///
    /// Never fails: every collaborator failure degrades to fewer (possibly
    /// zero) results.
    pub async fn search(&self, criteria: &SearchCriteria) -> SearchOutcome {
        let page_size = self.page_sizes.resolve(criteria.page_size);
        tracing::info!(
            "Searching '{}' in '{}' (strict: {}, page size: {})",
            criteria.keywords,
            criteria.location,
            criteria.strict_location,
            page_size
        );

        if let StageOutcome::Success(results) = self.index_lookup(criteria, page_size).await {
            tracing::info!("Index answered with {} results", results.len());
            self.cache.set(results.clone());
            return SearchOutcome {
                results,
                path: SearchPath::Index,
            };
        }

        let keywords = criteria.keywords.trim();
        let strict = criteria.strict_location;
        let mut fetched = HashSet::new();

        let (scraped, path) = match plan(criteria) {
            ScrapePlan::Direct => (
                self.scrape(keywords, LocationHint::None, strict).await,
                SearchPath::Direct,
            ),
            ScrapePlan::Postal { target } => (
                self.scrape(keywords, LocationHint::Postal(target.clone()), strict)
                    .await,
                SearchPath::Postal { target },
            ),
            ScrapePlan::CityRelaxed { city } => {
                self.city_search(keywords, &city, strict, page_size, &mut fetched)
                    .await
            }
        };

        let mut candidates = dedup_candidates(scraped.into_vec());
        candidates.truncate(page_size);

        let enriched = self.enricher.enrich_all_except(candidates, &fetched).await;
        let results: Vec<MarketResult> = enriched
            .into_iter()
            .map(|candidate| to_market_result(candidate, &self.price))
            .collect();

        if criteria.persist {
            self.persist(&results);
        }

        tracing::info!("Search finished via {:?} with {} results", path, results.len());
        self.cache.set(results.clone());
        SearchOutcome { results, path }
    }

    /// Queries the index, if one is configured, within the index timeout
    async fn index_lookup(
        &self,
        criteria: &SearchCriteria,
        page_size: usize,
    ) -> StageOutcome<MarketResult> {
        let Some(index) = &self.index else {
            return StageOutcome::Empty;
        };

        let location = Some(criteria.location.trim()).filter(|l| !l.is_empty());
        let query = index.search(criteria.keywords.trim(), location);

        let hits = match tokio::time::timeout(self.index_timeout, query).await {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                tracing::warn!("Search index failed, falling back to scraping: {}", e);
                return StageOutcome::Empty;
            }
            Err(_) => {
                let e = IndexError::Timeout(self.index_timeout);
                tracing::warn!("Search index failed, falling back to scraping: {}", e);
                return StageOutcome::Empty;
            }
        };

        let now = Utc::now();
        let mut results = dedupe(
            hits.into_iter()
                .filter_map(|hit| hit.into_market_result(now))
                .collect(),
        );
        results.truncate(page_size);
        StageOutcome::from_vec(results)
    }

    /// Fetches one result page and applies the location policy to it
    async fn scrape(
        &self,
        keywords: &str,
        hint: LocationHint,
        strict: bool,
    ) -> StageOutcome<ListingCandidate> {
        let url = build_search_url(&self.base_url, keywords, &hint, self.radius_km);

        let body = match self.fetcher.fetch(url.as_str(), self.request_timeout).await {
            FetchResult::Success { body, .. } => body,
            failed => {
                tracing::warn!("Scrape of {} failed: {}", url, failed.describe());
                return StageOutcome::Empty;
            }
        };

        let candidates = self.extractor.extract(&body, &url, self.extract_limit);
        tracing::debug!(
            "{} candidates for location '{}'",
            candidates.len(),
            hint.as_query_value()
        );
        apply_location_policy(candidates, &hint, strict, self.min_acceptable)
    }

    /// Relaxed city scrape, then post-filter or postal expansion
    async fn city_search(
        &self,
        keywords: &str,
        city: &str,
        strict: bool,
        page_size: usize,
        fetched: &mut HashSet<String>,
    ) -> (StageOutcome<ListingCandidate>, SearchPath) {
        match self
            .scrape(keywords, LocationHint::City(city.to_string()), false)
            .await
        {
            StageOutcome::Success(candidates) => {
                self.postal_post_filter(candidates, city, strict, fetched)
                    .await
            }
            StageOutcome::Empty => {
                tracing::info!("Relaxed scrape for '{}' found nothing, expanding", city);
                let (outcome, codes) = self
                    .postal_expansion(keywords, city, strict, page_size)
                    .await;
                (outcome, SearchPath::CityExpansion { codes })
            }
        }
    }

    /// Narrows a relaxed city result set to the city's postal prefixes
    ///
    /// Candidates are located first (postal code from the listing text or
    /// the detail page, recorded in `fetched`). When nothing matches, a
    /// strict search ends empty and a relaxed one keeps the whole located set.
    async fn postal_post_filter(
        &self,
        candidates: Vec<ListingCandidate>,
        city: &str,
        strict: bool,
        fetched: &mut HashSet<String>,
    ) -> (StageOutcome<ListingCandidate>, SearchPath) {
        let prefixes = lookup_postal_prefixes(city);
        let located = self.enricher.locate_all(candidates, fetched).await;
        let matched = post_filter_matches(&located, city, &prefixes);

        tracing::info!(
            "Post-filter for '{}' ({} prefixes) kept {} of {}",
            city,
            prefixes.len(),
            matched.len(),
            located.len()
        );

        if !matched.is_empty() {
            (StageOutcome::Success(matched), SearchPath::CityPostFiltered)
        } else if strict {
            (StageOutcome::Empty, SearchPath::CityPostFiltered)
        } else {
            (StageOutcome::from_vec(located), SearchPath::CityRelaxed)
        }
    }

    /// Scrapes the city's postal codes until the page is full
    ///
    /// The first round covers `expansion_initial` codes; further codes, up
    /// to `expansion_max`, are only scraped while results are still short of
    /// the page size. Returns the outcome and the number of codes scraped.
    async fn postal_expansion(
        &self,
        keywords: &str,
        city: &str,
        strict: bool,
        page_size: usize,
    ) -> (StageOutcome<ListingCandidate>, usize) {
        let codes = postal_codes_for_city(city);
        if codes.is_empty() {
            tracing::info!("No postal codes known for '{}'", city);
            return (StageOutcome::Empty, 0);
        }

        let initial = self.expansion_initial.min(codes.len());
        let max = self.expansion_max.min(codes.len());
        let rounds = [&codes[..initial], &codes[initial..max]];

        let mut seen = HashSet::new();
        let mut aggregated = Vec::new();
        let mut scraped = 0;

        for (round, round_codes) in rounds.iter().enumerate() {
            if aggregated.len() >= page_size {
                break;
            }
            if round > 0 && !round_codes.is_empty() {
                tracing::info!(
                    "Expansion for '{}' has {} of {} results, scraping {} more codes",
                    city,
                    aggregated.len(),
                    page_size,
                    round_codes.len()
                );
            }

            for batch in round_codes.chunks(self.scrape_concurrency) {
                if aggregated.len() >= page_size {
                    break;
                }

                let outcomes = join_all(batch.iter().map(|code| {
                    self.scrape(keywords, LocationHint::Postal(code.clone()), strict)
                }))
                .await;
                scraped += batch.len();

                for candidate in outcomes.into_iter().flat_map(StageOutcome::into_vec) {
                    if seen.insert(candidate.url.clone()) {
                        aggregated.push(candidate);
                    }
                }
            }
        }

        tracing::info!(
            "Expansion for '{}' scraped {} codes, {} results",
            city,
            scraped,
            aggregated.len()
        );
        (StageOutcome::from_vec(aggregated), scraped)
    }

    /// Hands every result to the store on the blocking pool
    ///
    /// Failures are logged and skipped per result.
    fn persist(&self, results: &[MarketResult]) {
        let Some(store) = &self.store else {
            tracing::debug!("Persistence requested but no store is configured");
            return;
        };

        let store = Arc::clone(store);
        let results = results.to_vec();
        let handle = tokio::task::spawn_blocking(move || {
            let mut failed = 0;
            for result in &results {
                if let Err(e) = store.upsert(result) {
                    failed += 1;
                    tracing::warn!("Failed to persist {}: {}", result.url, e);
                }
            }
            tracing::debug!(
                "Persisted {} of {} results",
                results.len() - failed,
                results.len()
            );
        });

        let mut writes = self.lock_writes();
        writes.retain(|write| !write.is_finished());
        writes.push(handle);
    }

    /// Waits for every store write started by earlier searches
    pub async fn flush(&self) {
        let writes = std::mem::take(&mut *self.lock_writes());
        for write in writes {
            if let Err(e) = write.await {
                tracing::warn!("Persistence task failed: {}", e);
            }
        }
    }

    fn lock_writes(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.pending_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
