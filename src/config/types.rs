use serde::Deserialize;

/// Main configuration structure for car-scout
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub search: SearchConfig,
    /// Optional fast full-text index consulted before scraping
    #[serde(default)]
    pub index: Option<IndexConfig>,
    /// Optional SQLite persistence of mapped results
    #[serde(default)]
    pub persistence: Option<PersistenceConfig>,
}

/// Upstream marketplace description
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceConfig {
    /// Root URL of the listing search (query parameters are appended)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Regex a resolved link must match to count as a listing detail page
    #[serde(default = "default_detail_pattern")]
    pub detail_pattern: String,

    /// Search radius sent along with a postal code
    #[serde(default = "default_radius_km")]
    pub radius_km: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            detail_pattern: default_detail_pattern(),
            radius_km: default_radius_km(),
        }
    }
}

/// HTTP client behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for search result pages (milliseconds)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Timeout for detail page fetches during enrichment (milliseconds)
    #[serde(default = "default_detail_timeout_ms")]
    pub detail_timeout_ms: u64,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_ms: default_request_timeout_ms(),
            detail_timeout_ms: default_detail_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Search orchestration tuning
///
/// The thresholds here are heuristics tuned to one upstream site.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SearchConfig {
    /// Page sizes a caller may request
    #[serde(default = "default_allowed_page_sizes")]
    pub allowed_page_sizes: Vec<usize>,

    /// Page size used when the requested one is not allowed
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Maximum candidates taken from one result page (5..=50)
    #[serde(default = "default_extract_limit")]
    pub extract_limit: usize,

    /// How many ancestors of a title anchor are searched for fields
    #[serde(default = "default_ancestor_depth")]
    pub ancestor_depth: usize,

    /// Below this many location matches a relaxed filter is abandoned
    #[serde(default = "default_min_acceptable_matches")]
    pub min_acceptable_matches: usize,

    /// Smallest number accepted as a price without a currency token
    #[serde(default = "default_min_bare_price")]
    pub min_bare_price: u64,

    #[serde(default = "default_enrich_concurrency")]
    pub enrich_concurrency: usize,

    #[serde(default = "default_scrape_concurrency")]
    pub scrape_concurrency: usize,

    /// Postal codes scraped in the first expansion round
    #[serde(default = "default_expansion_initial")]
    pub expansion_initial: usize,

    /// Upper bound on postal codes scraped during expansion
    #[serde(default = "default_expansion_max")]
    pub expansion_max: usize,

    /// Cap on the random sample produced by the result filter
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            allowed_page_sizes: default_allowed_page_sizes(),
            default_page_size: default_page_size(),
            extract_limit: default_extract_limit(),
            ancestor_depth: default_ancestor_depth(),
            min_acceptable_matches: default_min_acceptable_matches(),
            min_bare_price: default_min_bare_price(),
            enrich_concurrency: default_enrich_concurrency(),
            scrape_concurrency: default_scrape_concurrency(),
            expansion_initial: default_expansion_initial(),
            expansion_max: default_expansion_max(),
            sample_size: default_sample_size(),
        }
    }
}

/// Fast full-text index endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IndexConfig {
    pub url: String,

    #[serde(default = "default_index_name")]
    pub index_name: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// The index is an optimisation; keep this short
    #[serde(default = "default_index_timeout_ms")]
    pub timeout_ms: u64,
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PersistenceConfig {
    /// Path to the SQLite database file
    pub database_path: String,
}

fn default_base_url() -> String {
    "https://auto.bazos.cz/".to_string()
}

fn default_detail_pattern() -> String {
    r"/inzerat/\d+".to_string()
}

fn default_radius_km() -> u32 {
    25
}

fn default_user_agent() -> String {
    format!(
        "car-scout/{} (+https://github.com/car-scout/car-scout)",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

fn default_detail_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_allowed_page_sizes() -> Vec<usize> {
    vec![10, 20, 50]
}

fn default_page_size() -> usize {
    20
}

fn default_extract_limit() -> usize {
    20
}

fn default_ancestor_depth() -> usize {
    6
}

fn default_min_acceptable_matches() -> usize {
    3
}

fn default_min_bare_price() -> u64 {
    10_000
}

fn default_enrich_concurrency() -> usize {
    3
}

fn default_scrape_concurrency() -> usize {
    4
}

fn default_expansion_initial() -> usize {
    16
}

fn default_expansion_max() -> usize {
    50
}

fn default_sample_size() -> usize {
    20
}

fn default_index_name() -> String {
    "listings".to_string()
}

fn default_index_timeout_ms() -> u64 {
    1_500
}
