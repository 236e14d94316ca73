//! Optional full-text index consulted before scraping
//!
//! When a search index already holds listings, a hit there answers the
//! search without touching the upstream site. The index is strictly
//! optional: [`NullIndex`] stands in when none is configured and every
//! error is turned into "no hits" by the orchestrator.

use crate::config::IndexConfig;
use crate::model::MarketResult;
use crate::postal::{classify_location, postal_target, LocationKind, FULL_CODE_LEN};
use crate::price::parse_price;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Hits requested per query
pub const DEFAULT_HIT_LIMIT: usize = 50;

/// Errors from the search index
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Index request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Index answered HTTP {0}")]
    Status(u16),

    #[error("Index did not answer within {0:?}")]
    Timeout(Duration),
}

/// Result type alias for index operations
pub type IndexResult<T> = std::result::Result<T, IndexError>;

/// One document returned by the index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexHit {
    #[serde(default)]
    pub title: String,
    /// Number or free text
    #[serde(default)]
    pub price: Option<serde_json::Value>,
    #[serde(default, alias = "locality")]
    pub city: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default, alias = "published_date")]
    pub published_date: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl IndexHit {
    /// Numeric price, `0` when unknown
    pub fn price_value(&self) -> u64 {
        match &self.price {
            Some(serde_json::Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
                .unwrap_or(0),
            Some(serde_json::Value::String(s)) => parse_price(s),
            _ => 0,
        }
    }

    /// Converts the hit, dropping hits without a title or URL
    pub fn into_market_result(self, now: DateTime<Utc>) -> Option<MarketResult> {
        if self.title.trim().is_empty() || self.url.trim().is_empty() {
            return None;
        }

        let price = self.price_value();
        let date = self
            .published_date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or(now);
        let thumbnail = self.thumbnail.filter(|t| !t.is_empty());

        Some(MarketResult {
            title: self.title,
            price,
            location: self.city.unwrap_or_default(),
            url: self.url,
            date,
            images: thumbnail.clone().map(|t| vec![t]),
            thumbnail,
            description: self.description.filter(|d| !d.is_empty()),
            distance: None,
        })
    }
}

/// A full-text listing index
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Searches the index
    ///
    /// # Arguments
    ///
    /// * `query` - Free text keywords, possibly empty
    /// * `location_filter` - Raw location input (city or postal code)
    async fn search(&self, query: &str, location_filter: Option<&str>)
        -> IndexResult<Vec<IndexHit>>;
}

/// An index that never has any hits
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIndex;

#[async_trait]
impl SearchIndex for NullIndex {
    async fn search(&self, _query: &str, _location_filter: Option<&str>) -> IndexResult<Vec<IndexHit>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<IndexHit>,
}

/// Meilisearch-compatible HTTP index
///
/// Documents are expected to expose `city`, `postalCode` and `postalPrefix`
/// as filterable attributes.
#[derive(Debug, Clone)]
pub struct MeiliIndex {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    limit: usize,
}

impl MeiliIndex {
    pub fn new(config: &IndexConfig) -> IndexResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &IndexConfig) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/indexes/{}/search",
                config.url.trim_end_matches('/'),
                config.index_name
            ),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            limit: DEFAULT_HIT_LIMIT,
        }
    }
}

/// Builds the index filter expression for raw location input
pub fn location_filter_expression(location: &str) -> Option<String> {
    match classify_location(location) {
        LocationKind::Empty => None,
        LocationKind::Postal => {
            let target = postal_target(location);
            if target.len() >= FULL_CODE_LEN {
                Some(format!("postalCode = \"{}\"", target))
            } else {
                Some(format!("postalPrefix = \"{}\"", target))
            }
        }
        LocationKind::City => Some(format!(
            "city = \"{}\"",
            location.trim().replace('\\', "\\\\").replace('"', "\\\"")
        )),
    }
}

#[async_trait]
impl SearchIndex for MeiliIndex {
    async fn search(&self, query: &str, location_filter: Option<&str>) -> IndexResult<Vec<IndexHit>> {
        let body = SearchRequest {
            q: query.trim(),
            limit: self.limit,
            filter: location_filter.and_then(location_filter_expression),
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IndexError::Status(status.as_u16()));
        }

        let parsed: SearchResponse = response.json().await?;
        tracing::debug!("Index returned {} hits for '{}'", parsed.hits.len(), query);
        Ok(parsed.hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: &str) -> IndexConfig {
        IndexConfig {
            url: url.to_string(),
            index_name: "listings".to_string(),
            api_key: Some("secret".to_string()),
            timeout_ms: 1500,
        }
    }

    #[test]
    fn test_filter_expression() {
        assert_eq!(location_filter_expression(""), None);
        assert_eq!(
            location_filter_expression("277 24").as_deref(),
            Some("postalCode = \"27724\"")
        );
        assert_eq!(
            location_filter_expression("2772").as_deref(),
            Some("postalPrefix = \"277\"")
        );
        assert_eq!(
            location_filter_expression("Mělník").as_deref(),
            Some("city = \"Mělník\"")
        );
    }

    #[test]
    fn test_hit_conversion() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let hit: IndexHit = serde_json::from_value(json!({
            "title": "Octavia",
            "price": "125 000 Kč",
            "locality": "Mělník",
            "url": "https://auto.bazos.cz/inzerat/1/",
            "publishedDate": "2026-01-10T08:00:00Z"
        }))
        .unwrap();

        let result = hit.into_market_result(now).unwrap();
        assert_eq!(result.price, 125_000);
        assert_eq!(result.location, "Mělník");
        assert_eq!(result.date, Utc.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap());
        assert_eq!(result.thumbnail, None);

        let numeric: IndexHit =
            serde_json::from_value(json!({"title": "Golf", "price": 89000, "url": "u"})).unwrap();
        let result = numeric.into_market_result(now).unwrap();
        assert_eq!(result.price, 89_000);
        assert_eq!(result.date, now);

        let untitled: IndexHit = serde_json::from_value(json!({"url": "u"})).unwrap();
        assert!(untitled.into_market_result(now).is_none());
    }

    #[tokio::test]
    async fn test_null_index() {
        assert!(NullIndex.search("octavia", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_meili_search() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/indexes/listings/search"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({"q": "octavia", "filter": "city = \"Kolín\""})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": [{"title": "Octavia", "price": 100000, "city": "Kolín", "url": "https://a/1"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let index = MeiliIndex::new(&config(&server.uri())).unwrap();
        let hits = index.search(" octavia ", Some("Kolín")).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].city.as_deref(), Some("Kolín"));
    }

    #[tokio::test]
    async fn test_meili_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let index = MeiliIndex::new(&config(&server.uri())).unwrap();
        let err = index.search("octavia", None).await.unwrap_err();
        assert!(matches!(err, IndexError::Status(503)));
    }
}
