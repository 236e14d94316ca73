//! End-to-end search tests against a mock marketplace

use crate::common::{detail_page, results_page, test_config, Row};
use car_scout::config::{IndexConfig, PersistenceConfig};
use car_scout::storage::{ListingStore, SqliteStore};
use car_scout::{Orchestrator, SearchCriteria, SearchPath};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_postal_search_sends_full_code_verbatim() {
    let mock_server = MockServer::start().await;

    let page = results_page(&[
        Row::new(1, "Vysoká<br>277 24"),
        Row::new(2, "Vysoká<br>277 24"),
        Row::new(3, "Mělník<br>276 01"),
        Row::new(4, "Vysoká<br>277 24"),
    ]);
    Mock::given(method("GET"))
        .and(path("/search.php"))
        .and(query_param("hlokalita", "27724"))
        .and(query_param("rubriky", "auto"))
        .and(query_param("hledat", "octavia"))
        .respond_with(html(page))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let orchestrator = Orchestrator::from_config(&config).unwrap();
    let outcome = orchestrator
        .search(&SearchCriteria::new("octavia", "277 24"))
        .await;

    assert_eq!(
        outcome.path,
        SearchPath::Postal {
            target: "27724".to_string()
        }
    );
    assert_eq!(outcome.results.len(), 3);
    for result in &outcome.results {
        assert_eq!(result.location, "Vysoká 277 24");
        assert_eq!(result.price, 125_000);
        assert!(result.url.starts_with(&mock_server.uri()));
        assert!(result.thumbnail.as_deref().unwrap().ends_with(".jpg"));
    }
}

#[tokio::test]
async fn test_incomplete_listings_are_enriched_from_detail_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.php"))
        .respond_with(html(results_page(&[Row::bare(1), Row::bare(2)])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/inzerat/1/auto.php"))
        .respond_with(html(detail_page("276 01", "Mělník", "89 000 Kč")))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/inzerat/2/auto.php"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let results = Orchestrator::from_config(&config)
        .unwrap()
        .search_results(&SearchCriteria::new("fabia", ""))
        .await;

    assert_eq!(results.len(), 2);

    assert_eq!(results[0].title, "Škoda Fabia 1");
    assert_eq!(results[0].price, 89_000);
    assert_eq!(results[0].location, "Mělník");
    assert_eq!(
        results[0].thumbnail.as_deref(),
        Some(format!("{}/img/detail.jpg", mock_server.uri()).as_str())
    );

    // a failed detail fetch leaves the listing as scraped
    assert_eq!(results[1].title, "Škoda Fabia 2");
    assert_eq!(results[1].price, 0);
    assert_eq!(results[1].location, "");
}

#[tokio::test]
async fn test_strict_city_search_without_matches_is_empty() {
    let mock_server = MockServer::start().await;

    let page = results_page(&[
        Row::new(1, "Praha<br>150 00"),
        Row::new(2, "Brno<br>602 00"),
    ]);
    Mock::given(method("GET"))
        .and(path("/search.php"))
        .and(query_param("hlokalita", "Kolín"))
        .respond_with(html(page))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let orchestrator = Orchestrator::from_config(&config).unwrap();

    let strict = orchestrator
        .search(&SearchCriteria::new("", "Kolín").strict(true))
        .await;
    assert!(strict.results.is_empty());

    let relaxed = orchestrator.search(&SearchCriteria::new("", "Kolín")).await;
    assert_eq!(relaxed.path, SearchPath::CityRelaxed);
    assert_eq!(relaxed.results.len(), 2);
}

#[tokio::test]
async fn test_upstream_error_yields_no_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.php"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let outcome = Orchestrator::from_config(&config)
        .unwrap()
        .search(&SearchCriteria::new("octavia", ""))
        .await;

    assert_eq!(outcome.path, SearchPath::Direct);
    assert!(outcome.results.is_empty());
}

#[tokio::test]
async fn test_persisted_search_is_stored() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("listings.db");

    Mock::given(method("GET"))
        .and(path("/search.php"))
        .respond_with(html(results_page(&[
            Row::new(1, "Praha<br>110 00"),
            Row::new(2, "Brno<br>602 00"),
        ])))
        .mount(&mock_server)
        .await;

    let mut config = test_config(&mock_server.uri());
    config.persistence = Some(PersistenceConfig {
        database_path: db_path.to_string_lossy().to_string(),
    });
    let orchestrator = Orchestrator::from_config(&config).unwrap();

    let results = orchestrator
        .search_results(&SearchCriteria::new("", "").persisted())
        .await;
    assert_eq!(results.len(), 2);

    // a plain search does not touch the store
    orchestrator.search_results(&SearchCriteria::new("", "")).await;
    orchestrator
        .search_results(&SearchCriteria::new("", "").persisted())
        .await;
    orchestrator.flush().await;

    let store = SqliteStore::new(&db_path).unwrap();
    assert_eq!(store.count().unwrap(), 2);
    assert_eq!(store.seen_count(&results[0].url).unwrap(), Some(2));

    let stored = store.get(&results[1].url).unwrap().unwrap();
    assert_eq!(stored.title, results[1].title);
    assert_eq!(stored.price, 125_000);
}

#[tokio::test]
async fn test_index_hits_skip_scraping() {
    let upstream = MockServer::start().await;
    let index_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.php"))
        .respond_with(html(results_page(&[Row::new(1, "Praha")])))
        .expect(0)
        .mount(&upstream)
        .await;

    Mock::given(method("POST"))
        .and(path("/indexes/listings/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": [
                {"title": "Octavia combi", "price": 150000, "city": "Praha", "url": "https://auto.example.cz/1"},
                {"title": "Bez odkazu", "price": 1000},
                {"title": "Octavia RS", "price": "210 000 Kč", "locality": "Brno", "url": "https://auto.example.cz/2"}
            ]
        })))
        .expect(1)
        .mount(&index_server)
        .await;

    let mut config = test_config(&upstream.uri());
    config.index = Some(IndexConfig {
        url: index_server.uri(),
        index_name: "listings".to_string(),
        api_key: None,
        timeout_ms: 1_000,
    });

    let outcome = Orchestrator::from_config(&config)
        .unwrap()
        .search(&SearchCriteria::new("octavia", "Praha"))
        .await;

    assert_eq!(outcome.path, SearchPath::Index);
    let urls: Vec<&str> = outcome.results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec!["https://auto.example.cz/1", "https://auto.example.cz/2"]);
    assert_eq!(outcome.results[0].location, "Praha");
}

#[tokio::test]
async fn test_failing_index_falls_back_to_scraping() {
    let upstream = MockServer::start().await;
    let index_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.php"))
        .respond_with(html(results_page(&[Row::new(1, "Praha<br>110 00")])))
        .expect(1)
        .mount(&upstream)
        .await;

    Mock::given(method("POST"))
        .and(path("/indexes/listings/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&index_server)
        .await;

    let mut config = test_config(&upstream.uri());
    config.index = Some(IndexConfig {
        url: index_server.uri(),
        index_name: "listings".to_string(),
        api_key: Some("key".to_string()),
        timeout_ms: 1_000,
    });

    let outcome = Orchestrator::from_config(&config)
        .unwrap()
        .search(&SearchCriteria::new("", ""))
        .await;

    assert_eq!(outcome.path, SearchPath::Direct);
    assert_eq!(outcome.results.len(), 1);
}
