//! Detail page fetching and enrichment over HTTP

use crate::common::detail_page;
use car_scout::config::HttpConfig;
use car_scout::enrich::DetailEnricher;
use car_scout::fetch::{FetchResult, Fetcher, HttpFetcher};
use car_scout::ListingCandidate;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> Arc<HttpFetcher> {
    Arc::new(HttpFetcher::new(&HttpConfig::default()).unwrap())
}

fn candidate(server: &MockServer, id: u32) -> ListingCandidate {
    ListingCandidate::new(
        format!("Škoda Superb {}", id),
        format!("{}/inzerat/{}/auto.php", server.uri(), id),
        Utc::now(),
    )
}

#[tokio::test]
async fn test_fetch_reports_status_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher();
    let timeout = Duration::from_secs(2);

    match fetcher.fetch(&format!("{}/ok", mock_server.uri()), timeout).await {
        FetchResult::Success {
            status_code, body, ..
        } => {
            assert_eq!(status_code, 200);
            assert_eq!(body, "<html>ok</html>");
        }
        other => panic!("unexpected fetch result: {:?}", other),
    }

    let missing = fetcher
        .fetch(&format!("{}/missing", mock_server.uri()), timeout)
        .await;
    assert_eq!(missing, FetchResult::HttpError { status_code: 404 });
}

#[tokio::test]
async fn test_detail_page_fills_missing_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/inzerat/7/auto.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("602 00", "Brno", "185 000 Kč"))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let enricher = DetailEnricher::new(fetcher());
    let enriched = enricher.enrich(candidate(&mock_server, 7)).await;

    assert_eq!(enriched.raw_location, "Brno");
    assert_eq!(enriched.postal_code.as_deref(), Some("60200"));
    assert_eq!(
        enriched.thumbnail_url,
        format!("{}/img/detail.jpg", mock_server.uri())
    );
    assert_eq!(enriched.raw_price, "185 000 Kč");
    assert!(enriched.description.starts_with("Prodám vůz"));
    assert!(enricher.is_complete(&enriched));
}

#[tokio::test]
async fn test_slow_detail_page_leaves_candidate_unchanged() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/inzerat/3/auto.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("276 01", "Mělník", "99 000 Kč"))
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&mock_server)
        .await;

    let enricher = DetailEnricher::new(fetcher()).with_timeout(Duration::from_millis(100));
    let original = candidate(&mock_server, 3);
    let enriched = enricher.enrich(original.clone()).await;

    assert_eq!(enriched, original);
}

#[tokio::test]
async fn test_complete_candidates_are_not_fetched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/inzerat/1/auto.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(
            "110 00",
            "Praha",
            "1 Kč",
        )))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/inzerat/2/auto.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(
            "301 00",
            "Plzeň",
            "45 000 Kč",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut complete = candidate(&mock_server, 1);
    complete.raw_price = "120 000 Kč".to_string();
    complete.raw_location = "Praha 110 00".to_string();
    complete.thumbnail_url = format!("{}/img/1.jpg", mock_server.uri());

    let enricher = DetailEnricher::new(fetcher()).with_concurrency(2);
    let enriched = enricher
        .enrich_all(vec![complete.clone(), candidate(&mock_server, 2)])
        .await;

    assert_eq!(enriched[0], complete);
    assert_eq!(enriched[1].raw_price, "45 000 Kč");
    assert_eq!(enriched[1].raw_location, "Plzeň");
    assert_eq!(enriched[1].postal_code.as_deref(), Some("30100"));
}
