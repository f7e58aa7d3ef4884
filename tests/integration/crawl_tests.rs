//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small wiki-like site and drive the
//! real HTTP fetcher through complete search sessions.

use trawl_rank::config::{CrawlerConfig, FetcherConfig, UserAgentConfig};
use trawl_rank::crawler::{search, FetchError, Fetcher, HttpFetcher, TerminationReason};
use trawl_rank::storage::{IndexStore, LinkStore, SearchLog, SqliteStorage};
use trawl_rank::{compute_authority, hybrid_rerank, RankConfig};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a crawler configuration pointing at the mock server
fn create_crawler_config(base_url: &str, budget: u32) -> CrawlerConfig {
    CrawlerConfig {
        budget,
        search_url: format!("{}/wiki/Special:Search?search={{term}}", base_url),
        content_prefix: "/wiki/".to_string(),
        excluded_prefixes: vec!["/wiki/Special".to_string(), "/wiki/Help".to_string()],
    }
}

/// Creates a fetcher with no pacing and fast retries
fn create_fetcher(max_attempts: u32) -> HttpFetcher {
    let fetcher = FetcherConfig {
        min_request_interval: 0,
        timeout: 5,
        max_attempts,
        retry_backoff: 10,
    };
    let user_agent = UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    };
    HttpFetcher::from_config(&fetcher, &user_agent).expect("Failed to build fetcher")
}

/// Renders a page with some text and titled links
fn page(text: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<li><a href="{}" title="{}">{}</a></li>"#, href, href, href))
        .collect();
    format!(
        "<html><head><title>Test</title></head><body><p>{}</p><ul>{}</ul>\
         <a href=\"/wiki/Help:Contents\" title=\"Help\">Help</a></body></html>",
        text, anchors
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

/// Mounts a search root for `term`
async fn mount_root(server: &MockServer, term: &str, body: String, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/wiki/Special:Search"))
        .and(query_param("search", term))
        .respond_with(html(body))
        .expect(calls)
        .mount(server)
        .await;
}

/// Mounts a content page
async fn mount_page(server: &MockServer, page_path: &str, body: String, calls: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_budget_limits_search() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_root(
        &mock_server,
        "cat",
        page("cat cat cat results", &["/wiki/Cat_food", "/wiki/Dog"]),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/wiki/Cat_food",
        page("cat cat cat cat food", &["/wiki/Kibble"]),
        1,
    )
    .await;
    // Scored below Cat_food and never reached with a budget of two
    mount_page(&mock_server, "/wiki/Dog", page("dog dog dog", &[]), 0).await;
    mount_page(&mock_server, "/wiki/Kibble", page("kibble", &[]), 0).await;

    let config = create_crawler_config(&base_url, 2);
    let mut storage = SqliteStorage::open_in_memory().expect("Failed to open storage");
    let mut fetcher = create_fetcher(1);

    let report = search(&config, "hash", "cat", &mut storage, &mut fetcher)
        .await
        .expect("Search failed");

    assert_eq!(report.termination, TerminationReason::BudgetExhausted);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.fetch_failures, 0);

    let cat_food = format!("{}/wiki/Cat_food", base_url);
    let root = format!("{}/wiki/Special:Search?search=cat", base_url);
    assert_eq!(report.results, vec![(cat_food.clone(), 4), (root.clone(), 3)]);

    // Excluded links are not stored
    let root_links = storage.get_links(&root).unwrap();
    assert_eq!(root_links.len(), 2);
    assert!(root_links.contains(&cat_food));
    assert!(!storage.has_links(&format!("{}/wiki/Dog", base_url)).unwrap());
}

#[tokio::test]
async fn test_failed_fetch_spends_budget() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_root(
        &mock_server,
        "cat",
        page("cat cat cat", &["/wiki/Cat_gone", "/wiki/Dog"]),
        1,
    )
    .await;
    // 404 is not retried even though attempts are allowed
    Mock::given(method("GET"))
        .and(path("/wiki/Cat_gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/wiki/Dog", page("dog", &[]), 1).await;

    let config = create_crawler_config(&base_url, 10);
    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let mut fetcher = create_fetcher(3);

    let report = search(&config, "hash", "cat", &mut storage, &mut fetcher)
        .await
        .unwrap();

    assert_eq!(report.termination, TerminationReason::FrontierEmpty);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.fetch_failures, 1);
    assert!(!storage.has_links(&format!("{}/wiki/Cat_gone", base_url)).unwrap());
}

#[tokio::test]
async fn test_second_search_reuses_crawled_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_root(
        &mock_server,
        "cat",
        page("cat cat cat", &["/wiki/Cat_food", "/wiki/Dog"]),
        1,
    )
    .await;
    mount_root(
        &mock_server,
        "dog",
        page("dog results", &["/wiki/Dog", "/wiki/Cat_food"]),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/wiki/Cat_food",
        page("cat cat cat food", &[]),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/wiki/Dog",
        page("dog dog dog dog", &["/wiki/Cat_food"]),
        1,
    )
    .await;

    let config = create_crawler_config(&base_url, 10);
    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let mut fetcher = create_fetcher(1);

    let first = search(&config, "hash", "cat", &mut storage, &mut fetcher)
        .await
        .unwrap();
    assert_eq!(first.pages_fetched, 3);

    let second = search(&config, "hash", "dog", &mut storage, &mut fetcher)
        .await
        .unwrap();

    // Only the new search root is fetched
    assert_eq!(second.pages_fetched, 1);
    assert_eq!(second.cache_expansions, 2);
    assert_eq!(second.results, vec![(format!("{}/wiki/Dog", base_url), 4)]);

    let history = storage.recent_searches(10).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].term, "dog");
    assert_eq!(history[0].pages_fetched, Some(1));
    assert_eq!(history[1].pages_fetched, Some(3));
    assert!(history.iter().all(|r| r.is_finished()));
}

#[tokio::test]
async fn test_rank_over_crawled_graph() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_root(
        &mock_server,
        "cat",
        page("cat", &["/wiki/Cat", "/wiki/Cat_food"]),
        1,
    )
    .await;
    mount_page(&mock_server, "/wiki/Cat", page("cat cat cat", &["/wiki/Cat_food"]), 1).await;
    mount_page(
        &mock_server,
        "/wiki/Cat_food",
        page("cat cat cat cat cat", &["/wiki/Cat"]),
        1,
    )
    .await;

    let config = create_crawler_config(&base_url, 10);
    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let mut fetcher = create_fetcher(1);

    search(&config, "hash", "cat", &mut storage, &mut fetcher)
        .await
        .unwrap();

    let graph = storage.link_graph().unwrap();
    assert_eq!(graph.len(), 3);

    let authority = compute_authority(&graph, &RankConfig::default());
    let total: f64 = authority.values().sum();
    assert!((total - 1.0).abs() < 1e-6);

    let ranked = storage.ranked_urls_for_word("cat").unwrap();
    assert_eq!(ranked.len(), 2);

    let scores = hybrid_rerank(&authority, &ranked);
    assert_eq!(scores.len(), 2);
    assert!(scores[0].score >= scores[1].score);
    assert!(scores.iter().all(|s| s.score <= 1.0 + 1e-12));
}

#[tokio::test]
async fn test_fetcher_retries_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wiki/Flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/wiki/Flaky", page("finally", &[]), 1).await;

    let mut fetcher = create_fetcher(2);
    let url = Url::parse(&format!("{}/wiki/Flaky", mock_server.uri())).unwrap();

    let fetched = fetcher.fetch(&url).await.expect("Retry should succeed");
    assert!(fetched.body.contains("finally"));
}

#[tokio::test]
async fn test_fetcher_rejects_non_html() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wiki/Logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8, 1, 2], "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut fetcher = create_fetcher(3);
    let url = Url::parse(&format!("{}/wiki/Logo.png", mock_server.uri())).unwrap();

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert!(matches!(err, FetchError::ContentMismatch { .. }));
}
