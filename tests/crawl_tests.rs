//! Integration tests for the crawler
//!
//! These tests use wiremock to stand up a mock site and exercise the full
//! crawl cycle end-to-end, checking the persisted JSONL output.

use rockpool::config::{Config, CrawlConfig, FetchConfig, OutputConfig, UserAgentConfig};
use rockpool::crawler::{crawl, run_crawl, StopSignal, Termination};
use rockpool::storage::JsonlStore;
use rockpool::PageRecord;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn test_config(root_url: &str, pages_path: &Path, max_pages: u32, max_depth: u32) -> Config {
    Config {
        crawl: CrawlConfig {
            root_url: root_url.to_string(),
            keywords: vec![],
            max_pages,
            max_depth,
            include_subdomains: false,
        },
        fetch: FetchConfig {
            request_timeout_ms: 2_000,
            politeness_delay_ms: 0,
            max_retries: 1,
            max_body_bytes: 256 * 1024,
            ignore_robots: false,
        },
        user_agent: UserAgentConfig {
            crawler_name: "RockpoolBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/bot".to_string(),
            contact_email: "crawler@example.com".to_string(),
        },
        output: OutputConfig {
            pages_path: pages_path.to_string_lossy().into_owned(),
            database_path: None,
        },
    }
}

/// Mounts an HTML page at the given path
async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body.to_string(), "text/html"),
        )
        .mount(server)
        .await;
}

/// Reads the persisted records back from the JSONL output
fn read_records(pages_path: &Path) -> Vec<PageRecord> {
    JsonlStore::open(pages_path)
        .expect("failed to open store")
        .read_all()
        .expect("failed to read records")
}

#[tokio::test]
async fn test_crawl_depth_one_with_off_domain_link() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let pages_path = out.path().join("pages.jsonl");

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <a href="/one">One</a>
            <a href="/two">Two</a>
            <a href="/three">Three</a>
            <a href="https://elsewhere.invalid/page">Off-domain</a>
        </body></html>"#,
    )
    .await;
    mount_page(&server, "/one", "<html><title>One</title><body>first child</body></html>").await;
    mount_page(&server, "/two", "<html><title>Two</title><body>second child</body></html>").await;
    mount_page(&server, "/three", "<html><title>Three</title><body>third child</body></html>").await;

    let config = test_config(&format!("{}/", server.uri()), &pages_path, 10, 1);
    let report = crawl(config).await.expect("crawl failed");

    // Root plus its three same-domain children, nothing else
    assert_eq!(report.pages_stored, 4);
    assert_eq!(report.termination, Termination::FrontierExhausted);

    let records = read_records(&pages_path);
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].depth, 0);
    assert_eq!(records[0].title, "Home");
    assert!(records[1..].iter().all(|r| r.depth == 1));
    assert!(records.iter().all(|r| !r.url.contains("elsewhere")));
}

#[tokio::test]
async fn test_page_budget_hard_cap() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let pages_path = out.path().join("pages.jsonl");

    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/c1">1</a><a href="/c2">2</a><a href="/c3">3</a>
            <a href="/c4">4</a><a href="/c5">5</a>
        </body></html>"#,
    )
    .await;
    for child in ["/c1", "/c2", "/c3", "/c4", "/c5"] {
        mount_page(&server, child, "<html><body>child</body></html>").await;
    }

    let config = test_config(&format!("{}/", server.uri()), &pages_path, 2, 3);
    let report = crawl(config).await.expect("crawl failed");

    // Exactly two pages in discovery order; the rest of the frontier is
    // discarded without error
    assert_eq!(report.pages_stored, 2);
    assert_eq!(report.termination, Termination::PageBudgetReached);
    assert_eq!(report.frontier_discarded, 4);

    let records = read_records(&pages_path);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].depth, 0);
    assert!(records[1].url.ends_with("/c1"));
}

#[tokio::test]
async fn test_robots_disallow_respected() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let pages_path = out.path().join("pages.jsonl");

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/"),
        )
        .mount(&server)
        .await;

    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/private/staff">Private</a>
            <a href="/public">Public</a>
        </body></html>"#,
    )
    .await;
    mount_page(&server, "/public", "<html><body>open</body></html>").await;

    Mock::given(method("GET"))
        .and(path("/private/staff"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>secret</body></html>", "text/html"),
        )
        .expect(0) // Must never be fetched
        .mount(&server)
        .await;

    let config = test_config(&format!("{}/", server.uri()), &pages_path, 10, 2);
    let report = crawl(config).await.expect("crawl failed");

    assert_eq!(report.pages_stored, 2);
    assert_eq!(report.robots_skipped, 1);

    let records = read_records(&pages_path);
    assert!(records.iter().all(|r| !r.url.contains("/private/")));
}

#[tokio::test]
async fn test_ignore_robots_flag_overrides_disallow() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let pages_path = out.path().join("pages.jsonl");

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .mount(&server)
        .await;

    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/page">Page</a></body></html>"#,
    )
    .await;
    mount_page(&server, "/page", "<html><body>content</body></html>").await;

    let mut config = test_config(&format!("{}/", server.uri()), &pages_path, 10, 1);
    config.fetch.ignore_robots = true;

    let report = crawl(config).await.expect("crawl failed");

    assert_eq!(report.pages_stored, 2);
    assert_eq!(report.robots_skipped, 0);
}

#[tokio::test]
async fn test_depth_limit_stops_chain() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let pages_path = out.path().join("pages.jsonl");

    mount_page(&server, "/", r#"<html><body><a href="/level1">L1</a></body></html>"#).await;
    mount_page(
        &server,
        "/level1",
        r#"<html><body><a href="/level2">L2</a></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/level2",
        r#"<html><body><a href="/level3">L3</a></body></html>"#,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/level3"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>too deep</body></html>", "text/html"),
        )
        .expect(0) // Beyond max_depth, never fetched
        .mount(&server)
        .await;

    let config = test_config(&format!("{}/", server.uri()), &pages_path, 10, 2);
    let report = crawl(config).await.expect("crawl failed");

    assert_eq!(report.pages_stored, 3);
    assert_eq!(report.beyond_depth, 1);

    // Depth recorded per record equals the BFS level of discovery
    let records = read_records(&pages_path);
    let depths: Vec<u32> = records.iter().map(|r| r.depth).collect();
    assert_eq!(depths, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_equivalent_urls_fetched_once() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let pages_path = out.path().join("pages.jsonl");

    // Three spellings of the same resource
    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/a">plain</a>
            <a href="/a/">trailing slash</a>
            <a href="/x/../a">dot segments</a>
        </body></html>"#,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>once</body></html>", "text/html"),
        )
        .expect(1) // Deduped to a single fetch
        .mount(&server)
        .await;

    let config = test_config(&format!("{}/", server.uri()), &pages_path, 10, 1);
    let report = crawl(config).await.expect("crawl failed");

    assert_eq!(report.pages_stored, 2);
    assert_eq!(report.urls_seen, 2);
}

#[tokio::test]
async fn test_timeout_retries_then_continues() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let pages_path = out.path().join("pages.jsonl");

    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/slow">Slow</a>
            <a href="/ok">Ok</a>
        </body></html>"#,
    )
    .await;
    mount_page(&server, "/ok", "<html><body>fine</body></html>").await;

    // Always answers slower than the request timeout
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>late</body></html>", "text/html")
                .set_delay(Duration::from_secs(5)),
        )
        .expect(2) // Initial attempt + 1 retry
        .mount(&server)
        .await;

    let mut config = test_config(&format!("{}/", server.uri()), &pages_path, 10, 1);
    config.fetch.request_timeout_ms = 300;

    let report = crawl(config).await.expect("crawl failed");

    // The slow URL fails after retries; the crawl moves on without hanging
    assert_eq!(report.pages_stored, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.termination, Termination::FrontierExhausted);

    let records = read_records(&pages_path);
    assert!(records.iter().any(|r| r.url.ends_with("/ok")));
    assert!(records.iter().all(|r| !r.url.ends_with("/slow")));
}

#[tokio::test]
async fn test_keyword_priority_spends_budget_first() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let pages_path = out.path().join("pages.jsonl");

    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/about">About us</a>
            <a href="/products">Products</a>
            <a href="/people">Meet the Staff</a>
            <a href="/news">News</a>
        </body></html>"#,
    )
    .await;
    for child in ["/about", "/products", "/people", "/news"] {
        mount_page(&server, child, "<html><body>child</body></html>").await;
    }

    let mut config = test_config(&format!("{}/", server.uri()), &pages_path, 2, 1);
    config.crawl.keywords = vec!["staff".to_string()];

    let report = crawl(config).await.expect("crawl failed");

    assert_eq!(report.pages_stored, 2);

    // The keyword-matched link is promoted within its level and wins the
    // remaining budget slot
    let records = read_records(&pages_path);
    assert!(records[1].url.ends_with("/people"));
}

#[tokio::test]
async fn test_redirect_reaches_target_at_same_depth() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let pages_path = out.path().join("pages.jsonl");

    mount_page(&server, "/", r#"<html><body><a href="/old">Moved</a></body></html>"#).await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&server)
        .await;
    mount_page(&server, "/new", "<html><title>New</title><body>moved here</body></html>").await;

    // max_depth=1: the redirect target must inherit depth 1, not depth 2
    let config = test_config(&format!("{}/", server.uri()), &pages_path, 10, 1);
    let report = crawl(config).await.expect("crawl failed");

    assert_eq!(report.pages_stored, 2);
    assert_eq!(report.redirects_followed, 1);

    let records = read_records(&pages_path);
    let new_record = records.iter().find(|r| r.url.ends_with("/new")).unwrap();
    assert_eq!(new_record.depth, 1);
}

#[tokio::test]
async fn test_non_html_responses_skipped() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let pages_path = out.path().join("pages.jsonl");

    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/report.pdf">Report</a>
            <a href="/page">Page</a>
        </body></html>"#,
    )
    .await;
    mount_page(&server, "/page", "<html><body>html page</body></html>").await;

    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0x25, 0x50, 0x44, 0x46])
                .insert_header("content-type", "application/pdf"),
        )
        .mount(&server)
        .await;

    let config = test_config(&format!("{}/", server.uri()), &pages_path, 10, 1);
    let report = crawl(config).await.expect("crawl failed");

    assert_eq!(report.pages_stored, 2);
    assert_eq!(report.blocked, 1);

    let records = read_records(&pages_path);
    assert!(records.iter().all(|r| !r.url.ends_with(".pdf")));
}

#[tokio::test]
async fn test_output_wire_format() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let pages_path = out.path().join("pages.jsonl");

    mount_page(
        &server,
        "/",
        "<html><head><title>Team</title></head><body>Jane Doe, Director</body></html>",
    )
    .await;

    let config = test_config(&format!("{}/", server.uri()), &pages_path, 10, 1);
    crawl(config).await.expect("crawl failed");

    // One JSON object per line with the exact field set downstream expects
    let content = std::fs::read_to_string(&pages_path).unwrap();
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(lines.len(), 1);

    let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 5);
    assert_eq!(object["depth"], 0);
    assert_eq!(object["title"], "Team");
    assert_eq!(object["text"], "Jane Doe, Director");
    assert!(object["url"].as_str().unwrap().starts_with("http://"));

    // RFC 3339 timestamp
    let fetched_at = object["fetched_at"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(fetched_at).is_ok());
}

#[tokio::test]
async fn test_sqlite_store_mirrors_jsonl() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let pages_path = out.path().join("pages.jsonl");
    let db_path = out.path().join("pages.db");

    mount_page(&server, "/", r#"<html><body><a href="/child">Child</a></body></html>"#).await;
    mount_page(&server, "/child", "<html><body>child text</body></html>").await;

    let mut config = test_config(&format!("{}/", server.uri()), &pages_path, 10, 1);
    config.output.database_path = Some(db_path.to_string_lossy().into_owned());

    let report = crawl(config).await.expect("crawl failed");
    assert_eq!(report.pages_stored, 2);

    // Both backends hold the same pages
    use rockpool::storage::{PageStore, SqliteStore};
    let db = SqliteStore::open(&db_path).expect("failed to open db");
    assert_eq!(db.count().unwrap(), 2);
    assert_eq!(read_records(&pages_path).len(), 2);

    let child_url = format!("{}/child", server.uri());
    let record = db.get_by_url(&child_url).unwrap().expect("child missing");
    assert_eq!(record.depth, 1);
    assert_eq!(record.text, "child text");
}

#[tokio::test]
async fn test_cancellation_between_iterations() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let pages_path = out.path().join("pages.jsonl");

    mount_page(&server, "/", r#"<html><body><a href="/next">Next</a></body></html>"#).await;
    mount_page(&server, "/next", "<html><body>next</body></html>").await;

    let config = test_config(&format!("{}/", server.uri()), &pages_path, 10, 1);
    let stop = StopSignal::new();
    stop.stop();

    let report = run_crawl(config, stop).await.expect("crawl failed");

    // The signal was set before the first iteration: nothing was fetched
    // and nothing partial was written
    assert_eq!(report.termination, Termination::Cancelled);
    assert_eq!(report.pages_stored, 0);
    assert_eq!(read_records(&pages_path).len(), 0);
}
