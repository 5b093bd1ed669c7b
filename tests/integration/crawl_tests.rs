//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test the full
//! crawl cycle end-to-end, plus a map-backed fetcher for exact link graph
//! shapes.

use async_trait::async_trait;
use spidey::config::{Config, FetcherKind};
use spidey::crawler::{crawl, CrawlSession, FetchError, Fetcher, HttpFetcher, RenderedPage};
use spidey::index::IndexingPipeline;
use spidey::output::{export, generate_report};
use spidey::storage::{SqliteStorage, Storage};
use spidey::SpideyError;
use std::collections::HashMap;
use std::path::Path;
use url::Url;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration storing into the given directory
fn create_test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.fetch_timeout_secs = 2;
    config.output.database_path = dir.join("crawl.sqlite").to_string_lossy().to_string();
    config.output.report_path = dir.join("report.md").to_string_lossy().to_string();
    config
}

fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_response(body))
        .mount(server)
        .await;
}

/// Mounts a three page site: home -> {page1, page2}, page1 -> {page2, home}
async fn create_test_site() -> MockServer {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
        <p>Spiders crawl the web</p>
        <a href="/page1">Page 1</a>
        <a href="/page2">Page 2</a>
        </body></html>"#
            .to_string(),
    )
    .await;

    mount_page(
        &server,
        "/page1",
        r#"<html><head><title>Page One</title></head><body>
        <p>Crawling pages one by one</p>
        <a href="page2">Page 2 again</a>
        <a href="/">Home</a>
        </body></html>"#
            .to_string(),
    )
    .await;

    mount_page(
        &server,
        "/page2",
        "<html><head><title>Page Two</title></head><body><p>A leaf page</p></body></html>"
            .to_string(),
    )
    .await;

    server
}

fn page_id(storage: &dyn Storage, url: &str) -> i64 {
    storage
        .get_page_by_url(url)
        .unwrap()
        .unwrap_or_else(|| panic!("page {} not stored", url))
        .page_id
}

#[tokio::test]
async fn test_full_crawl_http() {
    let server = create_test_site().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    let session = crawl(create_test_config(dir.path()), &base, 3).await.unwrap();
    let storage = session.storage();

    assert_eq!(storage.count_pages().unwrap(), 3);
    assert_eq!(session.report().pages_visited, 3);

    let home = page_id(storage, &format!("{}/", base));
    let page1 = page_id(storage, &format!("{}/page1", base));
    let page2 = page_id(storage, &format!("{}/page2", base));

    assert_eq!(storage.get_page(home).unwrap().title, "Home");
    assert_eq!(storage.get_page(home).unwrap().parent_page_id, None);
    assert_eq!(storage.get_page(page2).unwrap().parent_page_id, Some(home));

    // page2 was discovered by home and again by page1 while still queued
    assert_eq!(storage.get_parents(page2).unwrap(), vec![home, page1]);

    // page1 linking back to home makes it a parent of home
    assert_eq!(storage.get_parents(home).unwrap(), vec![page1]);

    let (links, resolved) = storage.count_child_links().unwrap();
    assert_eq!(links, 4);
    assert_eq!(resolved, 4);
}

#[tokio::test]
async fn test_crawl_indexes_title_and_body() {
    let server = create_test_site().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    let session = crawl(create_test_config(dir.path()), &base, 3).await.unwrap();
    let storage = session.storage();

    let home = page_id(storage, &format!("{}/", base));
    let page1 = page_id(storage, &format!("{}/page1", base));

    // "crawl" and "Crawling" share a stem
    let postings = storage.find_postings("crawl").unwrap();
    assert_eq!(postings.content, vec![home, page1]);
    assert!(postings.title.is_empty());

    let postings = storage.find_postings("page").unwrap();
    assert!(postings.title.contains(&page1));

    // every body term has as many positions as its frequency
    for page in storage.get_pages().unwrap() {
        for term in storage.get_top_terms(page.page_id, 1000).unwrap() {
            let term_id = storage.get_term_id(&term.term).unwrap().unwrap();
            let positions = storage
                .get_content_positions(page.page_id, term_id)
                .unwrap()
                .unwrap();
            assert_eq!(positions.len() as u32, term.frequency);
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }
}

#[tokio::test]
async fn test_http_errors_are_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/missing">Missing</a><a href="/ok">Ok</a>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_page(&server, "/ok", "<p>fine</p>".to_string()).await;

    let dir = tempfile::tempdir().unwrap();
    let session = crawl(create_test_config(dir.path()), &base, 2).await.unwrap();
    let storage = session.storage();

    assert_eq!(session.report().fetch_failures, 1);
    assert_eq!(storage.count_pages().unwrap(), 2);
    assert!(storage
        .get_page_by_url(&format!("{}/missing", base))
        .unwrap()
        .is_none());
    assert_eq!(storage.count_child_links().unwrap(), (2, 1));
}

#[tokio::test]
async fn test_exhaustion_keeps_stored_pages() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", "<p>nothing to follow</p>".to_string()).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let db_path = config.output.database_path.clone();

    let result = crawl(config, &base, 3).await;
    assert!(matches!(
        result,
        Err(SpideyError::FrontierExhausted {
            visited: 1,
            target: 3
        })
    ));

    let storage = SqliteStorage::new(Path::new(&db_path)).unwrap();
    assert_eq!(storage.count_pages().unwrap(), 1);
}

#[tokio::test]
async fn test_existing_database_is_discarded() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", "<p>fresh</p>".to_string()).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    std::fs::write(&config.output.database_path, b"not a database").unwrap();

    let session = crawl(config, &base, 1).await.unwrap();
    assert_eq!(session.storage().count_pages().unwrap(), 1);
}

#[tokio::test]
async fn test_last_modified_header_recorded() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header_exists("user-agent"))
        .respond_with(
            html_response("<p>dated</p>".to_string())
                .insert_header("last-modified", "Tue, 01 Oct 2024 10:00:00 GMT"),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session = crawl(create_test_config(dir.path()), &base, 1).await.unwrap();

    let page = session
        .storage()
        .get_page_by_url(&format!("{}/", base))
        .unwrap()
        .unwrap();
    assert_eq!(page.last_modified, "Tue, 01 Oct 2024 10:00:00 GMT");
    assert_eq!(page.size, "<p>dated</p>".len() as i64);
    assert_eq!(page.hash.len(), 64);
}

#[tokio::test]
async fn test_export_writes_report() {
    let server = create_test_site().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let report_path = config.output.report_path.clone();

    let session = crawl(config, &base, 3).await.unwrap();
    let stats = export(session.storage(), Path::new(&report_path)).unwrap();

    assert_eq!(stats.total_pages, 3);
    let report = std::fs::read_to_string(&report_path).unwrap();
    assert!(report.contains("## Home"));
    assert!(report.contains("## Page One"));
    assert!(report.contains(&format!("- {}/page1", base)));
}

#[cfg(not(feature = "headless"))]
#[tokio::test]
async fn test_startup_failure_keeps_previous_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(dir.path());
    config.crawler.fetcher = FetcherKind::Headless;
    let db_path = config.output.database_path.clone();
    std::fs::write(&db_path, b"previous run").unwrap();

    let result = crawl(config, "https://s.test/", 1).await;

    assert!(matches!(result, Err(SpideyError::UnsupportedPlatform(_))));
    assert_eq!(std::fs::read(&db_path).unwrap(), b"previous run");
}

#[tokio::test]
async fn test_malformed_seed_keeps_previous_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let db_path = config.output.database_path.clone();
    std::fs::write(&db_path, b"previous run").unwrap();

    let result = crawl(config, "not a url", 1).await;

    assert!(matches!(result, Err(SpideyError::Url(_))));
    assert_eq!(std::fs::read(&db_path).unwrap(), b"previous run");
}

/// Serves pages from a map; unknown URLs fail navigation
struct MapFetcher {
    pages: HashMap<String, String>,
}

impl MapFetcher {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, html)| (url.to_string(), html.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl Fetcher for MapFetcher {
    async fn render(&self, url: &Url) -> Result<RenderedPage, FetchError> {
        let html = self
            .pages
            .get(url.as_str())
            .ok_or_else(|| FetchError::Navigation {
                url: url.to_string(),
                message: "HTTP 404 Not Found".to_string(),
            })?;

        Ok(RenderedPage {
            final_url: url.clone(),
            html: html.clone(),
            timestamp_hints: vec![],
        })
    }
}

fn create_map_session(target: usize, pages: &[(&str, &str)]) -> CrawlSession {
    CrawlSession::new(
        Config::default(),
        "https://s.test/",
        target,
        SqliteStorage::new_in_memory().unwrap(),
        Box::new(MapFetcher::new(pages)),
        IndexingPipeline::english(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_page_reached_twice_stored_once() {
    let mut session = create_map_session(
        3,
        &[
            (
                "https://s.test/",
                r#"<a href="/a">A</a><a href="https://s.test/c/">C</a>"#,
            ),
            ("https://s.test/a", r#"<a href="/c#section">C</a>"#),
            ("https://s.test/c", "<title>C</title><p>target</p>"),
        ],
    );

    session.run().await.unwrap();
    let storage = session.storage();

    let s = page_id(storage, "https://s.test/");
    let a = page_id(storage, "https://s.test/a");
    let c = page_id(storage, "https://s.test/c");

    assert_eq!(storage.count_pages().unwrap(), 3);
    assert_eq!(storage.get_parents(c).unwrap(), vec![s, a]);
    assert_eq!(storage.get_page(c).unwrap().parent_page_id, Some(s));
}

#[tokio::test]
async fn test_exhaustion_with_no_links() {
    let mut session = create_map_session(5, &[("https://s.test/", "<p>dead end</p>")]);

    let result = session.run().await;

    assert!(matches!(
        result,
        Err(SpideyError::FrontierExhausted {
            visited: 1,
            target: 5
        })
    ));
    assert!(result.unwrap_err().is_fatal());
    assert_eq!(session.storage().count_pages().unwrap(), 1);
}

#[tokio::test]
async fn test_report_from_map_crawl() {
    let mut session = create_map_session(
        2,
        &[
            ("https://s.test/", r#"<title>Start</title><a href="/b">B</a>"#),
            ("https://s.test/b", "<title>Second</title><p>words words</p>"),
        ],
    );

    session.run().await.unwrap();
    let report = generate_report(session.storage()).unwrap();

    assert!(report.contains("## Start"));
    assert!(report.contains("## Second"));
    assert!(report.contains("- **Keywords**: word 2"));
}

#[tokio::test]
async fn test_http_fetcher_with_session() {
    let server = create_test_site().await;
    let config = Config::default();
    let fetcher = HttpFetcher::new(&config).unwrap();

    let mut session = CrawlSession::new(
        config,
        &server.uri(),
        2,
        SqliteStorage::new_in_memory().unwrap(),
        Box::new(fetcher),
        IndexingPipeline::english(),
    )
    .unwrap();

    let report = session.run().await.unwrap();
    session.close().await;

    assert_eq!(report.pages_visited, 2);
}
