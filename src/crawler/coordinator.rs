//! Crawl driver - main crawl orchestration logic
//!
//! This module contains the crawl loop that sequences, for each dequeued URL:
//! - Fetching and parsing through the page processor
//! - Link planning against the frontier
//! - Indexing title and body text
//! - One transactional storage write
//! - Enqueueing the newly discovered links
//!
//! The loop is strictly sequential: one page is fully stored before the next
//! one is fetched.

use crate::config::{Config, FetcherKind};
use crate::crawler::browser::launch_headless;
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::frontier::{Frontier, NextUrl};
use crate::crawler::graph::plan_links;
use crate::crawler::processor::{process_page, ProcessedPage};
use crate::index::{IndexingPipeline, PorterStemmer, StopWords};
use crate::storage::{NewPage, PageVisit, SqliteStorage, Storage};
use crate::url::canonicalize;
use crate::SpideyError;
use std::path::Path;

/// Outcome counters of a finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Pages stored
    pub pages_visited: usize,

    /// Pages skipped because their fetch failed
    pub fetch_failures: usize,

    /// Outbound links dropped as malformed
    pub links_dropped: usize,
}

/// One crawl run: frontier, store, fetcher and indexer
pub struct CrawlSession {
    config: Config,
    frontier: Frontier,
    storage: SqliteStorage,
    fetcher: Box<dyn Fetcher>,
    pipeline: IndexingPipeline,
    report: CrawlReport,
}

impl CrawlSession {
    /// Creates a session from explicit collaborators
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `seed` - The URL the crawl starts from
    /// * `target` - Number of pages to visit
    /// * `storage` - An empty store
    /// * `fetcher` - The fetcher used to render pages
    /// * `pipeline` - The indexing pipeline
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSession)` - Ready to run
    /// * `Err(SpideyError::Url)` - The seed URL is malformed
    pub fn new(
        config: Config,
        seed: &str,
        target: usize,
        storage: SqliteStorage,
        fetcher: Box<dyn Fetcher>,
        pipeline: IndexingPipeline,
    ) -> Result<Self, SpideyError> {
        let mut frontier = Frontier::new(target);
        frontier.enqueue(seed, None)?;

        Ok(Self {
            config,
            frontier,
            storage,
            fetcher,
            pipeline,
            report: CrawlReport::default(),
        })
    }

    /// Creates a session with a freshly created store and the configured
    /// fetcher and stopwords
    ///
    /// Any store already at the configured database path is discarded, but
    /// only once the seed, the stopwords and the fetcher are all usable.
    pub async fn open(config: Config, seed: &str, target: usize) -> Result<Self, SpideyError> {
        canonicalize(seed)?;
        let pipeline = build_pipeline(&config)?;
        let mut fetcher = create_fetcher(&config).await?;

        let storage = match SqliteStorage::create_fresh(Path::new(&config.output.database_path)) {
            Ok(storage) => storage,
            Err(e) => {
                fetcher.close().await;
                return Err(e);
            }
        };

        Self::new(config, seed, target, storage, fetcher, pipeline)
    }

    /// Runs the crawl loop until the target is reached
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Exactly `target` pages were stored
    /// * `Err(SpideyError::FrontierExhausted)` - The queue ran dry first; pages
    ///   stored so far stay in the store
    /// * `Err(SpideyError)` - A storage failure stopped the run
    pub async fn run(&mut self) -> Result<CrawlReport, SpideyError> {
        tracing::info!(
            "Starting crawl for {} pages using the {:?} fetcher",
            self.frontier.target(),
            self.config.crawler.fetcher
        );

        while !self.frontier.is_complete() {
            let Some(next) = self.frontier.next_unvisited() else {
                tracing::error!(
                    "Frontier exhausted after {} of {} pages",
                    self.frontier.visited_count(),
                    self.frontier.target()
                );
                return Err(SpideyError::FrontierExhausted {
                    visited: self.frontier.visited_count(),
                    target: self.frontier.target(),
                });
            };

            self.visit(next).await?;
        }

        tracing::info!(
            "Crawl completed: {} pages stored, {} fetch failures, {} links dropped",
            self.report.pages_visited,
            self.report.fetch_failures,
            self.report.links_dropped
        );

        Ok(self.report.clone())
    }

    /// Processes a single URL
    ///
    /// A fetch failure is logged and absorbed; nothing is written for the URL.
    async fn visit(&mut self, next: NextUrl) -> Result<(), SpideyError> {
        tracing::debug!("Processing URL: {}", next.url);

        let page = match process_page(self.fetcher.as_ref(), &next.url, &self.config.crawler).await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Skipping {} ({}): {}", next.url, e.kind(), e);
                self.frontier.mark_failed(&next.url);
                self.report.fetch_failures += 1;
                return Ok(());
            }
        };

        let plan = plan_links(&page.url, &page.links, &self.frontier);
        let index = self.pipeline.index(&page.title, &page.text);
        let url = page.url.clone();

        let visit = PageVisit {
            page: new_page(page),
            parents: next.parents,
            children: plan.children.clone(),
            index,
        };
        let page_id = self.storage.record_page(&visit)?;

        self.frontier.mark_visited(&url, page_id);
        let revisits = plan.revisited().count();
        for link in plan.to_enqueue {
            self.frontier.enqueue_canonical(link, Some(page_id));
        }

        self.report.pages_visited += 1;
        self.report.links_dropped += plan.dropped;

        tracing::info!(
            "Visited {} ({} links, {} to visited pages). Remaining pages to scrape: {}",
            url,
            visit.children.len(),
            revisits,
            self.frontier.remaining()
        );

        Ok(())
    }

    /// Releases the fetcher
    pub async fn close(&mut self) {
        self.fetcher.close().await;
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn report(&self) -> &CrawlReport {
        &self.report
    }
}

fn new_page(page: ProcessedPage) -> NewPage {
    NewPage {
        url: page.url.to_string(),
        title: page.title,
        content: page.text,
        raw_html: page.raw_html,
        last_modified: page.last_modified,
        size: page.size,
        hash: page.hash,
    }
}

/// Builds the fetcher selected in the configuration
///
/// # Returns
///
/// * `Ok(Box<dyn Fetcher>)` - Fetcher ready to use
/// * `Err(SpideyError::UnsupportedPlatform)` - The headless browser could not
///   be resolved
pub async fn create_fetcher(config: &Config) -> Result<Box<dyn Fetcher>, SpideyError> {
    match config.crawler.fetcher {
        FetcherKind::Http => Ok(Box::new(HttpFetcher::new(config)?)),
        FetcherKind::Headless => launch_headless(config).await,
    }
}

/// Builds the indexing pipeline with the configured stopword list
pub fn build_pipeline(config: &Config) -> Result<IndexingPipeline, SpideyError> {
    let stopwords = match &config.index.stopwords_path {
        Some(path) => {
            let stopwords = StopWords::from_file(Path::new(path))?;
            tracing::info!("Loaded {} stopwords from {}", stopwords.len(), path);
            stopwords
        }
        None => StopWords::english(),
    };
    Ok(IndexingPipeline::new(stopwords, Box::new(PorterStemmer::new())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::{FetchError, RenderedPage};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use url::Url;

    /// Serves pages from a map; unknown URLs fail navigation
    struct MapFetcher {
        pages: HashMap<String, String>,
    }

    impl MapFetcher {
        fn new(pages: &[(&str, &str)]) -> Box<dyn Fetcher> {
            Box::new(Self {
                pages: pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.to_string()))
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl Fetcher for MapFetcher {
        async fn render(&self, url: &Url) -> Result<RenderedPage, FetchError> {
            match self.pages.get(url.as_str()) {
                Some(html) => Ok(RenderedPage {
                    final_url: url.clone(),
                    html: html.clone(),
                    timestamp_hints: vec![],
                }),
                None => Err(FetchError::Navigation {
                    url: url.to_string(),
                    message: "HTTP 404 Not Found".to_string(),
                }),
            }
        }
    }

    fn create_test_session(
        seed: &str,
        target: usize,
        pages: &[(&str, &str)],
    ) -> CrawlSession {
        CrawlSession::new(
            Config::default(),
            seed,
            target,
            SqliteStorage::new_in_memory().unwrap(),
            MapFetcher::new(pages),
            IndexingPipeline::english(),
        )
        .unwrap()
    }

    fn page_id(session: &CrawlSession, url: &str) -> i64 {
        session
            .storage()
            .get_page_by_url(url)
            .unwrap()
            .unwrap()
            .page_id
    }

    #[tokio::test]
    async fn test_stops_at_target() {
        let mut session = create_test_session(
            "https://site.test/",
            2,
            &[
                ("https://site.test/", r#"<a href="/a">A</a><a href="/b">B</a>"#),
                ("https://site.test/a", "<p>a</p>"),
                ("https://site.test/b", "<p>b</p>"),
            ],
        );

        let report = session.run().await.unwrap();

        assert_eq!(report.pages_visited, 2);
        assert_eq!(session.storage().count_pages().unwrap(), 2);
        assert!(session.storage().get_page_by_url("https://site.test/b").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revisit_through_queue_records_both_parents() {
        let mut session = create_test_session(
            "https://site.test/",
            3,
            &[
                ("https://site.test/", r#"<a href="/b">B</a><a href="/c">C</a>"#),
                ("https://site.test/b", r#"<a href="/c">C again</a>"#),
                ("https://site.test/c", "<p>leaf</p>"),
            ],
        );

        session.run().await.unwrap();

        let s = page_id(&session, "https://site.test/");
        let b = page_id(&session, "https://site.test/b");
        let c = page_id(&session, "https://site.test/c");
        assert_eq!(session.storage().get_parents(c).unwrap(), vec![s, b]);
        assert_eq!(session.storage().get_page(c).unwrap().parent_page_id, Some(s));
        assert_eq!(session.storage().count_pages().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_revisit_after_visit_records_both_parents() {
        let mut session = create_test_session(
            "https://site.test/",
            3,
            &[
                ("https://site.test/", r#"<a href="/c">C</a><a href="/b">B</a>"#),
                ("https://site.test/b", r#"<a href="/c">C again</a>"#),
                ("https://site.test/c", "<p>leaf</p>"),
            ],
        );

        session.run().await.unwrap();

        let s = page_id(&session, "https://site.test/");
        let b = page_id(&session, "https://site.test/b");
        let c = page_id(&session, "https://site.test/c");
        assert_eq!(session.storage().get_parents(c).unwrap(), vec![s, b]);

        let b_links = session.storage().get_child_links(b).unwrap();
        assert_eq!(b_links.len(), 1);
        assert_eq!(b_links[0].child_page_id, Some(c));
    }

    #[tokio::test]
    async fn test_exhaustion_is_fatal() {
        let mut session = create_test_session(
            "https://site.test/",
            5,
            &[("https://site.test/", "<p>no links here</p>")],
        );

        let result = session.run().await;

        assert!(matches!(
            result,
            Err(SpideyError::FrontierExhausted {
                visited: 1,
                target: 5
            })
        ));
        assert_eq!(session.storage().count_pages().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_page() {
        let mut session = create_test_session(
            "https://site.test/",
            2,
            &[
                (
                    "https://site.test/",
                    r#"<a href="/broken">X</a><a href="/ok">Y</a>"#,
                ),
                ("https://site.test/ok", "<p>fine</p>"),
            ],
        );

        let report = session.run().await.unwrap();

        assert_eq!(report.pages_visited, 2);
        assert_eq!(report.fetch_failures, 1);
        assert!(session
            .storage()
            .get_page_by_url("https://site.test/broken")
            .unwrap()
            .is_none());

        let seed = page_id(&session, "https://site.test/");
        let links = session.storage().get_child_links(seed).unwrap();
        assert_eq!(links[0].child_page_id, None);
        assert!(links[1].child_page_id.is_some());
    }

    #[tokio::test]
    async fn test_failed_seed_exhausts() {
        let mut session = create_test_session("https://site.test/", 1, &[]);
        let result = session.run().await;

        assert!(matches!(
            result,
            Err(SpideyError::FrontierExhausted { visited: 0, .. })
        ));
        assert_eq!(session.report().fetch_failures, 1);
    }

    #[tokio::test]
    async fn test_self_link_not_a_parent() {
        let mut session = create_test_session(
            "https://site.test/",
            1,
            &[("https://site.test/", r#"<a href="/">Home</a>"#)],
        );

        session.run().await.unwrap();

        let s = page_id(&session, "https://site.test/");
        assert!(session.storage().get_parents(s).unwrap().is_empty());
        assert_eq!(
            session.storage().get_child_links(s).unwrap()[0].child_page_id,
            Some(s)
        );
    }

    #[tokio::test]
    async fn test_pages_are_indexed() {
        let mut session = create_test_session(
            "https://site.test/",
            1,
            &[(
                "https://site.test/",
                "<title>Spiders</title><p>spiders spin webs</p>",
            )],
        );

        session.run().await.unwrap();

        let s = page_id(&session, "https://site.test/");
        let postings = session.storage().find_postings("spider").unwrap();
        assert_eq!(postings.title, vec![s]);
        assert_eq!(postings.content, vec![s]);
    }

    #[test]
    fn test_malformed_seed_rejected() {
        let result = CrawlSession::new(
            Config::default(),
            "not a url",
            1,
            SqliteStorage::new_in_memory().unwrap(),
            MapFetcher::new(&[]),
            IndexingPipeline::english(),
        );
        assert!(matches!(result, Err(SpideyError::Url(_))));
    }

    #[test]
    fn test_build_pipeline_with_missing_stopwords_file() {
        let mut config = Config::default();
        config.index.stopwords_path = Some("/nonexistent/stopwords.txt".to_string());
        assert!(matches!(build_pipeline(&config), Err(SpideyError::Io(_))));
    }
}
