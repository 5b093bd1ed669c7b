//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP and headless-browser fetching
//! - HTML parsing and link extraction
//! - The breadth-first frontier and link graph planning
//! - Overall crawl coordination

mod browser;
mod coordinator;
mod fetcher;
mod frontier;
mod graph;
mod parser;
mod processor;

#[cfg(feature = "headless")]
pub use browser::HeadlessFetcher;
pub use browser::{find_browser_executable, launch_headless};
pub use coordinator::{build_pipeline, create_fetcher, CrawlReport, CrawlSession};
pub use fetcher::{build_http_client, FetchError, Fetcher, HttpFetcher, RenderedPage};
pub use frontier::{EnqueueOutcome, Frontier, NextUrl};
pub use graph::{plan_links, LinkPlan};
pub use parser::{parse_html, ParsedPage, DEFAULT_TITLE};
pub use processor::{build_page, content_hash, process_page, ProcessedPage, UNKNOWN_LAST_MODIFIED};

use crate::config::Config;
use crate::SpideyError;

/// Runs a complete crawl
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Create a fresh store at the configured database path
/// 2. Start the configured fetcher
/// 3. Visit pages breadth-first from the seed until `target` pages are stored
/// 4. Release the fetcher, whether or not the crawl succeeded
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `seed` - The URL the crawl starts from
/// * `target` - Number of pages to visit
///
/// # Returns
///
/// * `Ok(CrawlSession)` - The finished session, holding the populated store
/// * `Err(SpideyError)` - Crawl failed
pub async fn crawl(config: Config, seed: &str, target: usize) -> Result<CrawlSession, SpideyError> {
    let mut session = CrawlSession::open(config, seed, target).await?;
    let result = session.run().await;
    session.close().await;
    result?;
    Ok(session)
}
