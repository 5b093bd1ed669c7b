//! Page processor
//!
//! Turns one dequeued URL into everything that gets stored for it: fetch,
//! parse, content hash, size and last-modified timestamp.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchError, Fetcher, RenderedPage};
use crate::crawler::parser::parse_html;
use sha2::{Digest, Sha256};
use url::Url;

/// Timestamp recorded when no source provides one
pub const UNKNOWN_LAST_MODIFIED: &str = "Unknown";

/// A fetched and parsed page
#[derive(Debug, Clone)]
pub struct ProcessedPage {
    /// The canonical URL the page was dequeued under
    pub url: Url,

    /// URL after redirects, used to resolve relative links
    pub final_url: Url,

    pub title: String,
    pub text: String,
    pub raw_html: String,
    pub last_modified: String,

    /// Character count of the raw markup
    pub size: usize,

    /// Hex SHA-256 of the whitespace-collapsed text
    pub hash: String,

    /// Outbound link candidates, not yet canonicalized
    pub links: Vec<String>,
}

/// Fetches and processes a single page
///
/// # Arguments
///
/// * `fetcher` - The fetcher used to render the page
/// * `url` - The canonical URL to visit
/// * `limits` - Link and anchor caps for the parser
///
/// # Returns
///
/// * `Ok(ProcessedPage)` - The page was rendered and parsed
/// * `Err(FetchError)` - The page could not be rendered; nothing should be
///   stored for it
pub async fn process_page(
    fetcher: &dyn Fetcher,
    url: &Url,
    limits: &CrawlerConfig,
) -> Result<ProcessedPage, FetchError> {
    let rendered = fetcher.render(url).await?;
    Ok(build_page(url.clone(), rendered, limits))
}

/// Builds a processed page from rendered markup
pub fn build_page(url: Url, rendered: RenderedPage, limits: &CrawlerConfig) -> ProcessedPage {
    let parsed = parse_html(&rendered.html, &rendered.final_url, limits);

    let last_modified = rendered
        .timestamp_hints
        .iter()
        .map(|hint| hint.trim())
        .find(|hint| !hint.is_empty())
        .map(str::to_string)
        .or(parsed.last_modified)
        .unwrap_or_else(|| UNKNOWN_LAST_MODIFIED.to_string());

    ProcessedPage {
        url,
        final_url: rendered.final_url,
        title: parsed.title,
        hash: content_hash(&parsed.text),
        text: parsed.text,
        size: rendered.html.chars().count(),
        raw_html: rendered.html,
        last_modified,
        links: parsed.links,
    }
}

/// Hex-encoded SHA-256 of page text
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
