//! HTML parser for extracting page content
//!
//! This module handles parsing rendered markup to extract:
//! - The page title
//! - Visible body text
//! - Outbound link candidates
//! - A last-modified timestamp declared in `<meta>` tags

use crate::config::CrawlerConfig;
use scraper::{Html, Node, Selector};
use url::Url;

/// Title used when a page has no usable `<title>`
pub const DEFAULT_TITLE: &str = "No Title Given";

/// Elements whose text never counts as page content
const HIDDEN_ELEMENTS: &[&str] = &["script", "style"];

/// Meta attributes that may carry a modification time, in preference order
const LAST_MODIFIED_META: &[(&str, &str)] = &[
    ("http-equiv", "last-modified"),
    ("name", "last-modified"),
    ("property", "article:modified_time"),
];

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Trimmed `<title>` text, or [`DEFAULT_TITLE`]
    pub title: String,

    /// Whitespace-collapsed visible text
    pub text: String,

    /// Absolute http(s) links in document order, duplicates included
    pub links: Vec<String>,

    /// Modification time declared by the document itself
    pub last_modified: Option<String>,
}

/// Parses HTML content and extracts title, text, links and metadata
///
/// # Link Extraction Rules
///
/// - At most `max_anchors_scanned` `<a href>` elements are looked at, in
///   document order, and at most `max_links_per_page` links are kept
/// - Relative hrefs are resolved against `base_url`
/// - `javascript:`, `mailto:`, `tel:`, `data:` and fragment-only hrefs are
///   skipped, as is anything that does not resolve to http or https
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The base URL for resolving relative links
/// * `limits` - Link and anchor caps
///
/// # Example
///
/// ```
/// use spidey::config::CrawlerConfig;
/// use spidey::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url, &CrawlerConfig::default());
/// assert_eq!(parsed.title, "Test");
/// assert_eq!(parsed.links, vec!["https://example.com/page"]);
/// ```
pub fn parse_html(html: &str, base_url: &Url, limits: &CrawlerConfig) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        text: extract_text(&document),
        links: extract_links(&document, base_url, limits),
        last_modified: extract_last_modified(&document),
    }
}

/// Collapses every whitespace run to a single space and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// Extracts the text of every node outside hidden elements
fn extract_text(document: &Html) -> String {
    let mut text = String::new();

    for node in document.tree.root().descendants() {
        let Node::Text(chunk) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |element| HIDDEN_ELEMENTS.contains(&element.name()))
        });

        if !hidden {
            text.push_str(chunk);
            text.push(' ');
        }
    }

    collapse_whitespace(&text)
}

/// Extracts up to the configured number of valid links
fn extract_links(document: &Html, base_url: &Url, limits: &CrawlerConfig) -> Vec<String> {
    let mut links = Vec::new();

    let Ok(a_selector) = Selector::parse("a") else {
        return links;
    };

    for element in document.select(&a_selector).take(limits.max_anchors_scanned) {
        if links.len() >= limits.max_links_per_page {
            break;
        }

        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_link(href, base_url) {
                links.push(absolute_url);
            }
        }
    }

    links
}

/// Returns the first non-blank modification time declared in `<meta>` tags
fn extract_last_modified(document: &Html) -> Option<String> {
    let selector = Selector::parse("meta[content]").ok()?;
    let metas: Vec<_> = document.select(&selector).collect();

    LAST_MODIFIED_META.iter().find_map(|(attribute, expected)| {
        metas
            .iter()
            .filter(|meta| {
                meta.value()
                    .attr(attribute)
                    .map_or(false, |value| value.trim().eq_ignore_ascii_case(expected))
            })
            .filter_map(|meta| meta.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())
            .map(str::to_string)
    })
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only references
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
