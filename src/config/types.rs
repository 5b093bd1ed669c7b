use serde::Deserialize;

/// Main configuration structure for Spidey
///
/// Every section has defaults, so an empty file (or no file at all) is a
/// valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

/// Which [`Fetcher`](crate::crawler::Fetcher) renders pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// Plain HTTP GET, suitable for static pages
    #[default]
    Http,
    /// Headless Chrome, for pages that need JavaScript
    Headless,
}

impl std::str::FromStr for FetcherKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "headless" => Ok(Self::Headless),
            other => Err(format!("unknown fetcher '{}', expected http or headless", other)),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of outbound links kept per page
    #[serde(rename = "max-links-per-page", default = "default_max_links")]
    pub max_links_per_page: usize,

    /// Maximum number of anchor elements scanned per page
    #[serde(rename = "max-anchors-scanned", default = "default_max_anchors")]
    pub max_anchors_scanned: usize,

    /// Per-fetch timeout (seconds)
    #[serde(rename = "fetch-timeout-secs", default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Fetcher used to render pages
    #[serde(default)]
    pub fetcher: FetcherKind,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_links_per_page: default_max_links(),
            max_anchors_scanned: default_max_anchors(),
            fetch_timeout_secs: default_fetch_timeout(),
            fetcher: FetcherKind::default(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file (recreated on every crawl)
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Path to the exported markdown report
    #[serde(rename = "report-path", default = "default_report_path")]
    pub report_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            report_path: default_report_path(),
        }
    }
}

/// Indexing configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexConfig {
    /// Stopword file, one word per line; the built-in English list is used when unset
    #[serde(rename = "stopwords-path", default)]
    pub stopwords_path: Option<String>,
}

fn default_max_links() -> usize {
    100
}

fn default_max_anchors() -> usize {
    200
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_crawler_name() -> String {
    "Spidey".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_database_path() -> String {
    "spidey.sqlite".to_string()
}

fn default_report_path() -> String {
    "spidey_report.md".to_string()
}
