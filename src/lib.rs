//! Spidey: a breadth-first crawler that builds an inverted index
//!
//! This crate crawls up to N distinct pages reachable from a seed URL and
//! records them in a SQLite store together with a parent/child link graph and
//! positional postings for title and body text.

pub mod config;
pub mod crawler;
pub mod index;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Spidey operations
#[derive(Debug, Error)]
pub enum SpideyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Frontier exhausted after visiting {visited} of {target} pages")]
    FrontierExhausted { visited: usize, target: usize },

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpideyError {
    /// Returns true if the whole run has to stop because of this error
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Url(_) | Self::Fetch(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
///
/// Any of these makes a single link unusable; the link is dropped and the
/// crawl carries on.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Spidey operations
pub type Result<T> = std::result::Result<T, SpideyError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlReport, CrawlSession, Fetcher, HttpFetcher};
pub use url::canonicalize;
