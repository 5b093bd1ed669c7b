//! Page fetching
//!
//! This module defines the [`Fetcher`] capability and its plain HTTP
//! realization:
//! - Building HTTP clients with the configured user agent and timeout
//! - GET requests with redirects followed
//! - Timestamp hints from response headers
//! - Error classification into timeout, TLS and navigation failures

use crate::config::Config;
use async_trait::async_trait;
use reqwest::{header, redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that make a single page unavailable
///
/// None of these stop the crawl; the driver moves on to the next URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("TLS failure fetching {url}: {message}")]
    TlsFailure { url: String, message: String },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
}

impl FetchError {
    /// The URL whose fetch failed
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::TlsFailure { url, .. }
            | Self::Navigation { url, .. } => url,
        }
    }

    /// Short classification label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::TlsFailure { .. } => "tls",
            Self::Navigation { .. } => "navigation",
        }
    }
}

/// A rendered page as returned by a fetcher
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// URL after redirects
    pub final_url: Url,

    /// Final markup
    pub html: String,

    /// Last-modified candidates in preference order; blank entries are allowed
    pub timestamp_hints: Vec<String>,
}

/// Renders a URL into its final HTML
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches and renders a single page
    async fn render(&self, url: &Url) -> Result<RenderedPage, FetchError>;

    /// Releases any resources held by the fetcher
    async fn close(&mut self) {}
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration (user agent and timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use spidey::config::Config;
/// use spidey::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.crawler.fetch_timeout_secs);

    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Plain HTTP fetcher for static pages
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher from the crawler configuration
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Wraps an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn render(&self, url: &Url) -> Result<RenderedPage, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Navigation {
                url: url.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let final_url = response.url().clone();
        let timestamp_hints = [header::LAST_MODIFIED, header::DATE]
            .iter()
            .filter_map(|name| response.headers().get(name))
            .filter_map(|value| value.to_str().ok())
            .map(|value| value.trim().to_string())
            .collect();

        let html = response
            .text()
            .await
            .map_err(|e| classify_error(url, e))?;

        Ok(RenderedPage {
            final_url,
            html,
            timestamp_hints,
        })
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    let url = url.to_string();

    if error.is_timeout() {
        return FetchError::Timeout { url };
    }

    let message = error_chain(&error);
    let lowered = message.to_lowercase();
    if lowered.contains("certificate") || lowered.contains("tls") || lowered.contains("handshake")
    {
        FetchError::TlsFailure { url, message }
    } else {
        FetchError::Navigation { url, message }
    }
}

/// Joins an error with all of its sources
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
