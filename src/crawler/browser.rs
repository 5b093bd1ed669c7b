//! Headless browser fetcher
//!
//! Renders pages in Chrome/Chromium so that JavaScript-built content is
//! indexed. The browser itself is only linked when the `headless` feature is
//! enabled; without it, asking for the headless fetcher fails at startup with
//! [`SpideyError::UnsupportedPlatform`].

use crate::config::Config;
use crate::crawler::fetcher::Fetcher;
use crate::SpideyError;
use std::path::PathBuf;
use std::process::Command;

/// Find a Chrome/Chromium executable with platform-specific search paths
///
/// `CHROMIUM_PATH` overrides the search. On Unix the `which` command is
/// consulted last.
pub fn find_browser_executable() -> Result<PathBuf, SpideyError> {
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            tracing::info!("Using browser from CHROMIUM_PATH: {}", path.display());
            return Ok(path);
        }
        tracing::warn!(
            "CHROMIUM_PATH points to a non-existent file: {}",
            path.display()
        );
    }

    let paths: &[&str] = if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    if let Some(path) = paths.iter().map(PathBuf::from).find(|p| p.exists()) {
        tracing::info!("Found browser at: {}", path.display());
        return Ok(path);
    }

    if !cfg!(target_os = "windows") {
        for cmd in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
            let Ok(output) = Command::new("which").arg(cmd).output() else {
                continue;
            };
            if output.status.success() {
                let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !found.is_empty() {
                    tracing::info!("Found browser using 'which': {}", found);
                    return Ok(PathBuf::from(found));
                }
            }
        }
    }

    Err(SpideyError::UnsupportedPlatform(
        "no Chrome/Chromium executable found; set CHROMIUM_PATH".to_string(),
    ))
}

/// Starts the headless fetcher
#[cfg(feature = "headless")]
pub async fn launch_headless(config: &Config) -> Result<Box<dyn Fetcher>, SpideyError> {
    Ok(Box::new(HeadlessFetcher::launch(config).await?))
}

/// Starts the headless fetcher
#[cfg(not(feature = "headless"))]
pub async fn launch_headless(_config: &Config) -> Result<Box<dyn Fetcher>, SpideyError> {
    Err(SpideyError::UnsupportedPlatform(
        "this build has no browser support; rebuild with --features headless".to_string(),
    ))
}

#[cfg(feature = "headless")]
pub use headless::HeadlessFetcher;

#[cfg(feature = "headless")]
mod headless {
    use super::find_browser_executable;
    use crate::config::Config;
    use crate::crawler::fetcher::{FetchError, Fetcher, RenderedPage};
    use crate::SpideyError;
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::error::CdpError;
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::task::JoinHandle;
    use url::Url;

    /// Scripts evaluated for last-modified hints, in preference order
    const TIMESTAMP_SCRIPTS: &[&str] = &["document.lastModified", "document.date"];

    /// Chrome-backed fetcher
    pub struct HeadlessFetcher {
        browser: Browser,
        handler: JoinHandle<()>,
        timeout: Duration,
    }

    impl HeadlessFetcher {
        /// Finds and launches a browser
        ///
        /// # Returns
        ///
        /// * `Ok(HeadlessFetcher)` - Browser running and ready
        /// * `Err(SpideyError::UnsupportedPlatform)` - No browser could be started
        pub async fn launch(config: &Config) -> Result<Self, SpideyError> {
            let executable = find_browser_executable()?;
            let timeout = Duration::from_secs(config.crawler.fetch_timeout_secs);

            let browser_config = BrowserConfig::builder()
                .chrome_executable(executable)
                .request_timeout(timeout)
                .arg(format!("--user-agent={}", config.user_agent.header_value()))
                .arg("--no-first-run")
                .arg("--no-default-browser-check")
                .build()
                .map_err(SpideyError::UnsupportedPlatform)?;

            let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
                SpideyError::UnsupportedPlatform(format!("failed to launch browser: {}", e))
            })?;

            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        tracing::trace!("Browser handler error: {}", e);
                    }
                }
                tracing::debug!("Browser handler task completed");
            });

            Ok(Self {
                browser,
                handler,
                timeout,
            })
        }

        async fn navigate(&self, url: &Url) -> Result<RenderedPage, CdpError> {
            let page = self.browser.new_page("about:blank").await?;

            let rendered: Result<RenderedPage, CdpError> = async {
                page.goto(url.as_str()).await?;
                page.wait_for_navigation().await?;
                let html = page.content().await?;

                let final_url = page
                    .url()
                    .await?
                    .and_then(|u| Url::parse(&u).ok())
                    .unwrap_or_else(|| url.clone());

                let mut timestamp_hints = Vec::new();
                for script in TIMESTAMP_SCRIPTS {
                    if let Ok(value) = page.evaluate(*script).await {
                        if let Ok(hint) = value.into_value::<String>() {
                            timestamp_hints.push(hint);
                        }
                    }
                }

                Ok(RenderedPage {
                    final_url,
                    html,
                    timestamp_hints,
                })
            }
            .await;

            if let Err(e) = page.close().await {
                tracing::debug!("Failed to close tab for {}: {}", url, e);
            }
            rendered
        }
    }

    #[async_trait]
    impl Fetcher for HeadlessFetcher {
        async fn render(&self, url: &Url) -> Result<RenderedPage, FetchError> {
            match tokio::time::timeout(self.timeout, self.navigate(url)).await {
                Err(_) => Err(FetchError::Timeout {
                    url: url.to_string(),
                }),
                Ok(Err(CdpError::Timeout)) => Err(FetchError::Timeout {
                    url: url.to_string(),
                }),
                Ok(Err(e)) => {
                    let message = e.to_string();
                    if message.contains("ERR_CERT") || message.contains("ERR_SSL") {
                        Err(FetchError::TlsFailure {
                            url: url.to_string(),
                            message,
                        })
                    } else {
                        Err(FetchError::Navigation {
                            url: url.to_string(),
                            message,
                        })
                    }
                }
                Ok(Ok(page)) => Ok(page),
            }
        }

        async fn close(&mut self) {
            if let Err(e) = self.browser.close().await {
                tracing::warn!("Failed to close browser: {}", e);
            }
            self.handler.abort();
        }
    }
}
