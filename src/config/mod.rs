//! Configuration module for Spidey
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The seed URL and target page count always come from the command line; the
//! file only tunes the crawler, the output locations, and the indexer.
//!
//! # Example
//!
//! ```no_run
//! use spidey::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("spidey.toml")).unwrap();
//! println!("Links kept per page: {}", config.crawler.max_links_per_page);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FetcherKind, IndexConfig, OutputConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
