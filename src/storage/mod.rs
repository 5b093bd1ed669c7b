//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Transactional page writes (page row, link graph, postings)
//! - Read-side queries used by the exporter and statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::index::PageIndex;

/// Page content as captured by the page processor
#[derive(Debug, Clone)]
pub struct NewPage {
    pub url: String,
    pub title: String,
    pub content: String,
    pub raw_html: String,
    pub last_modified: String,
    pub size: usize,
    pub hash: String,
}

/// An outbound link, already canonicalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundLink {
    pub url: String,

    /// Set when the target was visited before this page
    pub page_id: Option<i64>,
}

/// Everything written for one visited page
#[derive(Debug, Clone)]
pub struct PageVisit {
    pub page: NewPage,

    /// Pages that discovered this one; the first is the insertion parent.
    /// Empty only for the seed.
    pub parents: Vec<i64>,

    /// Distinct outbound links in extraction order
    pub children: Vec<OutboundLink>,

    pub index: PageIndex,
}

/// Represents a page in the database
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub page_id: i64,
    pub url: String,
    pub title: String,
    pub content: String,
    pub raw_html: String,
    pub last_modified: String,
    pub size: i64,
    pub parent_page_id: Option<i64>,
    pub hash: String,
}

/// Represents an outbound link of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildLinkRecord {
    pub page_id: i64,
    pub child_url: String,
    pub child_page_id: Option<i64>,
}

/// A body term and its frequency on one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermCount {
    pub term: String,
    pub frequency: u32,
}

/// Pages containing a term, in page ID order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermPostings {
    pub term_id: i64,
    pub title: Vec<i64>,
    pub content: Vec<i64>,
}
