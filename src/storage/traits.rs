//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{ChildLinkRecord, PageRecord, PageVisit, TermCount, TermPostings};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Term not found: {0}")]
    TermNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The crawl has exactly one writer, so writes take `&mut self` and reads
/// take `&self`.
pub trait Storage {
    // ===== Page Writes =====

    /// Records a freshly visited page and everything derived from it
    ///
    /// All rows for the page are written in a single transaction: the Page
    /// row, its ParentLink rows, its outbound ChildLink rows, resolution of
    /// earlier ChildLink rows pointing at this URL, extra ParentLink rows for
    /// outbound links to already-visited pages, and all term rows.
    ///
    /// # Arguments
    ///
    /// * `visit` - The page, its discoverers, outbound links and index data
    ///
    /// # Returns
    ///
    /// The new page ID
    fn record_page(&mut self, visit: &PageVisit) -> StorageResult<i64>;

    // ===== Page Reads =====

    /// Gets a page by ID
    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord>;

    /// Gets a page by canonical URL
    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Gets every page in visit order
    fn get_pages(&self) -> StorageResult<Vec<PageRecord>>;

    // ===== Link Graph =====

    /// Gets the IDs of every page that discovered the given page
    fn get_parents(&self, page_id: i64) -> StorageResult<Vec<i64>>;

    /// Gets the outbound links recorded for a page, in extraction order
    fn get_child_links(&self, page_id: i64) -> StorageResult<Vec<ChildLinkRecord>>;

    // ===== Terms and Postings =====

    /// Gets the dictionary ID of a stem
    fn get_term_id(&self, term: &str) -> StorageResult<Option<i64>>;

    /// Gets the body occurrence count of a term on a page
    fn get_term_frequency(&self, page_id: i64, term_id: i64) -> StorageResult<Option<u32>>;

    /// Gets the title positions of a term on a page
    fn get_title_positions(&self, page_id: i64, term_id: i64)
        -> StorageResult<Option<Vec<u32>>>;

    /// Gets the body positions of a term on a page
    fn get_content_positions(
        &self,
        page_id: i64,
        term_id: i64,
    ) -> StorageResult<Option<Vec<u32>>>;

    /// Looks up the pages containing a stem in their title and body
    ///
    /// Returns `StorageError::TermNotFound` if the stem was never indexed.
    fn find_postings(&self, term: &str) -> StorageResult<TermPostings>;

    /// Gets the most frequent body terms of a page
    fn get_top_terms(&self, page_id: i64, limit: usize) -> StorageResult<Vec<TermCount>>;

    // ===== Statistics =====

    /// Gets total page count
    fn count_pages(&self) -> StorageResult<u64>;

    /// Gets the size of the term dictionary
    fn count_terms(&self) -> StorageResult<u64>;

    /// Counts ParentLink rows
    fn count_parent_links(&self) -> StorageResult<u64>;

    /// Counts ChildLink rows, returning (total, resolved)
    fn count_child_links(&self) -> StorageResult<(u64, u64)>;

    /// Counts posting rows, returning (title, content)
    fn count_postings(&self) -> StorageResult<(u64, u64)>;
}
