//! Statistics generation from crawl database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::storage::Storage;
use crate::SpideyError;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Total number of stored pages
    pub total_pages: u64,

    /// Number of distinct stemmed terms
    pub total_terms: u64,

    pub parent_links: u64,

    /// Total number of recorded outbound links
    pub child_links: u64,

    /// Outbound links whose target page was stored
    pub resolved_child_links: u64,

    pub title_postings: u64,
    pub content_postings: u64,
}

impl CrawlStatistics {
    /// Outbound links whose target was never visited
    pub fn unresolved_child_links(&self) -> u64 {
        self.child_links.saturating_sub(self.resolved_child_links)
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(SpideyError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<CrawlStatistics, SpideyError> {
    let (child_links, resolved_child_links) = storage.count_child_links()?;
    let (title_postings, content_postings) = storage.count_postings()?;

    Ok(CrawlStatistics {
        total_pages: storage.count_pages()?,
        total_terms: storage.count_terms()?,
        parent_links: storage.count_parent_links()?,
        child_links,
        resolved_child_links,
        title_postings,
        content_postings,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Pages:");
    println!("  Stored pages: {}", stats.total_pages);
    println!("  Parent links: {}", stats.parent_links);
    println!();

    println!("Outbound links:");
    println!("  Total: {}", stats.child_links);
    println!("  Resolved: {}", stats.resolved_child_links);
    println!("  Unresolved: {}", stats.unresolved_child_links());
    println!();

    println!("Index:");
    println!("  Distinct terms: {}", stats.total_terms);
    println!("  Title postings: {}", stats.title_postings);
    println!("  Body postings: {}", stats.content_postings);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{PageIndex, TermPositions};
    use crate::storage::{NewPage, OutboundLink, PageVisit, SqliteStorage};

    fn create_test_visit(url: &str, children: &[&str]) -> PageVisit {
        PageVisit {
            page: NewPage {
                url: url.to_string(),
                title: "Title".to_string(),
                content: "body".to_string(),
                raw_html: "<p>body</p>".to_string(),
                last_modified: "Unknown".to_string(),
                size: 11,
                hash: "00".to_string(),
            },
            parents: vec![],
            children: children
                .iter()
                .map(|c| OutboundLink {
                    url: c.to_string(),
                    page_id: None,
                })
                .collect(),
            index: PageIndex {
                title: vec![TermPositions {
                    term: "titl".to_string(),
                    positions: vec![0],
                }],
                body: vec![TermPositions {
                    term: "bodi".to_string(),
                    positions: vec![0],
                }],
            },
        }
    }

    #[test]
    fn test_empty_store() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let stats = load_statistics(&storage).unwrap();
        assert_eq!(stats, CrawlStatistics::default());
    }

    #[test]
    fn test_counts_after_pages() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .record_page(&create_test_visit(
                "https://a.com/",
                &["https://a.com/b", "https://a.com/c"],
            ))
            .unwrap();

        let mut child = create_test_visit("https://a.com/b", &[]);
        child.parents = vec![1];
        storage.record_page(&child).unwrap();

        let stats = load_statistics(&storage).unwrap();
        assert_eq!(stats.total_pages, 2);
        assert_eq!(stats.total_terms, 2);
        assert_eq!(stats.parent_links, 1);
        assert_eq!(stats.child_links, 2);
        assert_eq!(stats.resolved_child_links, 1);
        assert_eq!(stats.unresolved_child_links(), 1);
        assert_eq!(stats.title_postings, 2);
        assert_eq!(stats.content_postings, 2);
    }
}
