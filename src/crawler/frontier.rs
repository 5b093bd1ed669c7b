//! Breadth-first crawl frontier
//!
//! This module owns the visited set and the FIFO queue of discovered URLs:
//! - Canonicalization and duplicate suppression at enqueue time
//! - Every discovering parent of a queued URL is remembered
//! - Failed URLs are never queued again
//! - The target page count that ends the crawl

use crate::url::canonicalize;
use crate::UrlError;
use std::collections::{HashMap, HashSet, VecDeque};
use url::Url;

/// What happened to a URL offered to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Newly added to the back of the queue
    Queued,

    /// Already waiting in the queue; the parent was added to its discoverers
    AlreadyQueued,

    /// Already visited under the given page ID
    Visited(i64),

    /// Its fetch failed earlier in this run
    Failed,
}

/// The next URL to visit, with every page that discovered it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextUrl {
    pub url: Url,

    /// Discovering page IDs in discovery order; empty for the seed
    pub parents: Vec<i64>,
}

/// A queued URL waiting for its visit
#[derive(Debug, Clone)]
struct PendingUrl {
    url: Url,
    parents: Vec<i64>,
}

/// Frontier manages the visited set and the pending queue
#[derive(Debug)]
pub struct Frontier {
    /// Canonical URL -> page ID
    visited: HashMap<String, i64>,

    /// Canonical URLs in discovery order
    queue: VecDeque<String>,

    /// Canonical URL -> queued entry
    pending: HashMap<String, PendingUrl>,

    failed: HashSet<String>,

    target: usize,
}

impl Frontier {
    /// Creates an empty frontier that is complete after `target` visits
    pub fn new(target: usize) -> Self {
        Self {
            visited: HashMap::new(),
            queue: VecDeque::new(),
            pending: HashMap::new(),
            failed: HashSet::new(),
            target,
        }
    }

    /// Canonicalizes a URL string and offers it to the queue
    ///
    /// # Arguments
    ///
    /// * `url` - The URL as found on a page
    /// * `parent` - The page that discovered it, `None` for the seed
    ///
    /// # Returns
    ///
    /// * `Ok(EnqueueOutcome)` - How the URL was handled
    /// * `Err(UrlError)` - The URL is malformed and was dropped
    pub fn enqueue(&mut self, url: &str, parent: Option<i64>) -> Result<EnqueueOutcome, UrlError> {
        let canonical = canonicalize(url)?;
        Ok(self.enqueue_canonical(canonical, parent))
    }

    /// Offers an already-canonical URL to the queue
    pub fn enqueue_canonical(&mut self, url: Url, parent: Option<i64>) -> EnqueueOutcome {
        let key = url.as_str();

        if let Some(&page_id) = self.visited.get(key) {
            return EnqueueOutcome::Visited(page_id);
        }

        if self.failed.contains(key) {
            return EnqueueOutcome::Failed;
        }

        if let Some(entry) = self.pending.get_mut(key) {
            if let Some(parent) = parent {
                if !entry.parents.contains(&parent) {
                    entry.parents.push(parent);
                }
            }
            return EnqueueOutcome::AlreadyQueued;
        }

        let key = key.to_string();
        self.queue.push_back(key.clone());
        self.pending.insert(
            key,
            PendingUrl {
                url,
                parents: parent.into_iter().collect(),
            },
        );
        EnqueueOutcome::Queued
    }

    /// Pops queued URLs until one that is not yet visited is found
    ///
    /// Returns `None` when the queue is exhausted.
    pub fn next_unvisited(&mut self) -> Option<NextUrl> {
        while let Some(key) = self.queue.pop_front() {
            let Some(entry) = self.pending.remove(&key) else {
                continue;
            };
            if self.visited.contains_key(&key) {
                tracing::debug!("Skipping already visited URL: {}", key);
                continue;
            }
            return Some(NextUrl {
                url: entry.url,
                parents: entry.parents,
            });
        }
        None
    }

    /// Records a successful visit
    pub fn mark_visited(&mut self, url: &Url, page_id: i64) {
        self.visited.insert(url.as_str().to_string(), page_id);
    }

    /// Records a failed visit; the URL will not be queued again
    pub fn mark_failed(&mut self, url: &Url) {
        self.failed.insert(url.as_str().to_string());
    }

    /// Page ID of a visited canonical URL
    pub fn visited_id(&self, url: &str) -> Option<i64> {
        self.visited.get(url).copied()
    }

    /// True once the target number of pages has been visited
    pub fn is_complete(&self) -> bool {
        self.visited.len() >= self.target
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Pages still needed to reach the target
    pub fn remaining(&self) -> usize {
        self.target.saturating_sub(self.visited.len())
    }

    pub fn queued_count(&self) -> usize {
        self.pending.len()
    }

    pub fn target(&self) -> usize {
        self.target
    }
}
