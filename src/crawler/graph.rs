//! Link graph recording
//!
//! Outbound links are recorded as ChildLink rows the moment a page is
//! stored. A link whose target was already visited is resolved immediately
//! and makes the linking page an extra parent of the target; every other link
//! stays unresolved until its target is visited, at which point storage fills
//! in the child page for all rows naming that URL.

use crate::crawler::frontier::Frontier;
use crate::storage::OutboundLink;
use crate::url::canonicalize;
use std::collections::HashSet;
use url::Url;

/// The canonical outbound links of one page
#[derive(Debug, Clone, Default)]
pub struct LinkPlan {
    /// Distinct links in first-seen order, as stored in ChildLink
    pub children: Vec<OutboundLink>,

    /// Links whose target has not been visited yet, to be enqueued
    pub to_enqueue: Vec<Url>,

    /// Links dropped because they could not be canonicalized
    pub dropped: usize,
}

impl LinkPlan {
    /// Page IDs that gain the current page as a parent
    pub fn revisited(&self) -> impl Iterator<Item = i64> + '_ {
        self.children.iter().filter_map(|child| child.page_id)
    }
}

/// Canonicalizes and classifies the links found on a page
///
/// # Arguments
///
/// * `page_url` - Canonical URL of the page the links were found on
/// * `links` - Raw link candidates in document order
/// * `frontier` - The frontier, consulted for already-visited targets
///
/// # Returns
///
/// A [`LinkPlan`]. A link back to the page itself is kept as a child but is
/// never treated as a revisit, so a page never becomes its own parent.
pub fn plan_links(page_url: &Url, links: &[String], frontier: &Frontier) -> LinkPlan {
    let mut plan = LinkPlan::default();
    let mut seen = HashSet::new();

    for link in links {
        let canonical = match canonicalize(link) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Dropping link {} from {}: {}", link, page_url, e);
                plan.dropped += 1;
                continue;
            }
        };

        if !seen.insert(canonical.as_str().to_string()) {
            continue;
        }

        let page_id = if canonical == *page_url {
            None
        } else {
            frontier.visited_id(canonical.as_str())
        };

        plan.children.push(OutboundLink {
            url: canonical.to_string(),
            page_id,
        });

        if page_id.is_none() && canonical != *page_url {
            plan.to_enqueue.push(canonical);
        }
    }

    plan
}
