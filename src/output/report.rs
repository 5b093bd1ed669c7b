//! Markdown crawl report
//!
//! One section per stored page, in visit order: title, URL, last-modified
//! timestamp and size, the most frequent body keywords and the first outbound
//! links.

use crate::output::stats::load_statistics;
use crate::storage::{PageRecord, Storage};
use crate::SpideyError;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Number of keywords listed per page
pub const REPORT_KEYWORDS: usize = 10;

/// Number of outbound links listed per page
pub const REPORT_CHILD_LINKS: usize = 10;

/// Writes the markdown report for every stored page
///
/// # Arguments
///
/// * `storage` - The storage backend containing crawl data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(SpideyError)` - Failed to query storage or write the file
pub fn write_report(storage: &dyn Storage, output_path: &Path) -> Result<(), SpideyError> {
    let markdown = generate_report(storage)?;

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    tracing::info!("Report written to {}", output_path.display());
    Ok(())
}

/// Formats the markdown report for every stored page
pub fn generate_report(storage: &dyn Storage) -> Result<String, SpideyError> {
    let stats = load_statistics(storage)?;
    let mut md = String::new();

    md.push_str("# Spidey Crawl Report\n\n");
    md.push_str(&format!(
        "- **Generated**: {}\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!("- **Pages**: {}\n", stats.total_pages));
    md.push_str(&format!("- **Distinct Terms**: {}\n", stats.total_terms));
    md.push_str(&format!(
        "- **Outbound Links**: {} ({} resolved)\n\n",
        stats.child_links, stats.resolved_child_links
    ));

    for page in storage.get_pages()? {
        format_page(storage, &page, &mut md)?;
    }

    Ok(md)
}

fn format_page(storage: &dyn Storage, page: &PageRecord, md: &mut String) -> Result<(), SpideyError> {
    md.push_str(&format!("## {}\n\n", page.title));
    md.push_str(&format!("- **URL**: {}\n", page.url));
    md.push_str(&format!(
        "- **Last Modified**: {}, **Size**: {}\n",
        page.last_modified, page.size
    ));

    let keywords = storage
        .get_top_terms(page.page_id, REPORT_KEYWORDS)?
        .iter()
        .map(|t| format!("{} {}", t.term, t.frequency))
        .collect::<Vec<_>>();
    md.push_str(&format!("- **Keywords**: {}\n", keywords.join("; ")));

    let children = storage.get_child_links(page.page_id)?;
    if !children.is_empty() {
        md.push_str("\n### Child Links\n\n");
        for link in children.iter().take(REPORT_CHILD_LINKS) {
            md.push_str(&format!("- {}\n", link.child_url));
        }
        if children.len() > REPORT_CHILD_LINKS {
            md.push_str(&format!(
                "- ... and {} more\n",
                children.len() - REPORT_CHILD_LINKS
            ));
        }
    }
    md.push('\n');

    Ok(())
}
