//! Output module for exporting crawl results
//!
//! This module handles:
//! - Generating the markdown report of stored pages
//! - Recording crawl statistics from the store

pub mod report;
pub mod stats;

pub use report::{generate_report, write_report};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};

use crate::storage::Storage;
use crate::SpideyError;
use std::path::Path;

/// Exports a finished crawl: writes the report file and prints statistics
///
/// # Arguments
///
/// * `storage` - The storage backend containing crawl data
/// * `report_path` - Path where the markdown report should be written
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - The statistics that were printed
/// * `Err(SpideyError)` - Failed to query storage or write the report
pub fn export(storage: &dyn Storage, report_path: &Path) -> Result<CrawlStatistics, SpideyError> {
    write_report(storage, report_path)?;
    let stats = load_statistics(storage)?;
    print_statistics(&stats);
    Ok(stats)
}
