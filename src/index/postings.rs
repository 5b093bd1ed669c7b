//! Term aggregation and the position-list codec
//!
//! A stem stream is folded into one [`TermPositions`] per distinct stem. The
//! stored form of a position list is the comma-joined decimal offsets, e.g.
//! `"0,4,17"`.

use std::collections::HashMap;
use std::num::ParseIntError;

/// Every zero-based offset at which a stem occurs in one stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermPositions {
    pub term: String,
    pub positions: Vec<u32>,
}

impl TermPositions {
    /// Occurrence count, always equal to the number of positions
    pub fn frequency(&self) -> usize {
        self.positions.len()
    }
}

/// Folds a stem stream into per-stem position lists
///
/// The result is ordered by frequency (highest first), ties broken by the
/// offset of the stem's first occurrence. Positions within each entry are
/// ascending.
///
/// # Example
///
/// ```
/// use spidey::index::aggregate;
///
/// let stems: Vec<String> = ["web", "crawl", "web"].iter().map(|s| s.to_string()).collect();
/// let terms = aggregate(&stems);
/// assert_eq!(terms[0].term, "web");
/// assert_eq!(terms[0].positions, vec![0, 2]);
/// assert_eq!(terms[1].positions, vec![1]);
/// ```
pub fn aggregate(stems: &[String]) -> Vec<TermPositions> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut terms: Vec<TermPositions> = Vec::new();

    for (offset, stem) in stems.iter().enumerate() {
        let position = offset as u32;
        match slots.get(stem.as_str()) {
            Some(&slot) => terms[slot].positions.push(position),
            None => {
                slots.insert(stem.as_str(), terms.len());
                terms.push(TermPositions {
                    term: stem.clone(),
                    positions: vec![position],
                });
            }
        }
    }

    // Stable sort keeps first-occurrence order among equal frequencies
    terms.sort_by(|a, b| b.frequency().cmp(&a.frequency()));
    terms
}

/// Serializes a position list as comma-separated offsets
pub fn format_positions(positions: &[u32]) -> String {
    positions
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses a stored position list
///
/// An empty string yields an empty list.
pub fn parse_positions(stored: &str) -> Result<Vec<u32>, ParseIntError> {
    if stored.trim().is_empty() {
        return Ok(Vec::new());
    }
    stored.split(',').map(|p| p.trim().parse::<u32>()).collect()
}
