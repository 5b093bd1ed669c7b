//! Stemming capability
//!
//! The indexing pipeline only depends on the [`Stemmer`] trait, so tests can
//! substitute deterministic fixtures for the Porter implementation.

use crate::index::StopWords;
use rust_stemmers::Algorithm;

/// Converts a token stream into a stem stream
///
/// Implementations drop stopwords and stem what remains, preserving order.
/// The output is never longer than the input.
pub trait Stemmer: Send + Sync {
    fn stem(&self, tokens: &[String], stopwords: &StopWords) -> Vec<String>;
}

/// Porter-family (Snowball English) stemmer
pub struct PorterStemmer {
    inner: rust_stemmers::Stemmer,
}

impl PorterStemmer {
    pub fn new() -> Self {
        Self {
            inner: rust_stemmers::Stemmer::create(Algorithm::English),
        }
    }
}

impl Default for PorterStemmer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PorterStemmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PorterStemmer")
    }
}

impl Stemmer for PorterStemmer {
    fn stem(&self, tokens: &[String], stopwords: &StopWords) -> Vec<String> {
        tokens
            .iter()
            .filter(|token| !stopwords.contains(token))
            .map(|token| self.inner.stem(token).into_owned())
            .collect()
    }
}
