//! Indexing pipeline
//!
//! Title and body are processed as two independent streams with the same
//! stopword set and stemmer: tokenize, drop stopwords, stem, aggregate.

use crate::index::postings::{aggregate, TermPositions};
use crate::index::stemmer::{PorterStemmer, Stemmer};
use crate::index::stopwords::StopWords;
use crate::index::tokenizer::tokenize;

/// Index data for one page, ready to be written to storage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageIndex {
    /// Title stream; positions only, no frequency table
    pub title: Vec<TermPositions>,

    /// Body stream; the frequency of each entry is its position count
    pub body: Vec<TermPositions>,
}

impl PageIndex {
    /// Every distinct stem across both streams, title first
    pub fn distinct_terms(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.title
            .iter()
            .chain(self.body.iter())
            .map(|t| t.term.as_str())
            .filter(|term| seen.insert(*term))
            .collect()
    }
}

/// Converts page text into index rows
pub struct IndexingPipeline {
    stopwords: StopWords,
    stemmer: Box<dyn Stemmer>,
}

impl IndexingPipeline {
    pub fn new(stopwords: StopWords, stemmer: Box<dyn Stemmer>) -> Self {
        Self { stopwords, stemmer }
    }

    /// Built-in English stopwords with the Porter stemmer
    pub fn english() -> Self {
        Self::new(StopWords::english(), Box::new(PorterStemmer::new()))
    }

    /// Runs tokenize, stopword removal and stemming over one text
    pub fn stems(&self, text: &str) -> Vec<String> {
        let tokens = tokenize(text);
        self.stemmer.stem(&tokens, &self.stopwords)
    }

    /// Builds the title and body postings for a page
    ///
    /// # Arguments
    ///
    /// * `title` - The page title
    /// * `body` - The extracted body text
    ///
    /// # Returns
    ///
    /// A [`PageIndex`] whose positions are offsets into the post-stemming
    /// streams.
    pub fn index(&self, title: &str, body: &str) -> PageIndex {
        let index = PageIndex {
            title: aggregate(&self.stems(title)),
            body: aggregate(&self.stems(body)),
        };
        tracing::trace!(
            "Indexed {} title terms, {} body terms",
            index.title.len(),
            index.body.len()
        );
        index
    }

    pub fn stopwords(&self) -> &StopWords {
        &self.stopwords
    }
}

impl std::fmt::Debug for IndexingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexingPipeline")
            .field("stopwords", &self.stopwords.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Upper-cases tokens and drops stopwords; easy to predict in assertions
    struct UpperStemmer;

    impl Stemmer for UpperStemmer {
        fn stem(&self, tokens: &[String], stopwords: &StopWords) -> Vec<String> {
            tokens
                .iter()
                .filter(|t| !stopwords.contains(t))
                .map(|t| t.to_uppercase())
                .collect()
        }
    }

    fn create_test_pipeline() -> IndexingPipeline {
        IndexingPipeline::new(
            StopWords::from_words(["the", "a"]),
            Box::new(UpperStemmer),
        )
    }

    #[test]
    fn test_positions_are_post_filter_offsets() {
        let pipeline = create_test_pipeline();
        let index = pipeline.index("", "the cat saw a cat");

        assert_eq!(index.body.len(), 2);
        assert_eq!(index.body[0].term, "CAT");
        assert_eq!(index.body[0].positions, vec![0, 2]);
        assert_eq!(index.body[1].term, "SAW");
        assert_eq!(index.body[1].positions, vec![1]);
    }

    #[test]
    fn test_title_and_body_are_independent() {
        let pipeline = create_test_pipeline();
        let index = pipeline.index("Dog Days", "a dog");

        assert_eq!(index.title.len(), 2);
        assert_eq!(index.title[0].term, "DOG");
        assert_eq!(index.title[0].positions, vec![0]);
        assert_eq!(index.body[0].term, "DOG");
        assert_eq!(index.body[0].positions, vec![0]);
        assert_eq!(index.distinct_terms(), vec!["DOG", "DAYS"]);
    }

    #[test]
    fn test_only_stopwords() {
        let pipeline = create_test_pipeline();
        let index = pipeline.index("The", "a the A");
        assert!(index.title.is_empty());
        assert!(index.body.is_empty());
        assert!(index.distinct_terms().is_empty());
    }

    #[test]
    fn test_english_pipeline() {
        let pipeline = IndexingPipeline::english();
        let index = pipeline.index(
            "Crawling the Web",
            "Spiders crawl pages. The crawler crawled many pages.",
        );

        let title_terms: Vec<&str> = index.title.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(title_terms, vec!["crawl", "web"]);

        let crawl = index.body.iter().find(|t| t.term == "crawl").unwrap();
        assert_eq!(crawl.positions, vec![1, 4]);
        for term in &index.body {
            assert_eq!(term.frequency(), term.positions.len());
        }
    }
}
