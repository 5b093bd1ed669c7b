//! Inverted index construction
//!
//! Turns page titles and bodies into stems with positions:
//!
//! - [`tokenize`]: lower-cased word tokens
//! - [`StopWords`]: the stopword set loaded once per run
//! - [`Stemmer`]: stopword removal and stemming, [`PorterStemmer`] by default
//! - [`aggregate`]: per-stem position lists in frequency order
//! - [`IndexingPipeline`]: all of the above for a title/body pair

mod pipeline;
mod postings;
mod stemmer;
mod stopwords;
mod tokenizer;

pub use pipeline::{IndexingPipeline, PageIndex};
pub use postings::{aggregate, format_positions, parse_positions, TermPositions};
pub use stemmer::{PorterStemmer, Stemmer};
pub use stopwords::StopWords;
pub use tokenizer::tokenize;
