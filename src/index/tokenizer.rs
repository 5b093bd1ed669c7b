//! Word tokenizer
//!
//! A word is a maximal run of alphanumeric or underscore characters. Tokens
//! are lower-cased and returned in document order.

use regex::Regex;
use std::sync::OnceLock;

fn word_pattern() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    // Constant pattern; compiling it cannot fail
    WORD.get_or_init(|| Regex::new(r"\w+").expect("Invalid word regex"))
}

/// Splits text into lower-cased word tokens
///
/// # Example
///
/// ```
/// use spidey::index::tokenize;
///
/// assert_eq!(tokenize("Hello, World_2!"), vec!["hello", "world_2"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    word_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}
