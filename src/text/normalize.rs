// Token normalization for term counting.
//
// Applies the classic text-mining cleanup chain in a fixed order:
//   rejoin line-break hyphenation -> strip punctuation -> lowercase
//   -> drop numbers -> drop stopwords -> stem
//
// Stopwords are removed before stemming so that the stopword list matches
// the surface forms it was written for.

use std::collections::HashSet;

use regex_lite::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use stop_words::{get, LANGUAGE};

/// Configurable normalization pipeline.
#[derive(Debug, Clone)]
pub struct Normalizer {
    pub remove_punctuation: bool,
    pub lowercase: bool,
    pub remove_numbers: bool,
    pub remove_stopwords: bool,
    pub stem: bool,
    /// Tokens shorter than this (in characters, after cleanup) are dropped
    pub min_word_length: usize,
    stopwords: HashSet<String>,
    hyphen_break: Regex,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl Normalizer {
    /// Build a normalizer with every step enabled, using the English
    /// stopword list plus `extra_stopwords`.
    pub fn new(extra_stopwords: &[String]) -> Self {
        let mut stopwords: HashSet<String> = get(LANGUAGE::English).into_iter().collect();
        stopwords.extend(extra_stopwords.iter().map(|w| w.trim().to_lowercase()));
        stopwords.remove("");

        Self {
            remove_punctuation: true,
            lowercase: true,
            remove_numbers: true,
            remove_stopwords: true,
            stem: true,
            min_word_length: 3,
            stopwords,
            // Static pattern; cannot fail to compile.
            hyphen_break: Regex::new(r"([A-Za-z])-[ \t]*\r?\n[ \t]*([A-Za-z])").unwrap(),
        }
    }

    /// A normalizer that only splits on whitespace.
    pub fn passthrough() -> Self {
        Self {
            remove_punctuation: false,
            lowercase: false,
            remove_numbers: false,
            remove_stopwords: false,
            stem: false,
            min_word_length: 1,
            ..Self::default()
        }
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(&word.to_lowercase())
    }

    /// Normalize `text` into an ordered list of tokens.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let joined = self.hyphen_break.replace_all(text, "$1$2");

        let mut cleaned = if self.remove_punctuation {
            strip_punctuation(&joined)
        } else {
            joined.into_owned()
        };

        if self.lowercase {
            cleaned = cleaned.to_lowercase();
        }

        if self.remove_numbers {
            // Any Unicode numeric char, so "٣٤٥" and "CO₂" lose their digits too
            cleaned = cleaned.chars().filter(|c| !c.is_numeric()).collect();
        }

        let stemmer = self.stem.then(|| Stemmer::create(Algorithm::English));

        cleaned
            .split_whitespace()
            .filter(|tok| !(self.remove_stopwords && self.is_stopword(tok)))
            .map(|tok| match &stemmer {
                Some(s) => s.stem(tok).into_owned(),
                None => tok.to_string(),
            })
            .filter(|tok| !tok.is_empty() && tok.chars().count() >= self.min_word_length)
            .collect()
    }
}

/// Remove punctuation and symbol characters. Characters are deleted rather
/// than replaced with spaces, so "co-operation" becomes "cooperation".
fn strip_punctuation(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}
