use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::corpus::discovery::DEFAULT_PATTERN;
use crate::topics::lda::LdaMethod;

/// Central configuration loaded from environment variables.
///
/// Every value has a default, so a bare `docmine run` works against
/// `./reports`. The .env file is loaded automatically at startup via
/// dotenvy, and command-line flags override what is set here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for input documents
    pub pdf_dir: PathBuf,
    /// Regex matched against file names during discovery
    pub pattern: String,
    /// Minimum number of documents a term must appear in
    pub min_doc_count: usize,
    /// Minimum total occurrences for a term to enter the matrix
    pub min_term_count: u32,
    /// Number of LDA topics
    pub topics: usize,
    pub lda_method: LdaMethod,
    pub lda_iterations: usize,
    pub seed: u64,
    /// Where reports and JSON dumps are written
    pub output_dir: PathBuf,
    /// Corpus-specific words to drop on top of the English stopword list
    pub extra_stopwords: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pdf_dir: PathBuf::from("./reports"),
            pattern: DEFAULT_PATTERN.to_string(),
            min_doc_count: 5,
            min_term_count: 1,
            topics: 5,
            lda_method: LdaMethod::Vem,
            lda_iterations: 1000,
            seed: 1234,
            output_dir: PathBuf::from("./output"),
            extra_stopwords: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. `load()` uses the process
    /// environment; tests pass a map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let extra_stopwords = lookup("DOCMINE_EXTRA_STOPWORDS")
            .map(|list| {
                list.split(',')
                    .map(|w| w.trim().to_string())
                    .filter(|w| !w.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let config = Self {
            pdf_dir: lookup("DOCMINE_PDF_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.pdf_dir),
            pattern: lookup("DOCMINE_PATTERN").unwrap_or(defaults.pattern),
            min_doc_count: parse_var(&lookup, "DOCMINE_MIN_DOC_COUNT", defaults.min_doc_count)?,
            min_term_count: parse_var(&lookup, "DOCMINE_MIN_TERM_COUNT", defaults.min_term_count)?,
            topics: parse_var(&lookup, "DOCMINE_TOPICS", defaults.topics)?,
            lda_method: match lookup("DOCMINE_LDA_METHOD") {
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("DOCMINE_LDA_METHOD has an invalid value: '{raw}'"))?,
                None => defaults.lda_method,
            },
            lda_iterations: parse_var(&lookup, "DOCMINE_LDA_ITERATIONS", defaults.lda_iterations)?,
            seed: parse_var(&lookup, "DOCMINE_SEED", defaults.seed)?,
            output_dir: lookup("DOCMINE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            extra_stopwords,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse fine but make no sense.
    pub fn validate(&self) -> Result<()> {
        if self.topics == 0 {
            anyhow::bail!("DOCMINE_TOPICS must be at least 1");
        }
        if self.pattern.trim().is_empty() {
            anyhow::bail!("DOCMINE_PATTERN must not be empty");
        }
        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}
