// Documents and the corpus that holds them.
//
// A corpus is built once from the discovered files and never changes after
// that. Every later stage reads from it through `texts()` or `names()`.

use std::path::PathBuf;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::extract::TextExtractor;
use crate::text::normalize::Normalizer;

/// A single input document, tagged by its source file name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub pages: Vec<String>,
}

impl Document {
    pub fn new(name: impl Into<String>, pages: Vec<String>) -> Self {
        Self {
            name: name.into(),
            pages,
        }
    }

    /// Full text with pages separated by newlines.
    pub fn text(&self) -> String {
        self.pages.join("\n")
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.chars().count()).sum()
    }
}

/// Per-document statistics shown by `docmine inspect`.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    pub pages: usize,
    pub characters: usize,
    pub tokens: usize,
}

/// Ordered, immutable document collection.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Extract every file in `paths` and wrap the results in a corpus.
    ///
    /// The first extraction failure aborts the load.
    pub fn load(paths: &[PathBuf], extractor: &dyn TextExtractor) -> Result<Self> {
        let pb = ProgressBar::new(paths.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  Extracting [{bar:30}] {pos}/{len} {msg}")
                .unwrap(),
        );

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            pb.set_message(name.clone());

            let pages = match extractor.extract_pages(path) {
                Ok(pages) => pages,
                Err(e) => {
                    pb.abandon();
                    return Err(e);
                }
            };
            documents.push(Document::new(name, pages));
            pb.inc(1);
        }
        pb.finish_and_clear();

        let pages: usize = documents.iter().map(Document::page_count).sum();
        info!(documents = documents.len(), pages, "Corpus loaded");

        Ok(Self { documents })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn names(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.name.clone()).collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.documents.iter().map(Document::text).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Run every document through the normalizer.
    pub fn tokenize(&self, normalizer: &Normalizer) -> Vec<Vec<String>> {
        self.documents
            .iter()
            .map(|d| normalizer.normalize(&d.text()))
            .collect()
    }

    pub fn summary(&self, normalizer: &Normalizer) -> Vec<DocumentSummary> {
        self.documents
            .iter()
            .map(|d| DocumentSummary {
                name: d.name.clone(),
                pages: d.page_count(),
                characters: d.char_count(),
                tokens: normalizer.normalize(&d.text()).len(),
            })
            .collect()
    }
}
