// Text extraction: turn an input file into per-page text.
//
// The TextExtractor trait keeps the rest of the pipeline independent of the
// file format. PDFs go through `pdf-extract`; plain text files are read as a
// single page, which is what the tests and small experiments use.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Trait for pulling page text out of a document on disk.
pub trait TextExtractor {
    /// Extract the text of every page, in page order.
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>>;
}

/// PDF extractor backed by the `pdf-extract` crate.
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
        let bytes =
            std::fs::read(path).with_context(|| format!("Cannot read {}", path.display()))?;
        // pdf-extract panics on some malformed inputs instead of returning Err
        let parsed = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(&bytes));
        let pages = match parsed {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => anyhow::bail!("Failed to parse PDF {}: {e}", path.display()),
            Err(_) => anyhow::bail!("PDF parser crashed on {}", path.display()),
        };
        debug!(file = %path.display(), pages = pages.len(), "Extracted PDF text");
        Ok(pages)
    }
}

/// Reads a UTF-8 text file as a one-page document.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        Ok(vec![text])
    }
}

/// Pick an extractor from a file extension. Anything that isn't `.txt`
/// is treated as a PDF.
pub fn extractor_for(path: &Path) -> Box<dyn TextExtractor> {
    let is_text = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
    if is_text {
        Box::new(PlainTextExtractor)
    } else {
        Box::new(PdfTextExtractor)
    }
}

/// Extractor that dispatches on each file's extension.
pub struct AutoExtractor;

impl TextExtractor for AutoExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
        extractor_for(path).extract_pages(path)
    }
}
