// Corpus construction: file discovery, text extraction, document collection.

pub mod discovery;
pub mod document;
pub mod extract;
