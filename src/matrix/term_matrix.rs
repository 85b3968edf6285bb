// Sparse term-document and document-term count matrices.
//
// Both orientations hold the same counts; `transpose()` converts between
// them without touching the values. Matrices are built once from normalized
// token lists and are never edited afterwards. Filtering operations such as
// `remove_sparse_terms` return a new matrix.
//
// The vocabulary is sorted alphabetically so that column order does not
// depend on document order.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

/// Global bounds a term must satisfy to enter the vocabulary.
///
/// The document-count pair is the `tm` "global" bound: a term is kept when
/// the number of documents containing it lies in
/// `[min_doc_count, max_doc_count]`. `min_term_count` is an extra filter on
/// total occurrences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermBounds {
    /// Minimum total number of occurrences across the corpus
    pub min_term_count: u32,
    /// Minimum number of documents the term must appear in
    pub min_doc_count: usize,
    /// Maximum number of documents the term may appear in (None = no cap)
    pub max_doc_count: Option<usize>,
}

impl Default for TermBounds {
    fn default() -> Self {
        Self {
            min_term_count: 1,
            min_doc_count: 1,
            max_doc_count: None,
        }
    }
}

impl TermBounds {
    /// Keep terms appearing in at least `min_doc_count` documents.
    pub fn global(min_doc_count: usize) -> Self {
        Self {
            min_doc_count,
            ..Self::default()
        }
    }

    /// Keep terms occurring at least `min_term_count` times in total.
    pub fn with_min_count(min_term_count: u32) -> Self {
        Self {
            min_term_count,
            ..Self::default()
        }
    }

    fn admits(&self, total: u32, doc_count: usize) -> bool {
        total >= self.min_term_count
            && doc_count >= self.min_doc_count
            && self.max_doc_count.map_or(true, |max| doc_count <= max)
    }
}

/// Shape and fill statistics, as printed when inspecting a matrix.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixShape {
    pub terms: usize,
    pub documents: usize,
    pub non_sparse_entries: usize,
    pub sparsity: f64,
    pub longest_term: usize,
}

/// Term-by-document counts. Each row is one term, holding `(doc, count)`
/// pairs sorted by document index with zero counts omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct TermDocumentMatrix {
    terms: Vec<String>,
    docs: Vec<String>,
    rows: Vec<Vec<(usize, u32)>>,
}

/// Document-by-term counts. Each row is one document, holding
/// `(term, count)` pairs sorted by term index.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTermMatrix {
    terms: Vec<String>,
    docs: Vec<String>,
    rows: Vec<Vec<(usize, u32)>>,
}

impl TermDocumentMatrix {
    /// Count tokens per document and keep the terms that satisfy `bounds`.
    pub fn build(docs: &[Vec<String>], names: &[String], bounds: TermBounds) -> Result<Self> {
        if docs.len() != names.len() {
            anyhow::bail!(
                "Got {} token lists but {} document names",
                docs.len(),
                names.len()
            );
        }

        // term -> per-document counts, alphabetically ordered
        let mut counts: BTreeMap<&str, Vec<(usize, u32)>> = BTreeMap::new();
        for (d, tokens) in docs.iter().enumerate() {
            let mut local: HashMap<&str, u32> = HashMap::new();
            for tok in tokens {
                *local.entry(tok.as_str()).or_insert(0) += 1;
            }
            for (term, n) in local {
                counts.entry(term).or_default().push((d, n));
            }
        }

        let candidates = counts.len();
        let mut terms = Vec::new();
        let mut rows = Vec::new();
        for (term, mut row) in counts {
            let total: u32 = row.iter().map(|(_, n)| n).sum();
            if !bounds.admits(total, row.len()) {
                continue;
            }
            row.sort_by_key(|(d, _)| *d);
            terms.push(term.to_string());
            rows.push(row);
        }

        info!(
            terms = terms.len(),
            dropped = candidates - terms.len(),
            documents = docs.len(),
            min_doc_count = bounds.min_doc_count,
            min_term_count = bounds.min_term_count,
            "Built term-document matrix"
        );

        Ok(Self {
            terms,
            docs: names.to_vec(),
            rows,
        })
    }

    /// Build from a dense `counts[term][doc]` table. Rows are reordered so
    /// the vocabulary ends up sorted.
    pub fn from_dense(terms: Vec<String>, docs: Vec<String>, counts: &[Vec<u32>]) -> Result<Self> {
        if counts.len() != terms.len() {
            anyhow::bail!("Expected {} term rows, got {}", terms.len(), counts.len());
        }
        let mut by_term: Vec<(String, &Vec<u32>)> = terms.into_iter().zip(counts).collect();
        by_term.sort_by(|a, b| a.0.cmp(&b.0));

        let mut sorted_terms = Vec::with_capacity(by_term.len());
        let mut rows = Vec::with_capacity(by_term.len());
        for (term, row) in by_term {
            if row.len() != docs.len() {
                anyhow::bail!(
                    "Row for term '{term}' has {} columns, expected {}",
                    row.len(),
                    docs.len()
                );
            }
            rows.push(
                row.iter()
                    .enumerate()
                    .filter(|(_, n)| **n > 0)
                    .map(|(d, n)| (d, *n))
                    .collect(),
            );
            sorted_terms.push(term);
        }
        Ok(Self {
            terms: sorted_terms,
            docs,
            rows,
        })
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn docs(&self) -> &[String] {
        &self.docs
    }

    pub fn nterms(&self) -> usize {
        self.terms.len()
    }

    pub fn ndocs(&self) -> usize {
        self.docs.len()
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.terms.binary_search_by(|t| t.as_str().cmp(term)).ok()
    }

    pub fn get(&self, term: usize, doc: usize) -> u32 {
        self.rows[term]
            .binary_search_by_key(&doc, |(d, _)| *d)
            .map(|i| self.rows[term][i].1)
            .unwrap_or(0)
    }

    /// Non-zero `(doc, count)` entries for one term.
    pub fn row(&self, term: usize) -> &[(usize, u32)] {
        &self.rows[term]
    }

    /// Total occurrences of each term across all documents.
    pub fn term_totals(&self) -> Vec<u32> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|(_, n)| n).sum())
            .collect()
    }

    /// Total (kept) tokens in each document.
    pub fn doc_totals(&self) -> Vec<u32> {
        let mut totals = vec![0u32; self.ndocs()];
        for row in &self.rows {
            for &(d, n) in row {
                totals[d] += n;
            }
        }
        totals
    }

    /// Number of documents each term appears in.
    pub fn doc_frequency(&self) -> Vec<usize> {
        self.rows.iter().map(Vec::len).collect()
    }

    /// Dense count vector of one term across documents.
    pub fn term_vector(&self, term: usize) -> Vec<f64> {
        let mut v = vec![0.0; self.ndocs()];
        for &(d, n) in &self.rows[term] {
            v[d] = n as f64;
        }
        v
    }

    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Share of cells that are zero (0.0 for an empty matrix).
    pub fn sparsity(&self) -> f64 {
        let cells = self.nterms() * self.ndocs();
        if cells == 0 {
            return 0.0;
        }
        1.0 - self.nnz() as f64 / cells as f64
    }

    pub fn shape(&self) -> MatrixShape {
        MatrixShape {
            terms: self.nterms(),
            documents: self.ndocs(),
            non_sparse_entries: self.nnz(),
            sparsity: self.sparsity(),
            longest_term: self.terms.iter().map(|t| t.chars().count()).max().unwrap_or(0),
        }
    }

    /// The `n` most frequent terms with their totals, highest first.
    /// Ties are broken alphabetically.
    pub fn frequent_terms(&self, n: usize) -> Vec<(String, u32)> {
        let mut ranked: Vec<(String, u32)> = self
            .terms
            .iter()
            .cloned()
            .zip(self.term_totals())
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    /// Terms occurring at least `lowfreq` times in total, alphabetical.
    pub fn terms_with_min_count(&self, lowfreq: u32) -> Vec<String> {
        self.terms
            .iter()
            .zip(self.term_totals())
            .filter(|(_, total)| *total >= lowfreq)
            .map(|(t, _)| t.clone())
            .collect()
    }

    /// Drop terms missing from too many documents.
    ///
    /// A term is kept when it appears in more than `ndocs * (1 - sparse)`
    /// documents. `sparse` must lie strictly between 0 and 1.
    pub fn remove_sparse_terms(&self, sparse: f64) -> Result<Self> {
        if !(sparse > 0.0 && sparse < 1.0) {
            anyhow::bail!("Sparsity threshold must be in (0, 1), got {sparse}");
        }
        let floor = self.ndocs() as f64 * (1.0 - sparse);

        let mut terms = Vec::new();
        let mut rows = Vec::new();
        for (term, row) in self.terms.iter().zip(&self.rows) {
            if row.len() as f64 > floor {
                terms.push(term.clone());
                rows.push(row.clone());
            }
        }
        debug!(
            kept = terms.len(),
            removed = self.nterms() - terms.len(),
            sparse,
            "Removed sparse terms"
        );

        Ok(Self {
            terms,
            docs: self.docs.clone(),
            rows,
        })
    }

    /// Terms whose count vectors correlate with `term` at or above
    /// `min_corr` (Pearson, across documents), strongest first.
    ///
    /// Terms with constant counts have no defined correlation and are skipped.
    pub fn associations(&self, term: &str, min_corr: f64) -> Result<Vec<(String, f64)>> {
        let Some(idx) = self.term_index(term) else {
            anyhow::bail!("Term '{term}' is not in the vocabulary");
        };
        let target = self.term_vector(idx);

        let mut found: Vec<(String, f64)> = (0..self.nterms())
            .filter(|&t| t != idx)
            .filter_map(|t| {
                pearson(&target, &self.term_vector(t)).map(|r| (self.terms[t].clone(), r))
            })
            .filter(|(_, r)| *r >= min_corr)
            .collect();

        found.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        Ok(found)
    }

    pub fn transpose(&self) -> DocumentTermMatrix {
        DocumentTermMatrix {
            terms: self.terms.clone(),
            docs: self.docs.clone(),
            rows: flip(&self.rows, self.ndocs()),
        }
    }
}

impl DocumentTermMatrix {
    pub fn build(docs: &[Vec<String>], names: &[String], bounds: TermBounds) -> Result<Self> {
        Ok(TermDocumentMatrix::build(docs, names, bounds)?.transpose())
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn docs(&self) -> &[String] {
        &self.docs
    }

    pub fn nterms(&self) -> usize {
        self.terms.len()
    }

    pub fn ndocs(&self) -> usize {
        self.docs.len()
    }

    pub fn get(&self, doc: usize, term: usize) -> u32 {
        self.rows[doc]
            .binary_search_by_key(&term, |(t, _)| *t)
            .map(|i| self.rows[doc][i].1)
            .unwrap_or(0)
    }

    /// Non-zero `(term, count)` entries for one document.
    pub fn row(&self, doc: usize) -> &[(usize, u32)] {
        &self.rows[doc]
    }

    pub fn doc_totals(&self) -> Vec<u32> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|(_, n)| n).sum())
            .collect()
    }

    /// Dense count vector of one document across the vocabulary.
    pub fn document_vector(&self, doc: usize) -> Vec<f64> {
        let mut v = vec![0.0; self.nterms()];
        for &(t, n) in &self.rows[doc] {
            v[t] = n as f64;
        }
        v
    }

    pub fn transpose(&self) -> TermDocumentMatrix {
        TermDocumentMatrix {
            terms: self.terms.clone(),
            docs: self.docs.clone(),
            rows: flip(&self.rows, self.nterms()),
        }
    }
}

/// Transpose sparse rows. Output rows stay sorted because input rows are
/// visited in index order.
fn flip(rows: &[Vec<(usize, u32)>], ncols: usize) -> Vec<Vec<(usize, u32)>> {
    let mut out = vec![Vec::new(); ncols];
    for (r, row) in rows.iter().enumerate() {
        for &(c, n) in row {
            out[c].push((r, n));
        }
    }
    out
}

fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len() as f64;
    if a.len() < 2 {
        return None;
    }
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }
    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(docs: &[&str]) -> Vec<Vec<String>> {
        docs.iter()
            .map(|d| d.split_whitespace().map(String::from).collect())
            .collect()
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("doc{i}")).collect()
    }

    #[test]
    fn test_build_counts_and_sorted_vocab() {
        let docs = tokens(&["peace peace war", "war treaty"]);
        let tdm = TermDocumentMatrix::build(&docs, &names(2), TermBounds::default()).unwrap();

        assert_eq!(tdm.terms(), &["peace", "treaty", "war"]);
        let peace = tdm.term_index("peace").unwrap();
        let war = tdm.term_index("war").unwrap();
        assert_eq!(tdm.get(peace, 0), 2);
        assert_eq!(tdm.get(peace, 1), 0);
        assert_eq!(tdm.get(war, 1), 1);
        assert_eq!(tdm.doc_totals(), vec![3, 2]);
    }

    #[test]
    fn test_min_term_count_bound() {
        let docs = tokens(&["peace peace war", "war treaty"]);
        let tdm =
            TermDocumentMatrix::build(&docs, &names(2), TermBounds::with_min_count(2)).unwrap();
        assert_eq!(tdm.terms(), &["peace", "war"]);
    }

    #[test]
    fn test_global_bound_counts_documents_not_occurrences() {
        let docs = tokens(&[
            "genocide genocide genocide genocide genocide",
            "peace",
            "peace",
        ]);
        let tdm = TermDocumentMatrix::build(&docs, &names(3), TermBounds::global(2)).unwrap();
        assert_eq!(tdm.terms(), &["peace"]);

        let strict = TermDocumentMatrix::build(&docs, &names(3), TermBounds::global(5)).unwrap();
        assert_eq!(strict.nterms(), 0);
    }

    #[test]
    fn test_doc_count_bounds() {
        let docs = tokens(&["a b c", "a b", "a"]);
        let bounds = TermBounds {
            min_term_count: 1,
            min_doc_count: 2,
            max_doc_count: Some(2),
        };
        let tdm = TermDocumentMatrix::build(&docs, &names(3), bounds).unwrap();
        assert_eq!(tdm.terms(), &["b"]);
    }

    #[test]
    fn test_transpose_round_trip() {
        let docs = tokens(&["x y y", "y z", "z z z"]);
        let tdm = TermDocumentMatrix::build(&docs, &names(3), TermBounds::default()).unwrap();
        let dtm = tdm.transpose();
        for t in 0..tdm.nterms() {
            for d in 0..tdm.ndocs() {
                assert_eq!(tdm.get(t, d), dtm.get(d, t));
            }
        }
        assert_eq!(dtm.transpose(), tdm);
    }

    #[test]
    fn test_frequent_terms_tie_break() {
        let docs = tokens(&["b a c c", "a b"]);
        let tdm = TermDocumentMatrix::build(&docs, &names(2), TermBounds::default()).unwrap();
        let top = tdm.frequent_terms(2);
        assert_eq!(top, vec![("a".to_string(), 2), ("b".to_string(), 2)]);
    }

    #[test]
    fn test_remove_sparse_terms() {
        // "common" in 3/3 docs, "half" in 2/3, "rare" in 1/3
        let docs = tokens(&["common half rare", "common half", "common"]);
        let tdm = TermDocumentMatrix::build(&docs, &names(3), TermBounds::default()).unwrap();
        let dense = tdm.remove_sparse_terms(0.5).unwrap();
        assert_eq!(dense.terms(), &["common", "half"]);
        assert!(tdm.remove_sparse_terms(1.0).is_err());
    }

    #[test]
    fn test_sparsity() {
        let docs = tokens(&["a", "b"]);
        let tdm = TermDocumentMatrix::build(&docs, &names(2), TermBounds::default()).unwrap();
        assert!((tdm.sparsity() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_associations() {
        let counts = vec![vec![1, 2, 3], vec![2, 4, 6], vec![3, 2, 1], vec![5, 5, 5]];
        let terms = vec!["aid".into(), "relief".into(), "war".into(), "flat".into()];
        let tdm = TermDocumentMatrix::from_dense(terms, names(3), &counts).unwrap();

        let assoc = tdm.associations("aid", 0.5).unwrap();
        assert_eq!(assoc.len(), 1);
        assert_eq!(assoc[0].0, "relief");
        assert!((assoc[0].1 - 1.0).abs() < 1e-9);
        assert!(tdm.associations("missing", 0.1).is_err());
    }
}
