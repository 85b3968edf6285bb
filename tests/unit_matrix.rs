// Unit tests for term matrices, weighting and document distances.

use docmine::distance::{cosine_distance, cosine_similarity, euclidean, Metric};
use docmine::matrix::term_matrix::{DocumentTermMatrix, TermBounds, TermDocumentMatrix};
use docmine::matrix::weighting::{weight, Weighting};

fn tokens(docs: &[&str]) -> (Vec<Vec<String>>, Vec<String>) {
    let toks = docs
        .iter()
        .map(|d| d.split_whitespace().map(String::from).collect())
        .collect();
    let names = (0..docs.len()).map(|i| format!("doc{i}.pdf")).collect();
    (toks, names)
}

const DOCS: [&str; 3] = [
    "peace peace peace treaty border",
    "peace treaty treaty refugee",
    "refugee refugee camp border",
];

// ============================================================
// Term-document matrix
// ============================================================

#[test]
fn min_count_bound_applies_to_corpus_total() {
    let (toks, names) = tokens(&DOCS);
    let tdm = TermDocumentMatrix::build(&toks, &names, TermBounds::with_min_count(3)).unwrap();
    // peace 4, treaty 3, refugee 3; border 2 and camp 1 drop out
    assert_eq!(tdm.terms(), ["peace", "refugee", "treaty"]);
    for total in tdm.term_totals() {
        assert!(total >= 3);
    }
}

#[test]
fn global_bound_needs_document_spread() {
    let (toks, names) = tokens(&["genocide genocide genocide genocide genocide", "peace", "peace"]);
    let by_total = TermDocumentMatrix::build(&toks, &names, TermBounds::with_min_count(5)).unwrap();
    assert_eq!(by_total.terms(), ["genocide"]);

    // five occurrences in a single document do not pass a document bound
    let by_docs = TermDocumentMatrix::build(&toks, &names, TermBounds::global(2)).unwrap();
    assert_eq!(by_docs.terms(), ["peace"]);
}

#[test]
fn counts_and_shape() {
    let (toks, names) = tokens(&DOCS);
    let tdm = TermDocumentMatrix::build(&toks, &names, TermBounds::default()).unwrap();
    let peace = tdm.term_index("peace").unwrap();
    assert_eq!(tdm.get(peace, 0), 3);
    assert_eq!(tdm.get(peace, 2), 0);

    let shape = tdm.shape();
    assert_eq!(shape.terms, 5);
    assert_eq!(shape.documents, 3);
    assert_eq!(shape.non_sparse_entries, tdm.nnz());
    assert_eq!(shape.longest_term, "refugee".len());
}

#[test]
fn transpose_agrees_with_direct_build() {
    let (toks, names) = tokens(&DOCS);
    let tdm = TermDocumentMatrix::build(&toks, &names, TermBounds::default()).unwrap();
    let dtm = DocumentTermMatrix::build(&toks, &names, TermBounds::default()).unwrap();
    assert_eq!(tdm.transpose(), dtm);
    assert_eq!(dtm.transpose(), tdm);
}

#[test]
fn frequent_terms_ranked_by_total() {
    let (toks, names) = tokens(&DOCS);
    let tdm = TermDocumentMatrix::build(&toks, &names, TermBounds::default()).unwrap();
    let top = tdm.frequent_terms(2);
    assert_eq!(top[0], ("peace".to_string(), 4));
    assert_eq!(top[1].1, 3);
}

#[test]
fn sparse_term_removal() {
    let (toks, names) = tokens(&DOCS);
    let tdm = TermDocumentMatrix::build(&toks, &names, TermBounds::default()).unwrap();
    // keep terms in more than 3 * (1 - 0.5) = 1.5 documents
    let dense = tdm.remove_sparse_terms(0.5).unwrap();
    assert!(!dense.terms().contains(&"camp".to_string()));
    assert!(dense.terms().contains(&"peace".to_string()));
    assert!(tdm.remove_sparse_terms(1.5).is_err());
}

// ============================================================
// TF-IDF
// ============================================================

#[test]
fn tfidf_matches_hand_computation() {
    let (toks, names) = tokens(&DOCS);
    let dtm = DocumentTermMatrix::build(&toks, &names, TermBounds::default()).unwrap();
    let w = weight(&dtm, Weighting::TfIdf { normalize: true });
    let peace = dtm.terms().iter().position(|t| t == "peace").unwrap();
    // doc0: tf 3/5, peace in 2 of 3 documents
    let expected = 0.6 * (3.0f64 / 2.0).log2();
    assert!((w.row(0)[peace] - expected).abs() < 1e-12);
    assert_eq!(w.row(2)[peace], 0.0);
}

#[test]
fn term_in_every_document_gets_zero_weight() {
    let (toks, names) = tokens(&["war peace", "war treaty", "war border"]);
    let dtm = DocumentTermMatrix::build(&toks, &names, TermBounds::default()).unwrap();
    let w = weight(&dtm, Weighting::default());
    let war = dtm.terms().iter().position(|t| t == "war").unwrap();
    assert!((0..3).all(|d| w.row(d)[war] == 0.0));
}

// ============================================================
// Distances
// ============================================================

#[test]
fn distance_matrices_are_symmetric_with_fixed_diagonal() {
    let (toks, names) = tokens(&DOCS);
    let dtm = DocumentTermMatrix::build(&toks, &names, TermBounds::default()).unwrap();
    let w = weight(&dtm, Weighting::default());

    let e = euclidean(&w);
    let s = cosine_similarity(&w);
    let c = cosine_distance(&w);
    assert_eq!(e.metric, Metric::Euclidean);
    for i in 0..3 {
        assert_eq!(e.get(i, i), 0.0);
        assert_eq!(s.get(i, i), 1.0);
        assert!(c.get(i, i).abs() < 1e-12);
        for j in 0..3 {
            assert!((e.get(i, j) - e.get(j, i)).abs() < 1e-12);
            assert!(e.get(i, j) >= 0.0);
            assert!((-1e-12..=1.0 + 1e-12).contains(&s.get(i, j)));
            assert!((c.get(i, j) - (1.0 - s.get(i, j))).abs() < 1e-12);
        }
    }
}

#[test]
fn documents_sharing_terms_are_closer() {
    let (toks, names) = tokens(&[
        "peace treaty peace",
        "peace treaty treaty",
        "refugee camp refugee",
    ]);
    let dtm = DocumentTermMatrix::build(&toks, &names, TermBounds::default()).unwrap();
    let w = weight(&dtm, Weighting::TermFrequency);
    let s = cosine_similarity(&w);
    assert!(s.get(0, 1) > s.get(0, 2));
    assert_eq!(s.get(0, 2), 0.0);
}
