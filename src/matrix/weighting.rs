// Term weighting schemes applied to a document-term matrix.
//
// TF-IDF follows the usual text-mining definition:
//
//   tf(t, d)  = count(t, d) / total(d)       (or the raw count when not normalized)
//   idf(t)    = log2(N / df(t))
//   w(t, d)   = tf(t, d) * idf(t)
//
// A term present in every document gets idf 0 and therefore weight 0.
// Weighting returns a fresh dense matrix; the counts are left untouched.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::term_matrix::DocumentTermMatrix;

/// How cell values are derived from raw counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Weighting {
    /// Raw counts
    TermFrequency,
    /// 1 if the term occurs in the document, else 0
    Binary,
    /// Term frequency times inverse document frequency
    TfIdf { normalize: bool },
}

impl Default for Weighting {
    fn default() -> Self {
        Weighting::TfIdf { normalize: true }
    }
}

/// Dense document-by-term matrix of weights.
#[derive(Debug, Clone, Serialize)]
pub struct WeightedMatrix {
    pub docs: Vec<String>,
    pub terms: Vec<String>,
    /// `values[doc][term]`
    pub values: Vec<Vec<f64>>,
    pub weighting: Weighting,
}

impl WeightedMatrix {
    pub fn ndocs(&self) -> usize {
        self.docs.len()
    }

    pub fn nterms(&self) -> usize {
        self.terms.len()
    }

    pub fn row(&self, doc: usize) -> &[f64] {
        &self.values[doc]
    }

    /// Highest-weighted terms of one document, strongest first.
    pub fn top_terms(&self, doc: usize, n: usize) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .terms
            .iter()
            .cloned()
            .zip(self.values[doc].iter().copied())
            .filter(|(_, w)| *w > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}

/// Apply `scheme` to the counts in `dtm`.
pub fn weight(dtm: &DocumentTermMatrix, scheme: Weighting) -> WeightedMatrix {
    let values = match scheme {
        Weighting::TermFrequency => term_frequency_rows(dtm, false),
        Weighting::Binary => (0..dtm.ndocs())
            .map(|d| {
                dtm.document_vector(d)
                    .into_iter()
                    .map(|c| if c > 0.0 { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect(),
        Weighting::TfIdf { normalize } => {
            let idf = inverse_document_frequency(dtm);
            let mut tf = term_frequency_rows(dtm, normalize);
            for row in &mut tf {
                for (w, factor) in row.iter_mut().zip(&idf) {
                    *w *= factor;
                }
            }
            let uninformative = idf.iter().filter(|v| **v == 0.0).count();
            if uninformative > 0 {
                info!(
                    terms = uninformative,
                    "Terms present in every document receive zero TF-IDF weight"
                );
            }
            tf
        }
    };

    WeightedMatrix {
        docs: dtm.docs().to_vec(),
        terms: dtm.terms().to_vec(),
        values,
        weighting: scheme,
    }
}

/// Per-document term frequencies. With `normalize`, each non-empty row is
/// divided by its total so it sums to 1.
pub fn term_frequency_rows(dtm: &DocumentTermMatrix, normalize: bool) -> Vec<Vec<f64>> {
    let totals = dtm.doc_totals();
    (0..dtm.ndocs())
        .map(|d| {
            let mut row = dtm.document_vector(d);
            if normalize {
                if totals[d] == 0 {
                    warn!(document = %dtm.docs()[d], "Document has no terms left after filtering");
                } else {
                    let total = totals[d] as f64;
                    row.iter_mut().for_each(|v| *v /= total);
                }
            }
            row
        })
        .collect()
}

/// `log2(N / df)` for every term.
pub fn inverse_document_frequency(dtm: &DocumentTermMatrix) -> Vec<f64> {
    let n = dtm.ndocs() as f64;
    let mut df = vec![0usize; dtm.nterms()];
    for d in 0..dtm.ndocs() {
        for &(t, _) in dtm.row(d) {
            df[t] += 1;
        }
    }
    df.into_iter()
        .map(|f| if f == 0 { 0.0 } else { (n / f as f64).log2() })
        .collect()
}
