// A fitted topic model and the tables derived from it.
//
// `phi` is the per-topic term distribution (often called beta) and `theta`
// the per-document topic distribution (often called gamma). Both are
// row-normalized. Everything else here is a read-only view over those two
// tables.

use anyhow::Result;
use serde::Serialize;

use crate::matrix::term_matrix::DocumentTermMatrix;

#[derive(Debug, Clone, Serialize)]
pub struct TopicModel {
    pub terms: Vec<String>,
    pub docs: Vec<String>,
    pub alpha: f64,
    pub beta: f64,
    phi: Vec<Vec<f64>>,
    theta: Vec<Vec<f64>>,
    log_likelihood: f64,
    token_count: u64,
}

/// Five-number summary used for box plots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxStats {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl BoxStats {
    /// Summarize `values` using linearly interpolated quantiles.
    /// Returns None for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

fn quantile(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

impl TopicModel {
    pub fn new(
        terms: Vec<String>,
        docs: Vec<String>,
        alpha: f64,
        beta: f64,
        phi: Vec<Vec<f64>>,
        theta: Vec<Vec<f64>>,
        dtm: &DocumentTermMatrix,
    ) -> Self {
        let mut log_likelihood = 0.0;
        let mut token_count = 0u64;
        for (d, theta_d) in theta.iter().enumerate() {
            for &(w, n) in dtm.row(d) {
                let p: f64 = theta_d.iter().zip(&phi).map(|(t, phi_t)| t * phi_t[w]).sum();
                log_likelihood += n as f64 * p.ln();
                token_count += n as u64;
            }
        }

        Self {
            terms,
            docs,
            alpha,
            beta,
            phi,
            theta,
            log_likelihood,
            token_count,
        }
    }

    pub fn topic_count(&self) -> usize {
        self.phi.len()
    }

    /// `phi()[topic][term]`
    pub fn phi(&self) -> &[Vec<f64>] {
        &self.phi
    }

    /// `theta()[doc][topic]`
    pub fn theta(&self) -> &[Vec<f64>] {
        &self.theta
    }

    /// Log-likelihood of the observed counts under the fitted tables.
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// `exp(-log_likelihood / tokens)`; 0.0 when there are no tokens.
    pub fn perplexity(&self) -> f64 {
        if self.token_count == 0 {
            return 0.0;
        }
        (-self.log_likelihood / self.token_count as f64).exp()
    }

    /// The `n` most probable terms of every topic.
    pub fn top_terms(&self, n: usize) -> Vec<Vec<(String, f64)>> {
        self.phi
            .iter()
            .map(|row| {
                let mut ranked: Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
                ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
                ranked
                    .into_iter()
                    .take(n)
                    .map(|(w, p)| (self.terms[w].clone(), p))
                    .collect()
            })
            .collect()
    }

    /// Most probable topic for each document.
    pub fn dominant_topics(&self) -> Vec<usize> {
        self.theta
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (t, &p)| {
                        if p > best.1 {
                            (t, p)
                        } else {
                            best
                        }
                    })
                    .0
            })
            .collect()
    }

    /// Terms that distinguish topic `b` from topic `a`: `log2(phi_b / phi_a)`
    /// for every term where either probability exceeds `min_beta`, ordered
    /// by absolute ratio, largest first.
    pub fn beta_log_ratio(&self, a: usize, b: usize, min_beta: f64) -> Result<Vec<(String, f64)>> {
        let k = self.topic_count();
        if a >= k || b >= k {
            anyhow::bail!("Topic index out of range (model has {k} topics)");
        }
        if a == b {
            anyhow::bail!("Comparing a topic with itself");
        }

        let mut ratios: Vec<(String, f64)> = self
            .terms
            .iter()
            .enumerate()
            .filter(|(w, _)| self.phi[a][*w] > min_beta || self.phi[b][*w] > min_beta)
            .map(|(w, term)| (term.clone(), (self.phi[b][w] / self.phi[a][w]).log2()))
            .collect();
        ratios.sort_by(|x, y| y.1.abs().total_cmp(&x.1.abs()).then_with(|| x.0.cmp(&y.0)));
        Ok(ratios)
    }

    /// Box-plot summary of each topic's probability across documents.
    pub fn gamma_by_topic(&self) -> Vec<BoxStats> {
        (0..self.topic_count())
            .filter_map(|t| {
                let column: Vec<f64> = self.theta.iter().map(|row| row[t]).collect();
                BoxStats::from_values(&column)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::term_matrix::TermDocumentMatrix;

    fn model() -> TopicModel {
        let dtm = TermDocumentMatrix::from_dense(
            vec!["aid".into(), "war".into(), "vote".into()],
            vec!["d0".into(), "d1".into()],
            &[vec![2, 0], vec![0, 3], vec![1, 1]],
        )
        .unwrap()
        .transpose();
        // vocabulary is sorted: aid, vote, war
        TopicModel::new(
            dtm.terms().to_vec(),
            dtm.docs().to_vec(),
            0.1,
            0.01,
            vec![vec![0.7, 0.2, 0.1], vec![0.1, 0.2, 0.7]],
            vec![vec![0.9, 0.1], vec![0.2, 0.8]],
            &dtm,
        )
    }

    #[test]
    fn test_top_terms() {
        let top = model().top_terms(2);
        assert_eq!(top[0][0].0, "aid");
        assert_eq!(top[1][0].0, "war");
        assert_eq!(top[0].len(), 2);
    }

    #[test]
    fn test_dominant_topics() {
        assert_eq!(model().dominant_topics(), vec![0, 1]);
    }

    #[test]
    fn test_beta_log_ratio() {
        let ratios = model().beta_log_ratio(0, 1, 0.15).unwrap();
        // all three terms pass the filter; vote has ratio 0
        assert_eq!(ratios.len(), 3);
        assert!((ratios.last().unwrap().1).abs() < 1e-12);
        let war = ratios.iter().find(|(t, _)| t == "war").unwrap().1;
        assert!((war - 7.0f64.log2()).abs() < 1e-12);
        assert!(model().beta_log_ratio(0, 0, 0.1).is_err());
        assert!(model().beta_log_ratio(0, 5, 0.1).is_err());
    }

    #[test]
    fn test_log_likelihood_and_perplexity() {
        let m = model();
        assert!(m.log_likelihood() < 0.0);
        assert!(m.perplexity() > 1.0);
    }

    #[test]
    fn test_box_stats() {
        let s = BoxStats::from_values(&[4.0, 1.0, 3.0, 2.0, 5.0]).unwrap();
        assert_eq!(s.min, 1.0);
        assert_eq!(s.q1, 2.0);
        assert_eq!(s.median, 3.0);
        assert_eq!(s.q3, 4.0);
        assert_eq!(s.max, 5.0);
        assert!(BoxStats::from_values(&[]).is_none());
    }
}
