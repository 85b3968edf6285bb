// Latent Dirichlet Allocation via collapsed Gibbs sampling.
//
// Each token carries a topic assignment z. One sweep resamples every token
// from its full conditional
//
//   p(z = t | rest) ∝ (n_dt + alpha) * (n_tw + beta) / (n_t + V * beta)
//
// with the token's own assignment removed from the counts. After the last
// sweep the counts are turned into the two probability tables:
//
//   theta[d][t] = (n_dt + alpha) / (N_d + K * alpha)
//   phi[t][w]   = (n_tw + beta)  / (n_t + V * beta)
//
// The sampler is seeded, so the same matrix and parameters always give the
// same model.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::model::TopicModel;
use super::traits::TopicModeler;
use crate::matrix::term_matrix::DocumentTermMatrix;

/// How the topic model is inferred.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LdaMethod {
    /// Variational EM with alpha estimation
    #[default]
    Vem,
    /// Collapsed Gibbs sampling with fixed priors
    Gibbs,
}

impl fmt::Display for LdaMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LdaMethod::Vem => f.write_str("vem"),
            LdaMethod::Gibbs => f.write_str("gibbs"),
        }
    }
}

impl FromStr for LdaMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vem" | "variational" => Ok(LdaMethod::Vem),
            "gibbs" => Ok(LdaMethod::Gibbs),
            other => anyhow::bail!("Unknown LDA method '{other}' (expected vem or gibbs)"),
        }
    }
}

/// Model hyper-parameters shared by both fitters. Fields that only one
/// fitter reads say so.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdaParams {
    pub method: LdaMethod,
    /// Number of topics (K)
    pub topics: usize,
    /// Document-topic Dirichlet prior; None means 50 / K. The starting
    /// value when VEM estimates alpha.
    pub alpha: Option<f64>,
    /// Topic-word Dirichlet prior (Gibbs)
    pub beta: f64,
    /// Gibbs sweeps, or the EM iteration cap
    pub iterations: usize,
    /// Sweeps discarded before the counts are averaged into the estimate (Gibbs)
    pub burn_in: usize,
    pub seed: u64,
    /// Re-estimate alpha in every M-step (VEM)
    pub estimate_alpha: bool,
    /// Relative bound change that stops EM (VEM)
    pub em_tolerance: f64,
    /// Per-document inference iteration cap (VEM)
    pub var_iterations: usize,
    /// Relative bound change that stops per-document inference (VEM)
    pub var_tolerance: f64,
}

impl Default for LdaParams {
    fn default() -> Self {
        Self {
            method: LdaMethod::default(),
            topics: 5,
            alpha: None,
            beta: 0.1,
            iterations: 1000,
            burn_in: 0,
            seed: 1234,
            estimate_alpha: true,
            em_tolerance: 1e-4,
            var_iterations: 500,
            var_tolerance: 1e-6,
        }
    }
}

impl LdaParams {
    pub fn alpha(&self) -> f64 {
        self.alpha.unwrap_or(50.0 / self.topics.max(1) as f64)
    }
}

/// Gibbs-sampled LDA. Implements [`TopicModeler`].
///
/// Ignores `params.method`; [`super::modeler`] picks the fitter.
pub struct GibbsLda {
    pub params: LdaParams,
    /// Show a progress bar while sampling
    pub progress: bool,
}

impl GibbsLda {
    pub fn new(params: LdaParams) -> Self {
        Self {
            params,
            progress: false,
        }
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }
}

impl TopicModeler for GibbsLda {
    fn fit(&self, dtm: &DocumentTermMatrix) -> Result<TopicModel> {
        let k = self.params.topics;
        let v = dtm.nterms();
        if k == 0 {
            anyhow::bail!("LDA needs at least one topic");
        }
        if v == 0 {
            anyhow::bail!("LDA needs a non-empty vocabulary; try a lower minimum term count");
        }
        if self.params.burn_in >= self.params.iterations && self.params.iterations > 0 {
            anyhow::bail!(
                "Burn-in ({}) must be smaller than the iteration count ({})",
                self.params.burn_in,
                self.params.iterations
            );
        }

        let alpha = self.params.alpha();
        let beta = self.params.beta;
        if alpha <= 0.0 || beta <= 0.0 {
            anyhow::bail!("Dirichlet priors must be positive (alpha={alpha}, beta={beta})");
        }

        let mut state = SamplerState::init(dtm, k, self.params.seed);
        info!(
            topics = k,
            terms = v,
            tokens = state.total_tokens(),
            alpha,
            beta,
            iterations = self.params.iterations,
            "Fitting LDA"
        );

        let pb = if self.progress {
            let pb = ProgressBar::new(self.params.iterations as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  Sampling [{bar:30}] {pos}/{len} ({eta})")
                    .unwrap(),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut acc_theta = vec![vec![0.0; k]; dtm.ndocs()];
        let mut acc_phi = vec![vec![0.0; v]; k];
        let mut samples = 0usize;

        for it in 0..self.params.iterations {
            state.sweep(alpha, beta)?;
            if it >= self.params.burn_in {
                add_into(&mut acc_theta, &state.theta(alpha));
                add_into(&mut acc_phi, &state.phi(beta));
                samples += 1;
            }
            if (it + 1) % 100 == 0 {
                debug!(iteration = it + 1, "LDA sweep");
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        // Zero iterations: report the random initialization as-is
        let (theta, phi) = if samples == 0 {
            (state.theta(alpha), state.phi(beta))
        } else {
            let scale = 1.0 / samples as f64;
            (scaled(acc_theta, scale), scaled(acc_phi, scale))
        };

        Ok(TopicModel::new(
            dtm.terms().to_vec(),
            dtm.docs().to_vec(),
            alpha,
            beta,
            phi,
            theta,
            dtm,
        ))
    }
}

struct SamplerState {
    k: usize,
    v: usize,
    /// Term id of every token, per document
    docs: Vec<Vec<usize>>,
    /// Topic of every token, per document
    z: Vec<Vec<usize>>,
    ndk: Vec<Vec<usize>>,
    nkw: Vec<Vec<usize>>,
    nk: Vec<usize>,
    rng: StdRng,
}

impl SamplerState {
    fn init(dtm: &DocumentTermMatrix, k: usize, seed: u64) -> Self {
        let v = dtm.nterms();
        let docs: Vec<Vec<usize>> = (0..dtm.ndocs())
            .map(|d| {
                dtm.row(d)
                    .iter()
                    .flat_map(|&(t, n)| std::iter::repeat(t).take(n as usize))
                    .collect()
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(seed);
        let mut ndk = vec![vec![0usize; k]; docs.len()];
        let mut nkw = vec![vec![0usize; v]; k];
        let mut nk = vec![0usize; k];
        let mut z = Vec::with_capacity(docs.len());

        for (d, doc) in docs.iter().enumerate() {
            let mut zd = Vec::with_capacity(doc.len());
            for &w in doc {
                let t = rng.gen_range(0..k);
                zd.push(t);
                ndk[d][t] += 1;
                nkw[t][w] += 1;
                nk[t] += 1;
            }
            z.push(zd);
        }

        Self {
            k,
            v,
            docs,
            z,
            ndk,
            nkw,
            nk,
            rng,
        }
    }

    fn total_tokens(&self) -> usize {
        self.docs.iter().map(Vec::len).sum()
    }

    fn sweep(&mut self, alpha: f64, beta: f64) -> Result<()> {
        let vb = self.v as f64 * beta;
        let mut weights = vec![0.0f64; self.k];

        for d in 0..self.docs.len() {
            for p in 0..self.docs[d].len() {
                let w = self.docs[d][p];
                let old = self.z[d][p];
                self.ndk[d][old] -= 1;
                self.nkw[old][w] -= 1;
                self.nk[old] -= 1;

                for (t, weight) in weights.iter_mut().enumerate() {
                    *weight = (self.ndk[d][t] as f64 + alpha) * (self.nkw[t][w] as f64 + beta)
                        / (self.nk[t] as f64 + vb);
                }

                // Positive priors keep every weight above zero
                let new = WeightedIndex::new(&weights)
                    .context("Invalid topic weights during sampling")?
                    .sample(&mut self.rng);

                self.z[d][p] = new;
                self.ndk[d][new] += 1;
                self.nkw[new][w] += 1;
                self.nk[new] += 1;
            }
        }
        Ok(())
    }

    fn theta(&self, alpha: f64) -> Vec<Vec<f64>> {
        let ka = self.k as f64 * alpha;
        self.ndk
            .iter()
            .zip(&self.docs)
            .map(|(counts, doc)| {
                let denom = doc.len() as f64 + ka;
                counts.iter().map(|&n| (n as f64 + alpha) / denom).collect()
            })
            .collect()
    }

    fn phi(&self, beta: f64) -> Vec<Vec<f64>> {
        let vb = self.v as f64 * beta;
        self.nkw
            .iter()
            .zip(&self.nk)
            .map(|(counts, &total)| {
                let denom = total as f64 + vb;
                counts.iter().map(|&n| (n as f64 + beta) / denom).collect()
            })
            .collect()
    }
}

fn add_into(acc: &mut [Vec<f64>], sample: &[Vec<f64>]) {
    for (a_row, s_row) in acc.iter_mut().zip(sample) {
        for (a, s) in a_row.iter_mut().zip(s_row) {
            *a += s;
        }
    }
}

fn scaled(mut table: Vec<Vec<f64>>, factor: f64) -> Vec<Vec<f64>> {
    table
        .iter_mut()
        .flat_map(|row| row.iter_mut())
        .for_each(|v| *v *= factor);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::term_matrix::TermBounds;

    fn corpus() -> DocumentTermMatrix {
        let docs = [
            "peace treaty ceasefire peace treaty negotiation",
            "ceasefire peace negotiation treaty envoy",
            "climate emissions carbon warming climate",
            "carbon emissions warming adaptation climate",
            "",
        ];
        let tokens: Vec<Vec<String>> = docs
            .iter()
            .map(|d| d.split_whitespace().map(String::from).collect())
            .collect();
        let names: Vec<String> = (0..docs.len()).map(|i| format!("d{i}")).collect();
        DocumentTermMatrix::build(&tokens, &names, TermBounds::default()).unwrap()
    }

    fn params(topics: usize) -> LdaParams {
        LdaParams {
            method: LdaMethod::Gibbs,
            topics,
            alpha: Some(0.1),
            beta: 0.01,
            iterations: 200,
            burn_in: 50,
            seed: 7,
            ..LdaParams::default()
        }
    }

    #[test]
    fn test_rows_sum_to_one() {
        let model = GibbsLda::new(params(2)).fit(&corpus()).unwrap();
        for row in model.phi().iter().chain(model.theta()) {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "row sums to {sum}");
        }
    }

    #[test]
    fn test_same_seed_same_model() {
        let a = GibbsLda::new(params(2)).fit(&corpus()).unwrap();
        let b = GibbsLda::new(params(2)).fit(&corpus()).unwrap();
        assert_eq!(a.phi(), b.phi());
        assert_eq!(a.theta(), b.theta());
    }

    #[test]
    fn test_empty_document_gets_uniform_theta() {
        let model = GibbsLda::new(params(2)).fit(&corpus()).unwrap();
        for p in &model.theta()[4] {
            assert!((p - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_separates_obvious_topics() {
        let model = GibbsLda::new(params(2)).fit(&corpus()).unwrap();
        let topics = model.dominant_topics();
        assert_eq!(topics[0], topics[1]);
        assert_eq!(topics[2], topics[3]);
        assert_ne!(topics[0], topics[2]);
    }

    #[test]
    fn test_rejects_bad_params() {
        assert!(GibbsLda::new(params(0)).fit(&corpus()).is_err());
        let burn = LdaParams {
            burn_in: 500,
            ..params(2)
        };
        assert!(GibbsLda::new(burn).fit(&corpus()).is_err());
    }

    #[test]
    fn test_single_topic_is_smoothed_counts() {
        // With one topic every draw is forced, so the tables are exact
        let dtm = corpus();
        let model = GibbsLda::new(params(1)).fit(&dtm).unwrap();
        for row in model.theta() {
            assert!((row[0] - 1.0).abs() < 1e-12);
        }
        let tokens: u32 = (0..dtm.ndocs()).flat_map(|d| dtm.row(d)).map(|&(_, n)| n).sum();
        let denom = tokens as f64 + dtm.nterms() as f64 * 0.01;
        for (w, term) in dtm.terms().iter().enumerate() {
            let count: u32 = (0..dtm.ndocs())
                .flat_map(|d| dtm.row(d))
                .filter(|&&(t, _)| t == w)
                .map(|&(_, n)| n)
                .sum();
            let expected = (count as f64 + 0.01) / denom;
            assert!(
                (model.phi()[0][w] - expected).abs() < 1e-12,
                "{term}: {} vs {expected}",
                model.phi()[0][w]
            );
        }
    }

    #[test]
    fn test_default_alpha() {
        assert_eq!(LdaParams::default().alpha(), 10.0);
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("VEM".parse::<LdaMethod>().unwrap(), LdaMethod::Vem);
        assert_eq!(" gibbs ".parse::<LdaMethod>().unwrap(), LdaMethod::Gibbs);
        assert!("em".parse::<LdaMethod>().is_err());
        assert_eq!(LdaMethod::default(), LdaMethod::Vem);
        assert_eq!(LdaMethod::Gibbs.to_string(), "gibbs");
    }
}
