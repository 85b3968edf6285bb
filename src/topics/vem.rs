// Latent Dirichlet Allocation via variational EM.
//
// E-step, per document: iterate the mean-field updates
//
//   phi[n][t] ∝ exp(digamma(gamma[t])) * beta[t][w_n]
//   gamma[t]  = alpha + sum_n c_n * phi[n][t]
//
// until the document's lower bound stops moving. The expected counts
// c_n * phi[n][t] are collected into per-topic word totals.
//
// M-step: beta[t][w] is the normalized expected count, and alpha (one
// symmetric value) takes a Newton step in log space on the digamma
// statistics of every gamma.
//
// The topic-word tables start from 1/V plus uniform noise, so a fixed seed
// always reproduces the same model.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::lda::LdaParams;
use super::model::TopicModel;
use super::special::{digamma, ln_gamma, log_sum_exp, trigamma};
use super::traits::TopicModeler;
use crate::matrix::term_matrix::DocumentTermMatrix;

/// Floor for log beta when a topic never claims a term.
const LOG_ZERO: f64 = -100.0;

/// Variational LDA. Implements [`TopicModeler`].
pub struct VemLda {
    pub params: LdaParams,
    /// Show a progress bar over EM iterations
    pub progress: bool,
}

impl VemLda {
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

impl TopicModeler for VemLda {
    fn fit(&self, dtm: &DocumentTermMatrix) -> Result<TopicModel> {
        let p = &self.params;
        let k = p.topics;
        let v = dtm.nterms();
        if k == 0 {
            anyhow::bail!("LDA needs at least one topic");
        }
        if v == 0 {
            anyhow::bail!("LDA needs a non-empty vocabulary; try a lower minimum term count");
        }
        if p.iterations == 0 || p.var_iterations == 0 {
            anyhow::bail!(
                "Variational EM needs at least one EM and one inference iteration (got {} and {})",
                p.iterations,
                p.var_iterations
            );
        }
        let mut alpha = p.alpha();
        if alpha <= 0.0 {
            anyhow::bail!("Dirichlet prior alpha must be positive (alpha={alpha})");
        }

        let mut rng = StdRng::seed_from_u64(p.seed);
        let mut log_beta = random_log_beta(k, v, &mut rng);
        let mut gammas = vec![vec![0.0; k]; dtm.ndocs()];

        info!(
            topics = k,
            terms = v,
            alpha,
            estimate_alpha = p.estimate_alpha,
            iterations = p.iterations,
            "Fitting LDA (variational EM)"
        );

        let pb = if self.progress {
            let pb = ProgressBar::new(p.iterations as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  EM [{bar:30}] {pos}/{len} ({msg})")
                    .unwrap(),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut previous: Option<f64> = None;
        for it in 0..p.iterations {
            let mut stats = SuffStats::new(k, v);
            let mut bound = 0.0;
            for (d, gamma) in gammas.iter_mut().enumerate() {
                bound += infer_document(dtm.row(d), &log_beta, alpha, gamma, &mut stats, p);
            }

            log_beta = stats.log_beta();
            if p.estimate_alpha && dtm.ndocs() > 0 {
                match optimize_alpha(stats.alpha_ss, dtm.ndocs(), k) {
                    Some(a) => alpha = a,
                    None => warn!(alpha, "Alpha update diverged, keeping previous value"),
                }
            }

            pb.set_message(format!("bound {bound:.1}"));
            pb.inc(1);
            debug!(iteration = it + 1, bound, alpha, "EM iteration");

            let converged = previous.is_some_and(|old| relative_change(old, bound) < p.em_tolerance);
            previous = Some(bound);
            if converged {
                info!(iterations = it + 1, bound, "EM converged");
                break;
            }
        }
        pb.finish_and_clear();

        let phi: Vec<Vec<f64>> = log_beta
            .iter()
            .map(|row| {
                let norm = log_sum_exp(row);
                row.iter().map(|l| (l - norm).exp()).collect()
            })
            .collect();
        let theta: Vec<Vec<f64>> = gammas
            .iter()
            .map(|g| {
                let total: f64 = g.iter().sum();
                g.iter().map(|x| x / total).collect()
            })
            .collect();

        // No topic-word prior in this model; beta is reported as 0
        Ok(TopicModel::new(
            dtm.terms().to_vec(),
            dtm.docs().to_vec(),
            alpha,
            0.0,
            phi,
            theta,
            dtm,
        ))
    }
}

/// Expected counts gathered over one E-step.
struct SuffStats {
    class_word: Vec<Vec<f64>>,
    class_total: Vec<f64>,
    /// Sum over documents and topics of digamma(gamma_t) - digamma(sum gamma)
    alpha_ss: f64,
}

impl SuffStats {
    fn new(k: usize, v: usize) -> Self {
        Self {
            class_word: vec![vec![0.0; v]; k],
            class_total: vec![0.0; k],
            alpha_ss: 0.0,
        }
    }

    fn log_beta(&self) -> Vec<Vec<f64>> {
        self.class_word
            .iter()
            .zip(&self.class_total)
            .map(|(row, &total)| {
                row.iter()
                    .map(|&c| {
                        if c > 0.0 && total > 0.0 {
                            c.ln() - total.ln()
                        } else {
                            LOG_ZERO
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

fn random_log_beta(k: usize, v: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    (0..k)
        .map(|_| {
            let row: Vec<f64> = (0..v)
                .map(|_| 1.0 / v as f64 + rng.gen_range(0.0..1.0))
                .collect();
            let total: f64 = row.iter().sum();
            row.iter().map(|x| (x / total).ln()).collect()
        })
        .collect()
}

/// Fit one document's variational parameters, add its expected counts to
/// `stats` and return its lower bound.
fn infer_document(
    words: &[(usize, u32)],
    log_beta: &[Vec<f64>],
    alpha: f64,
    gamma: &mut [f64],
    stats: &mut SuffStats,
    params: &LdaParams,
) -> f64 {
    let k = gamma.len();
    let total: f64 = words.iter().map(|&(_, c)| c as f64).sum();
    gamma.fill(alpha + total / k as f64);
    let mut phi = vec![vec![1.0 / k as f64; k]; words.len()];
    let mut bound = document_bound(words, log_beta, alpha, gamma, &phi);

    if !words.is_empty() {
        for _ in 0..params.var_iterations {
            let dig: Vec<f64> = gamma.iter().map(|&g| digamma(g)).collect();
            for (row, &(w, _)) in phi.iter_mut().zip(words) {
                for (t, cell) in row.iter_mut().enumerate() {
                    *cell = dig[t] + log_beta[t][w];
                }
                let norm = log_sum_exp(row);
                row.iter_mut().for_each(|cell| *cell = (*cell - norm).exp());
            }
            gamma.fill(alpha);
            for (row, &(_, c)) in phi.iter().zip(words) {
                for (g, ph) in gamma.iter_mut().zip(row) {
                    *g += c as f64 * ph;
                }
            }

            let next = document_bound(words, log_beta, alpha, gamma, &phi);
            let change = relative_change(bound, next);
            bound = next;
            if change < params.var_tolerance {
                break;
            }
        }
    }

    let dig_sum = digamma(gamma.iter().sum());
    for (row, &(w, c)) in phi.iter().zip(words) {
        for (t, ph) in row.iter().enumerate() {
            let expected = c as f64 * ph;
            stats.class_word[t][w] += expected;
            stats.class_total[t] += expected;
        }
    }
    stats.alpha_ss += gamma.iter().map(|&g| digamma(g) - dig_sum).sum::<f64>();
    bound
}

/// Evidence lower bound of one document under the current tables.
fn document_bound(
    words: &[(usize, u32)],
    log_beta: &[Vec<f64>],
    alpha: f64,
    gamma: &[f64],
    phi: &[Vec<f64>],
) -> f64 {
    let k = gamma.len() as f64;
    let gamma_sum: f64 = gamma.iter().sum();
    let dig_sum = digamma(gamma_sum);
    let dig: Vec<f64> = gamma.iter().map(|&g| digamma(g) - dig_sum).collect();

    let mut bound = ln_gamma(alpha * k) - k * ln_gamma(alpha) - ln_gamma(gamma_sum);
    for (t, &g) in gamma.iter().enumerate() {
        bound += (alpha - 1.0) * dig[t] + ln_gamma(g) - (g - 1.0) * dig[t];
    }
    for (row, &(w, c)) in phi.iter().zip(words) {
        for (t, &ph) in row.iter().enumerate() {
            if ph > 0.0 {
                bound += c as f64 * ph * (dig[t] - ph.ln() + log_beta[t][w]);
            }
        }
    }
    bound
}

/// Newton-Raphson on log(alpha) for a symmetric Dirichlet. Restarts from a
/// larger initial value when the step runs off to NaN; None if every start
/// fails.
fn optimize_alpha(alpha_ss: f64, docs: usize, k: usize) -> Option<f64> {
    let (d, k) = (docs as f64, k as f64);
    let mut init = 100.0f64;
    while init <= 1e6 {
        let mut log_a = init.ln();
        for _ in 0..100 {
            let a = log_a.exp();
            let df = d * (k * digamma(k * a) - k * digamma(a)) + alpha_ss;
            let d2f = d * (k * k * trigamma(k * a) - k * trigamma(a));
            log_a -= df / (d2f * a + df);
            if !log_a.is_finite() || df.abs() <= 1e-5 {
                break;
            }
        }
        let a = log_a.exp();
        if a.is_finite() && a > 0.0 {
            return Some(a);
        }
        init *= 10.0;
    }
    None
}

fn relative_change(old: f64, new: f64) -> f64 {
    if old == new {
        0.0
    } else {
        ((old - new) / old).abs()
    }
}
