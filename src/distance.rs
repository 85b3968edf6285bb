// Pairwise document distances over a weighted matrix.
//
// Every matrix produced here is symmetric. Distance matrices have a zero
// diagonal; the cosine similarity matrix has a diagonal of exactly 1, even
// for documents whose weight vector is all zeros. A zero vector has
// similarity 0 (distance 1) to every other document.

use serde::Serialize;

use crate::matrix::weighting::WeightedMatrix;

/// Which quantity a `DistanceMatrix` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Metric {
    Euclidean,
    CosineDistance,
    CosineSimilarity,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Euclidean => "Euclidean distance",
            Metric::CosineDistance => "Cosine distance",
            Metric::CosineSimilarity => "Cosine similarity",
        }
    }

    /// True when larger values mean "more alike".
    pub fn is_similarity(&self) -> bool {
        matches!(self, Metric::CosineSimilarity)
    }
}

/// Symmetric document-by-document table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
    pub metric: Metric,
}

impl DistanceMatrix {
    /// Build from a full square table, checking shape and symmetry.
    pub fn new(labels: Vec<String>, values: Vec<Vec<f64>>, metric: Metric) -> anyhow::Result<Self> {
        let n = labels.len();
        if values.len() != n || values.iter().any(|row| row.len() != n) {
            anyhow::bail!("Distance matrix must be {n}x{n}");
        }
        for i in 0..n {
            for j in (i + 1)..n {
                if (values[i][j] - values[j][i]).abs() > 1e-9 {
                    anyhow::bail!(
                        "Distance matrix is not symmetric at ({}, {})",
                        labels[i],
                        labels[j]
                    );
                }
            }
        }
        Ok(Self {
            labels,
            values,
            metric,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    /// Largest off-diagonal value (0.0 for fewer than two documents).
    pub fn max_value(&self) -> f64 {
        self.off_diagonal().fold(0.0, f64::max)
    }

    /// Smallest off-diagonal value (0.0 for fewer than two documents).
    pub fn min_value(&self) -> f64 {
        self.off_diagonal().reduce(f64::min).unwrap_or(0.0)
    }

    /// The most similar other document to `i`, with its value.
    pub fn nearest(&self, i: usize) -> Option<(usize, f64)> {
        let candidates = (0..self.len()).filter(|&j| j != i).map(|j| (j, self.values[i][j]));
        if self.metric.is_similarity() {
            candidates.max_by(|a, b| a.1.total_cmp(&b.1))
        } else {
            candidates.min_by(|a, b| a.1.total_cmp(&b.1))
        }
    }

    /// Convert a similarity matrix to `1 - s` distances. Distances pass
    /// through unchanged.
    pub fn to_distance(&self) -> DistanceMatrix {
        if !self.metric.is_similarity() {
            return self.clone();
        }
        DistanceMatrix {
            labels: self.labels.clone(),
            values: self
                .values
                .iter()
                .map(|row| row.iter().map(|s| 1.0 - s).collect())
                .collect(),
            metric: Metric::CosineDistance,
        }
    }

    fn off_diagonal(&self) -> impl Iterator<Item = f64> + '_ {
        let n = self.len();
        (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| self.values[i][j]))
    }
}

/// Euclidean distance between every pair of document rows.
pub fn euclidean(m: &WeightedMatrix) -> DistanceMatrix {
    pairwise(m, Metric::Euclidean, |a, b| {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y).powi(2))
            .sum::<f64>()
            .sqrt()
    })
}

/// Cosine similarity between every pair of document rows.
pub fn cosine_similarity(m: &WeightedMatrix) -> DistanceMatrix {
    let mut sim = pairwise(m, Metric::CosineSimilarity, cosine);
    for i in 0..sim.len() {
        sim.values[i][i] = 1.0;
    }
    sim
}

/// `1 - cosine similarity` for every pair of document rows.
pub fn cosine_distance(m: &WeightedMatrix) -> DistanceMatrix {
    cosine_similarity(m).to_distance()
}

/// Cosine of the angle between two vectors; 0.0 if either is all zeros.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    // Rounding can push identical vectors a hair past 1
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

fn pairwise(
    m: &WeightedMatrix,
    metric: Metric,
    f: impl Fn(&[f64], &[f64]) -> f64,
) -> DistanceMatrix {
    let n = m.ndocs();
    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let v = f(m.row(i), m.row(j));
            values[i][j] = v;
            values[j][i] = v;
        }
    }
    DistanceMatrix {
        labels: m.docs.clone(),
        values,
        metric,
    }
}
