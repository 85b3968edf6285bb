// Agglomerative hierarchical clustering via the Lance–Williams recurrence.
//
// Starting from singletons, the closest pair of active clusters is merged
// and the distance from the new cluster to every other cluster k is
// rewritten as
//
//   d(ij, k) = a_i d(i,k) + a_j d(j,k) + b d(i,j) + g |d(i,k) - d(j,k)|
//
// with coefficients chosen by the linkage. The recurrence is applied to the
// distances exactly as given; centroid and median linkage are conventionally
// fed squared Euclidean distances by the caller. Ward.D2 squares the input
// itself and reports square-rooted heights.
//
// Ties between equally close pairs go to the lowest (i, j) index pair.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use super::dendrogram::{Dendrogram, Merge, Node};
use crate::distance::DistanceMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Linkage {
    Single,
    Complete,
    Average,
    McQuitty,
    Centroid,
    Median,
    /// Ward's criterion applied to the given distances ("ward.D")
    Ward,
    /// Ward's criterion on squared distances ("ward.D2")
    WardD2,
}

impl Linkage {
    pub const ALL: [Linkage; 8] = [
        Linkage::Single,
        Linkage::Complete,
        Linkage::Average,
        Linkage::McQuitty,
        Linkage::Centroid,
        Linkage::Median,
        Linkage::Ward,
        Linkage::WardD2,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Linkage::Single => "single",
            Linkage::Complete => "complete",
            Linkage::Average => "average",
            Linkage::McQuitty => "mcquitty",
            Linkage::Centroid => "centroid",
            Linkage::Median => "median",
            Linkage::Ward => "ward.D",
            Linkage::WardD2 => "ward.D2",
        }
    }

    /// Lance–Williams coefficients (a_i, a_j, b, g) for merging clusters of
    /// sizes `ni` and `nj`, seen from a cluster of size `nk`.
    fn coefficients(&self, ni: f64, nj: f64, nk: f64) -> (f64, f64, f64, f64) {
        match self {
            Linkage::Single => (0.5, 0.5, 0.0, -0.5),
            Linkage::Complete => (0.5, 0.5, 0.0, 0.5),
            Linkage::Average => (ni / (ni + nj), nj / (ni + nj), 0.0, 0.0),
            Linkage::McQuitty => (0.5, 0.5, 0.0, 0.0),
            Linkage::Centroid => {
                let s = ni + nj;
                (ni / s, nj / s, -(ni * nj) / (s * s), 0.0)
            }
            Linkage::Median => (0.5, 0.5, -0.25, 0.0),
            Linkage::Ward | Linkage::WardD2 => {
                let s = ni + nj + nk;
                ((ni + nk) / s, (nj + nk) / s, -nk / s, 0.0)
            }
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Linkage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Linkage::Single),
            "complete" => Ok(Linkage::Complete),
            "average" | "upgma" => Ok(Linkage::Average),
            "mcquitty" | "wpgma" => Ok(Linkage::McQuitty),
            "centroid" => Ok(Linkage::Centroid),
            "median" => Ok(Linkage::Median),
            "ward" | "ward.d" => Ok(Linkage::Ward),
            "ward.d2" => Ok(Linkage::WardD2),
            other => anyhow::bail!("Unknown linkage method '{other}'"),
        }
    }
}

/// Build a dendrogram by repeatedly merging the closest clusters.
pub fn agglomerate(distances: &DistanceMatrix, linkage: Linkage) -> Result<Dendrogram> {
    let dist = distances.to_distance();
    let n = dist.len();
    if n < 2 {
        anyhow::bail!("Hierarchical clustering needs at least 2 documents, got {n}");
    }

    let squared = linkage == Linkage::WardD2;
    let mut d: Vec<Vec<f64>> = dist
        .values
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| if squared { v * v } else { *v })
                .collect()
        })
        .collect();

    let mut active = vec![true; n];
    let mut size = vec![1usize; n];
    let mut node: Vec<Node> = (0..n).map(Node::Leaf).collect();
    let mut merges = Vec::with_capacity(n - 1);

    for step in 0..(n - 1) {
        let (i, j) = closest_pair(&d, &active);
        let dij = d[i][j];
        let (ni, nj) = (size[i] as f64, size[j] as f64);

        for k in 0..n {
            if !active[k] || k == i || k == j {
                continue;
            }
            let (ai, aj, b, g) = linkage.coefficients(ni, nj, size[k] as f64);
            let updated = ai * d[i][k] + aj * d[j][k] + b * dij + g * (d[i][k] - d[j][k]).abs();
            d[i][k] = updated;
            d[k][i] = updated;
        }

        let (left, right) = Node::ordered(node[i], node[j]);
        let height = if squared { dij.max(0.0).sqrt() } else { dij };
        merges.push(Merge {
            left,
            right,
            height,
            size: size[i] + size[j],
        });
        debug!(step, height, method = linkage.name(), "Merged clusters");

        size[i] += size[j];
        node[i] = Node::Cluster(step);
        active[j] = false;
    }

    Ok(Dendrogram {
        labels: dist.labels.clone(),
        merges,
        method: linkage.name().to_string(),
    })
}

/// Lowest-index pair (i < j) of active clusters at minimum distance.
fn closest_pair(d: &[Vec<f64>], active: &[bool]) -> (usize, usize) {
    let mut best = (0, 0);
    let mut best_dist = f64::INFINITY;
    for i in 0..d.len() {
        if !active[i] {
            continue;
        }
        for j in (i + 1)..d.len() {
            if active[j] && d[i][j] < best_dist {
                best_dist = d[i][j];
                best = (i, j);
            }
        }
    }
    best
}
