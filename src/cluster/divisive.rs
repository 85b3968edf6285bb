// Divisive hierarchical clustering (DIANA).
//
// Top-down: the cluster with the largest diameter is split at each step.
// The item with the highest average dissimilarity to the rest of its
// cluster starts a splinter group; items then keep moving over while they
// are, on average, closer to the splinter group than to what remains.
// The process ends when every item stands alone.
//
// The split sequence is returned as an ordinary dendrogram: reversing the
// splits gives merges, each at the height of the parent cluster's diameter.

use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use super::dendrogram::{Dendrogram, Merge, Node};
use crate::distance::DistanceMatrix;

/// Outcome of a DIANA run.
#[derive(Debug, Clone, Serialize)]
pub struct DivisiveResult {
    pub dendrogram: Dendrogram,
    /// Divisive coefficient in [0, 1]
    pub coefficient: f64,
}

struct Split {
    splinter: Vec<usize>,
    remainder: Vec<usize>,
    diameter: f64,
}

pub fn diana(distances: &DistanceMatrix) -> Result<DivisiveResult> {
    let dist = distances.to_distance();
    let n = dist.len();
    if n < 2 {
        anyhow::bail!("Divisive clustering needs at least 2 documents, got {n}");
    }
    let d = &dist.values;

    let mut clusters: Vec<Vec<usize>> = vec![(0..n).collect()];
    let mut splits: Vec<Split> = Vec::with_capacity(n - 1);

    while splits.len() < n - 1 {
        // Largest-diameter cluster among those that can still be split
        let Some((idx, diameter)) = clusters
            .iter()
            .enumerate()
            .filter(|(_, c)| c.len() > 1)
            .map(|(i, c)| (i, diameter_of(d, c)))
            .fold(None, |best: Option<(usize, f64)>, cur| match best {
                Some(b) if b.1 >= cur.1 => Some(b),
                _ => Some(cur),
            })
        else {
            break;
        };

        let parent = clusters.swap_remove(idx);
        let (splinter, remainder) = split_off(d, parent);
        debug!(
            diameter,
            splinter = splinter.len(),
            remainder = remainder.len(),
            "Split cluster"
        );

        clusters.push(splinter.clone());
        clusters.push(remainder.clone());
        splits.push(Split {
            splinter,
            remainder,
            diameter,
        });
    }

    let dendrogram = to_dendrogram(&dist.labels, splits);
    let coefficient = dendrogram.coefficient();
    Ok(DivisiveResult {
        dendrogram,
        coefficient,
    })
}

/// Move the splinter group out of `members`. Both returned groups are
/// non-empty and sorted.
fn split_off(d: &[Vec<f64>], members: Vec<usize>) -> (Vec<usize>, Vec<usize>) {
    let mut remainder = members;
    let mut splinter = Vec::new();

    // Seed: the most isolated item
    let seed = argmax(remainder.iter().map(|&x| avg_to(d, x, &remainder, true)));
    splinter.push(remainder.remove(seed));

    while remainder.len() > 1 {
        let gains: Vec<f64> = remainder
            .iter()
            .map(|&x| avg_to(d, x, &remainder, true) - avg_to(d, x, &splinter, false))
            .collect();
        let best = argmax(gains.iter().copied());
        if gains[best] <= 0.0 {
            break;
        }
        splinter.push(remainder.remove(best));
    }

    splinter.sort_unstable();
    remainder.sort_unstable();
    (splinter, remainder)
}

/// Mean distance from `x` to `group`, skipping `x` itself when `exclude_self`.
fn avg_to(d: &[Vec<f64>], x: usize, group: &[usize], exclude_self: bool) -> f64 {
    let others: Vec<f64> = group
        .iter()
        .filter(|&&y| !(exclude_self && y == x))
        .map(|&y| d[x][y])
        .collect();
    if others.is_empty() {
        0.0
    } else {
        others.iter().sum::<f64>() / others.len() as f64
    }
}

fn diameter_of(d: &[Vec<f64>], members: &[usize]) -> f64 {
    let mut max = 0.0;
    for (a, &i) in members.iter().enumerate() {
        for &j in &members[a + 1..] {
            if d[i][j] > max {
                max = d[i][j];
            }
        }
    }
    max
}

/// First index of the maximum value.
fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_val = f64::NEG_INFINITY;
    for (i, v) in values.enumerate() {
        if v > best_val {
            best_val = v;
            best = i;
        }
    }
    best
}

/// Replay the splits backwards as merges.
fn to_dendrogram(labels: &[String], splits: Vec<Split>) -> Dendrogram {
    let mut cluster_of: HashMap<Vec<usize>, usize> = HashMap::new();
    let mut merges = Vec::with_capacity(splits.len());

    for split in splits.into_iter().rev() {
        let side = |members: &Vec<usize>| -> Node {
            if members.len() == 1 {
                Node::Leaf(members[0])
            } else {
                Node::Cluster(cluster_of[members])
            }
        };
        let (left, right) = Node::ordered(side(&split.splinter), side(&split.remainder));

        let mut parent = split.splinter;
        parent.extend(split.remainder);
        parent.sort_unstable();

        merges.push(Merge {
            left,
            right,
            height: split.diameter,
            size: parent.len(),
        });
        cluster_of.insert(parent, merges.len() - 1);
    }

    Dendrogram {
        labels: labels.to_vec(),
        merges,
        method: "diana".to_string(),
    }
}
