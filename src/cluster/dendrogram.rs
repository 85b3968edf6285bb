// Binary merge trees produced by hierarchical clustering.
//
// The layout follows the conventional `merge`/`height` representation:
// merge k joins two nodes, each either an original item (a leaf) or the
// cluster formed by an earlier merge. With n items there are n - 1 merges.
// Within a merge a leaf is listed before a cluster, two leaves in index
// order, and two clusters in merge order.

use serde::Serialize;

use crate::distance::{DistanceMatrix, Metric};

/// One side of a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Node {
    /// An original item, by index
    Leaf(usize),
    /// The cluster created by merge number `k`
    Cluster(usize),
}

impl Node {
    /// Canonical ordering of the two sides of a merge.
    pub(crate) fn ordered(a: Node, b: Node) -> (Node, Node) {
        match (a, b) {
            (Node::Cluster(_), Node::Leaf(_)) => (b, a),
            (Node::Leaf(x), Node::Leaf(y)) | (Node::Cluster(x), Node::Cluster(y)) if y < x => {
                (b, a)
            }
            _ => (a, b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Merge {
    pub left: Node,
    pub right: Node,
    pub height: f64,
    /// Number of leaves under this merge
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dendrogram {
    pub labels: Vec<String>,
    pub merges: Vec<Merge>,
    /// Name of the method that produced the tree, e.g. "ward.D2" or "diana"
    pub method: String,
}

impl Dendrogram {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn heights(&self) -> Vec<f64> {
        self.merges.iter().map(|m| m.height).collect()
    }

    /// The leaves under `node`, in plotting order.
    pub fn leaves(&self, node: Node) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            match n {
                Node::Leaf(i) => out.push(i),
                Node::Cluster(k) => {
                    // right pushed first so left is visited first
                    stack.push(self.merges[k].right);
                    stack.push(self.merges[k].left);
                }
            }
        }
        out
    }

    /// Left-to-right leaf order for drawing the tree.
    pub fn order(&self) -> Vec<usize> {
        match self.merges.len() {
            0 => (0..self.len()).collect(),
            k => self.leaves(Node::Cluster(k - 1)),
        }
    }

    /// Cut the tree into `k` groups. Returns a 1-based group id per item,
    /// numbered in order of each group's first item.
    pub fn cut(&self, k: usize) -> anyhow::Result<Vec<usize>> {
        let n = self.len();
        if k == 0 || k > n {
            anyhow::bail!("Cannot cut {n} items into {k} groups");
        }

        // Apply the first n - k merges
        let mut group_of: Vec<usize> = (0..n).collect();
        for (m, merge) in self.merges.iter().take(n - k).enumerate() {
            let target = self.leaves(merge.left)[0];
            for leaf in self.leaves(Node::Cluster(m)) {
                group_of[leaf] = group_of[target];
            }
        }

        let mut ids = vec![0usize; n];
        let mut next = 0;
        let mut seen = std::collections::HashMap::new();
        for (i, g) in group_of.into_iter().enumerate() {
            let id = *seen.entry(g).or_insert_with(|| {
                next += 1;
                next
            });
            ids[i] = id;
        }
        Ok(ids)
    }

    /// Cophenetic distances: for each pair of items, the height of the
    /// merge that first puts them in the same cluster.
    pub fn cophenetic(&self) -> DistanceMatrix {
        let n = self.len();
        let mut values = vec![vec![0.0; n]; n];
        for merge in &self.merges {
            let left = self.leaves(merge.left);
            let right = self.leaves(merge.right);
            for &a in &left {
                for &b in &right {
                    values[a][b] = merge.height;
                    values[b][a] = merge.height;
                }
            }
        }
        DistanceMatrix {
            labels: self.labels.clone(),
            values,
            metric: Metric::Euclidean,
        }
    }

    /// Agglomerative (or divisive) coefficient: the mean over items of
    /// `1 - h(i) / h_max`, where `h(i)` is the height at which item i is
    /// first merged. Values near 1 indicate strong cluster structure.
    pub fn coefficient(&self) -> f64 {
        let max = self.merges.iter().map(|m| m.height).fold(0.0, f64::max);
        if self.len() < 2 || max <= 0.0 {
            return 0.0;
        }
        let mut first = vec![0.0; self.len()];
        for merge in &self.merges {
            for side in [merge.left, merge.right] {
                if let Node::Leaf(i) = side {
                    first[i] = merge.height;
                }
            }
        }
        first.iter().map(|h| 1.0 - h / max).sum::<f64>() / self.len() as f64
    }
}
