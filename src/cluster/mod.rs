// Hierarchical clustering: agglomerative linkages, DIANA, dendrograms.

pub mod agglomerative;
pub mod dendrogram;
pub mod divisive;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;

use agglomerative::Linkage;
use dendrogram::Dendrogram;

use crate::distance::DistanceMatrix;

/// Any of the supported clustering methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterMethod {
    Agglomerative(Linkage),
    Divisive,
}

impl ClusterMethod {
    /// The methods the full analysis runs: Ward, average, centroid,
    /// McQuitty and DIANA.
    pub fn standard_set() -> Vec<ClusterMethod> {
        vec![
            ClusterMethod::Agglomerative(Linkage::WardD2),
            ClusterMethod::Agglomerative(Linkage::Average),
            ClusterMethod::Agglomerative(Linkage::Centroid),
            ClusterMethod::Agglomerative(Linkage::McQuitty),
            ClusterMethod::Divisive,
        ]
    }

    /// Parse a method name, or "all" for every supported method.
    pub fn parse_list(s: &str) -> Result<Vec<ClusterMethod>> {
        if s.eq_ignore_ascii_case("all") {
            let mut all: Vec<ClusterMethod> = Linkage::ALL
                .iter()
                .map(|l| ClusterMethod::Agglomerative(*l))
                .collect();
            all.push(ClusterMethod::Divisive);
            return Ok(all);
        }
        s.split(',').map(|part| part.trim().parse()).collect()
    }

    /// Run this method over `distances`.
    pub fn run(&self, distances: &DistanceMatrix) -> Result<Dendrogram> {
        match self {
            ClusterMethod::Agglomerative(linkage) => agglomerative::agglomerate(distances, *linkage),
            ClusterMethod::Divisive => Ok(divisive::diana(distances)?.dendrogram),
        }
    }
}

impl fmt::Display for ClusterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterMethod::Agglomerative(linkage) => write!(f, "{linkage}"),
            ClusterMethod::Divisive => f.write_str("diana"),
        }
    }
}

impl FromStr for ClusterMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("diana") || s.eq_ignore_ascii_case("divisive") {
            Ok(ClusterMethod::Divisive)
        } else {
            Ok(ClusterMethod::Agglomerative(s.parse()?))
        }
    }
}
