// Unit tests for hierarchical clustering: every linkage, DIANA, and the
// dendrogram operations shared by both.

use docmine::cluster::agglomerative::{agglomerate, Linkage};
use docmine::cluster::divisive::diana;
use docmine::cluster::ClusterMethod;
use docmine::distance::{DistanceMatrix, Metric};

/// Distance matrix for points on a line.
fn line(xs: &[f64]) -> DistanceMatrix {
    let values = xs
        .iter()
        .map(|a| xs.iter().map(|b| (a - b).abs()).collect())
        .collect();
    let labels = (0..xs.len()).map(|i| format!("doc{i}.pdf")).collect();
    DistanceMatrix::new(labels, values, Metric::Euclidean).unwrap()
}

/// Two tight groups far apart: {0, 1, 2} and {3, 4}.
fn two_groups() -> DistanceMatrix {
    line(&[0.0, 0.5, 1.2, 30.0, 31.0])
}

// ============================================================
// Structure shared by every method
// ============================================================

#[test]
fn every_method_builds_a_complete_tree() {
    let d = two_groups();
    for method in ClusterMethod::parse_list("all").unwrap() {
        let tree = method.run(&d).unwrap();
        assert_eq!(tree.merges.len(), d.len() - 1, "{method}");
        assert_eq!(tree.merges.last().unwrap().size, d.len(), "{method}");

        let mut order = tree.order();
        order.sort_unstable();
        assert_eq!(order, (0..d.len()).collect::<Vec<_>>(), "{method}");
    }
}

#[test]
fn every_method_recovers_two_separated_groups() {
    let d = two_groups();
    for method in ClusterMethod::parse_list("all").unwrap() {
        let tree = method.run(&d).unwrap();
        assert_eq!(tree.cut(2).unwrap(), vec![1, 1, 1, 2, 2], "{method}");
    }
}

#[test]
fn cut_extremes() {
    let tree = agglomerate(&two_groups(), Linkage::Average).unwrap();
    assert_eq!(tree.cut(1).unwrap(), vec![1; 5]);
    assert_eq!(tree.cut(5).unwrap(), vec![1, 2, 3, 4, 5]);
    assert!(tree.cut(0).is_err());
    assert!(tree.cut(6).is_err());
}

#[test]
fn monotone_linkages_have_non_decreasing_heights() {
    let d = line(&[0.0, 2.0, 3.0, 7.0, 11.0, 12.5]);
    for linkage in [
        Linkage::Single,
        Linkage::Complete,
        Linkage::Average,
        Linkage::McQuitty,
        Linkage::Ward,
        Linkage::WardD2,
    ] {
        let h = agglomerate(&d, linkage).unwrap().heights();
        for w in h.windows(2) {
            assert!(w[0] <= w[1] + 1e-12, "{linkage}: {h:?}");
        }
    }
}

#[test]
fn single_linkage_cophenetic_never_exceeds_distance() {
    let d = line(&[0.0, 2.0, 3.0, 7.0, 11.0]);
    let coph = agglomerate(&d, Linkage::Single).unwrap().cophenetic();
    for i in 0..d.len() {
        for j in 0..d.len() {
            assert!(coph.get(i, j) <= d.get(i, j) + 1e-12);
        }
    }
}

#[test]
fn ward_d2_first_merge_height_is_the_distance() {
    let tree = agglomerate(&line(&[0.0, 3.0, 10.0]), Linkage::WardD2).unwrap();
    assert!((tree.merges[0].height - 3.0).abs() < 1e-12);
    assert_eq!(tree.method, "ward.D2");
}

#[test]
fn single_document_is_rejected() {
    let d = line(&[1.0]);
    assert!(agglomerate(&d, Linkage::Average).is_err());
}

#[test]
fn similarities_are_converted_before_clustering() {
    let sim = DistanceMatrix::new(
        vec!["a".into(), "b".into(), "c".into()],
        vec![
            vec![1.0, 0.9, 0.1],
            vec![0.9, 1.0, 0.2],
            vec![0.1, 0.2, 1.0],
        ],
        Metric::CosineSimilarity,
    )
    .unwrap();
    let tree = agglomerate(&sim, Linkage::Average).unwrap();
    // a and b are the most similar pair, so they merge first
    assert!((tree.merges[0].height - 0.1).abs() < 1e-12);
    assert_eq!(tree.cut(2).unwrap(), vec![1, 1, 2]);
}

// ============================================================
// Coefficients
// ============================================================

#[test]
fn coefficients_in_unit_interval() {
    let d = two_groups();
    for method in ClusterMethod::standard_set() {
        let tree = method.run(&d).unwrap();
        let c = tree.coefficient();
        assert!((0.0..=1.0).contains(&c), "{method}: {c}");
    }
    let divisive = diana(&d).unwrap();
    assert!(divisive.coefficient > 0.9);
}

// ============================================================
// Method names
// ============================================================

#[test]
fn method_names_parse_and_display() {
    for name in ["ward.D2", "average", "centroid", "mcquitty", "diana"] {
        let method: ClusterMethod = name.parse().unwrap();
        assert_eq!(method.to_string(), name);
    }
    assert!("kmeans".parse::<ClusterMethod>().is_err());
    assert_eq!(ClusterMethod::parse_list("all").unwrap().len(), 9);
}
