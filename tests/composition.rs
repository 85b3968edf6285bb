// Composition tests: the full pipeline from a directory of files to the
// rendered reports.
//
// Plain .txt fixtures stand in for PDFs so the tests need no binary
// fixtures; everything after extraction is identical.

use std::fs;
use std::path::Path;

use docmine::cluster::ClusterMethod;
use docmine::config::Config;
use docmine::corpus::extract::AutoExtractor;
use docmine::distance::Metric;
use docmine::matrix::term_matrix::TermBounds;
use docmine::output::{markdown, terminal};
use docmine::pipeline::analysis::{self, AnalysisOptions};
use docmine::topics::lda::LdaMethod;

const FIXTURES: [(&str, &str); 4] = [
    (
        "A_70_1.txt",
        "Peacekeeping operations protect civilians. Peacekeeping mandates \
         require troops, and troops protect civilians in conflict zones.",
    ),
    (
        "A_70_2.txt",
        "Troops deployed for peacekeeping protect civilians. Mandates for \
         peacekeeping troops were renewed in conflict zones.",
    ),
    (
        "A_70_3.txt",
        "Climate finance supports adaptation. Emissions targets and climate \
         adaptation finance were debated; emissions keep rising.",
    ),
    (
        "A_70_4.txt",
        "Emissions reductions need climate finance. Adaptation projects \
         depend on finance as emissions and climate risks grow.",
    ),
];

fn write_fixtures(dir: &Path) {
    for (name, text) in FIXTURES {
        fs::write(dir.join(name), text).unwrap();
    }
    fs::write(dir.join("README.md"), "not part of the corpus").unwrap();
}

fn options(dir: &Path) -> AnalysisOptions {
    let mut options = AnalysisOptions::from_config(&Config::default());
    options.dir = dir.to_path_buf();
    options.pattern = r"\.txt$".to_string();
    options.bounds = TermBounds::global(2);
    options.cut = Some(2);
    options.lda.topics = 2;
    options.lda.iterations = 200;
    options.lda.alpha = Some(0.1);
    options.progress = false;
    options
}

// ============================================================
// Chain: discovery -> corpus -> matrix -> distances -> clusters -> LDA
// ============================================================

#[test]
fn full_run_produces_every_section() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());

    let report = analysis::run(&options(dir.path()), &AutoExtractor).unwrap();

    assert_eq!(report.documents.len(), 4);
    assert_eq!(report.documents[0].name, "A_70_1.txt");
    assert!(report.matrix.terms > 0);
    assert_eq!(report.matrix.documents, 4);
    for (_, count) in &report.frequent_terms {
        assert!(*count >= 2);
    }

    assert_eq!(report.euclidean.len(), 4);
    assert_eq!(report.cosine.len(), 4);
    assert_eq!(report.tfidf_top_terms.len(), 4);

    let methods: Vec<&str> = report.clusterings.iter().map(|c| c.method.as_str()).collect();
    assert_eq!(methods, vec!["ward.D2", "average", "centroid", "mcquitty", "diana"]);

    assert_eq!(report.topics.model.topic_count(), 2);
    assert_eq!(report.topics.dominant_topics.len(), 4);
    assert_eq!(report.topics.gamma_by_topic.len(), 2);
}

#[test]
fn clustering_separates_the_two_themes() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());

    let report = analysis::run(&options(dir.path()), &AutoExtractor).unwrap();
    for clustering in &report.clusterings {
        let groups = clustering.membership.as_ref().unwrap();
        assert_eq!(groups, &vec![1, 1, 2, 2], "{}", clustering.method);
    }
}

#[test]
fn similar_documents_are_nearest_neighbours() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());

    let report = analysis::run(&options(dir.path()), &AutoExtractor).unwrap();
    assert_eq!(report.euclidean.nearest(0).map(|(j, _)| j), Some(1));
    assert_eq!(report.euclidean.nearest(2).map(|(j, _)| j), Some(3));
    assert!(report.cosine.get(0, 1) > report.cosine.get(0, 2));
}

#[test]
fn single_document_skips_clustering() {
    let dir = tempfile::tempdir().unwrap();
    let (name, text) = FIXTURES[0];
    fs::write(dir.path().join(name), text).unwrap();
    let mut opts = options(dir.path());
    opts.bounds = TermBounds::with_min_count(2);

    let report = analysis::run(&opts, &AutoExtractor).unwrap();
    assert_eq!(report.documents.len(), 1);
    assert!(report.clusterings.is_empty());
}

#[test]
fn no_matching_files_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.md"), "nothing").unwrap();
    let err = analysis::run(&options(dir.path()), &AutoExtractor).unwrap_err();
    assert!(err.to_string().contains("matched"));
}

#[test]
fn min_count_too_high_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    let mut opts = options(dir.path());
    opts.bounds = TermBounds::with_min_count(1000);
    assert!(analysis::run(&opts, &AutoExtractor).is_err());
}

#[test]
fn stage_functions_compose_like_run() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    let opts = options(dir.path());

    let corpus = analysis::load_corpus(&opts, &AutoExtractor).unwrap();
    let tdm = analysis::build_matrix(&corpus, &opts).unwrap();
    let weighted = analysis::weigh(&tdm, &opts);
    let (euclidean, _) = analysis::distances(&weighted);
    let methods = ClusterMethod::parse_list("single,complete").unwrap();
    let clusterings = analysis::cluster_all(&euclidean, &methods, None).unwrap();

    assert_eq!(clusterings.len(), 2);
    assert!(clusterings.iter().all(|c| c.membership.is_none()));
}

#[test]
fn association_query_is_normalized_like_the_corpus() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    let opts = options(dir.path());
    let corpus = analysis::load_corpus(&opts, &AutoExtractor).unwrap();
    let tdm = analysis::build_matrix(&corpus, &opts).unwrap();

    // The raw word is not a vocabulary entry once stemmed
    let stemmed = opts.normalizer().normalize("Peacekeeping").remove(0);
    assert_ne!(stemmed, "peacekeeping");

    let (term, found) = analysis::term_associations(&tdm, "Peacekeeping", 0.5, &opts).unwrap();
    assert_eq!(term, stemmed);
    assert!(found.iter().all(|(t, _)| t != &term));
    assert!(analysis::term_associations(&tdm, "the", 0.5, &opts).is_err());
    assert!(analysis::term_associations(&tdm, "climate finance", 0.5, &opts).is_err());
}

#[test]
fn clustering_refuses_similarities() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    let opts = options(dir.path());
    let corpus = analysis::load_corpus(&opts, &AutoExtractor).unwrap();
    let tdm = analysis::build_matrix(&corpus, &opts).unwrap();
    let weighted = analysis::weigh(&tdm, &opts);

    assert!(analysis::clustering_input(&weighted, Metric::CosineSimilarity).is_err());
    let cosine = analysis::clustering_input(&weighted, Metric::CosineDistance).unwrap();
    assert_eq!(cosine.metric, Metric::CosineDistance);
    assert_eq!(cosine.get(0, 0), 0.0);
}

#[test]
fn topic_stage_uses_the_chosen_method() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    let mut opts = options(dir.path());
    let corpus = analysis::load_corpus(&opts, &AutoExtractor).unwrap();
    let tdm = analysis::build_matrix(&corpus, &opts).unwrap();

    let vem = analysis::fit_topics(&tdm, &opts).unwrap();
    assert_eq!(vem.method, LdaMethod::Vem);
    assert_eq!(vem.model.beta, 0.0);

    opts.lda.method = LdaMethod::Gibbs;
    let gibbs = analysis::fit_topics(&tdm, &opts).unwrap();
    assert_eq!(gibbs.method, LdaMethod::Gibbs);
    assert_eq!(gibbs.model.alpha, 0.1);
    assert_eq!(gibbs.dominant_topics.len(), corpus.len());
}

// ============================================================
// Reports
// ============================================================

#[test]
fn markdown_and_json_reports_are_written() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    let report = analysis::run(&options(dir.path()), &AutoExtractor).unwrap();

    let out = tempfile::tempdir().unwrap();
    let md_path = out.path().join("reports/docmine-report.md");
    let written = markdown::generate_report(&report, &md_path.to_string_lossy()).unwrap();
    let md = fs::read_to_string(&written).unwrap();
    assert!(md.starts_with("# Text mining report"));
    assert!(md.contains("A_70_3.txt"));
    assert!(md.contains("### diana"));
    assert!(md.contains("## Topic model (2 topics)"));

    let json_path = out.path().join("report.json");
    analysis::write_json(&report, &json_path).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(value["documents"].as_array().unwrap().len(), 4);
    assert_eq!(value["clusterings"].as_array().unwrap().len(), 5);
}

#[test]
fn terminal_renderers_cover_the_report() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    let report = analysis::run(&options(dir.path()), &AutoExtractor).unwrap();

    let table = terminal::render_corpus_summary(&report.documents).to_string();
    assert!(table.contains("A_70_4.txt"));
    assert_eq!(terminal::render_heatmap(&report.euclidean).len(), 5);
    let gamma = terminal::render_gamma_table(&report.topics.model).to_string();
    assert!(gamma.contains("T2"));
}
