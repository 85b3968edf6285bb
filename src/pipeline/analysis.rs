// The full analysis, one stage after another.
//
//   discover -> extract -> corpus -> normalize -> term matrix -> TF-IDF
//   -> distances -> hierarchical clustering -> LDA
//
// Each stage is also exposed on its own so the CLI subcommands can stop
// early. There is no retry or partial-failure handling: the first error
// ends the run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::cluster::dendrogram::Dendrogram;
use crate::cluster::divisive::diana;
use crate::cluster::ClusterMethod;
use crate::config::Config;
use crate::corpus::discovery::discover;
use crate::corpus::document::{Corpus, DocumentSummary};
use crate::corpus::extract::TextExtractor;
use crate::distance::{cosine_distance, cosine_similarity, euclidean, DistanceMatrix, Metric};
use crate::matrix::term_matrix::{MatrixShape, TermBounds, TermDocumentMatrix};
use crate::matrix::weighting::{weight, WeightedMatrix, Weighting};
use crate::text::normalize::Normalizer;
use crate::topics;
use crate::topics::lda::{LdaMethod, LdaParams};
use crate::topics::model::{BoxStats, TopicModel};
use crate::topics::traits::TopicModeler;

/// Everything that controls a run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub dir: PathBuf,
    pub pattern: String,
    pub bounds: TermBounds,
    pub extra_stopwords: Vec<String>,
    pub weighting: Weighting,
    pub methods: Vec<ClusterMethod>,
    /// Also report membership when each tree is cut into this many groups
    pub cut: Option<usize>,
    pub lda: LdaParams,
    /// How many terms to list per topic and in the frequency chart
    pub top_terms: usize,
    /// Minimum topic-word probability for the beta comparison
    pub min_beta: f64,
    pub progress: bool,
}

impl AnalysisOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            dir: config.pdf_dir.clone(),
            pattern: config.pattern.clone(),
            bounds: TermBounds {
                min_term_count: config.min_term_count,
                ..TermBounds::global(config.min_doc_count)
            },
            extra_stopwords: config.extra_stopwords.clone(),
            weighting: Weighting::default(),
            methods: ClusterMethod::standard_set(),
            cut: None,
            lda: LdaParams {
                method: config.lda_method,
                topics: config.topics,
                iterations: config.lda_iterations,
                seed: config.seed,
                ..LdaParams::default()
            },
            top_terms: 10,
            min_beta: 0.001,
            progress: true,
        }
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(&self.extra_stopwords)
    }
}

/// One clustering method's output.
#[derive(Debug, Clone, Serialize)]
pub struct ClusteringSummary {
    pub method: String,
    pub dendrogram: Dendrogram,
    /// Agglomerative or divisive coefficient
    pub coefficient: f64,
    pub membership: Option<Vec<usize>>,
}

/// Views over the fitted topic model that the reports show.
#[derive(Debug, Clone, Serialize)]
pub struct TopicSummary {
    pub method: LdaMethod,
    pub model: TopicModel,
    pub top_terms: Vec<Vec<(String, f64)>>,
    pub dominant_topics: Vec<usize>,
    /// `log2(beta_2 / beta_1)` for the first two topics, when there are two
    pub beta_spread: Vec<(String, f64)>,
    pub gamma_by_topic: Vec<BoxStats>,
    pub log_likelihood: f64,
    pub perplexity: f64,
}

/// Every result of a full run. Serializable for `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub source_dir: String,
    pub documents: Vec<DocumentSummary>,
    pub matrix: MatrixShape,
    pub frequent_terms: Vec<(String, u32)>,
    pub tfidf_top_terms: Vec<(String, Vec<(String, f64)>)>,
    pub euclidean: DistanceMatrix,
    pub cosine: DistanceMatrix,
    pub clusterings: Vec<ClusteringSummary>,
    pub topics: TopicSummary,
}

/// Stages 1–3: discover files and extract them into a corpus.
pub fn load_corpus(options: &AnalysisOptions, extractor: &dyn TextExtractor) -> Result<Corpus> {
    let paths = discover(&options.dir, &options.pattern)?;
    if paths.is_empty() {
        anyhow::bail!(
            "No files in {} matched pattern '{}'",
            options.dir.display(),
            options.pattern
        );
    }
    info!(files = paths.len(), dir = %options.dir.display(), "Discovered documents");
    Corpus::load(&paths, extractor)
}

/// Stages 4–5: normalize the corpus and count terms.
pub fn build_matrix(corpus: &Corpus, options: &AnalysisOptions) -> Result<TermDocumentMatrix> {
    let tokens = corpus.tokenize(&options.normalizer());
    let tdm = TermDocumentMatrix::build(&tokens, &corpus.names(), options.bounds)?;
    if tdm.nterms() == 0 {
        anyhow::bail!(
            "No terms appear in at least {} documents with at least {} occurrences",
            options.bounds.min_doc_count,
            options.bounds.min_term_count
        );
    }
    Ok(tdm)
}

/// Stage 6.
pub fn weigh(tdm: &TermDocumentMatrix, options: &AnalysisOptions) -> WeightedMatrix {
    weight(&tdm.transpose(), options.weighting)
}

/// Stage 7: Euclidean distances and cosine similarities.
pub fn distances(weighted: &WeightedMatrix) -> (DistanceMatrix, DistanceMatrix) {
    let e = euclidean(weighted);
    let c = cosine_similarity(weighted);
    info!(
        documents = e.len(),
        max_euclidean = e.max_value(),
        min_cosine = c.min_value(),
        "Computed distance matrices"
    );
    (e, c)
}

/// One matrix of the requested kind.
pub fn distance_matrix(weighted: &WeightedMatrix, metric: Metric) -> DistanceMatrix {
    match metric {
        Metric::Euclidean => euclidean(weighted),
        Metric::CosineDistance => cosine_distance(weighted),
        Metric::CosineSimilarity => cosine_similarity(weighted),
    }
}

/// The distance matrix clustering runs on. Similarities are refused: the
/// caller must ask for cosine distance explicitly.
pub fn clustering_input(weighted: &WeightedMatrix, metric: Metric) -> Result<DistanceMatrix> {
    if metric.is_similarity() {
        anyhow::bail!("Clustering needs a distance; use euclidean or cosine, not similarity");
    }
    Ok(distance_matrix(weighted, metric))
}

/// Terms correlated with `query`. The query goes through the same
/// normalization as the corpus, so "peacekeeping" finds the stemmed term.
/// Returns the matched vocabulary term with its associations.
pub fn term_associations(
    tdm: &TermDocumentMatrix,
    query: &str,
    min_corr: f64,
    options: &AnalysisOptions,
) -> Result<(String, Vec<(String, f64)>)> {
    let tokens = options.normalizer().normalize(query);
    let term = match tokens.as_slice() {
        [single] => single.clone(),
        [] => anyhow::bail!("'{query}' is removed entirely by normalization"),
        _ => anyhow::bail!(
            "'{query}' normalizes to several terms ({}); pass one word",
            tokens.join(", ")
        ),
    };
    let found = tdm.associations(&term, min_corr)?;
    Ok((term, found))
}

/// Stage 8: one dendrogram per configured method, over `distances`.
pub fn cluster_all(
    distances: &DistanceMatrix,
    methods: &[ClusterMethod],
    cut: Option<usize>,
) -> Result<Vec<ClusteringSummary>> {
    let mut out = Vec::with_capacity(methods.len());
    for method in methods {
        let (dendrogram, coefficient) = match method {
            ClusterMethod::Divisive => {
                let result = diana(distances)?;
                (result.dendrogram, result.coefficient)
            }
            other => {
                let tree = other.run(distances)?;
                let coefficient = tree.coefficient();
                (tree, coefficient)
            }
        };
        let membership = cut.map(|k| dendrogram.cut(k)).transpose()?;
        info!(method = %method, coefficient, "Built dendrogram");
        out.push(ClusteringSummary {
            method: method.to_string(),
            dendrogram,
            coefficient,
            membership,
        });
    }
    Ok(out)
}

/// Stage 9: fit LDA on the raw counts and derive the report tables.
pub fn fit_topics(tdm: &TermDocumentMatrix, options: &AnalysisOptions) -> Result<TopicSummary> {
    let dtm = tdm.transpose();
    let model = topics::modeler(&options.lda, options.progress).fit(&dtm)?;

    let beta_spread = if model.topic_count() >= 2 {
        model.beta_log_ratio(0, 1, options.min_beta)?
    } else {
        Vec::new()
    };

    info!(
        topics = model.topic_count(),
        method = %options.lda.method,
        alpha = model.alpha,
        log_likelihood = model.log_likelihood(),
        perplexity = model.perplexity(),
        "Fitted topic model"
    );

    Ok(TopicSummary {
        method: options.lda.method,
        top_terms: model.top_terms(options.top_terms),
        dominant_topics: model.dominant_topics(),
        gamma_by_topic: model.gamma_by_topic(),
        log_likelihood: model.log_likelihood(),
        perplexity: model.perplexity(),
        beta_spread,
        model,
    })
}

/// Run every stage in order.
pub fn run(options: &AnalysisOptions, extractor: &dyn TextExtractor) -> Result<AnalysisReport> {
    let corpus = load_corpus(options, extractor)?;
    let normalizer = options.normalizer();
    let documents = corpus.summary(&normalizer);

    let tdm = build_matrix(&corpus, options)?;
    let weighted = weigh(&tdm, options);
    let tfidf_top_terms = weighted
        .docs
        .iter()
        .enumerate()
        .map(|(d, name)| (name.clone(), weighted.top_terms(d, options.top_terms)))
        .collect();

    let (euclidean, cosine) = distances(&weighted);
    let clusterings = if corpus.len() >= 2 {
        cluster_all(&euclidean, &options.methods, options.cut)?
    } else {
        info!("Skipping clustering: fewer than two documents");
        Vec::new()
    };

    let topics = fit_topics(&tdm, options)?;

    Ok(AnalysisReport {
        generated_at: Utc::now(),
        source_dir: options.dir.display().to_string(),
        documents,
        matrix: tdm.shape(),
        frequent_terms: tdm.frequent_terms(options.top_terms),
        tfidf_top_terms,
        euclidean,
        cosine,
        clusterings,
        topics,
    })
}

/// Write the report as pretty-printed JSON, creating parent directories.
pub fn write_json(report: &AnalysisReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("Cannot write {}", path.display()))?;
    info!(path = %path.display(), "Wrote JSON report");
    Ok(())
}
