use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing::info;

use docmine::cluster::ClusterMethod;
use docmine::config::Config;
use docmine::corpus::extract::AutoExtractor;
use docmine::distance::Metric;
use docmine::output::{markdown, terminal};
use docmine::pipeline::analysis::{self, AnalysisOptions};
use docmine::topics::lda::LdaMethod;

/// Docmine: exploratory text mining for a folder of PDF reports.
///
/// Extracts and normalizes the text, builds term-document matrices, compares
/// documents, clusters them hierarchically and fits an LDA topic model.
#[derive(Parser)]
#[command(name = "docmine", version, about)]
struct Cli {
    /// Directory to scan (default: DOCMINE_PDF_DIR or ./reports)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Regex matched against file names (default: PDFs only)
    #[arg(long, global = true)]
    pattern: Option<String>,

    /// Minimum number of documents a term must appear in (default:
    /// DOCMINE_MIN_DOC_COUNT or 5)
    #[arg(long, global = true)]
    min_docs: Option<usize>,

    /// Minimum total occurrences for a term to be kept
    #[arg(long, global = true)]
    min_count: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List discovered documents with page, character and token counts
    Inspect,

    /// Show the term-document matrix and the most frequent terms
    Terms {
        /// Number of terms to chart
        #[arg(long, default_value = "20")]
        top: usize,

        /// Also list terms correlated with this one
        #[arg(long)]
        assoc: Option<String>,

        /// Minimum correlation for --assoc
        #[arg(long, default_value = "0.8")]
        min_corr: f64,

        /// Drop terms absent from more than this share of documents (0-1)
        #[arg(long)]
        sparse: Option<f64>,
    },

    /// Compare documents by their TF-IDF vectors
    Distances {
        #[arg(long, value_enum, default_value = "euclidean")]
        metric: MetricArg,
    },

    /// Cluster documents hierarchically and draw the dendrograms
    Cluster {
        /// Comma-separated methods (ward.D2, average, centroid, mcquitty,
        /// single, complete, median, ward.D, diana) or "all"
        #[arg(long)]
        method: Option<String>,

        /// Cut each tree into this many groups
        #[arg(long)]
        cut: Option<usize>,

        /// Distance to cluster on
        #[arg(long, value_enum, default_value = "euclidean")]
        metric: ClusterMetricArg,
    },

    /// Fit an LDA topic model
    Topics {
        /// Number of topics (default: DOCMINE_TOPICS or 5)
        #[arg(long)]
        k: Option<usize>,

        /// Inference method (default: DOCMINE_LDA_METHOD or vem)
        #[arg(long, value_enum)]
        method: Option<MethodArg>,

        /// EM iteration cap for vem, sweeps for gibbs (default:
        /// DOCMINE_LDA_ITERATIONS or 1000)
        #[arg(long)]
        iterations: Option<usize>,

        /// Keep alpha fixed instead of estimating it (vem)
        #[arg(long)]
        fixed_alpha: bool,

        /// Random seed (default: DOCMINE_SEED or 1234)
        #[arg(long)]
        seed: Option<u64>,

        /// Terms to list per topic
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Run every stage and write the reports
    Run {
        /// Markdown report path (default: <output dir>/docmine-report.md)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Also write the full results as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,

        /// Cut each tree into this many groups
        #[arg(long)]
        cut: Option<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Euclidean,
    Cosine,
    Similarity,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Euclidean => Metric::Euclidean,
            MetricArg::Cosine => Metric::CosineDistance,
            MetricArg::Similarity => Metric::CosineSimilarity,
        }
    }
}

/// Clustering only accepts distances.
#[derive(Clone, Copy, ValueEnum)]
enum ClusterMetricArg {
    Euclidean,
    Cosine,
}

impl From<ClusterMetricArg> for Metric {
    fn from(arg: ClusterMetricArg) -> Self {
        match arg {
            ClusterMetricArg::Euclidean => Metric::Euclidean,
            ClusterMetricArg::Cosine => Metric::CosineDistance,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Vem,
    Gibbs,
}

impl From<MethodArg> for LdaMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Vem => LdaMethod::Vem,
            MethodArg::Gibbs => LdaMethod::Gibbs,
        }
    }
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("docmine=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    let mut options = AnalysisOptions::from_config(&config);
    if let Some(dir) = cli.dir {
        options.dir = dir;
    }
    if let Some(pattern) = cli.pattern {
        options.pattern = pattern;
    }
    if let Some(min_docs) = cli.min_docs {
        options.bounds.min_doc_count = min_docs;
    }
    if let Some(min_count) = cli.min_count {
        options.bounds.min_term_count = min_count;
    }

    let extractor = AutoExtractor;

    match cli.command {
        Commands::Inspect => {
            let corpus = analysis::load_corpus(&options, &extractor)?;
            terminal::display_corpus_summary(&corpus.summary(&options.normalizer()));
        }

        Commands::Terms {
            top,
            assoc,
            min_corr,
            sparse,
        } => {
            let corpus = analysis::load_corpus(&options, &extractor)?;
            let mut tdm = analysis::build_matrix(&corpus, &options)?;
            if let Some(sparse) = sparse {
                tdm = tdm.remove_sparse_terms(sparse)?;
                info!(terms = tdm.nterms(), sparse, "Removed sparse terms");
            }

            println!();
            terminal::display_matrix_shape(&tdm.shape());
            terminal::display_frequent_terms(&tdm.frequent_terms(top));

            if let Some(query) = assoc {
                let (term, found) = analysis::term_associations(&tdm, &query, min_corr, &options)?;
                terminal::display_associations(&term, &found);
            }
        }

        Commands::Distances { metric } => {
            let corpus = analysis::load_corpus(&options, &extractor)?;
            let tdm = analysis::build_matrix(&corpus, &options)?;
            let weighted = analysis::weigh(&tdm, &options);
            let matrix = analysis::distance_matrix(&weighted, metric.into());
            terminal::display_distances(&matrix);
        }

        Commands::Cluster {
            method,
            cut,
            metric,
        } => {
            let methods = match method {
                Some(list) => ClusterMethod::parse_list(&list)?,
                None => ClusterMethod::standard_set(),
            };
            let corpus = analysis::load_corpus(&options, &extractor)?;
            if corpus.len() < 2 {
                anyhow::bail!("Clustering needs at least two documents");
            }
            let tdm = analysis::build_matrix(&corpus, &options)?;
            let weighted = analysis::weigh(&tdm, &options);
            let distances = analysis::clustering_input(&weighted, metric.into())?;
            for summary in analysis::cluster_all(&distances, &methods, cut)? {
                terminal::display_clustering(&summary);
            }
        }

        Commands::Topics {
            k,
            method,
            iterations,
            fixed_alpha,
            seed,
            top,
        } => {
            if let Some(k) = k {
                options.lda.topics = k;
            }
            if let Some(method) = method {
                options.lda.method = method.into();
            }
            if fixed_alpha {
                options.lda.estimate_alpha = false;
            }
            if let Some(iterations) = iterations {
                options.lda.iterations = iterations;
            }
            if let Some(seed) = seed {
                options.lda.seed = seed;
            }
            options.top_terms = top;

            let corpus = analysis::load_corpus(&options, &extractor)?;
            let tdm = analysis::build_matrix(&corpus, &options)?;
            let summary = analysis::fit_topics(&tdm, &options)?;
            terminal::display_topics(&summary, 20);
        }

        Commands::Run { report, json, cut } => {
            options.cut = cut;
            let result = analysis::run(&options, &extractor)?;
            terminal::display_report(&result);

            let report_path = report.unwrap_or_else(|| config.output_dir.join("docmine-report.md"));
            let written = markdown::generate_report(&result, &report_path.to_string_lossy())?;
            println!(
                "\n{}",
                format!("Markdown report saved to: {written}").bold()
            );

            if let Some(path) = json {
                analysis::write_json(&result, &path)?;
                println!("{}", format!("JSON saved to: {}", path.display()).bold());
            }
        }
    }

    Ok(())
}
