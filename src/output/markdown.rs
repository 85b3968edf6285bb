// Markdown report file for a full run.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::charts;
use crate::distance::DistanceMatrix;
use crate::pipeline::analysis::AnalysisReport;

/// Write the report to `path` and return the path written.
pub fn generate_report(report: &AnalysisReport, path: &str) -> Result<String> {
    let target = Path::new(path);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create {}", parent.display()))?;
    }
    std::fs::write(target, render(report))
        .with_context(|| format!("Cannot write {}", target.display()))?;
    info!(path, "Wrote Markdown report");
    Ok(path.to_string())
}

/// The full report as Markdown text.
pub fn render(report: &AnalysisReport) -> String {
    let mut md = String::new();

    // Writing to a String never fails, so the fmt::Results are ignored.
    let _ = writeln!(md, "# Text mining report\n");
    let _ = writeln!(
        md,
        "Generated {} from `{}`.\n",
        report.generated_at.format("%Y-%m-%d %H:%M UTC"),
        report.source_dir
    );

    let _ = writeln!(md, "## Corpus\n");
    let _ = writeln!(md, "| Document | Pages | Characters | Tokens |");
    let _ = writeln!(md, "|---|---:|---:|---:|");
    for doc in &report.documents {
        let _ = writeln!(
            md,
            "| {} | {} | {} | {} |",
            doc.name, doc.pages, doc.characters, doc.tokens
        );
    }

    let shape = &report.matrix;
    let _ = writeln!(md, "\n## Term-document matrix\n");
    let _ = writeln!(
        md,
        "{} terms x {} documents, {} non-sparse entries, {:.0}% sparse, longest term {} characters.\n",
        shape.terms,
        shape.documents,
        shape.non_sparse_entries,
        shape.sparsity * 100.0,
        shape.longest_term
    );
    let _ = writeln!(md, "| Term | Count |");
    let _ = writeln!(md, "|---|---:|");
    for (term, count) in &report.frequent_terms {
        let _ = writeln!(md, "| {term} | {count} |");
    }

    let _ = writeln!(md, "\n## Distinctive terms (TF-IDF)\n");
    for (doc, terms) in &report.tfidf_top_terms {
        let list: Vec<String> = terms.iter().map(|(t, w)| format!("{t} ({w:.3})")).collect();
        let _ = writeln!(md, "- **{doc}**: {}", list.join(", "));
    }

    let _ = writeln!(md, "\n## {}\n", report.euclidean.metric.label());
    md.push_str(&distance_table(&report.euclidean));
    let _ = writeln!(md, "\n## {}\n", report.cosine.metric.label());
    md.push_str(&distance_table(&report.cosine));

    if !report.clusterings.is_empty() {
        let _ = writeln!(md, "\n## Hierarchical clustering\n");
    }
    for clustering in &report.clusterings {
        let _ = writeln!(
            md,
            "### {} (coefficient {:.3})\n",
            clustering.method, clustering.coefficient
        );
        let _ = writeln!(md, "```text");
        for line in charts::dendrogram(&clustering.dendrogram, 40) {
            let _ = writeln!(md, "{line}");
        }
        let _ = writeln!(md, "```\n");
        if let Some(groups) = &clustering.membership {
            let labels: Vec<String> = clustering
                .dendrogram
                .labels
                .iter()
                .zip(groups)
                .map(|(label, g)| format!("{} → {g}", charts::short_label(label, 28)))
                .collect();
            let _ = writeln!(md, "Groups: {}\n", labels.join(", "));
        }
    }

    let topics = &report.topics;
    let model = &topics.model;
    let _ = writeln!(md, "\n## Topic model ({} topics)\n", model.topic_count());
    let _ = writeln!(
        md,
        "Fitted by {}, alpha {:.4}. Log-likelihood {:.1}, perplexity {:.1}.\n",
        topics.method, model.alpha, topics.log_likelihood, topics.perplexity
    );
    for (t, terms) in topics.top_terms.iter().enumerate() {
        let list: Vec<String> = terms.iter().map(|(w, p)| format!("{w} ({p:.4})")).collect();
        let _ = writeln!(md, "- **Topic {}**: {}", t + 1, list.join(", "));
    }

    if !topics.beta_spread.is_empty() {
        let _ = writeln!(md, "\n### Topic 2 vs topic 1\n");
        let _ = writeln!(md, "| Term | log2(beta2 / beta1) |");
        let _ = writeln!(md, "|---|---:|");
        for (term, ratio) in topics.beta_spread.iter().take(20) {
            let _ = writeln!(md, "| {term} | {ratio:+.3} |");
        }
    }

    let _ = writeln!(md, "\n### Document-topic probabilities\n");
    let header: Vec<String> = (1..=model.topic_count()).map(|t| format!("T{t}")).collect();
    let _ = writeln!(md, "| Document | {} | Top |", header.join(" | "));
    let _ = writeln!(md, "|---|{}---|", "---:|".repeat(model.topic_count()));
    for (d, row) in model.theta().iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|p| format!("{p:.3}")).collect();
        let _ = writeln!(
            md,
            "| {} | {} | T{} |",
            model.docs[d],
            cells.join(" | "),
            topics.dominant_topics[d] + 1
        );
    }

    let _ = writeln!(md, "\n### Gamma per topic\n");
    let _ = writeln!(md, "```text");
    for (t, stats) in topics.gamma_by_topic.iter().enumerate() {
        let _ = writeln!(
            md,
            "Topic {:<3} {}  median {:.3}",
            t + 1,
            charts::boxplot(stats, 0.0, 1.0, 41),
            stats.median
        );
    }
    let _ = writeln!(md, "```");

    md
}

fn distance_table(matrix: &DistanceMatrix) -> String {
    let labels: Vec<String> = matrix
        .labels
        .iter()
        .map(|l| charts::short_label(l, 16))
        .collect();
    let mut out = String::new();
    let _ = writeln!(out, "| | {} |", labels.join(" | "));
    let _ = writeln!(out, "|---|{}", "---:|".repeat(labels.len()));
    for (i, label) in labels.iter().enumerate() {
        let cells: Vec<String> = (0..matrix.len())
            .map(|j| format!("{:.3}", matrix.get(i, j)))
            .collect();
        let _ = writeln!(out, "| {label} | {} |", cells.join(" | "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Metric;

    #[test]
    fn test_distance_table_rows() {
        let m = DistanceMatrix::new(
            vec!["a.pdf".into(), "b.pdf".into()],
            vec![vec![0.0, 1.5], vec![1.5, 0.0]],
            Metric::Euclidean,
        )
        .unwrap();
        let table = distance_table(&m);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "| | a | b |");
        assert_eq!(lines[2], "| a | 0.000 | 1.500 |");
    }
}
