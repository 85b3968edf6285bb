// Colored terminal output for every pipeline stage.
//
// Tables go through comfy-table, charts come from `charts` and get colored
// here. The `render_*` functions build the text; the `display_*` functions
// print it.

use colored::Colorize;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};

use super::charts;
use crate::corpus::document::DocumentSummary;
use crate::distance::DistanceMatrix;
use crate::matrix::term_matrix::MatrixShape;
use crate::pipeline::analysis::{AnalysisReport, ClusteringSummary, TopicSummary};
use crate::topics::model::{BoxStats, TopicModel};

const BAR_WIDTH: usize = 30;
const LABEL_WIDTH: usize = 18;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn numeric(value: f64, precision: usize) -> Cell {
    Cell::new(format!("{value:.precision$}")).set_alignment(CellAlignment::Right)
}

fn heading(text: &str) {
    println!("\n{}\n", format!("=== {text} ===").bold());
}

pub fn render_corpus_summary(docs: &[DocumentSummary]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["#", "Document", "Pages", "Characters", "Tokens"]);
    for (i, doc) in docs.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&doc.name),
            Cell::new(doc.pages).set_alignment(CellAlignment::Right),
            Cell::new(doc.characters).set_alignment(CellAlignment::Right),
            Cell::new(doc.tokens).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn display_corpus_summary(docs: &[DocumentSummary]) {
    heading(&format!("Corpus ({} documents)", docs.len()));
    println!("{}", render_corpus_summary(docs));
}

pub fn display_matrix_shape(shape: &MatrixShape) {
    println!(
        "  Term-document matrix: {} terms x {} documents",
        shape.terms.to_string().bold(),
        shape.documents.to_string().bold()
    );
    println!(
        "  Non-sparse entries: {}  Sparsity: {:.0}%  Longest term: {} chars",
        shape.non_sparse_entries,
        shape.sparsity * 100.0,
        shape.longest_term
    );
}

/// Ranked bar chart of `(label, value)` pairs, one line per entry.
pub fn render_bar_chart(entries: &[(String, f64)], precision: usize) -> Vec<String> {
    let max = entries.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    entries
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            let bar = charts::bar(*value, max, BAR_WIDTH);
            let colored_bar = if max > 0.0 && *value >= 0.66 * max {
                bar.bright_green()
            } else if max > 0.0 && *value >= 0.33 * max {
                bar.bright_yellow()
            } else {
                bar.bright_blue()
            };
            format!(
                "  {:>2}. {:<w$} {} {:.p$}",
                i + 1,
                super::truncate_chars(label, LABEL_WIDTH),
                colored_bar,
                value,
                w = LABEL_WIDTH + 3,
                p = precision
            )
        })
        .collect()
}

pub fn display_frequent_terms(terms: &[(String, u32)]) {
    heading(&format!("Most frequent terms (top {})", terms.len()));
    let entries: Vec<(String, f64)> = terms.iter().map(|(t, n)| (t.clone(), *n as f64)).collect();
    for line in render_bar_chart(&entries, 0) {
        println!("{line}");
    }
}

pub fn display_tfidf_terms(per_doc: &[(String, Vec<(String, f64)>)]) {
    heading("Distinctive terms per document (TF-IDF)");
    for (doc, terms) in per_doc {
        let list: Vec<String> = terms.iter().map(|(t, w)| format!("{t} ({w:.3})")).collect();
        println!("  {}", doc.bold());
        println!("      {}", list.join(", ").dimmed());
    }
}

pub fn display_associations(term: &str, assoc: &[(String, f64)]) {
    heading(&format!("Terms associated with '{term}'"));
    if assoc.is_empty() {
        println!("  {}", "No terms pass the correlation limit.".dimmed());
        return;
    }
    for line in render_bar_chart(assoc, 2) {
        println!("{line}");
    }
}

pub fn render_distance_table(matrix: &DistanceMatrix) -> Table {
    let labels: Vec<String> = matrix
        .labels
        .iter()
        .map(|l| charts::short_label(l, 12))
        .collect();
    let mut table = new_table();
    let mut header = vec![Cell::new("")];
    header.extend(labels.iter().map(Cell::new));
    table.set_header(header);

    for (i, label) in labels.iter().enumerate() {
        let mut row = vec![Cell::new(label).fg(Color::Cyan)];
        row.extend((0..matrix.len()).map(|j| numeric(matrix.get(i, j), 3)));
        table.add_row(row);
    }
    table
}

/// Shaded grid, darker = larger value. Each cell is two characters wide.
pub fn render_heatmap(matrix: &DistanceMatrix) -> Vec<String> {
    let (min, max) = (matrix.min_value().min(0.0), matrix.max_value().max(1e-12));
    let labels: Vec<String> = matrix
        .labels
        .iter()
        .map(|l| charts::short_label(l, LABEL_WIDTH))
        .collect();
    let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    let mut lines = Vec::with_capacity(matrix.len() + 1);
    for (i, label) in labels.iter().enumerate() {
        let cells: String = (0..matrix.len())
            .map(|j| {
                let c = charts::shade(matrix.get(i, j), min, max);
                format!("{c}{c}")
            })
            .collect();
        let pad = width - label.chars().count();
        lines.push(format!("  {label}{} │{}│", " ".repeat(pad), cells.red()));
    }
    lines.push(format!(
        "  {} scale: ' ' = {:.3}  '█' = {:.3}",
        " ".repeat(width),
        min,
        max
    ));
    lines
}

pub fn display_distances(matrix: &DistanceMatrix) {
    heading(matrix.metric.label());
    for line in render_heatmap(matrix) {
        println!("{line}");
    }
    println!();
    println!("{}", render_distance_table(matrix));
}

pub fn display_clustering(summary: &ClusteringSummary) {
    heading(&format!("Dendrogram: {}", summary.method));
    for line in charts::dendrogram(&summary.dendrogram, 40) {
        println!("  {line}");
    }
    println!(
        "\n  Coefficient: {}",
        format!("{:.3}", summary.coefficient).bold()
    );

    if let Some(groups) = &summary.membership {
        let k = groups.iter().max().copied().unwrap_or(0);
        println!("  Cut into {k} groups:");
        for g in 1..=k {
            let members: Vec<String> = groups
                .iter()
                .enumerate()
                .filter(|(_, id)| **id == g)
                .map(|(i, _)| charts::short_label(&summary.dendrogram.labels[i], 28))
                .collect();
            println!("    {} {}", format!("[{g}]").cyan(), members.join(", "));
        }
    }
}

pub fn display_topic_terms(top_terms: &[Vec<(String, f64)>]) {
    heading("Top terms per topic");
    for (t, terms) in top_terms.iter().enumerate() {
        println!("  {}", format!("Topic {}", t + 1).bold());
        for line in render_bar_chart(terms, 4) {
            println!("  {line}");
        }
        println!();
    }
}

pub fn render_beta_spread(spread: &[(String, f64)], n: usize) -> Vec<String> {
    let mut shown: Vec<&(String, f64)> = spread.iter().take(n).collect();
    shown.sort_by(|a, b| a.1.total_cmp(&b.1));
    let max_abs = shown.iter().map(|(_, r)| r.abs()).fold(0.0, f64::max);

    shown
        .into_iter()
        .map(|(term, ratio)| {
            let bar = charts::diverging_bar(*ratio, max_abs, BAR_WIDTH / 2);
            let colored_bar = if *ratio < 0.0 { bar.blue() } else { bar.red() };
            format!(
                "  {:>w$} {} {:+.2}",
                super::truncate_chars(term, LABEL_WIDTH),
                colored_bar,
                ratio,
                w = LABEL_WIDTH + 3
            )
        })
        .collect()
}

pub fn display_beta_spread(spread: &[(String, f64)], n: usize) {
    heading("Topic 2 vs topic 1: log2(beta2 / beta1)");
    if spread.is_empty() {
        println!("  {}", "Needs at least two topics.".dimmed());
        return;
    }
    for line in render_beta_spread(spread, n) {
        println!("{line}");
    }
}

pub fn render_gamma_table(model: &TopicModel) -> Table {
    let mut table = new_table();
    let mut header = vec![Cell::new("Document")];
    header.extend((1..=model.topic_count()).map(|t| Cell::new(format!("T{t}"))));
    header.push(Cell::new("Top"));
    table.set_header(header);

    let dominant = model.dominant_topics();
    for (d, row) in model.theta().iter().enumerate() {
        let mut cells = vec![Cell::new(charts::short_label(&model.docs[d], 28))];
        cells.extend(row.iter().map(|p| numeric(*p, 3)));
        cells.push(Cell::new(format!("T{}", dominant[d] + 1)).fg(Color::Green));
        table.add_row(cells);
    }
    table
}

pub fn render_gamma_boxplot(stats: &[BoxStats]) -> Vec<String> {
    let mut lines: Vec<String> = stats
        .iter()
        .enumerate()
        .map(|(t, s)| {
            format!(
                "  {:<8} {}  median {:.3}",
                format!("Topic {}", t + 1),
                charts::boxplot(s, 0.0, 1.0, 41).yellow(),
                s.median
            )
        })
        .collect();
    lines.push(format!("  {:<8} 0{}1", "", " ".repeat(39)));
    lines
}

pub fn display_topics(summary: &TopicSummary, spread_terms: usize) {
    display_topic_terms(&summary.top_terms);
    display_beta_spread(&summary.beta_spread, spread_terms);

    heading("Document-topic probabilities (gamma)");
    println!("{}", render_gamma_table(&summary.model));

    heading("Gamma distribution per topic");
    for line in render_gamma_boxplot(&summary.gamma_by_topic) {
        println!("{line}");
    }

    println!(
        "\n  Method: {}  Alpha: {:.4}  Log-likelihood: {:.1}  Perplexity: {:.1}",
        summary.method, summary.model.alpha, summary.log_likelihood, summary.perplexity
    );
}

/// Print every section of a full run.
pub fn display_report(report: &AnalysisReport) {
    display_corpus_summary(&report.documents);
    println!();
    display_matrix_shape(&report.matrix);
    display_frequent_terms(&report.frequent_terms);
    display_tfidf_terms(&report.tfidf_top_terms);
    display_distances(&report.euclidean);
    display_distances(&report.cosine);
    for clustering in &report.clusterings {
        display_clustering(clustering);
    }
    display_topics(&report.topics, 20);
}
