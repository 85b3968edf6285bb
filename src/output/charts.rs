// Plain-text chart primitives.
//
// Everything here returns uncolored strings so the same drawings can go to
// the terminal (where terminal.rs adds color) or into a Markdown code block.

use crate::cluster::dendrogram::{Dendrogram, Node};
use crate::topics::model::BoxStats;

/// Shading ramp from lightest to darkest.
const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];

/// Horizontal bar of `width` cells, filled in proportion to `value / max`.
pub fn bar(value: f64, max: f64, width: usize) -> String {
    let filled = if max > 0.0 {
        ((value / max) * width as f64).round().clamp(0.0, width as f64) as usize
    } else {
        0
    };
    format!("{}{}", "█".repeat(filled), " ".repeat(width - filled))
}

/// Bar centered on a zero axis: negative values grow left, positive right.
pub fn diverging_bar(value: f64, max_abs: f64, half_width: usize) -> String {
    let len = if max_abs > 0.0 {
        ((value.abs() / max_abs) * half_width as f64)
            .round()
            .clamp(0.0, half_width as f64) as usize
    } else {
        0
    };
    let (left, right) = if value < 0.0 {
        (
            format!("{}{}", " ".repeat(half_width - len), "█".repeat(len)),
            " ".repeat(half_width),
        )
    } else {
        (
            " ".repeat(half_width),
            format!("{}{}", "█".repeat(len), " ".repeat(half_width - len)),
        )
    };
    format!("{left}│{right}")
}

/// Heatmap cell character for `value` on the `[min, max]` scale.
pub fn shade(value: f64, min: f64, max: f64) -> char {
    if max <= min {
        return SHADES[0];
    }
    let t = ((value - min) / (max - min)).clamp(0.0, 1.0);
    SHADES[(t * (SHADES.len() - 1) as f64).round() as usize]
}

/// Document name without its extension, shortened to `max` characters.
pub fn short_label(name: &str, max: usize) -> String {
    let stem = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() <= 4 => stem,
        _ => name,
    };
    if stem.chars().count() <= max {
        stem.to_string()
    } else {
        let cut: String = stem.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

/// Horizontal box plot on a `[lo, hi]` axis `width` cells wide.
pub fn boxplot(stats: &BoxStats, lo: f64, hi: f64, width: usize) -> String {
    let mut cells = vec![' '; width];
    if width == 0 {
        return String::new();
    }
    let pos = |v: f64| -> usize {
        if hi <= lo {
            return 0;
        }
        (((v - lo) / (hi - lo)) * (width - 1) as f64)
            .round()
            .clamp(0.0, (width - 1) as f64) as usize
    };

    let (min, q1, med, q3, max) = (
        pos(stats.min),
        pos(stats.q1),
        pos(stats.median),
        pos(stats.q3),
        pos(stats.max),
    );
    for cell in &mut cells[min..=max] {
        *cell = '─';
    }
    for cell in &mut cells[q1..=q3] {
        *cell = '▒';
    }
    cells[min] = '├';
    cells[max] = '┤';
    cells[med] = '┃';
    cells.into_iter().collect()
}

/// Draw a dendrogram sideways: leaves on the left in plotting order, merge
/// heights growing to the right. The last line is the height axis.
///
/// Inverted merges (a parent lower than a child, possible with centroid
/// linkage) are drawn one column right of the child's junction, widening
/// the drawing if needed.
pub fn dendrogram(tree: &Dendrogram, width: usize) -> Vec<String> {
    let n = tree.len();
    if n == 0 {
        return Vec::new();
    }
    let width = width.max(2);
    let order = tree.order();
    let label_width = tree
        .labels
        .iter()
        .map(|l| short_label(l, 28).chars().count())
        .max()
        .unwrap_or(0);

    let rows = 2 * n - 1;
    let mut grid = vec![vec![' '; width]; rows];
    let mut row_label: Vec<Option<String>> = vec![None; rows];

    let mut leaf_row = vec![0usize; n];
    for (pos, &leaf) in order.iter().enumerate() {
        leaf_row[leaf] = 2 * pos;
        row_label[2 * pos] = Some(short_label(&tree.labels[leaf], 28));
    }

    let max_height = tree.merges.iter().map(|m| m.height).fold(0.0, f64::max);
    let column = |h: f64| -> usize {
        if max_height <= 0.0 {
            0
        } else {
            ((h / max_height) * (width - 1) as f64)
                .round()
                .clamp(0.0, (width - 1) as f64) as usize
        }
    };

    // (row, column) where each merge's junction sits
    let mut junction: Vec<(usize, usize)> = Vec::with_capacity(tree.merges.len());
    for merge in &tree.merges {
        let place = |node: Node, junction: &[(usize, usize)]| -> (usize, usize, bool) {
            match node {
                Node::Leaf(i) => (leaf_row[i], 0, true),
                Node::Cluster(k) => (junction[k].0, junction[k].1, false),
            }
        };
        let (lr, lc, l_leaf) = place(merge.left, &junction);
        let (rr, rc, r_leaf) = place(merge.right, &junction);
        let floor = [(lc, l_leaf), (rc, r_leaf)]
            .into_iter()
            .filter(|(_, is_leaf)| !is_leaf)
            .map(|(c, _)| c + 1)
            .max()
            .unwrap_or(0);
        let col = column(merge.height).max(floor);
        if col >= grid[0].len() {
            for row in grid.iter_mut() {
                row.resize(col + 1, ' ');
            }
        }

        for (r, c, is_leaf) in [(lr, lc, l_leaf), (rr, rc, r_leaf)] {
            let start = if is_leaf { c } else { c + 1 };
            for x in start..col {
                grid[r][x] = '─';
            }
        }

        let (top, bottom) = (lr.min(rr), lr.max(rr));
        for row in grid.iter_mut().take(bottom).skip(top + 1) {
            row[col] = '│';
        }
        grid[top][col] = '┐';
        grid[bottom][col] = '┘';
        let mid = (top + bottom) / 2;
        if mid != top && mid != bottom {
            grid[mid][col] = '├';
        }
        junction.push((mid, col));
    }

    let mut lines: Vec<String> = grid
        .into_iter()
        .zip(row_label)
        .map(|(cells, label)| {
            let label = label.unwrap_or_default();
            let pad = label_width - label.chars().count();
            let drawing: String = cells.into_iter().collect();
            format!("{label}{} {}", " ".repeat(pad), drawing.trim_end())
        })
        .collect();

    let axis_label = format!("{max_height:.3}");
    let gap = width.saturating_sub(1 + axis_label.chars().count());
    lines.push(format!(
        "{} 0{}{}",
        " ".repeat(label_width),
        " ".repeat(gap),
        axis_label
    ));
    lines
}
