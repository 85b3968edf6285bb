// File discovery: enumerate input documents in a directory.
//
// The pattern is a regular expression matched against the file name only
// (not the full path), the same way a `list.files(pattern = ...)` call
// would treat it. Results are sorted by file name so every run sees the
// documents in the same order.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex_lite::Regex;
use tracing::debug;

/// Default pattern: any file ending in `.pdf`, case-insensitive.
pub const DEFAULT_PATTERN: &str = r"(?i)\.pdf$";

/// List the regular files in `dir` whose file name matches `pattern`.
///
/// Not recursive. Subdirectories and non-UTF-8 file names are skipped.
pub fn discover(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let re = Regex::new(pattern).with_context(|| format!("Invalid file pattern: {pattern}"))?;

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Cannot read document directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Error listing {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if re.is_match(name) {
            files.push(path);
        } else {
            debug!(file = name, "Skipping file that does not match pattern");
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
