//! Input report discovery and output report writing.

use chrono::{DateTime, Utc};
use pairscope_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Find the newest report in `dir` whose file name starts with `prefix` and
/// ends with `suffix`.
///
/// Report names embed a sortable timestamp, so the lexically greatest name is
/// the latest.
pub fn find_latest_report(dir: &Path, prefix: &str, suffix: &str) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(Error::MissingInput(format!(
            "reports directory not found: {}",
            dir.display()
        )));
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| name.starts_with(prefix) && name.ends_with(suffix))
        })
        .collect();

    candidates.sort();
    debug!(count = candidates.len(), dir = %dir.display(), "Matched backtest reports");

    candidates.pop().ok_or_else(|| {
        Error::MissingInput(format!(
            "no report matching {}*{} in {}",
            prefix,
            suffix,
            dir.display()
        ))
    })
}

/// Timestamped output name, e.g. `beta-drift-analysis-20260210-083000.md`.
pub fn output_file_name(now: DateTime<Utc>) -> String {
    format!("beta-drift-analysis-{}.md", now.format("%Y%m%d-%H%M%S"))
}

/// Write `content` to `dir/name`, creating `dir` if needed.
pub fn write_report(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, content)?;
    info!(path = %path.display(), bytes = content.len(), "Wrote drift analysis report");
    Ok(path)
}
