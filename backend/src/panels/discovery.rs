//! Panel file discovery
//!
//! A composite save writes one file per panel as `{base}-{index}.{ext}`.
//! Discovery is two-tiered:
//!
//! 1. Exact numbered pattern, ordered by numeric index
//! 2. Any `*.{ext}` file in the directory, ordered by name
//!
//! and finally falls back to the plain `{base}.{ext}` path as a one-panel
//! result. The second tier tolerates naming drift between library versions
//! but will also pick up unrelated files of the same extension, so callers
//! must point it at a directory they own.

use super::PanelError;
use glob::{glob, Pattern};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Find panel files for a composite artifact saved under `dir/base.ext`
pub fn discover_panels(dir: &Path, base: &str, ext: &str) -> Result<Vec<PathBuf>, PanelError> {
    let numbered = numbered_panels(dir, base, ext)?;
    if !numbered.is_empty() {
        return Ok(numbered);
    }

    let mut any_ext = glob_paths(&format!("{}/*.{}", escaped_dir(dir), ext))?;
    if !any_ext.is_empty() {
        debug!(
            "No '{}-N.{}' panels in {}; using {} file(s) with matching extension",
            base,
            ext,
            dir.display(),
            any_ext.len()
        );
        any_ext.sort();
        return Ok(any_ext);
    }

    let single = dir.join(format!("{}.{}", base, ext));
    if single.is_file() {
        return Ok(vec![single]);
    }

    Err(PanelError::NoPanelFiles(dir.display().to_string()))
}

/// Files matching `{base}-{index}.{ext}`, sorted by index
fn numbered_panels(dir: &Path, base: &str, ext: &str) -> Result<Vec<PathBuf>, PanelError> {
    let pattern = format!("{}/{}-*.{}", escaped_dir(dir), Pattern::escape(base), ext);
    let prefix = format!("{}-", base);

    let mut indexed: Vec<(usize, PathBuf)> = glob_paths(&pattern)?
        .into_iter()
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?;
            let index = stem.strip_prefix(&prefix)?.parse::<usize>().ok()?;
            Some((index, path))
        })
        .collect();

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, path)| path).collect())
}

fn glob_paths(pattern: &str) -> Result<Vec<PathBuf>, PanelError> {
    let entries = glob(pattern).map_err(|e| PanelError::Pattern(e.to_string()))?;
    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => debug!("Skipping unreadable glob entry: {}", e),
        }
    }
    Ok(paths)
}

fn escaped_dir(dir: &Path) -> String {
    Pattern::escape(&dir.to_string_lossy())
}
