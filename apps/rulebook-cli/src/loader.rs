//! Reading rule files and the manifest from disk

use anyhow::{Context, Result};
use rulebook_engine::compiler::{ErrorKind, ParseError};
use rulebook_engine::{ManifestSource, RuleSource};
use std::fs;
use std::path::Path;

/// Rule files found in the rules directory
#[derive(Debug, Default)]
pub struct RuleFiles {
    pub sources: Vec<RuleSource>,
    /// Files that are not UTF-8; reported next to the engine's findings
    pub unreadable: Vec<ParseError>,
}

/// Every `.md` file directly inside `dir`, skipping names that start with
/// `ignore_prefix`. Sorted by path.
pub fn load_rule_sources(dir: &Path, ignore_prefix: &str) -> Result<RuleFiles> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read rules directory: {}", dir.display()))?;

    let mut files = RuleFiles::default();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let name = entry.file_name();
        if !ignore_prefix.is_empty() && name.to_string_lossy().starts_with(ignore_prefix) {
            tracing::debug!("Skipping {}", path.display());
            continue;
        }

        let bytes = fs::read(&path)
            .with_context(|| format!("Failed to read rule file: {}", path.display()))?;
        let display_path = path.display().to_string();
        match String::from_utf8(bytes) {
            Ok(text) => files.sources.push(RuleSource::new(display_path, text)),
            Err(err) => {
                tracing::debug!("{} is not UTF-8: {}", display_path, err.utf8_error());
                files
                    .unreadable
                    .push(ParseError::new(display_path, ErrorKind::InvalidEncoding));
            }
        }
    }

    files.sources.sort_by(|a, b| a.path.cmp(&b.path));
    files.unreadable.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::info!(
        "Loaded {} rule files from {} ({} unreadable)",
        files.sources.len(),
        dir.display(),
        files.unreadable.len()
    );
    Ok(files)
}

pub fn load_manifest(path: &Path) -> Result<ManifestSource> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    Ok(ManifestSource::new(path.display().to_string(), text))
}
