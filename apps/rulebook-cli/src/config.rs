//! Configuration parsing for rulebook builds
//!
//! A `rulebook.toml` describes the document front matter and where the
//! inputs and output live:
//!
//! ```toml
//! [document]
//! title = "React Best Practices"
//! version = "1.0"
//! date = "2025-01-15"
//!
//! [compile]
//! rules_dir = "rules"
//! output = "AGENTS.md"
//! ```
//!
//! Every field is optional. Relative paths are resolved against the
//! directory holding the config file.

use anyhow::Context;
use rulebook_engine::OutputFormat;
use rulebook_types::DocumentMeta;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default manifest file name inside the rules directory
pub const DEFAULT_MANIFEST: &str = "_sections.md";

/// Main configuration structure loaded from TOML files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Title block and references
    #[serde(default)]
    pub document: DocumentMeta,
    /// Input and output locations
    #[serde(default)]
    pub compile: CompileConfig,
}

impl Config {
    /// Load configuration from a TOML file, resolving its paths
    /// relative to the file's directory
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.compile.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }
}

/// Where to read rules from and where to write the result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileConfig {
    /// Directory of rule files (default: `rules`)
    #[serde(default = "default_rules_dir")]
    pub rules_dir: PathBuf,
    /// Section manifest (default: `<rules_dir>/_sections.md`)
    #[serde(default)]
    pub manifest: Option<PathBuf>,
    /// Output file; stdout when unset
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub format: OutputFormat,
    /// Files whose name starts with this are not rules (default: `_`)
    #[serde(default = "default_ignore_prefix")]
    pub ignore_prefix: String,
}

fn default_rules_dir() -> PathBuf {
    PathBuf::from("rules")
}

fn default_ignore_prefix() -> String {
    "_".to_string()
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            rules_dir: default_rules_dir(),
            manifest: None,
            output: None,
            format: OutputFormat::default(),
            ignore_prefix: default_ignore_prefix(),
        }
    }
}

impl CompileConfig {
    pub fn manifest_path(&self) -> PathBuf {
        self.manifest
            .clone()
            .unwrap_or_else(|| self.rules_dir.join(DEFAULT_MANIFEST))
    }

    fn resolve_paths(&mut self, base: &Path) {
        self.rules_dir = resolve(base, &self.rules_dir);
        self.manifest = self.manifest.as_deref().map(|p| resolve(base, p));
        self.output = self.output.as_deref().map(|p| resolve(base, p));
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.document.title, "Rulebook");
        assert_eq!(config.compile.rules_dir, PathBuf::from("rules"));
        assert_eq!(config.compile.manifest_path(), PathBuf::from("rules/_sections.md"));
        assert_eq!(config.compile.ignore_prefix, "_");
        assert_eq!(config.compile.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
            [document]
            title = "React Best Practices"
            version = "1.0"
            organization = "Engineering"
            date = "2025-01-15"
            abstract = "Performance rules."
            references = ["https://react.dev"]

            [compile]
            rules_dir = "src/rules"
            manifest = "src/sections.md"
            format = "json"
        "#;
        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.document.date, NaiveDate::from_ymd_opt(2025, 1, 15));
        assert_eq!(config.document.abstract_text.as_deref(), Some("Performance rules."));
        assert_eq!(config.compile.format, OutputFormat::Json);
        assert_eq!(config.compile.manifest_path(), PathBuf::from("src/sections.md"));
    }

    #[test]
    fn test_bad_format_is_rejected() {
        assert!(Config::from_str("[compile]\nformat = \"pdf\"\n").is_err());
    }

    #[test]
    fn test_paths_resolve_against_config_dir() {
        let mut compile = CompileConfig {
            output: Some(PathBuf::from("out/AGENTS.md")),
            ..CompileConfig::default()
        };
        compile.resolve_paths(Path::new("/work/guide"));
        assert_eq!(compile.rules_dir, PathBuf::from("/work/guide/rules"));
        assert_eq!(compile.output, Some(PathBuf::from("/work/guide/out/AGENTS.md")));
        assert_eq!(
            compile.manifest_path(),
            PathBuf::from("/work/guide/rules/_sections.md")
        );
    }
}
