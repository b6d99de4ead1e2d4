//! Error taxonomy for parsing, validation and rendering

use rulebook_types::BlockKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status of a compile operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompileStatus {
    Success,
    Error,
}

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Error,
    Warning,
}

/// What went wrong, independent of where
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ErrorKind {
    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("unknown impact level `{0}`")]
    UnknownImpactLevel(String),

    #[error("malformed metadata block: {0}")]
    MalformedMetadata(String),

    #[error("file is not valid UTF-8")]
    InvalidEncoding,

    #[error("duplicate section id `{0}`")]
    DuplicateSectionId(String),

    #[error("manifest declares no sections")]
    EmptyManifest,

    #[error("section `{section}` references unknown rule `{rule}`")]
    DanglingRuleReference { section: String, rule: String },

    #[error("rule `{rule}` is not assigned to any section")]
    UnassignedRule { rule: String },

    #[error("rule `{rule}` is assigned to more than one section ({})", .sections.join(", "))]
    MultiplyAssignedRule { rule: String, sections: Vec<String> },

    #[error("section `{section}` has more than one rule titled \"{title}\"")]
    DuplicateRuleTitle { section: String, title: String },

    #[error("rule id `{0}` is defined by more than one file")]
    DuplicateRuleId(String),

    #[error("link to unknown anchor `#{target}`")]
    BrokenCrossReference { target: String },

    #[error("lead heading \"{heading}\" of rule `{rule}` does not match its title")]
    LeadHeadingMismatch { rule: String, heading: String },

    #[error("cannot render body block of kind `{0}`")]
    UnrenderableBlock(String),
}

impl ErrorKind {
    /// Stable snake_case code for reports
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::MissingField(_) => "missing_field",
            ErrorKind::UnknownImpactLevel(_) => "unknown_impact_level",
            ErrorKind::MalformedMetadata(_) => "malformed_metadata",
            ErrorKind::InvalidEncoding => "invalid_encoding",
            ErrorKind::DuplicateSectionId(_) => "duplicate_section_id",
            ErrorKind::EmptyManifest => "empty_manifest",
            ErrorKind::DanglingRuleReference { .. } => "dangling_rule_reference",
            ErrorKind::UnassignedRule { .. } => "unassigned_rule",
            ErrorKind::MultiplyAssignedRule { .. } => "multiply_assigned_rule",
            ErrorKind::DuplicateRuleTitle { .. } => "duplicate_rule_title",
            ErrorKind::DuplicateRuleId(_) => "duplicate_rule_id",
            ErrorKind::BrokenCrossReference { .. } => "broken_cross_reference",
            ErrorKind::LeadHeadingMismatch { .. } => "lead_heading_mismatch",
            ErrorKind::UnrenderableBlock(_) => "unrenderable_block",
        }
    }

    /// Broken cross-references and mismatched lead headings are warnings
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorKind::BrokenCrossReference { .. } | ErrorKind::LeadHeadingMismatch { .. } => {
                ErrorSeverity::Warning
            }
            _ => ErrorSeverity::Error,
        }
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(":{}", l)).unwrap_or_default()
}

/// A rule file or manifest that could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{path}{}: {kind}", line_suffix(.line))]
pub struct ParseError {
    pub path: String,
    /// 1-based line in the source, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub kind: ErrorKind,
}

impl ParseError {
    pub fn new(path: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            path: path.into(),
            line: None,
            kind,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// A structural inconsistency between rules and sections
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}")]
pub struct ValidationError {
    pub kind: ErrorKind,
    /// Files involved, sorted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl ValidationError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            sources: Vec::new(),
        }
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self.sources.sort();
        self
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.kind.severity()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == ErrorSeverity::Error
    }
}

/// Rendering failures. These indicate a parser/renderer mismatch rather
/// than bad input, so they always abort.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("rule `{rule}`: cannot render body block of kind `{kind}`")]
    UnrenderableBlock { rule: String, kind: BlockKind },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("output is not valid UTF-8: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl RenderError {
    /// The taxonomy kind, where one applies
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            RenderError::UnrenderableBlock { kind, .. } => {
                Some(ErrorKind::UnrenderableBlock(kind.to_string()))
            }
            _ => None,
        }
    }
}

/// Failures of the engine itself, as opposed to findings about the input
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A user-facing finding with enough context to locate the problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Human-readable message
    pub message: String,
    /// Stable error code (see [`ErrorKind::code`])
    pub code: String,
    /// Originating file(s)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    /// Line number (1-indexed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Helpful hint for fixing the problem
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub severity: ErrorSeverity,
}

impl Diagnostic {
    pub fn new(kind: &ErrorKind) -> Self {
        Self {
            message: kind.to_string(),
            code: kind.code().to_string(),
            files: Vec::new(),
            line: None,
            hint: None,
            severity: kind.severity(),
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.files.push(file.into());
        self
    }

    /// Set the location
    pub fn with_location(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Set a hint
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// `file:line` for the first file, if any
    pub fn location(&self) -> Option<String> {
        let file = self.files.first()?;
        Some(format!("{}{}", file, line_suffix(&self.line)))
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            ErrorSeverity::Error => "error",
            ErrorSeverity::Warning => "warning",
        };
        write!(f, "{}[{}]: ", label, self.code)?;
        if let Some(location) = self.location() {
            write!(f, "{}: ", location)?;
        }
        f.write_str(&self.message)?;
        if self.files.len() > 1 {
            write!(f, " (files: {})", self.files.join(", "))?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

fn hint_for(kind: &ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::UnknownImpactLevel(_) => {
            Some("use one of CRITICAL, HIGH, MEDIUM-HIGH, MEDIUM, LOW-MEDIUM, LOW")
        }
        ErrorKind::MalformedMetadata(_) => {
            Some("rule files start with a `---` line and close the metadata with another `---`")
        }
        ErrorKind::UnassignedRule { .. } => {
            Some("list the rule under `**Rules:**` or name the file after a section prefix")
        }
        ErrorKind::DanglingRuleReference { .. } => {
            Some("check the rule file name; identifiers are file names without `.md`")
        }
        ErrorKind::LeadHeadingMismatch { .. } => {
            Some("the `## ` heading is replaced by the title on output; make them agree or drop it")
        }
        ErrorKind::InvalidEncoding => Some("re-save the file as UTF-8"),
        _ => None,
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(err: &ParseError) -> Self {
        let mut diagnostic = Diagnostic::new(&err.kind).with_file(err.path.clone());
        if let Some(line) = err.line {
            diagnostic = diagnostic.with_location(line);
        }
        if let Some(hint) = hint_for(&err.kind) {
            diagnostic = diagnostic.with_hint(hint);
        }
        diagnostic
    }
}

impl From<&ValidationError> for Diagnostic {
    fn from(err: &ValidationError) -> Self {
        let mut diagnostic = Diagnostic::new(&err.kind);
        diagnostic.files = err.sources.clone();
        if let Some(hint) = hint_for(&err.kind) {
            diagnostic = diagnostic.with_hint(hint);
        }
        diagnostic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_includes_location() {
        let err = ParseError::new(
            "rules/x.md",
            ErrorKind::UnknownImpactLevel("SUPER-HIGH".to_string()),
        )
        .at_line(3);
        assert_eq!(err.to_string(), "rules/x.md:3: unknown impact level `SUPER-HIGH`");
    }

    #[test]
    fn test_warning_class_kinds() {
        let warning = ErrorKind::BrokenCrossReference {
            target: "nowhere".to_string(),
        };
        assert_eq!(warning.severity(), ErrorSeverity::Warning);
        let mismatch = ErrorKind::LeadHeadingMismatch {
            rule: "a".to_string(),
            heading: "Use X.".to_string(),
        };
        assert_eq!(mismatch.severity(), ErrorSeverity::Warning);
        assert_eq!(ErrorKind::InvalidEncoding.severity(), ErrorSeverity::Error);
        assert_eq!(
            ErrorKind::UnassignedRule {
                rule: "a".to_string()
            }
            .severity(),
            ErrorSeverity::Error
        );
    }

    #[test]
    fn test_diagnostic_display_lists_all_files() {
        let err = ValidationError::new(ErrorKind::DuplicateRuleTitle {
            section: "async".to_string(),
            title: "Use X".to_string(),
        })
        .with_sources(["rules/b.md", "rules/a.md"]);
        let text = Diagnostic::from(&err).to_string();
        assert!(text.starts_with("error[duplicate_rule_title]: rules/a.md: "));
        assert!(text.contains("rules/a.md, rules/b.md"));
    }

    #[test]
    fn test_error_kind_serializes_with_detail() {
        let kind = ErrorKind::UnknownImpactLevel("SUPER-HIGH".to_string());
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["kind"], "unknown_impact_level");
        assert_eq!(json["detail"], "SUPER-HIGH");
    }
}
