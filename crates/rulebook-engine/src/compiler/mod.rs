//! The compile pipeline: parse, load, bind, validate, aggregate, render

pub mod aggregate;
pub mod errors;
pub mod output;
pub mod render;

pub use aggregate::Aggregator;
pub use errors::{
    CompileStatus, Diagnostic, EngineError, ErrorKind, ErrorSeverity, ParseError, RenderError,
    ValidationError,
};
pub use output::OutputFormat;
pub use render::{render_document, render_to_string, write_markdown};

use rulebook_types::{CompiledDocument, DocumentMeta, RuleRecord, Section};
use serde::{Deserialize, Serialize};

use crate::manifest::{bind_rules, ManifestLoader};
use crate::parser::{rule_id_from_path, RuleParser, RuleSource};
use crate::verifier::{check_cross_references, ValidationReport, Validator};

/// The section manifest, as read by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSource {
    pub path: String,
    pub text: String,
}

impl ManifestSource {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Request to compile a rulebook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileRequest {
    /// Rule files, in any order
    pub rules: Vec<RuleSource>,
    /// Rule files the caller found but could not read as text
    #[serde(default)]
    pub unreadable: Vec<ParseError>,
    pub manifest: ManifestSource,
    #[serde(default)]
    pub meta: DocumentMeta,
    #[serde(default)]
    pub format: OutputFormat,
}

/// Response from compiling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResponse {
    pub status: CompileStatus,
    /// Rendered output; only present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<CompiledDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Diagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Diagnostic>,
}

impl CompileResponse {
    pub fn is_success(&self) -> bool {
        self.status == CompileStatus::Success
    }

    fn failed(errors: Vec<Diagnostic>, warnings: Vec<Diagnostic>) -> Self {
        Self {
            status: CompileStatus::Error,
            output: None,
            document: None,
            errors,
            warnings,
        }
    }
}

/// Everything learned before aggregation
struct Analysis {
    records: Vec<RuleRecord>,
    sections: Vec<Section>,
    errors: Vec<Diagnostic>,
    report: ValidationReport,
}

impl Analysis {
    fn is_fatal(&self) -> bool {
        !self.errors.is_empty() || self.report.is_fatal()
    }

    /// Parse and load errors first, then validation findings
    fn into_failure(mut self) -> CompileResponse {
        let (fatal, warnings) = self.report.diagnostics();
        self.errors.extend(fatal);
        CompileResponse::failed(self.errors, warnings)
    }
}

fn analyze(request: &CompileRequest) -> Analysis {
    let mut sources = request.rules.clone();
    sources.sort_by(|a, b| a.path.cmp(&b.path));

    let parsed = RuleParser::parse_all(&sources);
    let mut unreadable = request.unreadable.clone();
    unreadable.sort_by(|a, b| a.path.cmp(&b.path));
    let mut errors: Vec<Diagnostic> = unreadable
        .iter()
        .chain(parsed.errors.iter())
        .map(Diagnostic::from)
        .collect();

    let manifest = &request.manifest;
    let sections = match ManifestLoader::load(&manifest.path, &manifest.text) {
        Ok(sections) => bind_rules(&sections, &parsed.records),
        Err(manifest_errors) => {
            errors.extend(manifest_errors.iter().map(Diagnostic::from));
            // Without sections every rule would be reported as unassigned
            tracing::warn!("Manifest {} failed to load, skipping validation", manifest.path);
            return Analysis {
                records: parsed.records,
                sections: Vec::new(),
                errors,
                report: ValidationReport::default(),
            };
        }
    };

    let report = Validator::new()
        .with_manifest_path(manifest.path.clone())
        .with_excluded(
            parsed
                .failed_ids()
                .into_iter()
                .chain(unreadable.iter().map(|err| rule_id_from_path(&err.path)))
                .collect(),
        )
        .validate(&sections, &parsed.records);

    Analysis {
        records: parsed.records,
        sections,
        errors,
        report,
    }
}

/// Compile rule files and a manifest into one document.
///
/// Problems with the input come back as diagnostics in an `Error`
/// response, all of them at once. `Err` is reserved for failures of the
/// renderer itself.
pub fn compile(request: &CompileRequest) -> Result<CompileResponse, EngineError> {
    let analysis = analyze(request);
    if analysis.is_fatal() {
        tracing::info!(
            "Compilation failed with {} errors",
            analysis.errors.len() + analysis.report.fatal.len()
        );
        return Ok(analysis.into_failure());
    }

    let Analysis {
        records,
        sections,
        mut report,
        ..
    } = analysis;

    let document = Aggregator::aggregate(&request.meta, &sections, &records);
    report.extend(check_cross_references(&document));

    let output = render_document(&document, request.format)?;
    let (_, warnings) = report.diagnostics();

    tracing::info!(
        "Compiled {} sections, {} rules ({} warnings)",
        document.sections().len(),
        document.rule_count(),
        warnings.len()
    );

    Ok(CompileResponse {
        status: CompileStatus::Success,
        output: Some(output),
        document: Some(document),
        errors: Vec::new(),
        warnings,
    })
}

/// Run every check without rendering
pub fn validate(request: &CompileRequest) -> CompileResponse {
    let analysis = analyze(request);
    if analysis.is_fatal() {
        return analysis.into_failure();
    }

    let Analysis {
        records,
        sections,
        mut report,
        ..
    } = analysis;

    let document = Aggregator::aggregate(&request.meta, &sections, &records);
    report.extend(check_cross_references(&document));
    let (_, warnings) = report.diagnostics();

    CompileResponse {
        status: CompileStatus::Success,
        output: None,
        document: Some(document),
        errors: Vec::new(),
        warnings,
    }
}

/// Render a document previously compiled to JSON
pub fn render_json(json: &str, format: OutputFormat) -> Result<String, EngineError> {
    let document: CompiledDocument = serde_json::from_str(json)?;
    Ok(render_document(&document, format)?)
}
