//! Subcommand implementations. Each returns `Ok(true)` when the run
//! succeeded and `Ok(false)` when it reported problems.

use anyhow::{bail, Context, Result};
use rulebook_engine::compiler::errors::EngineError;
use rulebook_engine::{CompileRequest, CompileResponse, Diagnostic, OutputFormat};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::loader::{load_manifest, load_rule_sources};
use crate::report;

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub rules: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: Option<OutputFormat>,
}

impl Overrides {
    pub fn apply(self, config: &mut Config) {
        if let Some(rules) = self.rules {
            config.compile.rules_dir = rules;
        }
        if let Some(manifest) = self.manifest {
            config.compile.manifest = Some(manifest);
        }
        if let Some(output) = self.output {
            config.compile.output = Some(output);
        }
        if let Some(format) = self.format {
            config.compile.format = format;
        }
    }
}

pub fn build_request(config: &Config) -> Result<CompileRequest> {
    let compile = &config.compile;
    let files = load_rule_sources(&compile.rules_dir, &compile.ignore_prefix)?;
    Ok(CompileRequest {
        rules: files.sources,
        unreadable: files.unreadable,
        manifest: load_manifest(&compile.manifest_path())?,
        meta: config.document.clone(),
        format: compile.format,
    })
}

fn run_compile(config: &Config) -> Result<CompileResponse> {
    let request = build_request(config)?;
    let response = rulebook_engine::compile(&request).context("Compilation aborted")?;
    report::report(&response)?;
    Ok(response)
}

/// Compile and write the document to the configured output or stdout
pub fn compile(config: &Config) -> Result<bool> {
    let response = run_compile(config)?;
    let Some(output) = response.output.as_deref() else {
        return Ok(false);
    };
    write_output(config.compile.output.as_deref(), output)?;
    Ok(true)
}

/// Run every check without producing output
pub fn validate(config: &Config) -> Result<bool> {
    let request = build_request(config)?;
    let response = rulebook_engine::validate(&request);
    report::report(&response)?;
    Ok(response.is_success())
}

/// Compile and compare with the file already on disk
pub fn check(config: &Config) -> Result<bool> {
    let Some(path) = config.compile.output.as_deref() else {
        bail!("check needs an output file (--output or [compile] output)");
    };
    let response = run_compile(config)?;
    let Some(fresh) = response.output.as_deref() else {
        return Ok(false);
    };

    let current = match fs::read_to_string(path) {
        Ok(current) => current,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            eprintln!("{} does not exist; run `rulebook compile`", path.display());
            return Ok(false);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    if current == fresh {
        tracing::info!("{} is up to date", path.display());
        Ok(true)
    } else {
        eprintln!("{} is out of date; run `rulebook compile`", path.display());
        Ok(false)
    }
}

/// Render a JSON document to markdown
pub fn render(input: &Path, output: Option<&Path>) -> Result<bool> {
    let json = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    match rulebook_engine::render_json(&json, OutputFormat::Markdown) {
        Ok(markdown) => {
            write_output(output, &markdown)?;
            Ok(true)
        }
        Err(EngineError::Render(err)) => match err.kind() {
            Some(kind) => {
                let diagnostic = Diagnostic::new(&kind).with_file(input.display().to_string());
                eprintln!("{}", diagnostic);
                eprintln!("  {}", err);
                Ok(false)
            }
            None => Err(err).with_context(|| format!("Failed to render {}", input.display())),
        },
        Err(err) => {
            Err(err).with_context(|| format!("Invalid compiled document: {}", input.display()))
        }
    }
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(text.as_bytes())?;
            handle.flush()?;
        }
    }
    Ok(())
}
