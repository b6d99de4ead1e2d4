//! Printing diagnostics for humans

use std::io::{self, Write};

use rulebook_engine::{CompileResponse, Diagnostic};

/// Write every error, then every warning, then a one-line summary
pub fn write_diagnostics<W: Write>(response: &CompileResponse, out: &mut W) -> io::Result<()> {
    for diagnostic in response.errors.iter().chain(response.warnings.iter()) {
        writeln!(out, "{}", diagnostic)?;
    }
    writeln!(out, "{}", summary(&response.errors, &response.warnings))
}

pub fn summary(errors: &[Diagnostic], warnings: &[Diagnostic]) -> String {
    let status = if errors.is_empty() { "ok" } else { "failed" };
    format!(
        "{}: {} {}, {} {}",
        status,
        errors.len(),
        plural(errors.len(), "error"),
        warnings.len(),
        plural(warnings.len(), "warning")
    )
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

/// Diagnostics go to stderr; stdout may carry the document
pub fn report(response: &CompileResponse) -> io::Result<()> {
    let stderr = io::stderr();
    let mut handle = stderr.lock();
    write_diagnostics(response, &mut handle)?;
    handle.flush()
}
