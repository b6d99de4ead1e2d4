//! Core rendering logic
//!
//! Turns a [`CompiledDocument`] into its final text. Markdown output puts
//! an explicit `<a id>` before every heading so links keep working on
//! renderers that slug headings differently. Rule bodies are written
//! byte-for-byte as parsed.

use std::io::Write;

use rulebook_types::{BlockKind, CompiledDocument, DocumentMeta, TocEntry};

use super::errors::RenderError;
use super::output::OutputFormat;

/// Render a compiled document in the requested format
pub fn render_document(doc: &CompiledDocument, format: OutputFormat) -> Result<String, RenderError> {
    match format {
        OutputFormat::Markdown => render_to_string(doc),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(doc)?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Render markdown into a fresh string
pub fn render_to_string(doc: &CompiledDocument) -> Result<String, RenderError> {
    let mut buffer = Vec::new();
    write_markdown(doc, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Check every block kind before any output is produced, so a failure
/// never leaves a half-written document behind.
pub fn ensure_renderable(doc: &CompiledDocument) -> Result<(), RenderError> {
    for rule in doc.rules() {
        if let Some(block) = rule
            .record
            .body
            .blocks()
            .iter()
            .find(|b| b.kind == BlockKind::Unknown)
        {
            return Err(RenderError::UnrenderableBlock {
                rule: rule.record.id.clone(),
                kind: block.kind,
            });
        }
    }
    Ok(())
}

/// Write the markdown rendering of `doc` to `out`
pub fn write_markdown<W: Write>(doc: &CompiledDocument, out: &mut W) -> Result<(), RenderError> {
    ensure_renderable(doc)?;

    write_header(doc.meta(), out)?;
    write_toc(doc.toc(), out)?;

    for compiled in doc.sections() {
        let section = &compiled.section;
        writeln!(out, "<a id=\"{}\"></a>", compiled.anchor)?;
        writeln!(out)?;
        writeln!(out, "## {}. {}", section.number(), section.display_name)?;
        writeln!(out)?;
        writeln!(out, "**Impact: {}**", section.impact)?;
        writeln!(out)?;
        let description = section.description.trim();
        if !description.is_empty() {
            writeln!(out, "{}", description)?;
            writeln!(out)?;
        }

        for rule in &compiled.rules {
            writeln!(out, "<a id=\"{}\"></a>", rule.anchor)?;
            writeln!(out)?;
            writeln!(out, "### {} {}", rule.number, rule.record.title)?;
            writeln!(out)?;
            writeln!(out, "**Impact: {}**", rule.record.impact_annotation())?;
            writeln!(out)?;

            let body = rule.record.body.to_text();
            if !body.is_empty() {
                out.write_all(body.as_bytes())?;
                if !body.ends_with('\n') {
                    writeln!(out)?;
                }
                writeln!(out)?;
            }
        }

        writeln!(out, "---")?;
        writeln!(out)?;
    }

    write_references(doc.meta(), out)?;
    Ok(())
}

fn write_header<W: Write>(meta: &DocumentMeta, out: &mut W) -> Result<(), RenderError> {
    writeln!(out, "# {}", meta.title)?;
    writeln!(out)?;

    let mut byline = Vec::new();
    if let Some(version) = &meta.version {
        byline.push(format!("**Version {}**", version));
    }
    if let Some(organization) = &meta.organization {
        byline.push(organization.clone());
    }
    if let Some(date) = meta.date {
        byline.push(date.format("%B %Y").to_string());
    }
    if !byline.is_empty() {
        // Two trailing spaces force a markdown line break
        writeln!(out, "{}", byline.join("  \n"))?;
        writeln!(out)?;
    }

    if let Some(note) = &meta.note {
        writeln!(out, "> **Note:**  ")?;
        for line in note.trim().lines() {
            if line.trim().is_empty() {
                writeln!(out, ">")?;
            } else {
                writeln!(out, "> {}", line)?;
            }
        }
        writeln!(out)?;
    }

    writeln!(out, "---")?;
    writeln!(out)?;

    if let Some(abstract_text) = &meta.abstract_text {
        writeln!(out, "## Abstract")?;
        writeln!(out)?;
        writeln!(out, "{}", abstract_text.trim())?;
        writeln!(out)?;
        writeln!(out, "---")?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_toc<W: Write>(toc: &[TocEntry], out: &mut W) -> Result<(), RenderError> {
    writeln!(out, "## Table of Contents")?;
    writeln!(out)?;
    for entry in toc {
        let link = format!("[{}](#{})", escape_label(&entry.label), entry.anchor);
        if entry.depth <= 1 {
            match entry.impact {
                Some(impact) => writeln!(out, "{}. {} — **{}**", entry.number, link, impact)?,
                None => writeln!(out, "{}. {}", entry.number, link)?,
            }
        } else {
            let indent = "   ".repeat(usize::from(entry.depth - 1));
            writeln!(out, "{}- {} {}", indent, entry.number, link)?;
        }
    }
    writeln!(out)?;
    writeln!(out, "---")?;
    writeln!(out)?;
    Ok(())
}

fn write_references<W: Write>(meta: &DocumentMeta, out: &mut W) -> Result<(), RenderError> {
    if meta.references.is_empty() {
        return Ok(());
    }
    writeln!(out, "## References")?;
    writeln!(out)?;
    for (i, reference) in meta.references.iter().enumerate() {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            writeln!(out, "{}. [{}]({})", i + 1, reference, reference)?;
        } else {
            writeln!(out, "{}. {}", i + 1, reference)?;
        }
    }
    Ok(())
}

/// Brackets in a title would close the link label early
fn escape_label(label: &str) -> String {
    label.replace('[', "\\[").replace(']', "\\]")
}
