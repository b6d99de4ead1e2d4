//! Rule document parser
//!
//! Turns the raw text of one rule file into a [`RuleRecord`]: metadata
//! from the `---` block, the authoring lead, and the body as an opaque
//! block sequence. Parsing is a pure function of the input, so a batch
//! of files is parsed on the rayon pool.

pub mod blocks;
pub mod frontmatter;

use std::collections::BTreeSet;
use std::path::Path;

use rayon::prelude::*;
use rulebook_types::{Body, Impact, RuleRecord};
use serde::{Deserialize, Serialize};

use crate::compiler::errors::{ErrorKind, ParseError};
use crate::patterns::{KEY_IMPACT, KEY_IMPACT_DESCRIPTION, KEY_TAGS, KEY_TITLE};

/// Raw contents of one rule file, as supplied by the loader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSource {
    pub path: String,
    pub text: String,
}

impl RuleSource {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Identifier derived from the file name (`rules/async-parallel.md` →
    /// `async-parallel`)
    pub fn rule_id(&self) -> String {
        rule_id_from_path(&self.path)
    }
}

pub fn rule_id_from_path(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Outcome of parsing a batch: successes and failures, both in input order
#[derive(Debug, Default)]
pub struct ParsedRules {
    pub records: Vec<RuleRecord>,
    pub errors: Vec<ParseError>,
}

impl ParsedRules {
    /// Ids of the files that failed to parse
    pub fn failed_ids(&self) -> BTreeSet<String> {
        self.errors
            .iter()
            .map(|err| rule_id_from_path(&err.path))
            .collect()
    }
}

/// Rule document parser
pub struct RuleParser;

impl RuleParser {
    /// Parse one rule file
    pub fn parse(source: &RuleSource) -> Result<RuleRecord, ParseError> {
        let fail = |kind: ErrorKind, line: usize| ParseError::new(&source.path, kind).at_line(line);

        let fm = frontmatter::split(&source.text).map_err(|(kind, line)| fail(kind, line))?;

        let title = fm
            .get(KEY_TITLE)
            .map(|f| f.value.trim())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| fail(ErrorKind::MissingField(KEY_TITLE.to_string()), 1))?
            .to_string();

        let impact_field = fm
            .get(KEY_IMPACT)
            .filter(|f| !f.value.trim().is_empty())
            .ok_or_else(|| fail(ErrorKind::MissingField(KEY_IMPACT.to_string()), 1))?;
        let impact: Impact = impact_field.value.parse().map_err(|_| {
            fail(
                ErrorKind::UnknownImpactLevel(impact_field.value.trim().to_string()),
                impact_field.line,
            )
        })?;

        let impact_description = KEY_IMPACT_DESCRIPTION
            .iter()
            .find_map(|key| fm.get(key))
            .map(|f| f.value.trim().to_string())
            .filter(|v| !v.is_empty());

        let tags = fm.get(KEY_TAGS).map(|f| parse_tags(&f.value)).unwrap_or_default();

        for field in &fm.fields {
            let known = field.key == KEY_TITLE
                || field.key == KEY_IMPACT
                || field.key == KEY_TAGS
                || KEY_IMPACT_DESCRIPTION.contains(&field.key.as_str());
            if !known {
                tracing::debug!(
                    "{}:{}: ignoring metadata key `{}`",
                    source.path,
                    field.line,
                    field.key
                );
            }
        }

        let (lead, body) = blocks::split_lead(fm.rest);

        Ok(RuleRecord {
            id: source.rule_id(),
            source_path: source.path.clone(),
            title,
            impact,
            impact_description,
            tags,
            lead: lead.to_string(),
            body: Body::new(blocks::split_blocks(body)),
        })
    }

    /// Parse every source in parallel. A failing file never stops the
    /// others; results keep the input order.
    pub fn parse_all(sources: &[RuleSource]) -> ParsedRules {
        let results: Vec<Result<RuleRecord, ParseError>> =
            sources.par_iter().map(Self::parse).collect();

        let mut parsed = ParsedRules::default();
        for result in results {
            match result {
                Ok(record) => {
                    tracing::debug!(
                        "Parsed rule {} ({} blocks)",
                        record.id,
                        record.body.blocks().len()
                    );
                    parsed.records.push(record);
                }
                Err(err) => parsed.errors.push(err),
            }
        }
        parsed
    }
}

/// Comma separated, optionally bracketed; trimmed, empties dropped,
/// duplicates removed case-sensitively
fn parse_tags(raw: &str) -> BTreeSet<String> {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .unwrap_or(raw);
    raw.split(',')
        .map(|tag| tag.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
