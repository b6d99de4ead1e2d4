//! Section manifest loader
//!
//! The manifest is a markdown file. Everything before the first `## `
//! heading is introduction and ignored. Each section looks like:
//!
//! ```text
//! ## 1. Eliminating Waterfalls (async)
//!
//! **Impact:** CRITICAL
//! **Description:** Waterfalls are the #1 performance killer.
//! **Rules:** async-defer-await, async-parallel
//! **Prefixes:** async
//! ```
//!
//! The leading number is cosmetic: `order` comes from position. `Rules`
//! and `Prefixes` are optional; without either, rules bind by the
//! `<id>-` file-name prefix.

pub mod binding;

pub use binding::bind_rules;

use std::collections::HashSet;

use rulebook_types::{Impact, Section, SectionBinding};

use crate::compiler::errors::{ErrorKind, ParseError};
use crate::patterns::{MANIFEST_FIELD, SECTION_HEADING};

/// A section as it is being read, before validation
struct Draft {
    line: usize,
    id: Option<String>,
    display_name: String,
    impact: Option<(String, usize)>,
    description: Vec<String>,
    rules: Vec<String>,
    prefixes: Vec<String>,
    /// Last field seen; continuation lines append to it
    continuing_description: bool,
}

impl Draft {
    fn new(line: usize, display_name: String, id: Option<String>) -> Self {
        Self {
            line,
            id,
            display_name,
            impact: None,
            description: Vec::new(),
            rules: Vec::new(),
            prefixes: Vec::new(),
            continuing_description: false,
        }
    }
}

/// Section manifest loader
pub struct ManifestLoader;

impl ManifestLoader {
    /// Parse manifest text into sections ordered by position.
    ///
    /// `rule_refs` is left empty; see [`bind_rules`]. All problems are
    /// collected rather than stopping at the first.
    pub fn load(path: &str, text: &str) -> Result<Vec<Section>, Vec<ParseError>> {
        let mut drafts: Vec<Draft> = Vec::new();

        for (idx, raw_line) in text.lines().enumerate() {
            let line_num = idx + 1;
            let line = raw_line.trim();

            if line.starts_with("## ") {
                let (name, id) = match SECTION_HEADING.captures(line) {
                    Some(caps) => (
                        caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
                        caps.get(2).map(|m| m.as_str().to_string()),
                    ),
                    None => (line.trim_start_matches('#').trim().to_string(), None),
                };
                drafts.push(Draft::new(line_num, name, id));
                continue;
            }

            let Some(draft) = drafts.last_mut() else {
                continue;
            };

            if line.is_empty() || line.starts_with('#') || line == "---" {
                draft.continuing_description = false;
                continue;
            }

            match MANIFEST_FIELD.captures(line) {
                Some(caps) => {
                    let key = caps[1].trim().to_ascii_lowercase();
                    let value = caps[2].to_string();
                    draft.continuing_description = false;
                    match key.as_str() {
                        "impact" => draft.impact = Some((value, line_num)),
                        "description" => {
                            draft.description = vec![value];
                            draft.continuing_description = true;
                        }
                        "rules" => draft.rules.extend(split_list(&value)),
                        "prefixes" | "prefix" => draft.prefixes.extend(split_list(&value)),
                        other => {
                            tracing::debug!("{}:{}: ignoring manifest field `{}`", path, line_num, other)
                        }
                    }
                }
                None if draft.continuing_description => draft.description.push(line.to_string()),
                None => {
                    tracing::debug!("{}:{}: ignoring manifest line", path, line_num);
                }
            }
        }

        if drafts.is_empty() {
            return Err(vec![ParseError::new(path, ErrorKind::EmptyManifest)]);
        }

        let mut errors = Vec::new();
        let mut sections = Vec::new();
        let mut seen_ids: HashSet<String> = HashSet::new();

        for (order, draft) in drafts.into_iter().enumerate() {
            let Some(id) = draft.id else {
                errors.push(
                    ParseError::new(path, ErrorKind::MissingField("id".to_string()))
                        .at_line(draft.line),
                );
                continue;
            };
            if !seen_ids.insert(id.clone()) {
                errors.push(
                    ParseError::new(path, ErrorKind::DuplicateSectionId(id)).at_line(draft.line),
                );
                continue;
            }
            if draft.display_name.is_empty() {
                errors.push(
                    ParseError::new(path, ErrorKind::MissingField("displayName".to_string()))
                        .at_line(draft.line),
                );
                continue;
            }
            let impact = match &draft.impact {
                None => {
                    errors.push(
                        ParseError::new(path, ErrorKind::MissingField("impact".to_string()))
                            .at_line(draft.line),
                    );
                    continue;
                }
                Some((literal, line)) => match literal.parse::<Impact>() {
                    Ok(impact) => impact,
                    Err(_) => {
                        errors.push(
                            ParseError::new(
                                path,
                                ErrorKind::UnknownImpactLevel(literal.trim().to_string()),
                            )
                            .at_line(*line),
                        );
                        continue;
                    }
                },
            };

            let prefixes = if draft.prefixes.is_empty() && draft.rules.is_empty() {
                vec![id.clone()]
            } else {
                draft.prefixes
            };

            sections.push(Section {
                id,
                order,
                display_name: draft.display_name,
                impact,
                description: draft.description.join(" "),
                rule_refs: Vec::new(),
                binding: SectionBinding {
                    rules: draft.rules,
                    prefixes,
                },
            });
        }

        if errors.is_empty() {
            tracing::debug!("Loaded {} sections from {}", sections.len(), path);
            Ok(sections)
        } else {
            Err(errors)
        }
    }
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(|item| item.trim().trim_matches('`').to_string())
        .filter(|item| !item.is_empty())
}
