//! Structural validation of rules against the manifest
//!
//! Every check runs to completion and every finding is kept, so one run
//! reports all problems. Structural findings are fatal; mismatched lead
//! headings and broken cross-references (checked after aggregation, once
//! every anchor is known) are warnings.

pub mod xref;

pub use xref::check_cross_references;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rulebook_types::{RuleRecord, Section};
use serde::{Deserialize, Serialize};

use crate::compiler::errors::{Diagnostic, ErrorKind, ValidationError};
use crate::parser::blocks::lead_heading;

/// Findings from one validation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Structural problems; aggregation must not run while non-empty
    pub fatal: Vec<ValidationError>,
    /// Best-effort findings that do not block output
    pub warnings: Vec<ValidationError>,
}

/// Overall validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// No findings at all
    Valid,
    /// Only warnings
    ValidWithWarnings,
    /// At least one fatal finding
    Invalid,
}

impl ValidationReport {
    /// Route a finding by its severity
    pub fn push(&mut self, error: ValidationError) {
        if error.is_fatal() {
            self.fatal.push(error);
        } else {
            self.warnings.push(error);
        }
    }

    pub fn extend<I: IntoIterator<Item = ValidationError>>(&mut self, errors: I) {
        for error in errors {
            self.push(error);
        }
    }

    pub fn is_fatal(&self) -> bool {
        !self.fatal.is_empty()
    }

    pub fn status(&self) -> ValidationStatus {
        if !self.fatal.is_empty() {
            ValidationStatus::Invalid
        } else if !self.warnings.is_empty() {
            ValidationStatus::ValidWithWarnings
        } else {
            ValidationStatus::Valid
        }
    }

    pub fn diagnostics(&self) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
        (
            self.fatal.iter().map(Diagnostic::from).collect(),
            self.warnings.iter().map(Diagnostic::from).collect(),
        )
    }

    /// Plain-text summary
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Status: {:?}\n", self.status()));
        output.push_str(&format!(
            "Findings: {} fatal, {} warnings\n",
            self.fatal.len(),
            self.warnings.len()
        ));

        for error in self.fatal.iter().chain(self.warnings.iter()) {
            output.push_str(&format!("{}\n", Diagnostic::from(error)));
        }

        output
    }
}

/// Cross-checks parsed rules and bound sections
#[derive(Debug, Default)]
pub struct Validator {
    manifest_path: Option<String>,
    excluded: BTreeSet<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the manifest in findings that originate there
    pub fn with_manifest_path(mut self, path: impl Into<String>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    /// Rule ids whose files failed to parse; references to them were
    /// already reported and are not flagged again as dangling
    pub fn with_excluded(mut self, ids: BTreeSet<String>) -> Self {
        self.excluded = ids;
        self
    }

    /// Run every structural check. `sections` must already be bound.
    pub fn validate(&self, sections: &[Section], records: &[RuleRecord]) -> ValidationReport {
        let mut report = ValidationReport::default();

        let mut by_id: BTreeMap<&str, Vec<&RuleRecord>> = BTreeMap::new();
        for record in records {
            by_id.entry(record.id.as_str()).or_default().push(record);
        }

        report.extend(self.check_duplicate_ids(&by_id));
        report.extend(self.check_dangling_references(sections, &by_id));
        report.extend(self.check_assignment(sections, &by_id));
        report.extend(self.check_duplicate_titles(sections, &by_id));
        report.extend(self.check_lead_headings(records));

        tracing::info!(
            "Validated {} rules across {} sections: {} fatal, {} warnings",
            by_id.len(),
            sections.len(),
            report.fatal.len(),
            report.warnings.len()
        );
        report
    }

    fn manifest_sources(&self) -> Vec<String> {
        self.manifest_path.iter().cloned().collect()
    }

    fn check_duplicate_ids(&self, by_id: &BTreeMap<&str, Vec<&RuleRecord>>) -> Vec<ValidationError> {
        by_id
            .iter()
            .filter(|(_, records)| records.len() > 1)
            .map(|(id, records)| {
                ValidationError::new(ErrorKind::DuplicateRuleId(id.to_string()))
                    .with_sources(records.iter().map(|r| r.source_path.clone()))
            })
            .collect()
    }

    fn check_dangling_references(
        &self,
        sections: &[Section],
        by_id: &BTreeMap<&str, Vec<&RuleRecord>>,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for section in sections {
            let mut reported = BTreeSet::new();
            for rule in &section.rule_refs {
                if by_id.contains_key(rule.as_str()) || self.excluded.contains(rule) {
                    continue;
                }
                if reported.insert(rule.as_str()) {
                    errors.push(
                        ValidationError::new(ErrorKind::DanglingRuleReference {
                            section: section.id.clone(),
                            rule: rule.clone(),
                        })
                        .with_sources(self.manifest_sources()),
                    );
                }
            }
        }
        errors
    }

    fn check_assignment(
        &self,
        sections: &[Section],
        by_id: &BTreeMap<&str, Vec<&RuleRecord>>,
    ) -> Vec<ValidationError> {
        let mut assigned: HashMap<&str, Vec<&str>> = HashMap::new();
        for section in sections {
            for rule in &section.rule_refs {
                let owners = assigned.entry(rule.as_str()).or_default();
                if !owners.contains(&section.id.as_str()) {
                    owners.push(section.id.as_str());
                }
            }
        }

        let mut errors = Vec::new();
        for (id, records) in by_id {
            let sources = records.iter().map(|r| r.source_path.clone());
            match assigned.get(id).map(Vec::len).unwrap_or(0) {
                0 => errors.push(
                    ValidationError::new(ErrorKind::UnassignedRule {
                        rule: id.to_string(),
                    })
                    .with_sources(sources),
                ),
                1 => {}
                _ => {
                    let sections = assigned[id].iter().map(|s| s.to_string()).collect();
                    errors.push(
                        ValidationError::new(ErrorKind::MultiplyAssignedRule {
                            rule: id.to_string(),
                            sections,
                        })
                        .with_sources(sources),
                    );
                }
            }
        }
        errors
    }

    fn check_duplicate_titles(
        &self,
        sections: &[Section],
        by_id: &BTreeMap<&str, Vec<&RuleRecord>>,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for section in sections {
            let mut seen_ids = BTreeSet::new();
            let mut by_title: BTreeMap<&str, Vec<&RuleRecord>> = BTreeMap::new();

            // Order of first appearance decides report order
            let mut title_order: Vec<&str> = Vec::new();
            for rule in &section.rule_refs {
                if !seen_ids.insert(rule.as_str()) {
                    continue;
                }
                let Some(record) = by_id.get(rule.as_str()).and_then(|r| r.first()) else {
                    continue;
                };
                let title = record.title.trim();
                let group = by_title.entry(title).or_default();
                if group.is_empty() {
                    title_order.push(title);
                }
                group.push(record);
            }

            for title in title_order {
                let group = &by_title[title];
                if group.len() > 1 {
                    errors.push(
                        ValidationError::new(ErrorKind::DuplicateRuleTitle {
                            section: section.id.clone(),
                            title: title.to_string(),
                        })
                        .with_sources(group.iter().map(|r| r.source_path.clone())),
                    );
                }
            }
        }
        errors
    }

    /// The compiler prints its own heading, so a lead heading that says
    /// something else is dropped from the output unseen
    fn check_lead_headings(&self, records: &[RuleRecord]) -> Vec<ValidationError> {
        records
            .iter()
            .filter_map(|record| {
                let heading = lead_heading(&record.lead)?;
                if heading.eq_ignore_ascii_case(record.title.trim()) {
                    return None;
                }
                Some(
                    ValidationError::new(ErrorKind::LeadHeadingMismatch {
                        rule: record.id.clone(),
                        heading: heading.to_string(),
                    })
                    .with_sources([record.source_path.clone()]),
                )
            })
            .collect()
    }
}
