//! Assembling validated sections and rules into a compiled document

use std::collections::HashMap;

use rulebook_types::{
    CompiledDocument, CompiledRule, CompiledSection, DocumentMeta, RuleRecord, Section, TocEntry,
};

use crate::slug::AnchorSet;

/// Builds a [`CompiledDocument`] in one depth-first pass
pub struct Aggregator;

impl Aggregator {
    /// Sections are placed by `order`, rules by their position in the
    /// section's `rule_refs`. Anchors are assigned in that same
    /// traversal, section first and then each of its rules, so the
    /// result is a pure function of the inputs.
    ///
    /// Inputs are expected to have passed validation; a reference that
    /// does not resolve is skipped.
    pub fn aggregate(
        meta: &DocumentMeta,
        sections: &[Section],
        records: &[RuleRecord],
    ) -> CompiledDocument {
        let mut by_id: HashMap<&str, &RuleRecord> = HashMap::new();
        for record in records {
            by_id.entry(record.id.as_str()).or_insert(record);
        }

        let mut ordered: Vec<&Section> = sections.iter().collect();
        ordered.sort_by_key(|s| s.order);

        let mut anchors = AnchorSet::new();
        let mut toc = Vec::new();
        let mut compiled_sections = Vec::with_capacity(ordered.len());

        for section in ordered {
            let section_anchor = anchors.assign(&section.display_name);
            let section_number = section.number().to_string();
            toc.push(TocEntry {
                anchor: section_anchor.clone(),
                label: section.display_name.clone(),
                number: section_number.clone(),
                depth: 1,
                parent_anchor: None,
                impact: Some(section.impact),
            });

            let mut rules = Vec::with_capacity(section.rule_refs.len());
            for rule_id in &section.rule_refs {
                let Some(record) = by_id.get(rule_id.as_str()) else {
                    tracing::debug!("Skipping unresolved rule {} in {}", rule_id, section.id);
                    continue;
                };
                let anchor = anchors.assign(&record.title);
                let number = format!("{}.{}", section_number, rules.len() + 1);
                toc.push(TocEntry {
                    anchor: anchor.clone(),
                    label: record.title.clone(),
                    number: number.clone(),
                    depth: 2,
                    parent_anchor: Some(section_anchor.clone()),
                    impact: None,
                });
                rules.push(CompiledRule {
                    anchor,
                    number,
                    record: (*record).clone(),
                });
            }

            compiled_sections.push(CompiledSection {
                anchor: section_anchor,
                section: section.clone(),
                rules,
            });
        }

        tracing::info!(
            "Aggregated {} sections, {} toc entries",
            compiled_sections.len(),
            toc.len()
        );
        CompiledDocument::new(meta.clone(), compiled_sections, toc)
    }
}
