//! Populating `Section::rule_refs` from the manifest bindings

use rulebook_types::{RuleRecord, Section};

/// Fill each section's `rule_refs`.
///
/// Explicit `Rules:` entries come first in their listed order, kept even
/// when they resolve to nothing so validation can report them. Rules
/// matched by prefix follow, sorted by title (case-insensitive) and then
/// id, so the result never depends on the order files were read in. A
/// rule matching several sections lands in each of them.
pub fn bind_rules(sections: &[Section], records: &[RuleRecord]) -> Vec<Section> {
    let mut by_title: Vec<&RuleRecord> = records.iter().collect();
    by_title.sort_by(|a, b| {
        a.title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });

    sections
        .iter()
        .map(|section| {
            let mut refs: Vec<String> = Vec::new();
            for rule in &section.binding.rules {
                if !refs.contains(rule) {
                    refs.push(rule.clone());
                }
            }
            for record in &by_title {
                if section.binding.matches_prefix(&record.id) && !refs.contains(&record.id) {
                    refs.push(record.id.clone());
                }
            }
            tracing::debug!("Section {} bound {} rules", section.id, refs.len());

            Section {
                rule_refs: refs,
                ..section.clone()
            }
        })
        .collect()
}
