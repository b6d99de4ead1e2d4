//! Manifest sections

use serde::{Deserialize, Serialize};

use crate::impact::Impact;

/// A numbered, impact-ranked grouping of rules declared in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Short stable code, e.g. `async`
    pub id: String,
    /// Position in the manifest, starting at 0
    pub order: usize,
    pub display_name: String,
    /// Editorial label; independent of the member rules' impacts
    pub impact: Impact,
    #[serde(default)]
    pub description: String,
    /// Rule identifiers in document order. Empty until binding.
    #[serde(default)]
    pub rule_refs: Vec<String>,
    #[serde(default)]
    pub binding: SectionBinding,
}

impl Section {
    /// 1-based number used in headings
    pub fn number(&self) -> usize {
        self.order + 1
    }
}

/// How rule files attach to a section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionBinding {
    /// Rule ids listed explicitly, in the order they should appear
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<String>,
    /// File-name prefixes; a rule `<prefix>-<rest>` binds here
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefixes: Vec<String>,
}

impl SectionBinding {
    /// Whether a rule id carries one of this section's prefixes
    pub fn matches_prefix(&self, rule_id: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            rule_id
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with('-') && rest.len() > 1)
        })
    }
}
