//! The compiled document and its table of contents

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::impact::Impact;
use crate::rule::RuleRecord;
use crate::section::Section;

/// Front matter for the compiled document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Publication date, printed as "Month YYYY"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

fn default_title() -> String {
    "Rulebook".to_string()
}

impl Default for DocumentMeta {
    fn default() -> Self {
        Self {
            title: default_title(),
            version: None,
            organization: None,
            date: None,
            abstract_text: None,
            note: None,
            references: Vec::new(),
        }
    }
}

/// One line of the generated table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub anchor: String,
    pub label: String,
    /// Heading number, `3` for a section or `3.2` for a rule
    pub number: String,
    /// 1 for a section, 2 for a rule
    pub depth: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_anchor: Option<String>,
    /// Only set on section entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
}

/// A rule placed in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledRule {
    pub anchor: String,
    pub number: String,
    pub record: RuleRecord,
}

/// A section with its rules in manifest order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledSection {
    pub anchor: String,
    pub section: Section,
    pub rules: Vec<CompiledRule>,
}

/// Fully assembled document. Built once per compile and only read
/// afterwards; there is no mutating API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledDocument {
    meta: DocumentMeta,
    sections: Vec<CompiledSection>,
    toc: Vec<TocEntry>,
}

impl CompiledDocument {
    pub fn new(meta: DocumentMeta, sections: Vec<CompiledSection>, toc: Vec<TocEntry>) -> Self {
        Self {
            meta,
            sections,
            toc,
        }
    }

    pub fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    pub fn sections(&self) -> &[CompiledSection] {
        &self.sections
    }

    pub fn toc(&self) -> &[TocEntry] {
        &self.toc
    }

    /// All rules in document order
    pub fn rules(&self) -> impl Iterator<Item = &CompiledRule> {
        self.sections.iter().flat_map(|s| s.rules.iter())
    }

    pub fn rule_count(&self) -> usize {
        self.sections.iter().map(|s| s.rules.len()).sum()
    }

    /// Whether an anchor is defined anywhere in the document
    pub fn has_anchor(&self, anchor: &str) -> bool {
        self.toc.iter().any(|entry| entry.anchor == anchor)
    }
}
