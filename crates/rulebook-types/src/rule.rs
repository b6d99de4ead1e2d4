//! Parsed rule documents

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::impact::Impact;

/// One rule document: metadata plus an opaque body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    /// Stable identifier (the file stem, e.g. `async-parallel`)
    pub id: String,
    /// Where the rule came from, for diagnostics
    pub source_path: String,
    pub title: String,
    pub impact: Impact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    /// Authoring lead lines (title heading, impact annotation) stripped
    /// from the start of the body, kept verbatim
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lead: String,
    pub body: Body,
}

impl RuleRecord {
    /// Impact annotation as printed under the rule heading
    pub fn impact_annotation(&self) -> String {
        match &self.impact_description {
            Some(description) => format!("{} ({})", self.impact, description),
            None => self.impact.to_string(),
        }
    }
}

/// Kind of a body block. The parser never produces `Unknown`; it only
/// appears when a compiled document is read back from JSON with a kind
/// this version does not recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum BlockKind {
    Prose,
    Incorrect,
    Correct,
    Reference,
    Unknown,
}

impl From<String> for BlockKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "prose" => BlockKind::Prose,
            "incorrect" => BlockKind::Incorrect,
            "correct" => BlockKind::Correct,
            "reference" => BlockKind::Reference,
            _ => BlockKind::Unknown,
        }
    }
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Prose => "prose",
            BlockKind::Incorrect => "incorrect",
            BlockKind::Correct => "correct",
            BlockKind::Reference => "reference",
            BlockKind::Unknown => "unknown",
        }
    }

    /// Labelled code comparison (`**Incorrect…**` / `**Correct…**`)
    pub fn is_example(&self) -> bool {
        matches!(self, BlockKind::Incorrect | BlockKind::Correct)
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous slice of the body, kept byte-for-byte
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
}

impl Block {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Ordered, immutable block sequence. Concatenating the block texts
/// reproduces the original body exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Body {
    blocks: Vec<Block>,
}

impl Body {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The original body text
    pub fn to_text(&self) -> String {
        self.blocks.iter().map(|b| b.text.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(description: Option<&str>) -> RuleRecord {
        RuleRecord {
            id: "async-parallel".to_string(),
            source_path: "rules/async-parallel.md".to_string(),
            title: "Promise.all() for Independent Operations".to_string(),
            impact: Impact::Critical,
            impact_description: description.map(str::to_string),
            tags: BTreeSet::new(),
            lead: String::new(),
            body: Body::default(),
        }
    }

    #[test]
    fn test_impact_annotation() {
        assert_eq!(record(None).impact_annotation(), "CRITICAL");
        assert_eq!(
            record(Some("2-10x improvement")).impact_annotation(),
            "CRITICAL (2-10x improvement)"
        );
    }

    #[test]
    fn test_body_concatenates_blocks() {
        let body = Body::new(vec![
            Block::new(BlockKind::Prose, "Intro.\n\n"),
            Block::new(BlockKind::Incorrect, "**Incorrect:**\n\n```ts\na()\n```\n"),
        ]);
        assert_eq!(body.to_text(), "Intro.\n\n**Incorrect:**\n\n```ts\na()\n```\n");
        assert_eq!(body.blocks()[1].kind, BlockKind::Incorrect);
    }

    #[test]
    fn test_unrecognised_block_kind_deserializes_as_unknown() {
        let block: Block = serde_json::from_str(r#"{"kind":"diagram","text":"x"}"#).unwrap();
        assert_eq!(block.kind, BlockKind::Unknown);
    }
}
