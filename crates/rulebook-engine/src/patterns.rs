//! Line patterns recognised in rule files and the manifest

use lazy_static::lazy_static;
use regex::Regex;

/// Metadata block delimiter
pub const FRONTMATTER_DELIM: &str = "---";

/// Metadata keys a rule file may carry
pub const KEY_TITLE: &str = "title";
pub const KEY_IMPACT: &str = "impact";
pub const KEY_IMPACT_DESCRIPTION: &[&str] = &["impactDescription", "impact_description"];
pub const KEY_TAGS: &str = "tags";

lazy_static! {
    /// `**Incorrect (sequential, 3 round trips):**`
    pub static ref INCORRECT_LABEL: Regex = Regex::new(r"(?i)^\*\*incorrect\b").unwrap();

    /// `**Correct (parallel):**`
    pub static ref CORRECT_LABEL: Regex = Regex::new(r"(?i)^\*\*correct\b").unwrap();

    /// `Reference: [..](..)`, `References:` or `**Reference:**`
    pub static ref REFERENCE_LABEL: Regex =
        Regex::new(r"(?i)^(?:\*\*)?references?\s*:").unwrap();

    /// Authoring lead heading: `## Title`
    pub static ref LEAD_HEADING: Regex = Regex::new(r"^##\s+\S").unwrap();

    /// Authoring lead annotation: `**Impact: HIGH (..)**`
    pub static ref LEAD_IMPACT: Regex = Regex::new(r"(?i)^\*\*impact\s*:").unwrap();

    /// Manifest section heading: `## 1. Eliminating Waterfalls (async)`
    pub static ref SECTION_HEADING: Regex =
        Regex::new(r"^##\s+(?:\d+\.\s*)?(.*?)\s*(?:\(([A-Za-z0-9_-]+)\))?\s*$").unwrap();

    /// Manifest field line: `**Impact:** CRITICAL`
    pub static ref MANIFEST_FIELD: Regex =
        Regex::new(r"^\*\*([A-Za-z][A-Za-z ]*):\*\*\s*(.*?)\s*$").unwrap();

    /// In-document link: `[label](#anchor)`
    pub static ref ANCHOR_LINK: Regex = Regex::new(r"\]\(#([^)\s]+)\)").unwrap();

    /// Inline code span, single or double backticks
    pub static ref INLINE_CODE: Regex = Regex::new(r"``[^`]*``|`[^`]*`").unwrap();
}

/// Opening or closing code-fence marker (a run of three or more backticks
/// or tildes) at the start of a trimmed line
pub fn fence_marker(trimmed: &str) -> Option<&str> {
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let run = trimmed.chars().take_while(|&c| c == first).count();
    (run >= 3).then(|| &trimmed[..run])
}

/// Tracks whether the current line sits inside a fenced code block
#[derive(Debug, Default)]
pub struct FenceState {
    open: Option<String>,
}

impl FenceState {
    pub fn in_fence(&self) -> bool {
        self.open.is_some()
    }

    /// Feed one line; returns `true` when the line is itself a fence
    /// delimiter (opening or closing)
    pub fn advance(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        let Some(marker) = fence_marker(trimmed) else {
            return false;
        };
        match &self.open {
            Some(open) => {
                let closes = marker.starts_with(open.as_str())
                    && trimmed[marker.len()..].trim().is_empty();
                if closes {
                    self.open = None;
                }
                closes
            }
            None => {
                self.open = Some(marker.to_string());
                true
            }
        }
    }
}
