//! Splitting a rule body into typed blocks without touching its bytes

use rulebook_types::{Block, BlockKind};

use crate::patterns::{
    FenceState, CORRECT_LABEL, INCORRECT_LABEL, LEAD_HEADING, LEAD_IMPACT, REFERENCE_LABEL,
};

fn label_kind(trimmed: &str) -> Option<BlockKind> {
    if INCORRECT_LABEL.is_match(trimmed) {
        Some(BlockKind::Incorrect)
    } else if CORRECT_LABEL.is_match(trimmed) {
        Some(BlockKind::Correct)
    } else if REFERENCE_LABEL.is_match(trimmed) {
        Some(BlockKind::Reference)
    } else {
        None
    }
}

/// Split a body into blocks.
///
/// A labelled example runs from its label line through the first code
/// fence that closes after it. A reference block runs until the first
/// non-blank line following a blank one. Labels inside code fences are
/// content, not boundaries. The concatenated block texts always equal
/// `body`.
pub fn split_blocks(body: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut kind = BlockKind::Prose;
    let mut text = String::new();
    let mut fence = FenceState::default();
    let mut example_closed = false;
    let mut after_blank = false;

    for line in body.split_inclusive('\n') {
        let trimmed = line.trim();

        if !fence.in_fence() {
            let label = label_kind(trimmed);
            let ends_current = !trimmed.is_empty()
                && match kind {
                    BlockKind::Incorrect | BlockKind::Correct => example_closed,
                    BlockKind::Reference => after_blank,
                    _ => false,
                };

            if label.is_some() || ends_current {
                if !text.is_empty() {
                    blocks.push(Block::new(kind, std::mem::take(&mut text)));
                }
                kind = label.unwrap_or(BlockKind::Prose);
                example_closed = false;
                after_blank = false;
            }
        }

        let was_in_fence = fence.in_fence();
        if fence.advance(line) && was_in_fence && kind.is_example() {
            example_closed = true;
        }
        if trimmed.is_empty() && !fence.in_fence() {
            after_blank = true;
        }

        text.push_str(line);
    }

    if !text.is_empty() {
        blocks.push(Block::new(kind, text));
    }
    blocks
}

/// Split off the authoring lead: a `## ` heading and/or an
/// `**Impact: …**` line at the very start of the body, with the blank
/// lines around them. Returns `(lead, body)`; `lead` is empty when the
/// body has no lead lines.
///
/// The heading is taken whatever its text, so a level-2 heading never
/// lands inside a compiled rule. Whether it matches the rule title is
/// checked by the validator through [`lead_heading`].
pub fn split_lead(rest: &str) -> (&str, &str) {
    let mut offset = 0;
    let mut lead_end = 0;
    let mut seen_heading = false;
    let mut seen_impact = false;

    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            offset += line.len();
            if seen_heading || seen_impact {
                lead_end = offset;
            }
            continue;
        }

        if !seen_heading && !seen_impact && LEAD_HEADING.is_match(trimmed) {
            seen_heading = true;
        } else if !seen_impact && LEAD_IMPACT.is_match(trimmed) {
            seen_impact = true;
        } else {
            break;
        }
        offset += line.len();
        lead_end = offset;
    }

    rest.split_at(lead_end)
}

/// Text of the `## ` heading in a lead, if it has one
pub fn lead_heading(lead: &str) -> Option<&str> {
    lead.lines()
        .map(str::trim)
        .find(|line| LEAD_HEADING.is_match(line))
        .map(|line| line.trim_start_matches('#').trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BODY: &str = "Run independent work concurrently.\n\
\n\
**Incorrect (sequential, 3 round trips):**\n\
\n\
```typescript\n\
const user = await fetchUser()\n\
```\n\
\n\
**Correct (parallel, 1 round trip):**\n\
\n\
```typescript\n\
const [user, posts] = await Promise.all([fetchUser(), fetchPosts()])\n\
```\n\
\n\
Reference: [Promise.all](https://developer.mozilla.org)\n";

    fn kinds(blocks: &[Block]) -> Vec<BlockKind> {
        blocks.iter().map(|b| b.kind).collect()
    }

    #[test]
    fn test_splits_prose_examples_and_reference() {
        let blocks = split_blocks(BODY);
        assert_eq!(
            kinds(&blocks),
            vec![
                BlockKind::Prose,
                BlockKind::Incorrect,
                BlockKind::Correct,
                BlockKind::Reference
            ]
        );
        assert!(blocks[1].text.ends_with("```\n\n"));
        let joined: String = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(joined, BODY);
    }

    #[test]
    fn test_prose_after_example_starts_new_block() {
        let body = "**Correct:**\n```js\nx()\n```\nThis explains why.\n";
        let blocks = split_blocks(body);
        assert_eq!(kinds(&blocks), vec![BlockKind::Correct, BlockKind::Prose]);
        assert_eq!(blocks[1].text, "This explains why.\n");
    }

    #[test]
    fn test_labels_inside_fences_are_content() {
        let body = "```md\n**Incorrect:**\nReference: x\n```\n";
        let blocks = split_blocks(body);
        assert_eq!(kinds(&blocks), vec![BlockKind::Prose]);
        assert_eq!(blocks[0].text, body);
    }

    #[test]
    fn test_reference_ends_at_next_paragraph() {
        let body = "Reference: [a](https://a)\n- [b](https://b)\n\nClosing note.\n";
        let blocks = split_blocks(body);
        assert_eq!(kinds(&blocks), vec![BlockKind::Reference, BlockKind::Prose]);
        assert_eq!(blocks[0].text, "Reference: [a](https://a)\n- [b](https://b)\n\n");
    }

    #[test]
    fn test_empty_body_has_no_blocks() {
        assert!(split_blocks("").is_empty());
    }

    #[test]
    fn test_split_lead_strips_title_heading_and_impact() {
        let rest = "\n## Use X\n\n**Impact: HIGH (2x)**\n\nBody starts here.\n";
        let (lead, body) = split_lead(rest);
        assert_eq!(lead, "\n## Use X\n\n**Impact: HIGH (2x)**\n\n");
        assert_eq!(body, "Body starts here.\n");
        assert_eq!(lead_heading(lead), Some("Use X"));
    }

    #[test]
    fn test_split_lead_takes_mismatched_heading_and_impact() {
        let rest = "## Use X.\n\n**Impact: HIGH**\n\nBody.\n";
        let (lead, body) = split_lead(rest);
        assert_eq!(lead, "## Use X.\n\n**Impact: HIGH**\n\n");
        assert_eq!(body, "Body.\n");
        assert_eq!(lead_heading(lead), Some("Use X."));
    }

    #[test]
    fn test_split_lead_impact_without_heading() {
        let (lead, body) = split_lead("**Impact:** LOW\nBody.\n");
        assert_eq!(lead, "**Impact:** LOW\n");
        assert_eq!(body, "Body.\n");
        assert_eq!(lead_heading(lead), None);
    }

    #[test]
    fn test_split_lead_stops_at_prose() {
        let rest = "Text first.\n\n## Later\n";
        assert_eq!(split_lead(rest), ("", rest));
    }

    #[test]
    fn test_split_lead_leaves_deeper_headings() {
        let rest = "### Details\n\nText\n";
        assert_eq!(split_lead(rest), ("", rest));
    }
}
