//! Cross-reference resolution over the assembled document

use std::collections::BTreeSet;

use rulebook_types::CompiledDocument;

use crate::compiler::errors::{ErrorKind, ValidationError};
use crate::patterns::{FenceState, ANCHOR_LINK, INLINE_CODE};

/// `#anchor` link targets in markdown text, skipping fenced code and
/// inline code spans
pub fn link_targets(text: &str) -> Vec<String> {
    let mut fence = FenceState::default();
    let mut targets = Vec::new();
    for line in text.lines() {
        if fence.advance(line) || fence.in_fence() {
            continue;
        }
        let line = INLINE_CODE.replace_all(line, "");
        for caps in ANCHOR_LINK.captures_iter(&line) {
            targets.push(caps[1].to_string());
        }
    }
    targets
}

/// Report every in-document link whose anchor does not exist.
///
/// Runs after aggregation because anchors, collision suffixes included,
/// are only known once the whole document has been traversed. Each
/// missing target is reported once per rule or section.
pub fn check_cross_references(doc: &CompiledDocument) -> Vec<ValidationError> {
    let mut warnings = Vec::new();

    for compiled in doc.sections() {
        let mut reported = BTreeSet::new();
        for target in link_targets(&compiled.section.description) {
            if !doc.has_anchor(&target) && reported.insert(target.clone()) {
                tracing::debug!(
                    "Section {} links to unknown anchor #{}",
                    compiled.section.id,
                    target
                );
                warnings.push(ValidationError::new(ErrorKind::BrokenCrossReference { target }));
            }
        }

        for rule in &compiled.rules {
            let mut reported = BTreeSet::new();
            for block in rule.record.body.blocks() {
                for target in link_targets(&block.text) {
                    if !doc.has_anchor(&target) && reported.insert(target.clone()) {
                        tracing::debug!(
                            "{} links to unknown anchor #{}",
                            rule.record.source_path,
                            target
                        );
                        warnings.push(
                            ValidationError::new(ErrorKind::BrokenCrossReference { target })
                                .with_sources([rule.record.source_path.clone()]),
                        );
                    }
                }
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_link_targets_skip_code() {
        let text = "See [X](#use-x) and [ext](https://e.com).\n```md\n[no](#inside)\n```\n[Y](#use-y)";
        assert_eq!(link_targets(text), vec!["use-x", "use-y"]);
    }

    #[test]
    fn test_link_targets_skip_inline_code() {
        let text = "Write `[x](#target)` or ``[y](#other)``, then [real](#use-x).";
        assert_eq!(link_targets(text), vec!["use-x"]);
    }
}
