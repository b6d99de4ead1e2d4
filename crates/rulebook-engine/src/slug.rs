//! Title to anchor mapping
//!
//! `slugify` lower-cases a title, turns every run of non-alphanumeric
//! characters into one hyphen and trims hyphens from both ends. Within a
//! document, a slug that is already taken gets `-2`, `-3`, … appended.
//! Suffixes are handed out in traversal order (sections in manifest
//! order, each followed by its rules in `rule_refs` order), so the first
//! title to claim a slug keeps it unadorned.

use std::collections::HashSet;

/// Anchor used when a title has no alphanumeric characters at all
const EMPTY_SLUG: &str = "untitled";

/// Stable slug for a title, ignoring collisions
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    if out.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        out
    }
}

/// Anchors handed out so far in one traversal.
///
/// Threaded explicitly through the aggregation pass; a fresh set per
/// compile keeps anchor assignment a function of the titles seen so far.
#[derive(Debug, Default)]
pub struct AnchorSet {
    taken: HashSet<String>,
}

impl AnchorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the anchor for the next title in traversal order
    pub fn assign(&mut self, title: &str) -> String {
        let base = slugify(title);
        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

/// Anchors for an ordered list of titles
pub fn assign_anchors<'a, I>(titles: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut anchors = AnchorSet::new();
    titles.into_iter().map(|t| anchors.assign(t)).collect()
}
