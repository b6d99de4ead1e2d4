//! Shared data model for the rulebook compiler
//!
//! Rule documents, manifest sections, and the compiled document that the
//! engine builds from them. These are plain value types; all behaviour
//! lives in `rulebook-engine`.

pub mod document;
pub mod impact;
pub mod rule;
pub mod section;

pub use document::{CompiledDocument, CompiledRule, CompiledSection, DocumentMeta, TocEntry};
pub use impact::{Impact, UnknownImpact};
pub use rule::{Block, BlockKind, Body, RuleRecord};
pub use section::{Section, SectionBinding};
