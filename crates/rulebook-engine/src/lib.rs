//! Rulebook compilation engine
//!
//! Compiles a directory of rule documents and a section manifest into a
//! single navigable document:
//! - Rule parsing (metadata block plus opaque body)
//! - Manifest loading and rule binding
//! - Structural validation, reporting every finding in one run
//! - Aggregation with deterministic anchors and table of contents
//! - Markdown and JSON rendering
//!
//! The engine does no filesystem access; callers hand it file contents.

pub mod compiler;
pub mod manifest;
pub mod parser;
pub mod patterns;
pub mod slug;
pub mod verifier;

pub use compiler::{
    compile, render_json, validate, CompileRequest, CompileResponse, CompileStatus, Diagnostic,
    EngineError, ManifestSource, OutputFormat,
};
pub use parser::{RuleParser, RuleSource};
