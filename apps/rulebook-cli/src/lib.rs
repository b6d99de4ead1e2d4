//! Rulebook command-line front end
//!
//! Loads rule files and the section manifest from disk, runs the
//! compiler from `rulebook-engine` and reports diagnostics on stderr.

pub mod commands;
pub mod config;
pub mod loader;
pub mod report;

pub use commands::Overrides;
pub use config::Config;
