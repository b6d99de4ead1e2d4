//! Impact levels shared by rules and sections

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Editorial impact classification.
///
/// Variants are declared from least to most severe so the derived `Ord`
/// gives `Critical > High > MediumHigh > Medium > LowMedium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Impact {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "LOW-MEDIUM")]
    LowMedium,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "MEDIUM-HIGH")]
    MediumHigh,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "CRITICAL")]
    Critical,
}

/// An impact literal that matched none of the recognised levels
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown impact level: {0}")]
pub struct UnknownImpact(pub String);

impl Impact {
    /// All levels, most severe first
    pub const ALL: [Impact; 6] = [
        Impact::Critical,
        Impact::High,
        Impact::MediumHigh,
        Impact::Medium,
        Impact::LowMedium,
        Impact::Low,
    ];

    /// Canonical upper-case label used in documents
    pub fn label(&self) -> &'static str {
        match self {
            Impact::Critical => "CRITICAL",
            Impact::High => "HIGH",
            Impact::MediumHigh => "MEDIUM-HIGH",
            Impact::Medium => "MEDIUM",
            Impact::LowMedium => "LOW-MEDIUM",
            Impact::Low => "LOW",
        }
    }
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Impact {
    type Err = UnknownImpact;

    /// Case-insensitive; runs of spaces, underscores and hyphens all
    /// normalise to a single hyphen (`medium high` == `MEDIUM-HIGH`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let literal = s.trim();
        let normalized = literal
            .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-")
            .to_ascii_uppercase();

        Impact::ALL
            .iter()
            .copied()
            .find(|level| level.label() == normalized)
            .ok_or_else(|| UnknownImpact(literal.to_string()))
    }
}
