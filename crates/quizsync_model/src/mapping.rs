//! Identifier resolution audit records.

use crate::records::EntityKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which resolution rule produced a target identifier.
///
/// Rules are tried first-match-wins in the order listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionMethod {
    /// The source id exists verbatim in the target.
    Exact,
    /// The static legacy-format table supplied the canonical id.
    LegacyTable,
    /// A target record with the same business code supplied the id.
    CodeMatch,
    /// No rule matched; the source id was passed through unchanged and
    /// downstream writes are best-effort.
    Fallback,
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResolutionMethod::Exact => "exact",
            ResolutionMethod::LegacyTable => "legacy-table",
            ResolutionMethod::CodeMatch => "code-match",
            ResolutionMethod::Fallback => "fallback",
        };
        f.write_str(s)
    }
}

/// One resolved source→target identifier pair.
///
/// Mappings exist only for the duration of a run and are collected so every
/// resolution is auditable; the mapper never silently guesses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifierMapping {
    /// Identifier in the source environment.
    pub source_id: String,
    /// Resolved identifier in the target environment.
    pub target_id: String,
    /// The kind of entity mapped.
    pub entity: EntityKind,
    /// Which rule fired.
    pub method: ResolutionMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_display() {
        assert_eq!(ResolutionMethod::Exact.to_string(), "exact");
        assert_eq!(ResolutionMethod::LegacyTable.to_string(), "legacy-table");
        assert_eq!(ResolutionMethod::CodeMatch.to_string(), "code-match");
        assert_eq!(ResolutionMethod::Fallback.to_string(), "fallback");
    }
}
