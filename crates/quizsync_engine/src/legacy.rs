//! The versioned legacy-id table artifact.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Static legacy→canonical category id table.
///
/// Supplied as configuration, never computed at runtime, and shared by every
/// entry point so mappings cannot diverge between scripts. The `version`
/// field exists so a stale artifact is visible in logs and reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyIdTable {
    /// Artifact version, bumped whenever an entry changes.
    #[serde(default)]
    pub version: u32,
    /// Legacy category id → canonical category id.
    #[serde(default)]
    pub categories: BTreeMap<String, String>,
}

impl LegacyIdTable {
    /// An empty table; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the table from a JSON file.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SyncError::LegacyTable {
            message: format!("{}: {e}", path.display()),
        })?;
        serde_json::from_str(&text).map_err(|e| SyncError::LegacyTable {
            message: format!("{}: {e}", path.display()),
        })
    }

    /// Canonical id for a legacy category id, if the table knows it.
    pub fn canonical_for(&self, legacy_id: &str) -> Option<&str> {
        self.categories.get(legacy_id).map(String::as_str)
    }

    /// Legacy ids that map to the given canonical id.
    pub fn legacy_ids_for(&self, canonical_id: &str) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|(_, canonical)| canonical.as_str() == canonical_id)
            .map(|(legacy, _)| legacy.as_str())
            .collect()
    }

    /// True when the table carries no entries.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
