//! Post-sync verification status.

use crate::records::EntityKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verification outcome for one entity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// Source and target counts match at this level.
    Synced,
    /// Target has rows but counts diverge.
    Partial,
    /// Target has no rows at all.
    Missing,
    /// Verification itself failed (environment unreachable, etc.).
    Error,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncState::Synced => "synced",
            SyncState::Partial => "partial",
            SyncState::Missing => "missing",
            SyncState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Verification report for one entity level of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// The entity level verified.
    pub entity: EntityKind,
    /// Row count in the source environment.
    pub source_count: u64,
    /// Row count in the target environment.
    pub target_count: u64,
    /// Derived state.
    pub state: SyncState,
    /// One issue string per mismatch; empty when synced.
    pub issues: Vec<String>,
}

impl SyncStatus {
    /// Derives a status from source/target counts.
    ///
    /// State rule: `missing` if the target count is zero, `synced` if the
    /// counts are equal, `partial` otherwise with one issue per mismatch.
    pub fn from_counts(entity: EntityKind, source_count: u64, target_count: u64) -> Self {
        let (state, issues) = if source_count == target_count {
            (SyncState::Synced, Vec::new())
        } else if target_count == 0 {
            (
                SyncState::Missing,
                vec![format!(
                    "{} count mismatch: target 0 vs source {source_count}",
                    entity_noun(entity)
                )],
            )
        } else {
            (
                SyncState::Partial,
                vec![format!(
                    "{} count mismatch: target {target_count} vs source {source_count}",
                    entity_noun(entity)
                )],
            )
        };

        Self {
            entity,
            source_count,
            target_count,
            state,
            issues,
        }
    }

    /// Builds an error status carrying the failure message.
    pub fn error(entity: EntityKind, message: impl Into<String>) -> Self {
        Self {
            entity,
            source_count: 0,
            target_count: 0,
            state: SyncState::Error,
            issues: vec![message.into()],
        }
    }
}

fn entity_noun(entity: EntityKind) -> &'static str {
    match entity {
        EntityKind::Category => "Category",
        EntityKind::Item => "Question",
        EntityKind::SubItem => "Option",
    }
}

/// Aggregate counts of per-level states across a verification pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    /// Levels that verified as synced.
    pub synced: u64,
    /// Levels with diverging non-zero counts.
    pub partial: u64,
    /// Levels with an empty target.
    pub missing: u64,
    /// Levels whose verification errored.
    pub error: u64,
}

impl StateCounts {
    /// Records one status in the aggregate.
    pub fn record(&mut self, status: &SyncStatus) {
        match status.state {
            SyncState::Synced => self.synced += 1,
            SyncState::Partial => self.partial += 1,
            SyncState::Missing => self.missing += 1,
            SyncState::Error => self.error += 1,
        }
    }

    /// Total number of statuses recorded.
    pub fn total(&self) -> u64 {
        self.synced + self.partial + self.missing + self.error
    }
}

impl fmt::Display for StateCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "synced={} partial={} missing={} error={}",
            self.synced, self.partial, self.missing, self.error
        )
    }
}
