//! Post-sync verification by count comparison.

use crate::error::SyncResult;
use crate::mapper::IdentifierMapper;
use quizsync_connector::EnvironmentStore;
use quizsync_model::{CategoryRecord, EntityKind, StateCounts, SyncStatus};
use tracing::debug;

/// Verification report for one category across all three levels.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CategoryVerification {
    /// Business code of the category verified.
    pub code: String,
    /// Resolved target id the counts were read from.
    pub target_id: String,
    /// Category-level status (presence in target).
    pub category: SyncStatus,
    /// Question-level status.
    pub items: SyncStatus,
    /// Option-level status.
    pub sub_items: SyncStatus,
}

impl CategoryVerification {
    /// The three per-level statuses.
    pub fn statuses(&self) -> [&SyncStatus; 3] {
        [&self.category, &self.items, &self.sub_items]
    }

    /// True when every level verified as synced.
    pub fn all_synced(&self) -> bool {
        self.statuses()
            .iter()
            .all(|s| s.state == quizsync_model::SyncState::Synced)
    }

    /// Records all three statuses in an aggregate.
    pub fn record_into(&self, counts: &mut StateCounts) {
        for status in self.statuses() {
            counts.record(status);
        }
    }
}

/// Re-reads both environments after a sync pass and reports per-entity
/// status. The verifier never attempts repair.
pub struct Verifier;

impl Verifier {
    /// Verifies one category by comparing counts at each level.
    pub fn verify(
        source: &dyn EnvironmentStore,
        target: &dyn EnvironmentStore,
        category: &CategoryRecord,
        target_id: &str,
    ) -> SyncResult<CategoryVerification> {
        let category_status = SyncStatus::from_counts(
            EntityKind::Category,
            1,
            u64::from(target.category_by_id(target_id)?.is_some()),
        );
        let item_status = SyncStatus::from_counts(
            EntityKind::Item,
            source.count_items(&category.id)?,
            target.count_items(target_id)?,
        );
        let sub_item_status = SyncStatus::from_counts(
            EntityKind::SubItem,
            source.count_sub_items(&category.id)?,
            target.count_sub_items(target_id)?,
        );

        debug!(
            code = %category.code,
            category = %category_status.state,
            items = %item_status.state,
            options = %sub_item_status.state,
            "verified category"
        );

        Ok(CategoryVerification {
            code: category.code.clone(),
            target_id: target_id.to_string(),
            category: category_status,
            items: item_status,
            sub_items: sub_item_status,
        })
    }

    /// Verifies one category located by business code, resolving its target
    /// id through the mapper. Used by the read-only verify entry point.
    ///
    /// A code absent from the source is reported as an error status rather
    /// than failing the pass.
    pub fn verify_code(
        source: &dyn EnvironmentStore,
        target: &dyn EnvironmentStore,
        mapper: &IdentifierMapper,
        code: &str,
    ) -> SyncResult<CategoryVerification> {
        let category = source
            .categories()?
            .into_iter()
            .find(|c| c.code == code);

        let Some(category) = category else {
            let missing = |entity| SyncStatus::error(entity, format!("code '{code}' not in source"));
            return Ok(CategoryVerification {
                code: code.to_string(),
                target_id: String::new(),
                category: missing(EntityKind::Category),
                items: missing(EntityKind::Item),
                sub_items: missing(EntityKind::SubItem),
            });
        };

        let resolution = mapper.resolve_category(&category, target)?;
        Self::verify(source, target, &category, &resolution.target_id)
    }
}
