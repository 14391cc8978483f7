//! Typed write operations emitted by the planner.

use crate::records::{CategoryRecord, EntityKind, ItemRecord, SubItemRecord};

/// A single write against a target environment.
///
/// Every variant is idempotent: upserts carry `INSERT OR REPLACE` semantics,
/// the remap is a conditional `UPDATE` (affecting zero rows is a no-op
/// success), and the delete is guarded by a zero-reference check re-run
/// immediately before execution. Re-applying any op converges to the same
/// end state, which is what makes crash re-runs safe.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert or replace a category by its resolved target id.
    UpsertCategory(CategoryRecord),
    /// Insert or replace a question.
    UpsertItem(ItemRecord),
    /// Insert or replace an answer option.
    UpsertSubItem(SubItemRecord),
    /// Point items at the canonical category id instead of a legacy one.
    RemapItemCategory {
        /// The deprecated category id currently referenced.
        legacy_id: String,
        /// The canonical category id to reference instead.
        canonical_id: String,
    },
    /// Remove a legacy/duplicate category no active item references.
    DeleteCategory {
        /// The category id to delete.
        id: String,
    },
}

impl WriteOp {
    /// The entity kind this op touches.
    pub fn entity(&self) -> EntityKind {
        match self {
            WriteOp::UpsertCategory(_)
            | WriteOp::RemapItemCategory { .. }
            | WriteOp::DeleteCategory { .. } => EntityKind::Category,
            WriteOp::UpsertItem(_) => EntityKind::Item,
            WriteOp::UpsertSubItem(_) => EntityKind::SubItem,
        }
    }

    /// The primary id this op is keyed on, for failure reports.
    pub fn target_id(&self) -> &str {
        match self {
            WriteOp::UpsertCategory(c) => &c.id,
            WriteOp::UpsertItem(i) => &i.id,
            WriteOp::UpsertSubItem(s) => &s.id,
            WriteOp::RemapItemCategory { legacy_id, .. } => legacy_id,
            WriteOp::DeleteCategory { id } => id,
        }
    }

    /// Short human-readable description for logs and failure reports.
    pub fn describe(&self) -> String {
        match self {
            WriteOp::UpsertCategory(c) => format!("upsert category {}", c.id),
            WriteOp::UpsertItem(i) => format!("upsert question {}", i.id),
            WriteOp::UpsertSubItem(s) => format!("upsert option {}", s.id),
            WriteOp::RemapItemCategory {
                legacy_id,
                canonical_id,
            } => format!("remap questions {legacy_id} -> {canonical_id}"),
            WriteOp::DeleteCategory { id } => format!("delete category {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_entity_and_id() {
        let op = WriteOp::RemapItemCategory {
            legacy_id: "old-cat".into(),
            canonical_id: "cat_new".into(),
        };
        assert_eq!(op.entity(), EntityKind::Category);
        assert_eq!(op.target_id(), "old-cat");
        assert_eq!(op.describe(), "remap questions old-cat -> cat_new");
    }
}
