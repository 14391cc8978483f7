//! Reconciliation planning.
//!
//! The planner turns source state into an ordered, FK-safe, idempotent
//! write-plan per category: upsert the category under its resolved id, remap
//! item FKs away from legacy ids, upsert items and sub-items, then clean up
//! unreferenced legacy categories. Guards that depend on target state at
//! execution time (remap preconditions, the zero-reference delete check) are
//! evaluated by the runner immediately before the op executes, since the
//! earlier steps mutate exactly that state.

use crate::error::SyncResult;
use crate::mapper::{IdentifierMapper, Resolution};
use quizsync_connector::EnvironmentStore;
use quizsync_model::{CategoryRecord, WriteOp};
use std::collections::BTreeSet;
use tracing::debug;

/// The ordered plan for one category.
#[derive(Debug, Clone)]
pub struct CategoryPlan {
    /// The source category as read from the source environment.
    pub source: CategoryRecord,
    /// How the target id was resolved.
    pub resolution: Resolution,
    /// Step 1: upsert the category under the resolved id.
    pub category_op: WriteOp,
    /// Legacy ids that may still own items in the target. Each is a remap
    /// candidate (step 2) and a cleanup candidate (step 4).
    pub legacy_ids: Vec<String>,
    /// Step 3a: item upserts, rewritten to the resolved category id.
    pub item_ops: Vec<WriteOp>,
    /// Step 3b: sub-item upserts.
    pub sub_item_ops: Vec<WriteOp>,
}

impl CategoryPlan {
    /// Number of item upserts planned.
    pub fn item_count(&self) -> usize {
        self.item_ops.len()
    }

    /// Number of sub-item upserts planned.
    pub fn sub_item_count(&self) -> usize {
        self.sub_item_ops.len()
    }
}

/// Computes write-plans from source and target state.
///
/// Planning is per category, and the runner calls it per category too: a
/// planning failure (a transient read, say) then costs that one category
/// instead of the whole run.
pub struct Planner;

impl Planner {
    /// Plans one category.
    pub fn plan_category(
        source: &dyn EnvironmentStore,
        target: &dyn EnvironmentStore,
        mapper: &IdentifierMapper,
        category: CategoryRecord,
        row_limit: Option<usize>,
    ) -> SyncResult<CategoryPlan> {
        let resolution = mapper.resolve_category(&category, target)?;

        let mut upserted = category.clone();
        upserted.id = resolution.target_id.clone();
        let category_op = WriteOp::UpsertCategory(upserted);

        // Candidates: the source id when it differs from the resolved id,
        // plus every legacy alias the table knows for the resolved id.
        let mut legacy_ids = BTreeSet::new();
        if category.id != resolution.target_id {
            legacy_ids.insert(category.id.clone());
        }
        for legacy in mapper.legacy_table().legacy_ids_for(&resolution.target_id) {
            if legacy != resolution.target_id {
                legacy_ids.insert(legacy.to_string());
            }
        }

        let mut items = source.items(&category.id)?;
        items.sort_by(|a, b| (a.order_index, &a.id).cmp(&(b.order_index, &b.id)));
        if let Some(limit) = row_limit {
            items.truncate(limit);
        }

        let item_ids: BTreeSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
        let sub_items = source.sub_items(&category.id)?;

        let item_ops = items
            .iter()
            .map(|item| {
                let mut item = item.clone();
                item.category_id = resolution.target_id.clone();
                WriteOp::UpsertItem(item)
            })
            .collect::<Vec<_>>();

        // Options of truncated items are dropped with their parent, keeping
        // the plan FK-safe under a row limit.
        let sub_item_ops = sub_items
            .into_iter()
            .filter(|s| item_ids.contains(s.item_id.as_str()))
            .map(WriteOp::UpsertSubItem)
            .collect::<Vec<_>>();

        debug!(
            code = %category.code,
            target_id = %resolution.target_id,
            items = item_ops.len(),
            sub_items = sub_item_ops.len(),
            legacy_candidates = legacy_ids.len(),
            "planned category"
        );

        Ok(CategoryPlan {
            source: category,
            resolution,
            category_op,
            legacy_ids: legacy_ids.into_iter().collect(),
            item_ops,
            sub_item_ops,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::LegacyIdTable;
    use quizsync_connector::MemoryStore;
    use quizsync_model::{ItemRecord, ResolutionMethod, SubItemRecord};
    use std::collections::BTreeMap;

    fn category(id: &str, code: &str) -> CategoryRecord {
        CategoryRecord {
            id: id.into(),
            code: code.into(),
            name: code.into(),
            description: None,
            dimensions: None,
            scoring_type: None,
            min_score: 0,
            max_score: 100,
            estimated_time: None,
            is_active: true,
            sort_order: 0,
            created_at: None,
            updated_at: None,
        }
    }

    fn item(id: &str, category_id: &str, order: i64) -> ItemRecord {
        ItemRecord {
            id: id.into(),
            category_id: category_id.into(),
            text: format!("question {id}"),
            text_en: None,
            item_type: "single_choice".into(),
            dimension: None,
            domain: None,
            weight: 1.0,
            order_index: order,
            is_required: true,
            is_active: true,
            is_reverse: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn sub_item(id: &str, item_id: &str) -> SubItemRecord {
        SubItemRecord {
            id: id.into(),
            item_id: item_id.into(),
            text: format!("option {id}"),
            text_en: None,
            value: id.into(),
            score: 1.0,
            description: None,
            order_index: 0,
            is_correct: false,
            is_active: true,
            created_at: None,
        }
    }

    fn legacy_table() -> LegacyIdTable {
        let mut categories = BTreeMap::new();
        categories.insert(
            "love-language-category".to_string(),
            "cat_love_language".to_string(),
        );
        LegacyIdTable {
            version: 1,
            categories,
        }
    }

    #[test]
    fn plan_rewrites_item_fks_to_resolved_id() {
        let source = MemoryStore::new("source");
        source.seed(
            vec![category("love-language-category", "love_language")],
            vec![item("q1", "love-language-category", 1)],
            vec![sub_item("o1", "q1")],
        );
        let target = MemoryStore::new("target");

        let mapper = IdentifierMapper::new(legacy_table());
        let cp = Planner::plan_category(
            &source,
            &target,
            &mapper,
            category("love-language-category", "love_language"),
            None,
        )
        .unwrap();

        assert_eq!(cp.resolution.method, ResolutionMethod::LegacyTable);
        assert_eq!(cp.resolution.target_id, "cat_love_language");
        assert_eq!(cp.legacy_ids, vec!["love-language-category".to_string()]);

        match &cp.item_ops[0] {
            WriteOp::UpsertItem(i) => assert_eq!(i.category_id, "cat_love_language"),
            other => panic!("unexpected op: {other:?}"),
        }
        assert_eq!(cp.sub_item_count(), 1);
    }

    #[test]
    fn exact_resolution_has_no_legacy_candidates() {
        let source = MemoryStore::new("source");
        source.seed(vec![category("cat_mbti", "mbti")], vec![], vec![]);
        let target = MemoryStore::new("target");
        target.seed(vec![category("cat_mbti", "mbti")], vec![], vec![]);

        let mapper = IdentifierMapper::new(LegacyIdTable::empty());
        let cp =
            Planner::plan_category(&source, &target, &mapper, category("cat_mbti", "mbti"), None)
                .unwrap();
        assert!(cp.legacy_ids.is_empty());
    }

    #[test]
    fn row_limit_drops_orphaned_sub_items() {
        let source = MemoryStore::new("source");
        source.seed(
            vec![category("cat_a", "alpha")],
            vec![item("q1", "cat_a", 1), item("q2", "cat_a", 2)],
            vec![sub_item("o1", "q1"), sub_item("o2", "q2")],
        );
        let target = MemoryStore::new("target");

        let mapper = IdentifierMapper::new(LegacyIdTable::empty());
        let cp = Planner::plan_category(
            &source,
            &target,
            &mapper,
            category("cat_a", "alpha"),
            Some(1),
        )
        .unwrap();

        assert_eq!(cp.item_count(), 1);
        // o2's parent was truncated, so o2 must not be planned.
        assert_eq!(cp.sub_item_count(), 1);
        match &cp.sub_item_ops[0] {
            WriteOp::UpsertSubItem(s) => assert_eq!(s.id, "o1"),
            other => panic!("unexpected op: {other:?}"),
        }
    }
}
