//! In-memory environment store for tests.

use crate::error::{ConnectorError, ConnectorResult};
use crate::store::EnvironmentStore;
use parking_lot::RwLock;
use quizsync_model::{CategoryRecord, ItemRecord, SubItemRecord, WriteOp};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of all three tables, for state comparisons in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    /// Categories by id.
    pub categories: BTreeMap<String, CategoryRecord>,
    /// Questions by id.
    pub items: BTreeMap<String, ItemRecord>,
    /// Options by id.
    pub sub_items: BTreeMap<String, SubItemRecord>,
}

/// An in-memory three-table store.
///
/// Interprets [`WriteOp`]s against owned maps and enforces the same FK rules
/// the real schema carries, so engine tests exercise constraint failures
/// without a database. Failure injection hooks script per-id constraint
/// errors and a number of leading transient failures.
pub struct MemoryStore {
    name: String,
    tables: RwLock<TableSnapshot>,
    constraint_ids: RwLock<HashSet<String>>,
    transient_failures: AtomicU64,
    read_failures: AtomicU64,
    apply_calls: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: RwLock::new(TableSnapshot {
                categories: BTreeMap::new(),
                items: BTreeMap::new(),
                sub_items: BTreeMap::new(),
            }),
            constraint_ids: RwLock::new(HashSet::new()),
            transient_failures: AtomicU64::new(0),
            read_failures: AtomicU64::new(0),
            apply_calls: AtomicU64::new(0),
        }
    }

    /// Seeds records directly, bypassing FK checks and failure injection.
    pub fn seed(
        &self,
        categories: Vec<CategoryRecord>,
        items: Vec<ItemRecord>,
        sub_items: Vec<SubItemRecord>,
    ) {
        let mut tables = self.tables.write();
        for c in categories {
            tables.categories.insert(c.id.clone(), c);
        }
        for i in items {
            tables.items.insert(i.id.clone(), i);
        }
        for s in sub_items {
            tables.sub_items.insert(s.id.clone(), s);
        }
    }

    /// Makes every op keyed on `id` fail with a constraint violation.
    pub fn fail_with_constraint(&self, id: impl Into<String>) {
        self.constraint_ids.write().insert(id.into());
    }

    /// Makes the next `n` apply calls fail with a transient error.
    pub fn inject_transient(&self, n: u64) {
        self.transient_failures.store(n, Ordering::SeqCst);
    }

    /// Makes the next `n` read calls fail with a transient error.
    pub fn inject_read_transient(&self, n: u64) {
        self.read_failures.store(n, Ordering::SeqCst);
    }

    // Gates the base read methods only; the count methods delegate to them,
    // so one failing read consumes one injection.
    fn read_gate(&self) -> ConnectorResult<()> {
        let remaining = self.read_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.read_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ConnectorError::Transient {
                message: "injected: read timed out".into(),
            });
        }
        Ok(())
    }

    /// Number of apply calls made so far, for retry assertions.
    pub fn apply_calls(&self) -> u64 {
        self.apply_calls.load(Ordering::SeqCst)
    }

    /// Clones the current table state.
    pub fn snapshot(&self) -> TableSnapshot {
        self.tables.read().clone()
    }

    fn apply_one(&self, tables: &mut TableSnapshot, op: &WriteOp) -> ConnectorResult<()> {
        if self.constraint_ids.read().contains(op.target_id()) {
            return Err(ConnectorError::Constraint {
                message: format!(
                    "UNIQUE constraint failed: {}.id ({})",
                    op.entity().table(),
                    op.target_id()
                ),
            });
        }

        match op {
            WriteOp::UpsertCategory(c) => {
                tables.categories.insert(c.id.clone(), c.clone());
            }
            WriteOp::UpsertItem(i) => {
                if !tables.categories.contains_key(&i.category_id) {
                    return Err(ConnectorError::Constraint {
                        message: format!(
                            "FOREIGN KEY constraint failed: questions.category_id ({})",
                            i.category_id
                        ),
                    });
                }
                tables.items.insert(i.id.clone(), i.clone());
            }
            WriteOp::UpsertSubItem(s) => {
                if !tables.items.contains_key(&s.item_id) {
                    return Err(ConnectorError::Constraint {
                        message: format!(
                            "FOREIGN KEY constraint failed: question_options.question_id ({})",
                            s.item_id
                        ),
                    });
                }
                tables.sub_items.insert(s.id.clone(), s.clone());
            }
            WriteOp::RemapItemCategory {
                legacy_id,
                canonical_id,
            } => {
                // Zero affected rows is a no-op success.
                for item in tables.items.values_mut() {
                    if item.category_id == *legacy_id {
                        item.category_id = canonical_id.clone();
                    }
                }
            }
            WriteOp::DeleteCategory { id } => {
                tables.categories.remove(id);
            }
        }
        Ok(())
    }
}

impl EnvironmentStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, ops: &[WriteOp]) -> ConnectorResult<()> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ConnectorError::Transient {
                message: "injected: fetch failed".into(),
            });
        }

        // Ops before the failing one stay applied, matching the real
        // multi-statement upload behavior.
        let mut tables = self.tables.write();
        for op in ops {
            self.apply_one(&mut tables, op)?;
        }
        Ok(())
    }

    fn categories(&self) -> ConnectorResult<Vec<CategoryRecord>> {
        self.read_gate()?;
        Ok(self.tables.read().categories.values().cloned().collect())
    }

    fn category_by_id(&self, id: &str) -> ConnectorResult<Option<CategoryRecord>> {
        self.read_gate()?;
        Ok(self.tables.read().categories.get(id).cloned())
    }

    fn categories_by_code(&self, code: &str) -> ConnectorResult<Vec<CategoryRecord>> {
        self.read_gate()?;
        Ok(self
            .tables
            .read()
            .categories
            .values()
            .filter(|c| c.code == code && c.is_active)
            .cloned()
            .collect())
    }

    fn items(&self, category_id: &str) -> ConnectorResult<Vec<ItemRecord>> {
        self.read_gate()?;
        Ok(self
            .tables
            .read()
            .items
            .values()
            .filter(|i| i.category_id == category_id)
            .cloned()
            .collect())
    }

    fn sub_items(&self, category_id: &str) -> ConnectorResult<Vec<SubItemRecord>> {
        self.read_gate()?;
        let tables = self.tables.read();
        Ok(tables
            .sub_items
            .values()
            .filter(|s| {
                tables
                    .items
                    .get(&s.item_id)
                    .is_some_and(|i| i.category_id == category_id)
            })
            .cloned()
            .collect())
    }

    fn count_items(&self, category_id: &str) -> ConnectorResult<u64> {
        Ok(self.items(category_id)?.len() as u64)
    }

    fn count_active_items(&self, category_id: &str) -> ConnectorResult<u64> {
        Ok(self
            .items(category_id)?
            .iter()
            .filter(|i| i.is_active)
            .count() as u64)
    }

    fn count_sub_items(&self, category_id: &str) -> ConnectorResult<u64> {
        Ok(self.sub_items(category_id)?.len() as u64)
    }
}
