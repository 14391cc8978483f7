//! Per-run orchestration.

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::executor::{BatchExecutor, BatchReport, ExecutorStats};
use crate::mapper::IdentifierMapper;
use crate::planner::{CategoryPlan, Planner};
use crate::retry::RetryingStore;
use crate::verifier::{CategoryVerification, Verifier};
use quizsync_connector::{ConnectorError, EnvironmentStore};
use quizsync_model::{IdentifierMapping, StateCounts, WriteOp};
use tracing::{info, warn};

/// Final outcome for one category within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryOutcome {
    /// All levels verified synced with no write failures.
    Synced,
    /// Writes landed but something diverges or failed row-level.
    Partial,
    /// The category upsert itself failed, so downstream writes were skipped.
    Skipped,
    /// The category could not be processed at all (planning or verification
    /// error).
    Failed,
}

impl std::fmt::Display for CategoryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CategoryOutcome::Synced => "synced",
            CategoryOutcome::Partial => "partial",
            CategoryOutcome::Skipped => "skipped",
            CategoryOutcome::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Per-category result of a run.
#[derive(Debug, Clone)]
pub struct CategoryReport {
    /// Business code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Final outcome.
    pub outcome: CategoryOutcome,
    /// Post-sync verification, when it could be performed.
    pub verification: Option<CategoryVerification>,
    /// Row-level failure descriptions.
    pub failures: Vec<String>,
}

/// Result of a whole run.
#[derive(Debug)]
pub struct RunReport {
    /// Per-category reports, in processing order.
    pub categories: Vec<CategoryReport>,
    /// Aggregate of all verification statuses.
    pub counts: StateCounts,
    /// Executor counters for the run.
    pub stats: ExecutorStats,
    /// Every id resolution performed, for audit.
    pub mappings: Vec<IdentifierMapping>,
    /// Mapping-ambiguity flags raised during the run.
    pub ambiguities: Vec<String>,
}

impl RunReport {
    /// True when not a single category came through clean.
    pub fn fully_failed(&self) -> bool {
        !self.categories.is_empty()
            && self
                .categories
                .iter()
                .all(|c| matches!(c.outcome, CategoryOutcome::Skipped | CategoryOutcome::Failed))
    }
}

/// Receives progress as categories complete.
///
/// Implementations print or collect lines; content is entity name, counts,
/// pass/fail.
pub trait ProgressSink {
    /// Called once per category, after verification.
    fn category_finished(&mut self, report: &CategoryReport);
}

impl ProgressSink for () {
    fn category_finished(&mut self, _report: &CategoryReport) {}
}

/// Orchestrates one bounded sync run: plan, execute, clean up, verify.
///
/// Runs are single-threaded by design: category → item → sub-item ordering
/// is what makes the plan FK-safe, and the check-then-delete cleanup step is
/// unsafe under concurrent mutation of the same category. Nothing is rolled
/// back mid-run; every op is idempotent, so a crashed run re-converges when
/// re-executed.
pub struct SyncRunner<'a> {
    source: &'a dyn EnvironmentStore,
    target: &'a dyn EnvironmentStore,
    mapper: IdentifierMapper,
    config: SyncConfig,
}

impl<'a> SyncRunner<'a> {
    /// Creates a runner between two environments.
    pub fn new(
        source: &'a dyn EnvironmentStore,
        target: &'a dyn EnvironmentStore,
        mapper: IdentifierMapper,
        config: SyncConfig,
    ) -> Self {
        Self {
            source,
            target,
            mapper,
            config,
        }
    }

    /// Runs the sync, optionally restricted to one category code.
    ///
    /// Only fatal (configuration) errors propagate; every other failure is
    /// contained in the affected category's report.
    pub fn run(
        &self,
        code_filter: Option<&str>,
        progress: &mut dyn ProgressSink,
    ) -> SyncResult<RunReport> {
        let executor = BatchExecutor::new(self.config.clone());
        let mut reports = Vec::new();

        // Reads are as exposed to network trouble as writes; route every
        // connector read through the run's retry policy.
        let source = RetryingStore::new(self.source, self.config.retry.clone());
        let target = RetryingStore::new(self.target, self.config.retry.clone());

        let source_categories = source.categories()?;
        info!(
            source = source.name(),
            target = target.name(),
            categories = source_categories.len(),
            "starting sync run"
        );

        for category in source_categories {
            if let Some(code) = code_filter {
                if category.code != code {
                    continue;
                }
            }

            let code = category.code.clone();
            let name = category.name.clone();
            let report = match self.sync_category(&executor, &source, &target, category) {
                Ok(report) => report,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(code = %code, error = %err, "category failed");
                    CategoryReport {
                        code,
                        name,
                        outcome: CategoryOutcome::Failed,
                        verification: None,
                        failures: vec![err.to_string()],
                    }
                }
            };

            info!(
                code = %report.code,
                outcome = %report.outcome,
                failures = report.failures.len(),
                "category finished"
            );
            progress.category_finished(&report);
            reports.push(report);
        }

        let mut counts = StateCounts::default();
        for report in &reports {
            if let Some(verification) = &report.verification {
                verification.record_into(&mut counts);
            }
        }

        Ok(RunReport {
            categories: reports,
            counts,
            stats: executor.stats(),
            mappings: self.mapper.audit_log(),
            ambiguities: self.mapper.ambiguities(),
        })
    }

    fn ensure_not_fatal(report: &BatchReport) -> SyncResult<()> {
        if let Some(message) = report.fatal_failure() {
            return Err(ConnectorError::Configuration { message }.into());
        }
        Ok(())
    }

    fn sync_category(
        &self,
        executor: &BatchExecutor,
        source: &dyn EnvironmentStore,
        target: &dyn EnvironmentStore,
        category: quizsync_model::CategoryRecord,
    ) -> SyncResult<CategoryReport> {
        let plan =
            Planner::plan_category(source, target, &self.mapper, category, self.config.row_limit)?;

        let code = plan.source.code.clone();
        let name = plan.source.name.clone();
        let mut failures = Vec::new();

        // Step 1: the category itself. A category that cannot be upserted
        // after retries is marked skipped; its items and options are not
        // attempted, but the rest of the run continues.
        let report = executor.run(target, std::slice::from_ref(&plan.category_op));
        Self::ensure_not_fatal(&report)?;
        if !report.is_clean() {
            for f in &report.failed {
                failures.push(format!("{}: {}", f.op.describe(), f.error));
            }
            return Ok(CategoryReport {
                code,
                name,
                outcome: CategoryOutcome::Skipped,
                verification: None,
                failures,
            });
        }

        // Step 2: FK remaps. Both preconditions are checked immediately
        // before the UPDATE to avoid no-op round trips.
        self.remap_legacy_items(executor, target, &plan, &mut failures)?;

        // Step 3: items, then their options.
        for ops in [&plan.item_ops, &plan.sub_item_ops] {
            let report = executor.run(target, ops);
            Self::ensure_not_fatal(&report)?;
            for f in &report.failed {
                failures.push(format!("{}: {}", f.op.describe(), f.error));
            }
        }

        // Step 4: delete legacy rows nothing references anymore. The
        // zero-reference check runs again right before each delete, since
        // step 2 may have partially failed.
        self.cleanup_legacy_categories(executor, target, &plan, &mut failures)?;

        let verification =
            Verifier::verify(source, target, &plan.source, &plan.resolution.target_id)?;

        let outcome = if verification.all_synced() && failures.is_empty() {
            CategoryOutcome::Synced
        } else {
            CategoryOutcome::Partial
        };

        Ok(CategoryReport {
            code,
            name,
            outcome,
            verification: Some(verification),
            failures,
        })
    }

    fn remap_legacy_items(
        &self,
        executor: &BatchExecutor,
        target: &dyn EnvironmentStore,
        plan: &CategoryPlan,
        failures: &mut Vec<String>,
    ) -> SyncResult<()> {
        for legacy_id in &plan.legacy_ids {
            let canonical_present = target.category_by_id(&plan.resolution.target_id)?.is_some();
            let referenced = target.count_items(legacy_id)? > 0;
            if !canonical_present || !referenced {
                continue;
            }

            let op = WriteOp::RemapItemCategory {
                legacy_id: legacy_id.clone(),
                canonical_id: plan.resolution.target_id.clone(),
            };
            let report = executor.run(target, std::slice::from_ref(&op));
            Self::ensure_not_fatal(&report)?;
            for f in &report.failed {
                failures.push(format!("{}: {}", f.op.describe(), f.error));
            }
        }
        Ok(())
    }

    fn cleanup_legacy_categories(
        &self,
        executor: &BatchExecutor,
        target: &dyn EnvironmentStore,
        plan: &CategoryPlan,
        failures: &mut Vec<String>,
    ) -> SyncResult<()> {
        for legacy_id in &plan.legacy_ids {
            if target.category_by_id(legacy_id)?.is_none() {
                continue;
            }
            if target.count_active_items(legacy_id)? > 0 {
                warn!(
                    legacy_id = %legacy_id,
                    "legacy category still referenced, leaving in place"
                );
                continue;
            }

            let op = WriteOp::DeleteCategory {
                id: legacy_id.clone(),
            };
            let report = executor.run(target, std::slice::from_ref(&op));
            Self::ensure_not_fatal(&report)?;
            for f in &report.failed {
                failures.push(format!("{}: {}", f.op.describe(), f.error));
            }
        }
        Ok(())
    }
}
