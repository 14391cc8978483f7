//! The typed store surface the engine consumes.

use crate::error::ConnectorResult;
use quizsync_model::{CategoryRecord, ItemRecord, SubItemRecord, WriteOp};

/// Read/write access to one environment's content tables.
///
/// This trait abstracts the execution backend, allowing the real database
/// CLI paths and an in-memory implementation for testing.
///
/// `apply` executes ops in order and stops at the first failure, mirroring
/// multi-statement upload semantics: callers that need row-level isolation
/// degrade to single-op batches. An UPDATE that affects zero rows is a no-op
/// success, not an error.
pub trait EnvironmentStore: Send + Sync {
    /// The environment's name, for logs and reports.
    fn name(&self) -> &str;

    /// Applies a batch of write ops in order, stopping at the first failure.
    fn apply(&self, ops: &[WriteOp]) -> ConnectorResult<()>;

    /// All categories.
    fn categories(&self) -> ConnectorResult<Vec<CategoryRecord>>;

    /// One category by id.
    fn category_by_id(&self, id: &str) -> ConnectorResult<Option<CategoryRecord>>;

    /// Active categories sharing a business code, ordered by id.
    fn categories_by_code(&self, code: &str) -> ConnectorResult<Vec<CategoryRecord>>;

    /// Questions in a category.
    fn items(&self, category_id: &str) -> ConnectorResult<Vec<ItemRecord>>;

    /// Options under a category's questions.
    fn sub_items(&self, category_id: &str) -> ConnectorResult<Vec<SubItemRecord>>;

    /// Count of questions in a category.
    fn count_items(&self, category_id: &str) -> ConnectorResult<u64>;

    /// Count of active questions referencing a category id.
    fn count_active_items(&self, category_id: &str) -> ConnectorResult<u64>;

    /// Count of options under a category's questions.
    fn count_sub_items(&self, category_id: &str) -> ConnectorResult<u64>;
}
