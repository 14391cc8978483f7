//! Subcommand implementations.

pub mod sync;
pub mod verify;

use quizsync_connector::{CliStore, EnvironmentsFile};
use quizsync_engine::LegacyIdTable;
use std::path::Path;
use tracing::debug;

/// Loaded configuration plus the two stores a command operates on.
pub struct Context {
    /// The source environment store.
    pub source: CliStore,
    /// The target environment store.
    pub target: CliStore,
    /// The shared legacy-id table (empty when not configured).
    pub legacy: LegacyIdTable,
    /// Fixed category codes for the verify entry point.
    pub verify_categories: Vec<String>,
}

/// Builds stores for both environments from the configuration file.
///
/// Credential resolution happens here, so a missing token fails before any
/// statement is attempted.
pub fn load_context(
    config_path: &Path,
    source: &str,
    target: &str,
) -> Result<Context, Box<dyn std::error::Error>> {
    let file = EnvironmentsFile::load(config_path)?;

    if source == target {
        return Err(format!("source and target are both '{source}'").into());
    }

    let source_store = CliStore::new(file.binary.clone(), file.environment(source)?.clone())?;
    let target_store = CliStore::new(file.binary.clone(), file.environment(target)?.clone())?;

    debug!(
        source = source,
        target = target,
        environments = file.environments.len(),
        "loaded configuration"
    );

    let legacy = match &file.legacy_table {
        Some(rel) => {
            let base = config_path.parent().unwrap_or_else(|| Path::new("."));
            LegacyIdTable::load(&base.join(rel))?
        }
        None => LegacyIdTable::empty(),
    };

    Ok(Context {
        source: source_store,
        target: target_store,
        legacy,
        verify_categories: file.verify_categories,
    })
}
