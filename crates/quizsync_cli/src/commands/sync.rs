//! Sync command implementation.

use quizsync_engine::{
    CategoryOutcome, CategoryReport, IdentifierMapper, ProgressSink, SyncConfig, SyncRunner,
};
use std::path::Path;

/// Prints one line per category as the run proceeds.
struct PrintSink;

impl ProgressSink for PrintSink {
    fn category_finished(&mut self, report: &CategoryReport) {
        let mark = match report.outcome {
            CategoryOutcome::Synced => "✓",
            _ => "✗",
        };
        match &report.verification {
            Some(v) => println!(
                "{mark} {} [{}]: questions {}/{}, options {}/{}",
                report.code,
                report.outcome,
                v.items.target_count,
                v.items.source_count,
                v.sub_items.target_count,
                v.sub_items.source_count,
            ),
            None => println!("{mark} {} [{}]", report.code, report.outcome),
        }
        for failure in &report.failures {
            println!("    {failure}");
        }
    }
}

/// Runs the sync command.
pub fn run(
    config_path: &Path,
    module: &str,
    submodule: Option<&str>,
    source: &str,
    target: &str,
    limit: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    if module != "tests" {
        return Err(format!("unknown module '{module}' (only 'tests' is synced)").into());
    }

    let ctx = super::load_context(config_path, source, target)?;

    let mut config = SyncConfig::new();
    if let Some(limit) = limit {
        config = config.with_row_limit(limit);
    }

    println!("Syncing tests from '{source}' into '{target}'");
    if let Some(code) = submodule {
        println!("Restricted to category '{code}'");
    }
    println!();

    let runner = SyncRunner::new(
        &ctx.source,
        &ctx.target,
        IdentifierMapper::new(ctx.legacy),
        config,
    );
    let report = runner.run(submodule, &mut PrintSink)?;

    println!();
    println!("Summary: {}", report.counts);
    println!(
        "Batches: {} ({} retries, {} fallbacks)",
        report.stats.batches, report.stats.retries, report.stats.fallbacks
    );
    for note in &report.ambiguities {
        println!("Review: {note}");
    }

    if report.categories.is_empty() {
        return Err("nothing to sync (no matching source category)".into());
    }
    if report.fully_failed() {
        return Err("sync failed for every category".into());
    }

    Ok(())
}
