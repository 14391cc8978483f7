//! Verify command implementation.

use quizsync_engine::{CategoryVerification, IdentifierMapper, RetryConfig, RetryingStore, Verifier};
use quizsync_model::StateCounts;
use std::path::Path;

/// Runs the read-only verify command across the configured category set.
///
/// `partial` and `missing` states are informational; only configuration
/// failures exit non-zero.
pub fn run(
    config_path: &Path,
    source: &str,
    target: &str,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = super::load_context(config_path, source, target)?;
    if ctx.verify_categories.is_empty() {
        return Err("no verify_categories configured".into());
    }

    let mapper = IdentifierMapper::new(ctx.legacy);
    let source_store = RetryingStore::new(&ctx.source, RetryConfig::default());
    let target_store = RetryingStore::new(&ctx.target, RetryConfig::default());
    let mut results: Vec<CategoryVerification> = Vec::new();
    let mut counts = StateCounts::default();

    for code in &ctx.verify_categories {
        let verification = Verifier::verify_code(&source_store, &target_store, &mapper, code)?;
        verification.record_into(&mut counts);
        results.push(verification);
    }

    match format {
        "json" => {
            let payload = serde_json::json!({
                "categories": results,
                "summary": counts,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        _ => {
            println!("Verifying '{target}' against '{source}'");
            println!();
            for v in &results {
                println!("{} -> {}", v.code, v.target_id);
                for status in v.statuses() {
                    println!(
                        "  {:<10} {:<8} target {} vs source {}",
                        status.entity.label(),
                        status.state.to_string(),
                        status.target_count,
                        status.source_count,
                    );
                    for issue in &status.issues {
                        println!("    {issue}");
                    }
                }
            }
            println!();
            println!("Summary: {counts}");
        }
    }

    Ok(())
}
