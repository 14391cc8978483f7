//! QuizSync CLI
//!
//! Command-line entry points for quiz content synchronization.
//!
//! # Commands
//!
//! - `sync` - Reconcile content from a source environment into a target
//! - `verify` - Read-only count verification across the configured categories
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// QuizSync content synchronization tools.
#[derive(Parser)]
#[command(name = "quizsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(global = true, short, long, default_value = "quizsync.json")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile content from a source environment into a target
    Sync {
        /// Content module to sync (currently only `tests`)
        module: String,

        /// Optional category code to restrict the run to
        submodule: Option<String>,

        /// Source environment name
        #[arg(short, long)]
        source: String,

        /// Target environment name
        #[arg(short, long, default_value = "production")]
        target: String,

        /// Cap on questions synced per category
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Verify counts across the configured category set (read-only)
    Verify {
        /// Source environment name
        #[arg(short, long)]
        source: String,

        /// Target environment name
        #[arg(short, long, default_value = "production")]
        target: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Sync {
            module,
            submodule,
            source,
            target,
            limit,
        } => {
            commands::sync::run(
                &cli.config,
                &module,
                submodule.as_deref(),
                &source,
                &target,
                limit,
            )?;
        }
        Commands::Verify {
            source,
            target,
            format,
        } => {
            commands::verify::run(&cli.config, &source, &target, &format)?;
        }
        Commands::Version => {
            println!("QuizSync v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
