//! # QuizSync Engine
//!
//! Reconciliation planner, batch executor, and verifier for QuizSync.
//!
//! This crate provides:
//! - Identifier resolution across diverging id namespaces
//! - An ordered, FK-safe, idempotent write-plan per category
//! - Throttled batch execution with retry/backoff and per-row fallback
//! - Post-sync verification by count comparison
//! - The per-run orchestrator tying it all together
//!
//! ## Architecture
//!
//! A run reconciles three-level content (category → question → option) from
//! a source environment into a target environment, "source wins". Per
//! category the runner executes four ordered steps:
//! 1. upsert the category under its resolved target id
//! 2. remap item FKs away from known legacy category ids
//! 3. upsert questions, then options
//! 4. delete legacy category rows nothing references anymore
//!
//! ## Key invariants
//!
//! - Every write op is idempotent; re-running a crashed sync converges
//! - One category's failure never blocks the rest of the run
//! - Transient failures retry with the same backoff on reads and writes
//! - Only configuration errors abort a run
//! - The zero-reference check re-runs immediately before each legacy delete

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod executor;
mod legacy;
mod mapper;
mod planner;
mod retry;
mod runner;
mod verifier;

pub use config::{RetryConfig, SyncConfig};
pub use error::{SyncError, SyncResult};
pub use executor::{BatchExecutor, BatchReport, ExecutorStats, FailedOp};
pub use legacy::LegacyIdTable;
pub use mapper::{IdentifierMapper, Resolution};
pub use planner::{CategoryPlan, Planner};
pub use retry::RetryingStore;
pub use runner::{CategoryOutcome, CategoryReport, ProgressSink, RunReport, SyncRunner};
pub use verifier::{CategoryVerification, Verifier};
