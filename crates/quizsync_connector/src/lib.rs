//! # QuizSync Connector
//!
//! Environment connector for QuizSync.
//!
//! This crate provides:
//! - Named environment configuration and credential resolution
//! - Centralized parameterized SQL construction and escaping
//! - The database-CLI execution paths (local scratch-file, remote command)
//! - Failure classification (transient vs. constraint vs. configuration)
//! - An in-memory store with failure injection for tests
//!
//! ## Key invariants
//!
//! - SQL text is assembled only in the [`sql`] module
//! - Scratch files are removed on every exit path
//! - A missing credential for a remote environment fails before any
//!   statement executes

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cli_store;
mod environment;
mod error;
mod memory;
mod row;
pub mod sql;
mod store;

pub use cli_store::CliStore;
pub use environment::{EnvironmentConfig, EnvironmentsFile, ExecutionMode};
pub use error::{classify_failure, ConnectorError, ConnectorResult};
pub use memory::{MemoryStore, TableSnapshot};
pub use store::EnvironmentStore;
