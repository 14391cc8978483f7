//! # QuizSync Model
//!
//! Record, mapping, and status types for QuizSync.
//!
//! This crate provides:
//! - `CategoryRecord`, `ItemRecord`, `SubItemRecord` for the three-level
//!   content hierarchy (test categories → questions → answer options)
//! - `WriteOp` for typed, idempotent write operations
//! - `IdentifierMapping` for id-resolution audit records
//! - `SyncStatus` for post-sync verification reports
//!
//! This is a pure data crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod mapping;
mod ops;
mod records;
mod status;

pub use mapping::{IdentifierMapping, ResolutionMethod};
pub use ops::WriteOp;
pub use records::{CategoryRecord, EntityKind, ItemRecord, SubItemRecord};
pub use status::{StateCounts, SyncState, SyncStatus};
