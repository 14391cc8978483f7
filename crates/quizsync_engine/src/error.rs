//! Error types for the sync engine.

use quizsync_connector::ConnectorError;
use thiserror::Error;

/// Result type for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during a sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Failure executing against an environment.
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    /// The legacy-id table artifact could not be loaded or parsed.
    #[error("invalid legacy-id table: {message}")]
    LegacyTable {
        /// What went wrong, including the path.
        message: String,
    },
}

impl SyncError {
    /// Returns true if this error must abort the whole run.
    ///
    /// Everything except configuration problems is contained at
    /// per-category granularity.
    pub fn is_fatal(&self) -> bool {
        match self {
            SyncError::Connector(e) => e.is_fatal(),
            SyncError::LegacyTable { .. } => true,
        }
    }
}
