//! Error types for environment execution.

use thiserror::Error;

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Errors that can occur while executing against an environment.
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Network/timeout failure; likely to succeed on retry.
    #[error("transient execution error: {message}")]
    Transient {
        /// Raw failure text from the backend.
        message: String,
    },

    /// FK/uniqueness/check violation; retrying cannot help, the offending
    /// row must be isolated instead.
    #[error("constraint violation: {message}")]
    Constraint {
        /// Raw failure text from the backend.
        message: String,
    },

    /// Missing credential or unknown environment; fatal for the whole run.
    #[error("configuration error: {message}")]
    Configuration {
        /// Actionable description naming what is missing.
        message: String,
    },

    /// Any other non-transient execution failure (syntax error, etc.).
    #[error("execution failed: {message}")]
    Execution {
        /// Raw failure text from the backend.
        message: String,
    },

    /// The backend returned rows that could not be decoded.
    #[error("row decode error: {0}")]
    Decode(String),

    /// I/O failure while staging a statement file or spawning the CLI.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConnectorError {
    /// Returns true if the operation is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConnectorError::Transient { .. })
    }

    /// Returns true if the error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConnectorError::Configuration { .. })
    }
}

/// Classifies raw backend/CLI failure text into the error taxonomy.
///
/// Signature matching is deliberately broad: remote backends surface network
/// trouble through several different strings, and misclassifying a transient
/// failure as structural costs a whole category.
pub fn classify_failure(raw: &str) -> ConnectorError {
    let lower = raw.to_ascii_lowercase();

    const TRANSIENT_SIGNATURES: [&str; 8] = [
        "timeout",
        "timed out",
        "econnreset",
        "econnrefused",
        "network",
        "fetch failed",
        "too many requests",
        "socket hang up",
    ];
    if TRANSIENT_SIGNATURES.iter().any(|sig| lower.contains(sig)) || lower.contains("429") {
        return ConnectorError::Transient { message: raw.into() };
    }

    const CONSTRAINT_SIGNATURES: [&str; 4] = [
        "unique constraint",
        "foreign key constraint",
        "check constraint",
        "not null constraint",
    ];
    if CONSTRAINT_SIGNATURES.iter().any(|sig| lower.contains(sig)) {
        return ConnectorError::Constraint { message: raw.into() };
    }

    ConnectorError::Execution { message: raw.into() }
}
