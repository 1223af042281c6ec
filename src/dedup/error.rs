//! Deduplication Error Types
//!
//! Queue failures never show up here: pull, put, delete, reset and parse
//! failures are handled inside the worker that hit them. Only internal
//! faults propagate out of a run.

use crate::dedup::pool::WorkerRole;

#[derive(Debug, Clone, thiserror::Error)]
pub enum DedupError {
    /// The ledger lock was poisoned by a panicking worker
    #[error("Ledger synchronisation error: {message}")]
    Synchronisation { message: String },

    /// A worker task panicked or was cancelled
    #[error("{role} worker failed: {message}")]
    WorkerFailed { role: WorkerRole, message: String },

    #[error("Invalid deduplicator configuration: {message}")]
    Configuration { message: String },
}

impl crate::core::error_handling::ContextualError for DedupError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, DedupError::Configuration { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            DedupError::Configuration { message } => Some(message),
            _ => None,
        }
    }
}

/// Result type for deduplication operations
pub type DedupResult<T> = Result<T, DedupError>;
