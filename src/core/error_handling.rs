//! Fatal error reporting at the process boundary
//!
//! Errors that end the process are split into two kinds. User-actionable
//! errors (bad flags, bad config) are shown verbatim. System errors (a
//! panicking worker, a transport that cannot be built) are shown as a short
//! operation context, with the full error at debug level.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` should return
/// `Some(message)`; otherwise it should return `None`.
pub trait ContextualError: std::error::Error {
    /// True if the message tells the user what to fix
    fn is_user_actionable(&self) -> bool;

    fn user_message(&self) -> Option<&str>;
}

/// Log a fatal error with a detail level matching its kind
///
/// # Examples
/// ```rust,no_run
/// # use sqs_dedup::core::error_handling::log_error_with_context;
/// # use sqs_dedup::core::validation::ValidationError;
/// let error = ValidationError::new("--queue-url and --storage-queue-url must differ");
/// log_error_with_context(&error, "Argument validation");
/// // Logs: "FATAL: --queue-url and --storage-queue-url must differ"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {} failed", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::ValidationError;
    use crate::dedup::api::DedupError;
    use crate::dedup::WorkerRole;
    use crate::queue::QueueError;

    #[test]
    fn test_validation_errors_are_user_actionable() {
        let error = ValidationError::new("--num-workers must be at least 1");

        assert!(error.is_user_actionable());
        assert_eq!(error.user_message(), Some("--num-workers must be at least 1"));
    }

    #[test]
    fn test_worker_failure_is_a_system_error() {
        let error = DedupError::WorkerFailed {
            role: WorkerRole::Puller,
            message: "task panicked".to_string(),
        };

        assert!(!error.is_user_actionable());
        assert_eq!(error.user_message(), None);
    }

    #[test]
    fn test_configuration_error_carries_its_message() {
        let error = DedupError::Configuration {
            message: "num_workers must be at least 1".to_string(),
        };

        assert!(error.is_user_actionable());
        assert_eq!(error.user_message(), Some("num_workers must be at least 1"));
    }

    #[test]
    fn test_queue_setup_errors() {
        let bad_url = QueueError::OperationFailed {
            message: "Invalid queue URL 'x'".to_string(),
        };
        let transport = QueueError::Transport {
            queue: "primary".to_string(),
            message: "connection refused".to_string(),
        };

        assert!(bad_url.is_user_actionable());
        assert!(!transport.is_user_actionable());
        assert_eq!(transport.user_message(), None);

        // Must not panic for either kind
        log_error_with_context(&bad_url, "Queue setup");
        log_error_with_context(&transport, "Queue setup");
    }
}
