//! Queue Error Types

#[derive(Debug, Clone, thiserror::Error)]
pub enum QueueError {
    #[error("Transport error on queue '{queue}': {message}")]
    Transport { queue: String, message: String },

    #[error("Queue API error ({code}): {message}")]
    Api { code: String, message: String },

    #[error("Failed to parse message {message_id}: {message}")]
    Parse { message_id: String, message: String },

    #[error("Batch partially failed: {failed} of {total} entries rejected")]
    PartialBatch { failed: usize, total: usize },

    #[error("Batch of {size} entries exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

impl crate::core::error_handling::ContextualError for QueueError {
    // Only setup failures (bad URL, client construction) reach the user;
    // runtime queue errors are absorbed by the workers.
    fn is_user_actionable(&self) -> bool {
        matches!(self, QueueError::OperationFailed { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            QueueError::OperationFailed { message } => Some(message),
            _ => None,
        }
    }
}
