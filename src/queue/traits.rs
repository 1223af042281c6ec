//! Traits for the queue system
//!
//! The deduplication engine talks to queues only through [`Queue`]. Every
//! operation works on a batch of at most [`MAX_BATCH_SIZE`] entries; callers
//! must tolerate smaller or empty batches.

use crate::queue::error::QueueResult;
use crate::queue::message::MessageRef;
use async_trait::async_trait;

/// Upper bound on entries per pull, delete, reset or put call
pub const MAX_BATCH_SIZE: usize = 10;

/// Batch capability of a message queue
///
/// Implementations must be safe to call concurrently from many workers.
///
/// # Example Implementation
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use sqs_dedup::queue::{MessageRef, Queue, QueueResult};
///
/// struct NullQueue;
///
/// #[async_trait]
/// impl Queue for NullQueue {
///     fn name(&self) -> &str {
///         "null"
///     }
///     async fn pull_batch(&self) -> QueueResult<Vec<MessageRef>> {
///         Ok(Vec::new())
///     }
///     async fn delete_batch(&self, _tokens: &[String]) -> QueueResult<()> {
///         Ok(())
///     }
///     async fn reset_visibility_batch(&self, _tokens: &[String]) -> QueueResult<()> {
///         Ok(())
///     }
///     async fn put_batch(&self, _messages: &[MessageRef]) -> QueueResult<()> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Queue: Send + Sync {
    /// Human-readable identifier used in log lines
    fn name(&self) -> &str;

    /// Receive up to a batch of messages; an empty batch means nothing visible
    async fn pull_batch(&self) -> QueueResult<Vec<MessageRef>>;

    /// Delete deliveries by acknowledgment token
    async fn delete_batch(&self, tokens: &[String]) -> QueueResult<()>;

    /// Make deliveries visible again immediately
    async fn reset_visibility_batch(&self, tokens: &[String]) -> QueueResult<()>;

    /// Enqueue copies of the given messages
    async fn put_batch(&self, messages: &[MessageRef]) -> QueueResult<()>;
}
