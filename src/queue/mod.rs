//! Queue Capability
//!
//! The abstract batch queue the deduplication engine runs against, the
//! message capability set it classifies on, and two implementations: an
//! Amazon SQS client and a deterministic in-memory double.
//!
//! # Overview
//!
//! - **[`Queue`]**: four batch operations (pull, delete, reset visibility, put)
//! - **[`QueueMessage`]**: unique id, delivery id, acknowledgment token, raw body
//! - **[`MessageParser`]**: decodes raw wire deliveries into messages
//! - **[`SqsQueue`]**: network-backed implementation
//! - **[`InMemoryQueue`]**: in-process implementation recording deletes and resets
//!
//! # Example Usage
//!
//! ```rust
//! use sqs_dedup::queue::{generate_messages, InMemoryQueue, Queue};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = InMemoryQueue::new("primary");
//! queue.add_messages(generate_messages(25));
//!
//! let batch = queue.pull_batch().await?;
//! assert_eq!(batch.len(), 10);
//! # Ok(())
//! # }
//! ```

pub mod api;
mod error;
pub mod memory;
mod message;
mod parser;
pub mod sqs;
mod traits;

pub use error::{QueueError, QueueResult};
pub use memory::{generate_messages, make_duplicate_messages, InMemoryQueue, SeedMessage};
pub use message::{ack_tokens, MessageRef, ParsedMessage, QueueMessage};
pub use parser::{JsonMessageParser, MessageParser, RawMessage, INVALIDATION_UNIQUE_ID_POINTER};
pub use sqs::{SqsQueue, SqsQueueConfig};
pub use traits::{Queue, MAX_BATCH_SIZE};

#[cfg(test)]
mod tests;
