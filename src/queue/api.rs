//! Public API for the queue system
//!
//! External modules should import from here rather than directly from the
//! implementation modules.

// Capability and message types
pub use crate::queue::message::{ack_tokens, MessageRef, ParsedMessage, QueueMessage};
pub use crate::queue::traits::{Queue, MAX_BATCH_SIZE};

// Parsing
pub use crate::queue::parser::{JsonMessageParser, MessageParser, RawMessage};

// Implementations
pub use crate::queue::memory::InMemoryQueue;
pub use crate::queue::sqs::{SqsQueue, SqsQueueConfig};

// Error handling
pub use crate::queue::error::{QueueError, QueueResult};
