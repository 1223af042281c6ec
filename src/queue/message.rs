//! Message Types for the Deduplication Queues
//!
//! A queue hands out deliveries that expose four capabilities: the domain
//! dedup key, the queue-assigned delivery id, the per-delivery acknowledgment
//! token, and the raw body. Different queue formats provide their own
//! implementations of [`QueueMessage`]; the engine only ever sees the trait.

use std::fmt::Debug;
use std::sync::Arc;

/// Capability set every delivered message must provide
///
/// # Example
///
/// ```rust
/// use sqs_dedup::queue::{ParsedMessage, QueueMessage};
///
/// let message = ParsedMessage::new("uuid-1", "msg-1", "receipt-1", "{}");
/// assert_eq!(message.unique_id(), "uuid-1");
/// assert_eq!(message.ack_token(), "receipt-1");
/// ```
pub trait QueueMessage: Send + Sync + Debug {
    /// Domain-level dedup key (business identity)
    fn unique_id(&self) -> &str;

    /// Queue-assigned id of the physical send. A redelivery of the same send
    /// carries the same delivery id under a fresh acknowledgment token.
    fn delivery_id(&self) -> &str;

    /// Opaque credential needed to delete or change visibility of this delivery
    fn ack_token(&self) -> &str;

    /// Body exactly as received, used when the message is re-put elsewhere
    fn raw_body(&self) -> &str;
}

/// Shared handle to a delivered message
pub type MessageRef = Arc<dyn QueueMessage>;

/// Plain message with all four capabilities resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    unique_id: String,
    delivery_id: String,
    ack_token: String,
    raw_body: String,
}

impl ParsedMessage {
    pub fn new(
        unique_id: impl Into<String>,
        delivery_id: impl Into<String>,
        ack_token: impl Into<String>,
        raw_body: impl Into<String>,
    ) -> Self {
        Self {
            unique_id: unique_id.into(),
            delivery_id: delivery_id.into(),
            ack_token: ack_token.into(),
            raw_body: raw_body.into(),
        }
    }

    pub fn into_ref(self) -> MessageRef {
        Arc::new(self)
    }
}

impl QueueMessage for ParsedMessage {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn delivery_id(&self) -> &str {
        &self.delivery_id
    }

    fn ack_token(&self) -> &str {
        &self.ack_token
    }

    fn raw_body(&self) -> &str {
        &self.raw_body
    }
}

/// Collect the acknowledgment tokens of a batch
pub fn ack_tokens(messages: &[MessageRef]) -> Vec<String> {
    messages
        .iter()
        .map(|message| message.ack_token().to_string())
        .collect()
}
