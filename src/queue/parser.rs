//! Wire payload parsing
//!
//! Turns a raw delivery (id, receipt, body) into a [`MessageRef`]. The
//! dedup key lives somewhere inside the JSON body; [`JsonMessageParser`]
//! locates it with a JSON pointer so other message formats only need a
//! different pointer rather than a new parser.

use crate::queue::error::{QueueError, QueueResult};
use crate::queue::message::{MessageRef, ParsedMessage};
use serde_json::Value;

/// Default pointer for invalidation-queue messages: `{"data": {"uuid": ...}}`
pub const INVALIDATION_UNIQUE_ID_POINTER: &str = "/data/uuid";

/// Delivery as handed over by the transport, before parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub body: String,
}

/// Decodes a raw delivery into a message exposing the dedup capabilities
pub trait MessageParser: Send + Sync {
    fn parse(&self, raw: RawMessage) -> QueueResult<MessageRef>;
}

/// Parser that reads the dedup key from a JSON body via a JSON pointer
#[derive(Debug, Clone)]
pub struct JsonMessageParser {
    unique_id_pointer: String,
}

impl JsonMessageParser {
    pub fn new(unique_id_pointer: impl Into<String>) -> Self {
        Self {
            unique_id_pointer: unique_id_pointer.into(),
        }
    }

    /// Parser for the invalidation queue format
    pub fn invalidation() -> Self {
        Self::new(INVALIDATION_UNIQUE_ID_POINTER)
    }

    pub fn unique_id_pointer(&self) -> &str {
        &self.unique_id_pointer
    }

    fn extract_unique_id(&self, body: &Value) -> Option<String> {
        match body.pointer(&self.unique_id_pointer)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl Default for JsonMessageParser {
    fn default() -> Self {
        Self::invalidation()
    }
}

impl MessageParser for JsonMessageParser {
    fn parse(&self, raw: RawMessage) -> QueueResult<MessageRef> {
        let body: Value = serde_json::from_str(&raw.body).map_err(|e| QueueError::Parse {
            message_id: raw.message_id.clone(),
            message: format!("body is not valid JSON: {}", e),
        })?;

        let unique_id = self
            .extract_unique_id(&body)
            .ok_or_else(|| QueueError::Parse {
                message_id: raw.message_id.clone(),
                message: format!("no usable unique id at '{}'", self.unique_id_pointer),
            })?;

        Ok(ParsedMessage::new(unique_id, raw.message_id, raw.receipt_handle, raw.body).into_ref())
    }
}
