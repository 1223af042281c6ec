//! In-memory queue double
//!
//! A deterministic, fully in-process [`Queue`] for tests and local runs. It
//! models the parts of a visibility-timeout queue the engine depends on:
//!
//! - pulled messages leave the visible set and become in-flight under a fresh
//!   acknowledgment token
//! - deleting or resetting an in-flight token settles that delivery and
//!   records it for assertions; unknown tokens are ignored
//! - put messages are enqueued as new sends with fresh delivery ids
//!
//! Reset deliveries are recorded rather than returned to the visible set, so
//! a drained queue reads as empty after the engine finishes.

use crate::queue::error::{QueueError, QueueResult};
use crate::queue::message::{MessageRef, ParsedMessage};
use crate::queue::traits::{Queue, MAX_BATCH_SIZE};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Message to seed into an [`InMemoryQueue`]
///
/// A `None` delivery id makes the queue assign a fresh one, as a real queue
/// does for every new send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedMessage {
    pub unique_id: String,
    pub delivery_id: Option<String>,
    pub raw_body: String,
}

impl SeedMessage {
    pub fn new(unique_id: impl Into<String>) -> Self {
        let unique_id = unique_id.into();
        let raw_body = invalidation_body(&unique_id);
        Self {
            unique_id,
            delivery_id: None,
            raw_body,
        }
    }

    pub fn with_delivery_id(mut self, delivery_id: impl Into<String>) -> Self {
        self.delivery_id = Some(delivery_id.into());
        self
    }
}

/// `count` messages keyed `uuid-1` .. `uuid-<count>`
pub fn generate_messages(count: usize) -> Vec<SeedMessage> {
    (1..=count)
        .map(|i| SeedMessage::new(format!("uuid-{}", i)))
        .collect()
}

/// `count` distinct sends that all share one unique id
pub fn make_duplicate_messages(unique_id: &str, count: usize) -> Vec<SeedMessage> {
    (0..count).map(|_| SeedMessage::new(unique_id)).collect()
}

fn invalidation_body(unique_id: &str) -> String {
    serde_json::json!({ "data": { "uuid": unique_id } }).to_string()
}

#[derive(Debug, Clone)]
struct StoredMessage {
    unique_id: String,
    delivery_id: String,
    raw_body: String,
}

impl StoredMessage {
    fn deliver(&self, token: String) -> ParsedMessage {
        ParsedMessage::new(
            self.unique_id.clone(),
            self.delivery_id.clone(),
            token,
            self.raw_body.clone(),
        )
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    visible: VecDeque<StoredMessage>,
    in_flight: HashMap<String, StoredMessage>,
    deleted: Vec<ParsedMessage>,
    reset: Vec<ParsedMessage>,
    put_count: usize,
    next_token: u64,
    next_delivery: u64,
}

/// Thread-safe in-memory queue recording every settled delivery
#[derive(Debug)]
pub struct InMemoryQueue {
    name: String,
    batch_size: usize,
    state: Mutex<MemoryState>,
    fail_pulls: AtomicBool,
    fail_puts: AtomicBool,
}

impl InMemoryQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_batch_size(name, MAX_BATCH_SIZE)
    }

    /// Create a queue handing out at most `batch_size` messages per pull
    pub fn with_batch_size(name: impl Into<String>, batch_size: usize) -> Self {
        Self {
            name: name.into(),
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
            state: Mutex::new(MemoryState::default()),
            fail_pulls: AtomicBool::new(false),
            fail_puts: AtomicBool::new(false),
        }
    }

    fn state(&self) -> QueueResult<MutexGuard<'_, MemoryState>> {
        crate::core::sync::handle_mutex_poison(self.state.lock(), |message| {
            QueueError::OperationFailed { message }
        })
    }

    // Observation accessors stay usable after a panicking test thread.
    fn observe(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Enqueue one message with an explicit delivery id
    pub fn add_message(&self, unique_id: impl Into<String>, delivery_id: impl Into<String>) {
        self.add_messages([SeedMessage::new(unique_id).with_delivery_id(delivery_id)]);
    }

    pub fn add_messages(&self, seeds: impl IntoIterator<Item = SeedMessage>) {
        let mut state = self.observe();
        for seed in seeds {
            let delivery_id = match seed.delivery_id {
                Some(id) => id,
                None => Self::fresh_delivery_id(&self.name, &mut state),
            };
            state.visible.push_back(StoredMessage {
                unique_id: seed.unique_id,
                delivery_id,
                raw_body: seed.raw_body,
            });
        }
    }

    fn fresh_delivery_id(name: &str, state: &mut MemoryState) -> String {
        state.next_delivery += 1;
        format!("{}-msg-{}", name, state.next_delivery)
    }

    /// Make every subsequent pull fail with a transport error
    pub fn set_fail_pulls(&self, fail: bool) {
        self.fail_pulls.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent put fail with a transport error
    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Messages not yet pulled
    pub fn visible_len(&self) -> usize {
        self.observe().visible.len()
    }

    /// Deliveries pulled but neither deleted nor reset
    pub fn in_flight_len(&self) -> usize {
        self.observe().in_flight.len()
    }

    pub fn deleted_len(&self) -> usize {
        self.observe().deleted.len()
    }

    pub fn reset_len(&self) -> usize {
        self.observe().reset.len()
    }

    /// Number of messages accepted through `put_batch`
    pub fn put_count(&self) -> usize {
        self.observe().put_count
    }

    pub fn deleted_messages(&self) -> Vec<ParsedMessage> {
        self.observe().deleted.clone()
    }

    pub fn reset_messages(&self) -> Vec<ParsedMessage> {
        self.observe().reset.clone()
    }

    fn transport_error(&self, operation: &str) -> QueueError {
        QueueError::Transport {
            queue: self.name.clone(),
            message: format!("injected {} failure", operation),
        }
    }
}

#[async_trait]
impl Queue for InMemoryQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn pull_batch(&self) -> QueueResult<Vec<MessageRef>> {
        if self.fail_pulls.load(Ordering::SeqCst) {
            return Err(self.transport_error("pull"));
        }

        let mut state = self.state()?;
        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            let Some(stored) = state.visible.pop_front() else {
                break;
            };
            state.next_token += 1;
            let token = format!("{}-receipt-{}", self.name, state.next_token);
            let delivered = stored.deliver(token.clone());
            state.in_flight.insert(token, stored);
            batch.push(delivered.into_ref());
        }
        Ok(batch)
    }

    async fn delete_batch(&self, tokens: &[String]) -> QueueResult<()> {
        let mut state = self.state()?;
        for token in tokens {
            if let Some(stored) = state.in_flight.remove(token) {
                let settled = stored.deliver(token.clone());
                state.deleted.push(settled);
            }
        }
        Ok(())
    }

    async fn reset_visibility_batch(&self, tokens: &[String]) -> QueueResult<()> {
        let mut state = self.state()?;
        for token in tokens {
            if let Some(stored) = state.in_flight.remove(token) {
                let settled = stored.deliver(token.clone());
                state.reset.push(settled);
            }
        }
        Ok(())
    }

    async fn put_batch(&self, messages: &[MessageRef]) -> QueueResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(self.transport_error("put"));
        }

        let mut state = self.state()?;
        for message in messages {
            let delivery_id = Self::fresh_delivery_id(&self.name, &mut state);
            state.visible.push_back(StoredMessage {
                unique_id: message.unique_id().to_string(),
                delivery_id,
                raw_body: message.raw_body().to_string(),
            });
            state.put_count += 1;
        }
        Ok(())
    }
}
