//! Mover worker
//!
//! Copies messages from one queue to another, deleting each batch from the
//! source once the put succeeded. Two modes:
//!
//! - flush: batches come from a feed of kept messages; every moved batch is
//!   recorded as spilled in the ledger
//! - restore: batches are pulled straight from the source queue until it
//!   returns an empty batch
//!
//! A failed put aborts the mover. The batch stays on the source queue and
//! nothing is recorded for it.

use crate::dedup::error::DedupResult;
use crate::dedup::feed::Feed;
use crate::dedup::ledger::Ledger;
use crate::queue::{ack_tokens, MessageRef, Queue, MAX_BATCH_SIZE};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum MoveMode {
    #[strum(serialize = "flush")]
    Flush,
    #[strum(serialize = "restore")]
    Restore,
}

/// How a mover finished
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    pub moved: usize,
    /// True if the mover stopped on a failed put
    pub aborted: bool,
}

enum Source {
    Feed(Feed<MessageRef>),
    Queue,
}

pub struct Mover {
    from: Arc<dyn Queue>,
    to: Arc<dyn Queue>,
    source: Source,
    ledger: Option<Arc<Ledger>>,
}

impl Mover {
    /// Mover for spilling kept messages from the primary queue to storage
    pub fn flush(
        from: Arc<dyn Queue>,
        to: Arc<dyn Queue>,
        feed: Feed<MessageRef>,
        ledger: Arc<Ledger>,
    ) -> Self {
        Self {
            from,
            to,
            source: Source::Feed(feed),
            ledger: Some(ledger),
        }
    }

    /// Mover for draining the storage queue back into the primary queue
    pub fn restore(from: Arc<dyn Queue>, to: Arc<dyn Queue>) -> Self {
        Self {
            from,
            to,
            source: Source::Queue,
            ledger: None,
        }
    }

    pub fn mode(&self) -> MoveMode {
        match self.source {
            Source::Feed(_) => MoveMode::Flush,
            Source::Queue => MoveMode::Restore,
        }
    }

    pub async fn run(self) -> DedupResult<MoveOutcome> {
        let mut outcome = MoveOutcome::default();

        loop {
            let batch = self.next_batch().await;
            if batch.is_empty() {
                break;
            }

            if let Err(e) = self.to.put_batch(&batch).await {
                log::warn!(
                    "Error putting {} messages into '{}', aborting {}: {}",
                    batch.len(),
                    self.to.name(),
                    self.mode(),
                    e
                );
                outcome.aborted = true;
                break;
            }

            if let Err(e) = self.from.delete_batch(&ack_tokens(&batch)).await {
                log::debug!(
                    "Failed to delete {} moved messages from '{}': {}",
                    batch.len(),
                    self.from.name(),
                    e
                );
            }

            if let Some(ledger) = &self.ledger {
                ledger.lock()?.record_spilled(&batch);
            }
            outcome.moved += batch.len();
        }

        Ok(outcome)
    }

    async fn next_batch(&self) -> Vec<MessageRef> {
        match &self.source {
            Source::Feed(feed) => feed.next_batch(MAX_BATCH_SIZE).await,
            Source::Queue => match self.from.pull_batch().await {
                Ok(batch) => batch,
                Err(e) => {
                    log::warn!("Error pulling from '{}': {}", self.from.name(), e);
                    Vec::new()
                }
            },
        }
    }
}
