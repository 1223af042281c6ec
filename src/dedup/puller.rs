//! Puller worker
//!
//! Pulls batches from the primary queue and classifies every delivery into
//! the ledger. A puller stops when the queue looks empty, when the ledger
//! holds `max_inflight` messages, or when the run has exceeded its time
//! limit. The last two checks run once per batch, so the ledger may overshoot
//! the cap by up to one batch per puller.

use crate::dedup::error::DedupResult;
use crate::dedup::ledger::{Classification, Ledger};
use crate::queue::{MessageRef, Queue};
use std::sync::Arc;
use std::time::Duration;

/// How a puller finished
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullOutcome {
    /// False once the queue returned an empty batch or a pull failed
    pub messages_exist: bool,
    pub timed_out: bool,
    pub pulled: usize,
}

enum Next {
    Continue,
    Stop,
}

pub struct Puller {
    queue: Arc<dyn Queue>,
    ledger: Arc<Ledger>,
    max_inflight: usize,
    time_limit: Duration,
}

impl Puller {
    pub fn new(
        queue: Arc<dyn Queue>,
        ledger: Arc<Ledger>,
        max_inflight: usize,
        time_limit: Duration,
    ) -> Self {
        Self {
            queue,
            ledger,
            max_inflight,
            time_limit,
        }
    }

    pub async fn run(self) -> DedupResult<PullOutcome> {
        let mut outcome = PullOutcome {
            messages_exist: true,
            ..PullOutcome::default()
        };

        loop {
            let messages = match self.queue.pull_batch().await {
                Ok(messages) => messages,
                Err(e) => {
                    // Fail open: treat the queue as drained for this round
                    log::warn!("Error pulling from '{}': {}", self.queue.name(), e);
                    outcome.messages_exist = false;
                    break;
                }
            };
            if messages.is_empty() {
                outcome.messages_exist = false;
                break;
            }
            outcome.pulled += messages.len();

            if let Next::Stop = self.classify_batch(messages, &mut outcome)? {
                break;
            }
        }

        Ok(outcome)
    }

    fn classify_batch(
        &self,
        messages: Vec<MessageRef>,
        outcome: &mut PullOutcome,
    ) -> DedupResult<Next> {
        let mut state = self.ledger.lock()?;

        let mut duplicates = 0;
        for message in messages {
            if state.classify(message) == Classification::Duplicate {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            log::trace!("Marked {} duplicates for deletion", duplicates);
        }

        // The time budget is recorded even when the cap also stops this puller
        let timed_out = state.elapsed() > self.time_limit;
        outcome.timed_out |= timed_out;

        if state.inflight() >= self.max_inflight {
            log::debug!(
                "Reached max inflight ({}) on '{}'",
                self.max_inflight,
                self.queue.name()
            );
            return Ok(Next::Stop);
        }
        if timed_out {
            return Ok(Next::Stop);
        }
        Ok(Next::Continue)
    }
}
