//! Test helper functions for deduplication runs
//!
//! Builds primary/storage queue pairs and checks the conservation law: every
//! delivery the run consumed was either deleted or reset, and the primary
//! queue holds exactly the messages restored from storage.

use sqs_dedup::dedup::api::{DeduplicatorConfig, RunSummary};
use sqs_dedup::queue::InMemoryQueue;
use std::sync::Arc;
use std::time::Duration;

pub struct QueuePair {
    pub primary: Arc<InMemoryQueue>,
    pub storage: Arc<InMemoryQueue>,
}

impl QueuePair {
    pub fn new() -> Self {
        Self {
            primary: Arc::new(InMemoryQueue::new("primary")),
            storage: Arc::new(InMemoryQueue::new("storage")),
        }
    }
}

/// Config with a generous time limit so runs end by draining
pub fn config(num_workers: usize, max_inflight: usize) -> DeduplicatorConfig {
    DeduplicatorConfig {
        num_workers,
        max_inflight,
        time_limit: Duration::from_secs(600),
    }
}

/// Assert the conservation law for a run that drained `total` deliveries
pub fn assert_conserved(queues: &QueuePair, summary: &RunSummary, total: usize) {
    let primary = &queues.primary;

    assert!(summary.drained, "run should end by draining the queue");
    assert_eq!(
        primary.deleted_len() + primary.reset_len(),
        total,
        "every consumed delivery must be deleted or reset"
    );
    assert_eq!(primary.in_flight_len(), 0, "no delivery may be left in flight");
    assert_eq!(
        primary.visible_len(),
        primary.put_count(),
        "only restored messages may remain visible"
    );
    assert_eq!(queues.storage.visible_len(), 0, "storage must be drained");
}
