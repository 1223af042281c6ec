//! Deduplication Engine
//!
//! Removes redundant copies of messages from a primary queue while keeping
//! memory bounded. Each run pulls the queue with a pool of workers, keeps the
//! first delivery of every unique id, deletes later copies, and spills kept
//! messages to a storage queue when the in-memory cap is reached. At the end
//! of a run every kept message is made visible again and the storage queue
//! is drained back into the primary queue.
//!
//! # Example Usage
//!
//! ```rust
//! use sqs_dedup::dedup::{Deduplicator, DeduplicatorConfig};
//! use sqs_dedup::queue::{make_duplicate_messages, InMemoryQueue};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let primary = Arc::new(InMemoryQueue::new("primary"));
//! let storage = Arc::new(InMemoryQueue::new("storage"));
//! primary.add_messages(make_duplicate_messages("uuid-1", 5));
//!
//! let mut dedup = Deduplicator::new(primary.clone(), storage, DeduplicatorConfig::default())?;
//! let summary = dedup.run().await?;
//!
//! assert_eq!(summary.deleted, 4);
//! assert_eq!(summary.reset, 1);
//! # Ok(())
//! # }
//! ```

pub mod api;
mod deleter;
mod error;
mod feed;
mod ledger;
mod mover;
mod orchestrator;
mod pool;
mod puller;
mod reseter;

pub use error::{DedupError, DedupResult};
pub use feed::{Feed, FEED_CAPACITY};
pub use ledger::{Classification, Ledger, LedgerCounts};
pub use mover::{MoveMode, MoveOutcome, Mover};
pub use orchestrator::{Deduplicator, DeduplicatorConfig, Phase, RunSummary};
pub use pool::{WorkerPool, WorkerRole};
pub use puller::{PullOutcome, Puller};

#[cfg(test)]
mod tests;
