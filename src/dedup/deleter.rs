//! Deleter worker: removes redundant copies from the primary queue

use crate::dedup::error::DedupResult;
use crate::dedup::feed::Feed;
use crate::queue::{Queue, MAX_BATCH_SIZE};
use std::sync::Arc;

pub struct Deleter {
    queue: Arc<dyn Queue>,
    feed: Feed<String>,
}

impl Deleter {
    pub fn new(queue: Arc<dyn Queue>, feed: Feed<String>) -> Self {
        Self { queue, feed }
    }

    /// Delete tokens from the feed until it is closed and empty
    ///
    /// Failed batches are not retried; the copies reappear on the queue and
    /// are caught again by a later run. Returns the number of tokens handled.
    pub async fn run(self) -> DedupResult<usize> {
        let mut handled = 0;
        loop {
            let tokens = self.feed.next_batch(MAX_BATCH_SIZE).await;
            if tokens.is_empty() {
                break;
            }
            if let Err(e) = self.queue.delete_batch(&tokens).await {
                log::debug!(
                    "Failed to delete {} messages from '{}': {}",
                    tokens.len(),
                    self.queue.name(),
                    e
                );
            }
            handled += tokens.len();
        }
        Ok(handled)
    }
}
