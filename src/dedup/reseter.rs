//! Reseter worker: makes kept messages visible again at the end of a run

use crate::dedup::error::DedupResult;
use crate::dedup::feed::Feed;
use crate::queue::{Queue, MAX_BATCH_SIZE};
use std::sync::Arc;

pub struct Reseter {
    queue: Arc<dyn Queue>,
    feed: Feed<String>,
}

impl Reseter {
    pub fn new(queue: Arc<dyn Queue>, feed: Feed<String>) -> Self {
        Self { queue, feed }
    }

    /// Reset visibility for tokens from the feed until it is closed and empty
    ///
    /// A failed batch simply lapses back to visible when its visibility
    /// timeout expires.
    pub async fn run(self) -> DedupResult<usize> {
        let mut handled = 0;
        loop {
            let tokens = self.feed.next_batch(MAX_BATCH_SIZE).await;
            if tokens.is_empty() {
                break;
            }
            if let Err(e) = self.queue.reset_visibility_batch(&tokens).await {
                log::debug!(
                    "Failed to reset visibility of {} messages on '{}': {}",
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
