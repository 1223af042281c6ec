//! Work feeds
//!
//! A feed is a bounded multi-consumer channel that hands items to a pool of
//! workers. The producer side is a plain `mpsc::Sender`; dropping it closes
//! the feed. Consumers share the receiver and take whole batches at a time,
//! so one worker never interleaves its batch with another's.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Capacity of every feed created by the engine
pub const FEED_CAPACITY: usize = 10_000;

/// Consumer handle of a feed, cheap to clone per worker
pub struct Feed<T> {
    receiver: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for Feed<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: Arc::clone(&self.receiver),
        }
    }
}

/// Create a feed with the given capacity
pub fn channel<T>(capacity: usize) -> (mpsc::Sender<T>, Feed<T>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        sender,
        Feed {
            receiver: Arc::new(Mutex::new(receiver)),
        },
    )
}

impl<T> Feed<T> {
    /// Closed feed pre-loaded with `items`
    pub fn from_items(items: Vec<T>) -> Self {
        let (sender, feed) = channel(items.len());
        for item in items {
            // Capacity equals the item count so this cannot be full
            let _ = sender.try_send(item);
        }
        feed
    }

    /// Take up to `max` items
    ///
    /// Waits until the batch is full or the feed is closed and drained. An
    /// empty batch means the feed is finished.
    pub async fn next_batch(&self, max: usize) -> Vec<T> {
        let mut receiver = self.receiver.lock().await;
        let mut batch = Vec::with_capacity(max);
        while batch.len() < max {
            match receiver.recv().await {
                Some(item) => batch.push(item),
                None => break,
            }
        }
        batch
    }
}

/// Push every item into a feed, then close it
///
/// Stops early if all consumers are gone. Returns the number of items sent.
pub async fn fill<T>(sender: mpsc::Sender<T>, items: Vec<T>) -> usize {
    let mut sent = 0;
    for item in items {
        if sender.send(item).await.is_err() {
            log::debug!("Feed consumers gone after {} items", sent);
            break;
        }
        sent += 1;
    }
    sent
}
