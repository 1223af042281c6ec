//! Tests for concurrent access to the in-memory queue

#[cfg(test)]
mod tests {
    use crate::queue::api::{ack_tokens, InMemoryQueue, Queue};
    use crate::queue::generate_messages;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tokio::task::JoinSet;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_pullers_receive_each_message_once() {
        let queue = Arc::new(InMemoryQueue::new("primary"));
        queue.add_messages(generate_messages(1000));

        let mut tasks = JoinSet::new();
        for _ in 0..20 {
            let queue = Arc::clone(&queue);
            tasks.spawn(async move {
                let mut seen = Vec::new();
                loop {
                    let batch = queue.pull_batch().await.unwrap();
                    if batch.is_empty() {
                        break;
                    }
                    seen.extend(batch.iter().map(|m| m.unique_id().to_string()));
                }
                seen
            });
        }

        let mut all = Vec::new();
        while let Some(result) = tasks.join_next().await {
            all.extend(result.unwrap());
        }

        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(all.len(), 1000, "every message should be pulled once");
        assert_eq!(unique.len(), 1000);
        assert_eq!(queue.visible_len(), 0);
        assert_eq!(queue.in_flight_len(), 1000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deletes_settle_every_token() {
        let queue = Arc::new(InMemoryQueue::new("primary"));
        queue.add_messages(generate_messages(200));

        let mut token_batches = Vec::new();
        loop {
            let batch = queue.pull_batch().await.unwrap();
            if batch.is_empty() {
                break;
            }
            token_batches.push(ack_tokens(&batch));
        }

        let mut tasks = JoinSet::new();
        for tokens in token_batches {
            let queue = Arc::clone(&queue);
            tasks.spawn(async move { queue.delete_batch(&tokens).await });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        assert_eq!(queue.deleted_len(), 200);
        assert_eq!(queue.in_flight_len(), 0);
    }
}
