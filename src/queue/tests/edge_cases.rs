//! Edge case tests for the queue system

#[cfg(test)]
mod tests {
    use crate::queue::api::{InMemoryQueue, Queue};
    use crate::queue::{JsonMessageParser, MessageParser, RawMessage};

    #[tokio::test]
    async fn test_partial_final_batch() {
        let queue = InMemoryQueue::new("primary");
        queue.add_messages(crate::queue::generate_messages(13));

        assert_eq!(queue.pull_batch().await.unwrap().len(), 10);
        assert_eq!(queue.pull_batch().await.unwrap().len(), 3);
        assert!(queue.pull_batch().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_of_unknown_token_is_ignored() {
        let queue = InMemoryQueue::new("primary");

        queue
            .reset_visibility_batch(&["never-issued".to_string()])
            .await
            .unwrap();

        assert_eq!(queue.reset_len(), 0);
    }

    #[tokio::test]
    async fn test_seeded_bodies_round_trip_through_parser() {
        let queue = InMemoryQueue::new("primary");
        queue.add_message("uuid-7", "msg-7");
        let pulled = queue.pull_batch().await.unwrap();

        let parsed = JsonMessageParser::invalidation()
            .parse(RawMessage {
                message_id: pulled[0].delivery_id().to_string(),
                receipt_handle: pulled[0].ack_token().to_string(),
                body: pulled[0].raw_body().to_string(),
            })
            .unwrap();

        assert_eq!(parsed.unique_id(), "uuid-7");
        assert_eq!(parsed.delivery_id(), "msg-7");
    }
}
