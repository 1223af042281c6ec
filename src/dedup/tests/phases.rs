//! Phase sequencing tests for the deduplication engine

#[cfg(test)]
mod tests {
    use crate::dedup::api::{Deduplicator, DeduplicatorConfig, LedgerCounts, Phase};
    use crate::queue::{generate_messages, make_duplicate_messages, InMemoryQueue};
    use std::sync::Arc;
    use std::time::Duration;

    fn config(num_workers: usize, max_inflight: usize) -> DeduplicatorConfig {
        DeduplicatorConfig {
            num_workers,
            max_inflight,
            time_limit: Duration::from_secs(600),
        }
    }

    fn queues() -> (Arc<InMemoryQueue>, Arc<InMemoryQueue>) {
        (
            Arc::new(InMemoryQueue::new("primary")),
            Arc::new(InMemoryQueue::new("storage")),
        )
    }

    #[tokio::test]
    async fn test_empty_queue_drains_on_first_iteration() {
        let (primary, storage) = queues();
        let mut dedup = Deduplicator::new(primary.clone(), storage, config(4, 100)).unwrap();
        assert_eq!(dedup.phase(), Phase::Idle);

        let summary = dedup.run().await.unwrap();

        assert_eq!(summary.iterations, 1);
        assert!(summary.drained);
        assert!(!summary.timed_out);
        assert_eq!(summary.deleted + summary.reset, 0);
        assert_eq!(dedup.phase(), Phase::Done);
    }

    #[tokio::test]
    async fn test_pre_restore_moves_storage_back_before_pulling() {
        let (primary, storage) = queues();
        storage.add_messages(generate_messages(20));
        let mut dedup =
            Deduplicator::new(primary.clone(), storage.clone(), config(3, 1000)).unwrap();

        let summary = dedup.run().await.unwrap();

        assert_eq!(summary.restored_before, 20);
        assert_eq!(summary.restored_after, 0);
        assert_eq!(summary.reset, 20);
        assert_eq!(storage.visible_len(), 0);
        assert_eq!(primary.reset_len(), 20);
        assert_eq!(primary.visible_len(), 0);
    }

    #[tokio::test]
    async fn test_identical_redelivery_is_left_alone() {
        let (primary, storage) = queues();
        primary.add_message("a", "send-1");
        primary.add_message("a", "send-1");
        let mut dedup = Deduplicator::new(primary.clone(), storage, config(1, 1000)).unwrap();

        let summary = dedup.run().await.unwrap();

        assert_eq!(summary.deleted, 0);
        assert_eq!(summary.reset, 1);
        // The second delivery is neither deleted nor reset; it lapses back
        assert_eq!(primary.in_flight_len(), 1);
    }

    #[tokio::test]
    async fn test_overflow_spills_and_restores() {
        let (primary, storage) = queues();
        primary.add_messages(generate_messages(200));
        let mut dedup =
            Deduplicator::new(primary.clone(), storage.clone(), config(2, 30)).unwrap();

        let summary = dedup.run().await.unwrap();

        assert!(summary.drained);
        assert!(summary.flushed_to_storage);
        assert!(dedup.started_flush_to_storage());
        assert!(summary.spilled > 0);
        assert_eq!(summary.spilled + summary.reset, 200);
        assert_eq!(summary.restored_after, summary.spilled);
        assert_eq!(primary.deleted_len(), summary.spilled);
        assert_eq!(primary.visible_len(), primary.put_count());
        assert_eq!(storage.visible_len(), 0);
        assert_eq!(primary.in_flight_len(), 0);
        assert!(dedup.ledger().overlapping_ids().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ledger_after_run_keeps_only_spilled_ids() {
        let (primary, storage) = queues();
        primary.add_messages(generate_messages(120));
        let mut dedup = Deduplicator::new(primary.clone(), storage, config(2, 25)).unwrap();

        let summary = dedup.run().await.unwrap();
        let counts = dedup.ledger().counts().unwrap();

        assert_eq!(
            counts,
            LedgerCounts {
                kept: 0,
                to_delete: 0,
                spilled: summary.spilled,
            }
        );
    }

    #[tokio::test]
    async fn test_time_limit_stops_loop_before_queue_is_drained() {
        let (primary, storage) = queues();
        primary.add_messages(generate_messages(500));
        let mut dedup = Deduplicator::new(
            primary.clone(),
            storage,
            DeduplicatorConfig {
                num_workers: 2,
                max_inflight: 10_000,
                time_limit: Duration::ZERO,
            },
        )
        .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let summary = dedup.run().await.unwrap();

        assert!(summary.timed_out);
        assert!(!summary.drained);
        assert_eq!(summary.iterations, 1);
        assert_eq!(summary.reset, 20);
        assert_eq!(primary.visible_len(), 480);
    }

    #[tokio::test]
    async fn test_time_limit_ends_run_stalled_on_inflight_cap() {
        let (primary, storage) = queues();
        primary.add_messages(make_duplicate_messages("same", 1000));
        let mut dedup = Deduplicator::new(
            primary.clone(),
            storage,
            DeduplicatorConfig {
                num_workers: 1,
                max_inflight: 2,
                time_limit: Duration::ZERO,
            },
        )
        .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let summary = dedup.run().await.unwrap();

        assert!(summary.timed_out);
        assert!(!summary.drained);
        assert!(!summary.flushed_to_storage);
        assert_eq!(summary.iterations, 1);
        assert_eq!(summary.deleted, 9);
        assert_eq!(summary.reset, 1);
        assert_eq!(primary.visible_len(), 990);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (primary, storage) = queues();

        assert!(Deduplicator::new(primary.clone(), storage.clone(), config(0, 10)).is_err());
        assert!(Deduplicator::new(primary, storage, config(1, 0)).is_err());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::PreRestore.to_string(), "pre-restore");
        assert_eq!(Phase::VisibilityReset.to_string(), "visibility reset");
    }
}
