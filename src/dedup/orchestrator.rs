//! Run orchestration
//!
//! A run moves through fixed phases, each a pool of workers joined before the
//! next phase starts:
//!
//! 1. pre-restore: drain the storage queue back into the primary queue
//! 2. pull/dedup loop: pull and classify, delete duplicates, and spill kept
//!    messages to storage once the in-memory cap is reached
//! 3. post-restore: drain storage into the primary queue again
//! 4. visibility reset: make every still-kept message visible again
//!
//! Memory stays bounded by `max_inflight`: once that many messages are kept,
//! they are copied to the storage queue and only their unique ids remain.

use crate::dedup::deleter::Deleter;
use crate::dedup::error::{DedupError, DedupResult};
use crate::dedup::feed::{self, Feed, FEED_CAPACITY};
use crate::dedup::ledger::{Ledger, LedgerCounts};
use crate::dedup::mover::{MoveOutcome, Mover};
use crate::dedup::pool::{WorkerPool, WorkerRole};
use crate::dedup::puller::{PullOutcome, Puller};
use crate::dedup::reseter::Reseter;
use crate::queue::Queue;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Tuning for one [`Deduplicator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeduplicatorConfig {
    /// Workers per pool
    pub num_workers: usize,
    /// Soft cap on kept plus pending deletions before spilling to storage
    pub max_inflight: usize,
    /// Wall-clock budget measured from construction or the last reset
    pub time_limit: Duration,
}

impl Default for DeduplicatorConfig {
    fn default() -> Self {
        Self {
            num_workers: 20,
            max_inflight: 100_000,
            time_limit: Duration::from_secs(600),
        }
    }
}

impl DeduplicatorConfig {
    pub fn validate(&self) -> DedupResult<()> {
        if self.num_workers == 0 {
            return Err(DedupError::Configuration {
                message: "num_workers must be at least 1".to_string(),
            });
        }
        if self.max_inflight == 0 {
            return Err(DedupError::Configuration {
                message: "max_inflight must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    #[strum(serialize = "idle")]
    Idle,
    #[strum(serialize = "pre-restore")]
    PreRestore,
    #[strum(serialize = "pull/dedup")]
    PullDedup,
    #[strum(serialize = "post-restore")]
    PostRestore,
    #[strum(serialize = "visibility reset")]
    VisibilityReset,
    #[strum(serialize = "done")]
    Done,
}

/// What one run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Pull/dedup loop iterations
    pub iterations: usize,
    /// The loop ended because every puller saw an empty queue
    pub drained: bool,
    /// The loop ended because the time limit was exceeded
    pub timed_out: bool,
    /// Kept messages were spilled to storage at least once
    pub flushed_to_storage: bool,
    /// Duplicate tokens handed to deleters
    pub deleted: usize,
    /// Messages moved to storage by flush movers
    pub spilled: usize,
    /// Messages moved from storage before the loop
    pub restored_before: usize,
    /// Messages moved from storage after the loop
    pub restored_after: usize,
    /// Kept tokens handed to reseters
    pub reset: usize,
}

/// Deduplicates one primary queue using a storage queue for overflow
pub struct Deduplicator {
    queue: Arc<dyn Queue>,
    storage: Arc<dyn Queue>,
    config: DeduplicatorConfig,
    ledger: Arc<Ledger>,
    started_flush_to_storage: bool,
    phase: Phase,
}

impl Deduplicator {
    pub fn new(
        queue: Arc<dyn Queue>,
        storage: Arc<dyn Queue>,
        config: DeduplicatorConfig,
    ) -> DedupResult<Self> {
        config.validate()?;
        Ok(Self {
            queue,
            storage,
            config,
            ledger: Arc::new(Ledger::new()),
            started_flush_to_storage: false,
            phase: Phase::Idle,
        })
    }

    pub fn config(&self) -> &DeduplicatorConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether spilling to storage has started in the current run
    pub fn started_flush_to_storage(&self) -> bool {
        self.started_flush_to_storage
    }

    /// Execute one full run
    ///
    /// Queue failures are logged and absorbed by the workers; only internal
    /// faults (a poisoned ledger or a panicking worker) are returned.
    pub async fn run(&mut self) -> DedupResult<RunSummary> {
        let mut summary = RunSummary::default();

        self.enter(Phase::PreRestore);
        summary.restored_before = self.restore_from_storage().await?;

        self.enter(Phase::PullDedup);
        loop {
            summary.iterations += 1;
            let outcomes = self.pull_and_classify().await?;
            self.log_counts(self.ledger.counts()?);

            summary.deleted += self.delete_duplicates().await?;

            if outcomes.iter().all(|outcome| !outcome.messages_exist) {
                log::info!("Pulled all messages from '{}'", self.queue.name());
                summary.drained = true;
                break;
            }

            if self.started_flush_to_storage
                || self.ledger.kept_len()? >= self.config.max_inflight
            {
                if !self.started_flush_to_storage {
                    log::info!(
                        "Reached max inflight, spilling kept messages to '{}'",
                        self.storage.name()
                    );
                }
                self.started_flush_to_storage = true;
                summary.flushed_to_storage = true;
                summary.spilled += self.flush_to_storage().await?;
            }

            if outcomes.iter().any(|outcome| outcome.timed_out) {
                log::info!(
                    "Stopping after exceeding the time limit of {}s",
                    self.config.time_limit.as_secs()
                );
                summary.timed_out = true;
                break;
            }
        }

        self.enter(Phase::PostRestore);
        summary.restored_after = self.restore_from_storage().await?;

        self.enter(Phase::VisibilityReset);
        summary.reset = self.reset_visibility().await?;

        self.enter(Phase::Done);
        log::info!(
            "Run finished after {} iterations: {} duplicates deleted, {} spilled, {} restored, {} reset",
            summary.iterations,
            summary.deleted,
            summary.spilled,
            summary.restored_before + summary.restored_after,
            summary.reset
        );
        Ok(summary)
    }

    /// Forget everything from the previous run and restart the clock
    pub fn reset(&mut self) -> DedupResult<()> {
        self.ledger.reset()?;
        self.started_flush_to_storage = false;
        self.phase = Phase::Idle;
        Ok(())
    }

    /// Run repeatedly, sleeping `interval` between runs
    ///
    /// Stops when `shutdown` fires (or its sender is dropped). A signal that
    /// arrives mid-run lets the run finish first. Returns the number of
    /// completed runs.
    pub async fn run_forever(
        &mut self,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> DedupResult<usize> {
        let mut runs = 0;
        loop {
            self.run().await?;
            runs += 1;

            log::info!("Sleeping {}s before the next run", interval.as_secs());
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.recv() => {
                    log::info!("Shutdown requested, stopping after {} runs", runs);
                    return Ok(runs);
                }
            }
            self.reset()?;
        }
    }

    fn enter(&mut self, phase: Phase) {
        log::debug!("Entering {} phase", phase);
        self.phase = phase;
    }

    fn log_counts(&self, counts: LedgerCounts) {
        log::info!(
            "Kept: {}, to delete: {}, spilled: {}, unique (kept + spilled): {}",
            counts.kept,
            counts.to_delete,
            counts.spilled,
            counts.unique()
        );
    }

    async fn restore_from_storage(&self) -> DedupResult<usize> {
        let mut pool = WorkerPool::new(WorkerRole::Mover);
        for _ in 0..self.config.num_workers {
            pool.spawn(Mover::restore(self.storage.clone(), self.queue.clone()).run());
        }
        let restored = moved(pool.join().await?);
        if restored > 0 {
            log::info!(
                "Restored {} messages from '{}' to '{}'",
                restored,
                self.storage.name(),
                self.queue.name()
            );
        }
        Ok(restored)
    }

    async fn pull_and_classify(&self) -> DedupResult<Vec<PullOutcome>> {
        let mut pool = WorkerPool::new(WorkerRole::Puller);
        for _ in 0..self.config.num_workers {
            let puller = Puller::new(
                self.queue.clone(),
                self.ledger.clone(),
                self.config.max_inflight,
                self.config.time_limit,
            );
            pool.spawn(puller.run());
        }
        pool.join().await
    }

    async fn delete_duplicates(&self) -> DedupResult<usize> {
        let tokens = self.ledger.take_to_delete()?;
        let queue = self.queue.clone();
        let handled = fed_phase(
            WorkerRole::Deleter,
            tokens,
            self.config.num_workers,
            |feed| Deleter::new(queue.clone(), feed).run(),
        )
        .await?;
        Ok(handled.into_iter().sum())
    }

    async fn flush_to_storage(&self) -> DedupResult<usize> {
        let kept = self.ledger.snapshot_kept()?;
        let (queue, storage, ledger) = (
            self.queue.clone(),
            self.storage.clone(),
            self.ledger.clone(),
        );
        let outcomes = fed_phase(WorkerRole::Mover, kept, self.config.num_workers, |feed| {
            Mover::flush(queue.clone(), storage.clone(), feed, ledger.clone()).run()
        })
        .await?;
        Ok(moved(outcomes))
    }

    async fn reset_visibility(&self) -> DedupResult<usize> {
        let tokens = self.ledger.take_kept_tokens()?;
        let queue = self.queue.clone();
        let handled = fed_phase(
            WorkerRole::Reseter,
            tokens,
            self.config.num_workers,
            |feed| Reseter::new(queue.clone(), feed).run(),
        )
        .await?;
        Ok(handled.into_iter().sum())
    }
}

fn moved(outcomes: Vec<MoveOutcome>) -> usize {
    outcomes.iter().map(|outcome| outcome.moved).sum()
}

/// Feed `items` to `workers` freshly built workers and wait for all of them
///
/// The filler runs alongside the workers, so feeds larger than
/// [`FEED_CAPACITY`] do not block the phase.
async fn fed_phase<T, W, F, Fut>(
    role: WorkerRole,
    items: Vec<T>,
    workers: usize,
    make_worker: F,
) -> DedupResult<Vec<W>>
where
    T: Send + 'static,
    W: Send + 'static,
    F: Fn(Feed<T>) -> Fut,
    Fut: Future<Output = DedupResult<W>> + Send + 'static,
{
    let (sender, feed) = feed::channel(FEED_CAPACITY);

    let mut filler = WorkerPool::new(WorkerRole::FeedFiller);
    filler.spawn(async move { Ok(feed::fill(sender, items).await) });

    let mut pool = WorkerPool::new(role);
    for _ in 0..workers {
        pool.spawn(make_worker(feed.clone()));
    }
    // Workers hold the only consumer handles; if they all die the filler
    // sees a closed feed instead of blocking.
    drop(feed);

    let (filled, outcomes) = tokio::join!(filler.join(), pool.join());
    filled?;
    outcomes
}
