//! Worker pools
//!
//! Every phase of a run spawns a fixed set of workers into a [`WorkerPool`]
//! and then waits on [`WorkerPool::join`]. Join is the phase barrier: it
//! only returns once every task has finished, even if one of them failed.

use crate::dedup::error::{DedupError, DedupResult};
use std::future::Future;
use tokio::task::JoinSet;

/// Role of the workers in a pool, used in logs and failure reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum WorkerRole {
    Puller,
    Deleter,
    Reseter,
    Mover,
    #[strum(serialize = "Feed filler")]
    FeedFiller,
}

/// Fixed group of tasks sharing one role
pub struct WorkerPool<T> {
    role: WorkerRole,
    tasks: JoinSet<DedupResult<T>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    pub fn new(role: WorkerRole) -> Self {
        Self {
            role,
            tasks: JoinSet::new(),
        }
    }

    pub fn role(&self) -> WorkerRole {
        self.role
    }

    pub fn spawn<F>(&mut self, worker: F)
    where
        F: Future<Output = DedupResult<T>> + Send + 'static,
    {
        self.tasks.spawn(worker);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every worker and collect their outcomes
    ///
    /// A panicking worker becomes [`DedupError::WorkerFailed`]. The first
    /// failure is returned, but only after the remaining workers have been
    /// joined.
    pub async fn join(mut self) -> DedupResult<Vec<T>> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        let mut first_error: Option<DedupError> = None;

        while let Some(joined) = self.tasks.join_next().await {
            let error = match joined {
                Ok(Ok(outcome)) => {
                    outcomes.push(outcome);
                    continue;
                }
                Ok(Err(error)) => error,
                Err(join_error) => DedupError::WorkerFailed {
                    role: self.role,
                    message: join_error.to_string(),
                },
            };
            log::error!("{} worker stopped abnormally: {}", self.role, error);
            first_error.get_or_insert(error);
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(outcomes),
        }
    }
}
