//! Shared bookkeeping for one run
//!
//! The ledger records what the pullers have seen so far:
//!
//! - `kept`: first-seen message per unique id, still in flight on the
//!   primary queue
//! - `to_delete`: tokens of redundant copies awaiting deletion
//! - `spilled`: messages already copied to the storage queue
//!
//! A unique id is in at most one of `kept` and `spilled`. All access goes
//! through one mutex; workers hold it only for short synchronous sections.

use crate::dedup::error::{DedupError, DedupResult};
use crate::queue::MessageRef;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// What a puller decided about one delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// First sighting of the unique id
    Kept,
    /// Another copy of a kept or spilled message
    Duplicate,
    /// Same delivery seen again after its visibility lapsed; no action
    Redelivered,
}

/// Point-in-time sizes of the ledger collections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerCounts {
    pub kept: usize,
    pub to_delete: usize,
    pub spilled: usize,
}

impl LedgerCounts {
    /// Distinct unique ids seen in this run
    pub fn unique(&self) -> usize {
        self.kept + self.spilled
    }
}

#[derive(Debug)]
pub struct LedgerState {
    kept: HashMap<String, MessageRef>,
    to_delete: HashSet<String>,
    spilled: HashMap<String, MessageRef>,
    started_at: Instant,
}

impl LedgerState {
    fn new() -> Self {
        Self {
            kept: HashMap::new(),
            to_delete: HashSet::new(),
            spilled: HashMap::new(),
            started_at: Instant::now(),
        }
    }

    /// Record one pulled delivery
    pub fn classify(&mut self, message: MessageRef) -> Classification {
        let known = self
            .kept
            .get(message.unique_id())
            .or_else(|| self.spilled.get(message.unique_id()));

        match known {
            None => {
                self.kept
                    .insert(message.unique_id().to_string(), message);
                Classification::Kept
            }
            Some(existing) if existing.delivery_id() != message.delivery_id() => {
                self.to_delete.insert(message.ack_token().to_string());
                Classification::Duplicate
            }
            Some(_) => Classification::Redelivered,
        }
    }

    /// Messages the run is currently holding: kept plus pending deletions
    pub fn inflight(&self) -> usize {
        self.kept.len() + self.to_delete.len()
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Move messages from `kept` to `spilled` once they reached storage
    pub fn record_spilled(&mut self, messages: &[MessageRef]) {
        for message in messages {
            self.kept.remove(message.unique_id());
            self.spilled
                .insert(message.unique_id().to_string(), message.clone());
        }
    }

    pub fn counts(&self) -> LedgerCounts {
        LedgerCounts {
            kept: self.kept.len(),
            to_delete: self.to_delete.len(),
            spilled: self.spilled.len(),
        }
    }
}

/// Mutex-guarded [`LedgerState`] shared by every worker of a run
#[derive(Debug)]
pub struct Ledger {
    state: Mutex<LedgerState>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::new()),
        }
    }

    /// Ledger whose `kept` map already holds the given messages
    pub fn with_kept(messages: impl IntoIterator<Item = MessageRef>) -> Self {
        let mut state = LedgerState::new();
        for message in messages {
            state.kept.insert(message.unique_id().to_string(), message);
        }
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn lock(&self) -> DedupResult<MutexGuard<'_, LedgerState>> {
        crate::core::sync::handle_mutex_poison(self.state.lock(), |message| {
            DedupError::Synchronisation { message }
        })
    }

    /// Take the pending deletion tokens, leaving `to_delete` empty
    pub fn take_to_delete(&self) -> DedupResult<Vec<String>> {
        let mut state = self.lock()?;
        Ok(std::mem::take(&mut state.to_delete).into_iter().collect())
    }

    /// Copy of the currently kept messages; `kept` is left untouched
    pub fn snapshot_kept(&self) -> DedupResult<Vec<MessageRef>> {
        Ok(self.lock()?.kept.values().cloned().collect())
    }

    /// Tokens of every kept message, clearing `kept`
    pub fn take_kept_tokens(&self) -> DedupResult<Vec<String>> {
        let mut state = self.lock()?;
        Ok(std::mem::take(&mut state.kept)
            .into_values()
            .map(|message| message.ack_token().to_string())
            .collect())
    }

    pub fn kept_len(&self) -> DedupResult<usize> {
        Ok(self.lock()?.kept.len())
    }

    pub fn to_delete_len(&self) -> DedupResult<usize> {
        Ok(self.lock()?.to_delete.len())
    }

    pub fn spilled_len(&self) -> DedupResult<usize> {
        Ok(self.lock()?.spilled.len())
    }

    pub fn counts(&self) -> DedupResult<LedgerCounts> {
        Ok(self.lock()?.counts())
    }

    /// Clear every collection and restart the run clock
    pub fn reset(&self) -> DedupResult<()> {
        *self.lock()? = LedgerState::new();
        Ok(())
    }

    /// Unique ids present in both `kept` and `spilled`; always empty
    #[cfg(test)]
    pub(crate) fn overlapping_ids(&self) -> DedupResult<Vec<String>> {
        let state = self.lock()?;
        Ok(state
            .kept
            .keys()
            .filter(|unique_id| state.spilled.contains_key(*unique_id))
            .cloned()
            .collect())
    }
}
