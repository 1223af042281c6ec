//! Public API for the deduplication engine
//!
//! External modules should import from here rather than directly from the
//! implementation modules.

// Orchestration
pub use crate::dedup::orchestrator::{Deduplicator, DeduplicatorConfig, Phase, RunSummary};

// Bookkeeping
pub use crate::dedup::ledger::{Ledger, LedgerCounts};

// Error handling
pub use crate::dedup::error::{DedupError, DedupResult};
