//! Common test utilities and helpers
//!
//! This module provides shared queue fixtures and conservation checks for
//! the integration tests.

pub mod queue_helpers;
