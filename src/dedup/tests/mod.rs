//! Test modules for the deduplication engine
//!
//! Tests are organized by functional area.

mod phases;
