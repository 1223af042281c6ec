//! CLI argument validation
//!
//! Runs after the config file and command line have been merged, so
//! required values may come from either source.

use crate::core::validation::{validate_json_pointer, validate_queue_url, ValidationError};

use super::args::Args;

impl Args {
    /// Validate merged arguments for consistency and constraints
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_queue_urls()?;
        self.validate_counts()?;
        self.validate_unique_id_pointer()?;
        Ok(())
    }

    fn validate_queue_urls(&self) -> Result<(), ValidationError> {
        let queue_url = self.queue_url.as_deref().ok_or_else(|| {
            ValidationError::new("--queue-url is required (on the command line or in the config file)")
        })?;
        let storage_url = self.storage_queue_url.as_deref().ok_or_else(|| {
            ValidationError::new(
                "--storage-queue-url is required (on the command line or in the config file)",
            )
        })?;

        let queue = validate_queue_url("--queue-url", queue_url)?;
        let storage = validate_queue_url("--storage-queue-url", storage_url)?;
        if queue == storage {
            return Err(ValidationError::new(
                "--queue-url and --storage-queue-url must name different queues",
            ));
        }
        Ok(())
    }

    fn validate_counts(&self) -> Result<(), ValidationError> {
        if self.num_workers() == 0 {
            return Err(ValidationError::new("--num-workers must be at least 1"));
        }
        if self.max_inflight() == 0 {
            return Err(ValidationError::new("--max-inflight must be at least 1"));
        }
        if self.wait_time_seconds.is_some_and(|seconds| seconds > 20) {
            return Err(ValidationError::new(
                "--wait-time-seconds must be between 0 and 20",
            ));
        }
        Ok(())
    }

    // The config file bypasses clap's value parser, so check the merged value
    fn validate_unique_id_pointer(&self) -> Result<(), ValidationError> {
        validate_json_pointer(self.unique_id_pointer())
            .map(|_| ())
            .map_err(|e| ValidationError::new(&format!("--unique-id-pointer: {}", e)))
    }
}
