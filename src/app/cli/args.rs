//! Core CLI arguments structure and basic functionality
//!
//! This module contains the Args struct definition and the conversions into
//! engine and transport settings. Validation, parsing, and configuration
//! loading are handled by separate modules.

use crate::core::logging::LogFormat;
use crate::core::validation::{validate_json_pointer, validate_positive_int};
use crate::dedup::api::DeduplicatorConfig;
use crate::queue::{SqsQueueConfig, INVALIDATION_UNIQUE_ID_POINTER};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_NUM_WORKERS: usize = 20;
pub const DEFAULT_MAX_INFLIGHT: usize = 100_000;
pub const DEFAULT_TIME_LIMIT_SECONDS: u64 = 600;
pub const DEFAULT_SECONDS_BETWEEN_RUNS: u64 = 60;
pub const DEFAULT_WAIT_TIME_SECONDS: u32 = 1;

// Settings are optional so values from the config file can be told apart
// from ones given on the command line.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "sqs-dedup")]
#[command(about = "Remove duplicate messages from an SQS queue with bounded memory")]
#[command(version)]
pub struct Args {
    /// URL of the queue to deduplicate
    #[arg(short = 'q', long = "queue-url", value_name = "URL")]
    pub queue_url: Option<String>,

    /// URL of the overflow queue used when the in-memory cap is reached
    #[arg(short = 's', long = "storage-queue-url", value_name = "URL")]
    pub storage_queue_url: Option<String>,

    /// Workers per phase [default: 20]
    #[arg(short = 'w', long = "num-workers", value_name = "COUNT", value_parser = validate_positive_int)]
    pub num_workers: Option<usize>,

    /// Messages held in memory before spilling to storage [default: 100000]
    #[arg(short = 'm', long = "max-inflight", value_name = "COUNT", value_parser = validate_positive_int)]
    pub max_inflight: Option<usize>,

    /// Time budget of one run in seconds [default: 600]
    #[arg(short = 't', long = "time-limit-seconds", value_name = "SECONDS")]
    pub time_limit_seconds: Option<u64>,

    /// Keep running, sleeping between runs
    #[arg(long = "run-forever", action = ArgAction::SetTrue)]
    pub run_forever: bool,

    /// Sleep between runs in repeat mode [default: 60]
    #[arg(long = "seconds-to-sleep-between-runs", value_name = "SECONDS")]
    pub seconds_between_runs: Option<u64>,

    /// Long-poll wait per receive in seconds [default: 1]
    #[arg(long = "wait-time-seconds", value_name = "SECONDS", value_parser = clap::value_parser!(u32).range(0..=20))]
    pub wait_time_seconds: Option<u32>,

    /// Visibility timeout applied to received messages (queue default if unset)
    #[arg(long = "visibility-timeout-seconds", value_name = "SECONDS")]
    pub visibility_timeout_seconds: Option<u32>,

    /// JSON pointer to the unique id inside a message body [default: /data/uuid]
    #[arg(long = "unique-id-pointer", value_name = "POINTER", value_parser = validate_json_pointer)]
    pub unique_id_pointer: Option<String>,

    /// AWS shared-config profile used for credentials and region
    #[arg(short = 'p', long = "profile-name", value_name = "PROFILE")]
    pub profile_name: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Force colored log output
    #[arg(long = "color", action = ArgAction::SetTrue, conflicts_with = "no_color")]
    pub color_flag: bool,

    /// Disable colored log output
    #[arg(long = "no-color", action = ArgAction::SetTrue)]
    pub no_color: bool,

    /// Resolved color setting: Some(true) forced on, Some(false) off, None auto
    #[arg(skip)]
    pub color: Option<bool>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers.unwrap_or(DEFAULT_NUM_WORKERS)
    }

    pub fn max_inflight(&self) -> usize {
        self.max_inflight.unwrap_or(DEFAULT_MAX_INFLIGHT)
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_seconds.unwrap_or(DEFAULT_TIME_LIMIT_SECONDS))
    }

    pub fn sleep_between_runs(&self) -> Duration {
        Duration::from_secs(
            self.seconds_between_runs
                .unwrap_or(DEFAULT_SECONDS_BETWEEN_RUNS),
        )
    }

    pub fn unique_id_pointer(&self) -> &str {
        self.unique_id_pointer
            .as_deref()
            .unwrap_or(INVALIDATION_UNIQUE_ID_POINTER)
    }

    pub fn log_format(&self) -> LogFormat {
        self.log_format
            .as_deref()
            .and_then(|format| format.parse().ok())
            .unwrap_or(LogFormat::Text)
    }

    /// Whether log output should be colored, falling back to TTY detection
    pub fn use_color(&self) -> bool {
        use std::io::IsTerminal;
        self.color
            .unwrap_or_else(|| self.log_file.is_none() && std::io::stderr().is_terminal())
    }

    pub fn deduplicator_config(&self) -> DeduplicatorConfig {
        DeduplicatorConfig {
            num_workers: self.num_workers(),
            max_inflight: self.max_inflight(),
            time_limit: self.time_limit(),
        }
    }

    pub fn sqs_config(&self, queue_url: &str) -> SqsQueueConfig {
        let mut config = SqsQueueConfig::new(queue_url);
        config.wait_time_seconds = self.wait_time_seconds.unwrap_or(DEFAULT_WAIT_TIME_SECONDS);
        config.visibility_timeout_seconds = self.visibility_timeout_seconds;
        config.profile_name = self.profile_name.clone();
        config
    }
}
