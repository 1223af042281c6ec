//! CLI argument parsing tests

use clap::Parser;
use sqs_dedup::app::cli::args::*;
use std::time::Duration;

#[test]
fn test_all_flags_parse() {
    let args = Args::try_parse_from([
        "sqs-dedup",
        "--queue-url",
        "https://sqs.us-east-1.amazonaws.com/1/primary",
        "--storage-queue-url",
        "https://sqs.us-east-1.amazonaws.com/1/storage",
        "--num-workers",
        "8",
        "--max-inflight",
        "2500",
        "--time-limit-seconds",
        "120",
        "--run-forever",
        "--seconds-to-sleep-between-runs",
        "30",
        "--wait-time-seconds",
        "10",
        "--visibility-timeout-seconds",
        "300",
        "--unique-id-pointer",
        "/order/id",
        "--profile-name",
        "dedup-prod",
        "--log-level",
        "debug",
        "--log-format",
        "json",
    ])
    .unwrap();

    assert_eq!(args.num_workers(), 8);
    assert_eq!(args.max_inflight(), 2500);
    assert_eq!(args.time_limit(), Duration::from_secs(120));
    assert!(args.run_forever);
    assert_eq!(args.sleep_between_runs(), Duration::from_secs(30));
    assert_eq!(args.wait_time_seconds, Some(10));
    assert_eq!(args.visibility_timeout_seconds, Some(300));
    assert_eq!(args.unique_id_pointer(), "/order/id");
    assert_eq!(args.profile_name.as_deref(), Some("dedup-prod"));
    assert_eq!(args.log_level.as_deref(), Some("debug"));
    assert_eq!(args.log_format.as_deref(), Some("json"));
}

#[test]
fn test_short_flags() {
    let args = Args::try_parse_from(["sqs-dedup", "-w", "2", "-m", "10", "-t", "5"]).unwrap();

    assert_eq!(args.num_workers, Some(2));
    assert_eq!(args.max_inflight, Some(10));
    assert_eq!(args.time_limit_seconds, Some(5));
}

#[test]
fn test_zero_counts_rejected_by_parser() {
    assert!(Args::try_parse_from(["sqs-dedup", "--num-workers", "0"]).is_err());
    assert!(Args::try_parse_from(["sqs-dedup", "--max-inflight", "0"]).is_err());
    assert!(Args::try_parse_from(["sqs-dedup", "--num-workers", "many"]).is_err());
}

#[test]
fn test_out_of_range_values_rejected() {
    assert!(Args::try_parse_from(["sqs-dedup", "--wait-time-seconds", "21"]).is_err());
    assert!(Args::try_parse_from(["sqs-dedup", "--log-format", "xml"]).is_err());
    assert!(Args::try_parse_from(["sqs-dedup", "--log-level", "loud"]).is_err());
    assert!(Args::try_parse_from(["sqs-dedup", "--unique-id-pointer", "data.uuid"]).is_err());
}

#[test]
fn test_version_flag_is_reported_by_clap() {
    let error = Args::try_parse_from(["sqs-dedup", "--version"]).unwrap_err();

    assert_eq!(error.kind(), clap::error::ErrorKind::DisplayVersion);
}
