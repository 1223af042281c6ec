//! CLI validation tests

use sqs_dedup::app::cli::args::*;

fn valid_args() -> Args {
    Args {
        queue_url: Some("https://sqs.us-east-1.amazonaws.com/1/primary".to_string()),
        storage_queue_url: Some("https://sqs.us-east-1.amazonaws.com/1/storage".to_string()),
        ..Args::default()
    }
}

#[test]
fn test_valid_arguments_pass() {
    assert!(valid_args().validate().is_ok());
}

#[test]
fn test_missing_queue_urls() {
    let mut args = valid_args();
    args.queue_url = None;
    let error = args.validate().unwrap_err();
    assert!(error.message().contains("--queue-url is required"));

    let mut args = valid_args();
    args.storage_queue_url = None;
    let error = args.validate().unwrap_err();
    assert!(error.message().contains("--storage-queue-url is required"));
}

#[test]
fn test_queue_urls_must_differ() {
    let mut args = valid_args();
    args.storage_queue_url = args.queue_url.clone();

    let error = args.validate().unwrap_err();

    assert!(error.message().contains("must name different queues"));
}

#[test]
fn test_queue_urls_must_be_http() {
    let mut args = valid_args();
    args.queue_url = Some("sqs://primary".to_string());

    assert!(args.validate().is_err());
}

#[test]
fn test_zero_counts_from_config_rejected() {
    let mut args = valid_args();
    args.num_workers = Some(0);
    assert!(args.validate().is_err());

    let mut args = valid_args();
    args.max_inflight = Some(0);
    assert!(args.validate().is_err());
}

#[test]
fn test_wait_time_above_sqs_limit_rejected() {
    let mut args = valid_args();
    args.wait_time_seconds = Some(25);

    let error = args.validate().unwrap_err();

    assert!(error.message().contains("--wait-time-seconds"));
}
