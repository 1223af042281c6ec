//! CLI TOML configuration tests

use sqs_dedup::app::cli::args::*;
use std::path::PathBuf;
use toml::Table;

#[test]
fn test_every_key_applies() {
    let config: Table = toml::from_str(
        r#"
queue-url = "https://sqs.us-east-1.amazonaws.com/1/primary"
storage-queue-url = "https://sqs.us-east-1.amazonaws.com/1/storage"
num-workers = 12
max-inflight = 40000
time-limit-seconds = 900
run-forever = true
seconds-to-sleep-between-runs = 15
wait-time-seconds = 2
visibility-timeout-seconds = 60
unique-id-pointer = "/id"
profile-name = "dedup-prod"
color = true
log-level = "warn"
log-file = "/tmp/sqs-dedup.log"
log-format = "ext"
"#,
    )
    .unwrap();
    let mut args = Args::default();

    Args::apply_toml_values(&mut args, &config).unwrap();

    assert_eq!(
        args.queue_url.as_deref(),
        Some("https://sqs.us-east-1.amazonaws.com/1/primary")
    );
    assert_eq!(args.num_workers(), 12);
    assert_eq!(args.max_inflight(), 40_000);
    assert_eq!(args.time_limit_seconds, Some(900));
    assert!(args.run_forever);
    assert_eq!(args.seconds_between_runs, Some(15));
    assert_eq!(args.wait_time_seconds, Some(2));
    assert_eq!(args.visibility_timeout_seconds, Some(60));
    assert_eq!(args.unique_id_pointer(), "/id");
    assert_eq!(args.profile_name.as_deref(), Some("dedup-prod"));
    assert_eq!(args.color, Some(true));
    assert_eq!(args.log_level.as_deref(), Some("warn"));
    assert_eq!(args.log_file, Some(PathBuf::from("/tmp/sqs-dedup.log")));
    assert_eq!(args.log_format.as_deref(), Some("ext"));
}

#[test]
fn test_no_color_key() {
    let mut config = Table::new();
    config.insert("no-color".to_string(), toml::Value::Boolean(true));
    let mut args = Args::default();

    Args::apply_toml_values(&mut args, &config).unwrap();

    assert_eq!(args.color, Some(false));
}

#[test]
fn test_log_file_magic_values_disable_file_logging() {
    for value in ["none", "NONE", "-"] {
        let mut config = Table::new();
        config.insert("log-file".to_string(), toml::Value::String(value.to_string()));
        let mut args = Args::default();
        args.log_file = Some(PathBuf::from("/tmp/old.log"));

        Args::apply_toml_values(&mut args, &config).unwrap();

        assert_eq!(args.log_file, None, "value {:?}", value);
    }
}

#[test]
fn test_wrong_types_are_rejected() {
    let cases = [
        ("num-workers", toml::Value::String("20".to_string())),
        ("max-inflight", toml::Value::Integer(-1)),
        ("run-forever", toml::Value::Integer(1)),
        ("queue-url", toml::Value::Boolean(true)),
        ("wait-time-seconds", toml::Value::Integer(i64::MAX)),
    ];

    for (key, value) in cases {
        let mut config = Table::new();
        config.insert(key.to_string(), value);
        let mut args = Args::default();

        let result = Args::apply_toml_values(&mut args, &config);

        assert!(result.is_err(), "{} should be rejected", key);
        assert!(result.unwrap_err().message().contains(key));
    }
}

#[test]
fn test_unknown_keys_are_ignored() {
    let mut config = Table::new();
    config.insert("aws-profile".to_string(), toml::Value::String("prod".to_string()));
    let mut args = Args::default();

    assert!(Args::apply_toml_values(&mut args, &config).is_ok());
}

#[test]
fn test_unique_id_pointer_from_file_is_validated() {
    for pointer in ["data.uuid", ""] {
        let mut config: Table = toml::from_str(
            r#"
queue-url = "https://sqs.us-east-1.amazonaws.com/1/primary"
storage-queue-url = "https://sqs.us-east-1.amazonaws.com/1/storage"
"#,
        )
        .unwrap();
        config.insert(
            "unique-id-pointer".to_string(),
            toml::Value::String(pointer.to_string()),
        );
        let mut args = Args::default();
        Args::apply_toml_values(&mut args, &config).unwrap();

        let err = args.validate().unwrap_err();

        assert!(
            err.message().contains("--unique-id-pointer"),
            "pointer {:?}: {}",
            pointer,
            err
        );
    }
}
