//! Logging setup on top of flexi_logger
//!
//! Three output formats are supported:
//!
//! - `text`: timestamp, level and message
//! - `ext`: as `text`, followed by the source location
//! - `json`: one compact JSON object per line
//!
//! Colors apply to the two plain-text formats only.

use std::sync::{Mutex, OnceLock};

static LOGGER_HANDLE: OnceLock<Mutex<flexi_logger::LoggerHandle>> = OnceLock::new();

/// Output format accepted by `--log-format`
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::EnumString, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    Text,
    Ext,
    Json,
}

/// Start the global logger
///
/// `log_level` takes a flexi_logger spec such as `info` or
/// `info,sqs_dedup::dedup=debug`.
pub fn init_logging(
    log_level: Option<&str>,
    log_format: LogFormat,
    log_file: Option<&str>,
    color_enabled: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    use flexi_logger::{FileSpec, Logger};

    let mut logger = Logger::try_with_str(log_level.unwrap_or("info"))?;

    logger = match (log_format, color_enabled) {
        (LogFormat::Json, _) => logger.format(json_format),
        (LogFormat::Ext, true) => logger.format(extended_color_format),
        (LogFormat::Ext, false) => logger.format(extended_format),
        (LogFormat::Text, true) => logger.format(simple_color_format),
        (LogFormat::Text, false) => logger.format(simple_format),
    };

    if let Some(file_path) = log_file {
        let file_spec = FileSpec::try_from(std::path::Path::new(file_path))?;
        logger = logger.log_to_file(file_spec);
    }

    let handle = logger.start()?;
    let _ = LOGGER_HANDLE.set(Mutex::new(handle));

    Ok(())
}

/// Flush buffered output, e.g. before exiting with a failure code
pub fn flush_logging() {
    if let Some(handle) = LOGGER_HANDLE.get() {
        if let Ok(handle) = handle.lock() {
            handle.flush();
        }
    }
}

fn level_abbr(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERR",
        log::Level::Warn => "WRN",
        log::Level::Info => "INF",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRC",
    }
}

fn simple_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level_abbr(record.level()),
        record.args()
    )
}

fn simple_color_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {}",
        dimmed_timestamp(now),
        colored_level(record.level()),
        record.args()
    )
}

// "2025-01-01 12:00:00.000 INF message (dedup/puller.rs:42)"
fn extended_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {} ({})",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level_abbr(record.level()),
        record.args(),
        format_target_as_path(record.target(), record.line())
    )
}

fn extended_color_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use colored::Colorize;

    write!(
        w,
        "{} {} {} ({})",
        dimmed_timestamp(now),
        colored_level(record.level()),
        record.args(),
        format_target_as_path(record.target(), record.line()).dimmed()
    )
}

fn json_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    let json_obj = serde_json::json!({
        "timestamp": now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        "level": level_abbr(record.level()),
        "message": record.args().to_string(),
        "target": format_target_as_path(record.target(), record.line())
    });

    match serde_json::to_string(&json_obj) {
        Ok(json_string) => w.write_all(json_string.as_bytes()),
        Err(_) => w.write_all(b"{\"error\":\"Failed to serialize log message\"}"),
    }
}

fn dimmed_timestamp(now: &mut flexi_logger::DeferredNow) -> colored::ColoredString {
    use colored::Colorize;
    now.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed()
}

fn colored_level(level: log::Level) -> colored::ColoredString {
    use colored::Colorize;
    let abbr = level_abbr(level);
    match level {
        log::Level::Error => abbr.red().bold(),
        log::Level::Warn => abbr.yellow(),
        log::Level::Info => abbr.green(),
        log::Level::Debug => abbr.blue(),
        log::Level::Trace => abbr.magenta(),
    }
}

// sqs_dedup::dedup::puller -> dedup/puller.rs:42
fn format_target_as_path(target: &str, line: Option<u32>) -> String {
    let path_like = match target.strip_prefix("sqs_dedup::") {
        Some(module) => module.replace("::", "/") + ".rs",
        None => target.replace("::", "/"),
    };

    match line {
        Some(line_num) => format!("{}:{}", path_like, line_num),
        None => path_like,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexi_logger::DeferredNow;
    use std::str::FromStr;

    fn render(
        format: fn(
            &mut dyn std::io::Write,
            &mut DeferredNow,
            &log::Record,
        ) -> Result<(), std::io::Error>,
        target: &str,
    ) -> String {
        let mut buffer = Vec::new();
        let mut now = DeferredNow::new();
        let record = log::Record::builder()
            .level(log::Level::Warn)
            .target(target)
            .line(Some(42))
            .args(format_args!("Error pulling from 'primary'"))
            .build();

        format(&mut buffer, &mut now, &record).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_simple_format_omits_location() {
        let output = render(simple_format, "sqs_dedup::dedup::puller");

        assert!(output.contains("WRN Error pulling from 'primary'"));
        assert!(!output.contains("puller.rs"));
    }

    #[test]
    fn test_extended_format_appends_location() {
        let output = render(extended_format, "sqs_dedup::dedup::puller");

        assert!(
            output.ends_with("WRN Error pulling from 'primary' (dedup/puller.rs:42)"),
            "got: {}",
            output
        );
    }

    #[test]
    fn test_json_format_is_one_object() {
        let output = render(json_format, "sqs_dedup::queue::sqs");
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["level"], "WRN");
        assert_eq!(parsed["target"], "queue/sqs.rs:42");
        assert_eq!(parsed["message"], "Error pulling from 'primary'");
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_foreign_targets_keep_their_path() {
        assert_eq!(
            format_target_as_path("reqwest::connect", None),
            "reqwest/connect"
        );
    }

    #[test]
    #[serial_test::serial]
    fn test_init_logging_writes_json_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sqs-dedup.log");

        if init_logging(Some("info"), LogFormat::Json, path.to_str(), false).is_err() {
            // Another test in this binary already owns the global logger
            return;
        }
        log::info!("Pulled all messages from 'primary'");
        flush_logging();

        let mut contents = String::new();
        for entry in std::fs::read_dir(dir.path()).unwrap() {
            contents.push_str(&std::fs::read_to_string(entry.unwrap().path()).unwrap());
        }
        assert!(contents.contains("\"message\":\"Pulled all messages from 'primary'\""));
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("ext").unwrap(), LogFormat::Ext);
        assert_eq!(LogFormat::Text.to_string(), "text");
        assert!(LogFormat::from_str("xml").is_err());
    }
}
