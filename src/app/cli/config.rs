//! TOML configuration file parsing and loading
//!
//! Keys mirror the long flag names (`queue-url`, `max-inflight`, ...).
//! Values from the file are applied first; command-line values override
//! them afterwards.

use crate::core::validation::ValidationError;
use std::path::PathBuf;

use super::args::Args;

/// Directory and file name of the default config under the user config dir
const CONFIG_DIR_NAME: &str = "SqsDedup";
const CONFIG_FILE_NAME: &str = "sqs-dedup.toml";

impl Args {
    /// Default config file location, if the platform has a config dir
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the config file into `args`
    ///
    /// An explicitly given file must exist; the default file is optional.
    /// Returns the path that was loaded, if any.
    pub async fn load_config_file(
        args: &mut Self,
        config_file: Option<PathBuf>,
    ) -> Result<Option<PathBuf>, ValidationError> {
        let path = match config_file {
            Some(path) if !path.exists() => {
                return Err(ValidationError::new(&format!(
                    "The specified configuration file does not exist: {}",
                    path.display()
                )));
            }
            Some(path) => path,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(None),
            },
        };

        let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
            ValidationError::new(&format!(
                "Error reading configuration file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config = toml::from_str::<toml::Table>(&contents).map_err(|e| {
            ValidationError::new(&format!(
                "Error parsing configuration file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::apply_toml_values(args, &config).map_err(|e| {
            ValidationError::new(&format!(
                "Error in configuration file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Some(path))
    }

    /// Apply TOML configuration values to Args
    pub fn apply_toml_values(args: &mut Self, config: &toml::Table) -> Result<(), ValidationError> {
        if let Some(url) = Self::string_field(config, "queue-url")? {
            args.queue_url = Some(url);
        }
        if let Some(url) = Self::string_field(config, "storage-queue-url")? {
            args.storage_queue_url = Some(url);
        }
        if let Some(count) = Self::count_field(config, "num-workers")? {
            args.num_workers = Some(count as usize);
        }
        if let Some(count) = Self::count_field(config, "max-inflight")? {
            args.max_inflight = Some(count as usize);
        }
        if let Some(seconds) = Self::count_field(config, "time-limit-seconds")? {
            args.time_limit_seconds = Some(seconds);
        }
        if let Some(run_forever) = Self::bool_field(config, "run-forever")? {
            args.run_forever = run_forever;
        }
        if let Some(seconds) = Self::count_field(config, "seconds-to-sleep-between-runs")? {
            args.seconds_between_runs = Some(seconds);
        }
        if let Some(seconds) = Self::count_field(config, "wait-time-seconds")? {
            args.wait_time_seconds = Some(Self::narrow(seconds, "wait-time-seconds")?);
        }
        if let Some(seconds) = Self::count_field(config, "visibility-timeout-seconds")? {
            args.visibility_timeout_seconds =
                Some(Self::narrow(seconds, "visibility-timeout-seconds")?);
        }
        if let Some(pointer) = Self::string_field(config, "unique-id-pointer")? {
            args.unique_id_pointer = Some(pointer);
        }
        if let Some(profile) = Self::string_field(config, "profile-name")? {
            args.profile_name = Some(profile);
        }

        if let Some(color) = Self::bool_field(config, "color")? {
            args.color = Some(color);
        }
        if let Some(no_color) = Self::bool_field(config, "no-color")? {
            args.color = Some(!no_color);
        }
        if let Some(log_level) = Self::string_field(config, "log-level")? {
            args.log_level = Some(log_level);
        }
        if let Some(log_file) = Self::string_field(config, "log-file")? {
            // Magic values "none" and "-" disable file logging
            args.log_file = if log_file.eq_ignore_ascii_case("none") || log_file == "-" {
                None
            } else {
                Some(PathBuf::from(log_file))
            };
        }
        if let Some(log_format) = Self::string_field(config, "log-format")? {
            args.log_format = Some(log_format);
        }

        Ok(())
    }

    fn string_field(config: &toml::Table, key: &str) -> Result<Option<String>, ValidationError> {
        match config.get(key) {
            None => Ok(None),
            Some(toml::Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(Self::type_error(key, "a string", other)),
        }
    }

    fn bool_field(config: &toml::Table, key: &str) -> Result<Option<bool>, ValidationError> {
        match config.get(key) {
            None => Ok(None),
            Some(toml::Value::Boolean(b)) => Ok(Some(*b)),
            Some(other) => Err(Self::type_error(key, "a boolean", other)),
        }
    }

    fn count_field(config: &toml::Table, key: &str) -> Result<Option<u64>, ValidationError> {
        match config.get(key) {
            None => Ok(None),
            Some(toml::Value::Integer(n)) if *n >= 0 => Ok(Some(*n as u64)),
            Some(other) => Err(Self::type_error(key, "a non-negative integer", other)),
        }
    }

    fn narrow(value: u64, key: &str) -> Result<u32, ValidationError> {
        u32::try_from(value)
            .map_err(|_| ValidationError::new(&format!("'{}' value {} is too large", key, value)))
    }

    fn type_error(key: &str, expected: &str, found: &toml::Value) -> ValidationError {
        ValidationError::new(&format!(
            "'{}' must be {}, found {}",
            key,
            expected,
            found.type_str()
        ))
    }
}
