//! Command-line parsing layered over the config file
//!
//! Parsing runs in two stages. The first stage only needs `--config-file`;
//! the file is then loaded into a fresh `Args`, and finally every value the
//! user actually typed on the command line is applied on top.

use crate::core::validation::ValidationError;
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches};

use super::args::Args;

impl Args {
    /// Parse the command line without consulting the config file
    pub fn parse_command_line(args: &[String]) -> Result<(Self, ArgMatches), clap::Error> {
        let matches = Self::command().try_get_matches_from(args)?;
        let mut parsed = Self::from_arg_matches(&matches)?;
        parsed.color = Self::color_from_flags(parsed.color_flag, parsed.no_color);
        Ok((parsed, matches))
    }

    /// Parse the command line, merging in the config file it names
    pub async fn parse_with_config(args: &[String]) -> Result<Self, ParseFailure> {
        let (cli, matches) = Self::parse_command_line(args).map_err(ParseFailure::Cli)?;

        let mut merged = Self::new();
        Self::load_config_file(&mut merged, cli.config_file.clone())
            .await
            .map_err(ParseFailure::Config)?;
        Self::apply_command_line(&mut merged, &cli, &matches);
        Ok(merged)
    }

    /// Copy values given on the command line over `args`
    pub fn apply_command_line(args: &mut Self, cli: &Self, matches: &ArgMatches) {
        let given = |id: &str| matches.value_source(id) == Some(ValueSource::CommandLine);

        if given("queue_url") {
            args.queue_url = cli.queue_url.clone();
        }
        if given("storage_queue_url") {
            args.storage_queue_url = cli.storage_queue_url.clone();
        }
        if given("num_workers") {
            args.num_workers = cli.num_workers;
        }
        if given("max_inflight") {
            args.max_inflight = cli.max_inflight;
        }
        if given("time_limit_seconds") {
            args.time_limit_seconds = cli.time_limit_seconds;
        }
        if given("run_forever") {
            args.run_forever = true;
        }
        if given("seconds_between_runs") {
            args.seconds_between_runs = cli.seconds_between_runs;
        }
        if given("wait_time_seconds") {
            args.wait_time_seconds = cli.wait_time_seconds;
        }
        if given("visibility_timeout_seconds") {
            args.visibility_timeout_seconds = cli.visibility_timeout_seconds;
        }
        if given("unique_id_pointer") {
            args.unique_id_pointer = cli.unique_id_pointer.clone();
        }
        if given("profile_name") {
            args.profile_name = cli.profile_name.clone();
        }
        args.config_file = cli.config_file.clone();
        if cli.color.is_some() {
            args.color = cli.color;
        }
        if given("log_level") {
            args.log_level = cli.log_level.clone();
        }
        if let Some(log_file) = &cli.log_file {
            let log_file_str = log_file.to_string_lossy();
            args.log_file = if log_file_str.eq_ignore_ascii_case("none") || log_file_str == "-" {
                None
            } else {
                Some(log_file.clone())
            };
        }
        if given("log_format") {
            args.log_format = cli.log_format.clone();
        }
    }

    fn color_from_flags(color: bool, no_color: bool) -> Option<bool> {
        match (color, no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Why command-line parsing stopped
#[derive(Debug)]
pub enum ParseFailure {
    /// Bad flags, or `--help` / `--version`; clap renders these itself
    Cli(clap::Error),
    Config(ValidationError),
}
