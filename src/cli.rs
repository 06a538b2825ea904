//! Command-line interface definitions for the job feed builder.
//!
//! Every option can also be supplied through an environment variable; the
//! flag wins when both are present.

use crate::aggregate::RunConfig;
use crate::fetch::FetchConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for a job feed run.
///
/// # Examples
///
/// ```sh
/// # Defaults: "Job boards list.xlsx" in, jobs.json out
/// job_feed
///
/// # Custom roster and output, gentler on remote sites
/// job_feed -s roster.xlsx -o public/jobs.json --delay-ms 1500
///
/// # Fill unknown job types from the title
/// job_feed --infer-type
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Roster spreadsheet listing organizations and career page URLs
    #[arg(short, long, env = "JOB_FEED_SOURCES", default_value = "Job boards list.xlsx")]
    pub sources: PathBuf,

    /// Path of the JSON feed to write
    #[arg(short, long, env = "JOB_FEED_OUTPUT", default_value = "jobs.json")]
    pub output: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, env = "JOB_FEED_TIMEOUT_SECS", default_value_t = 25)]
    pub timeout_secs: u64,

    /// Total attempts per request, first try included
    #[arg(long, env = "JOB_FEED_MAX_ATTEMPTS", default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,

    /// Base backoff between retries in milliseconds
    #[arg(long, env = "JOB_FEED_BACKOFF_MS", default_value_t = 700)]
    pub backoff_ms: u64,

    /// Pause between organizations in milliseconds
    #[arg(long, env = "JOB_FEED_DELAY_MS", default_value_t = 500)]
    pub delay_ms: u64,

    /// Guess a job category from the title when the type is unknown
    #[arg(long, env = "JOB_FEED_INFER_TYPE")]
    pub infer_type: bool,
}

impl Cli {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            max_attempts: self.max_attempts,
            backoff_base: Duration::from_millis(self.backoff_ms),
            ..FetchConfig::default()
        }
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            sources: self.sources.clone(),
            output: self.output.clone(),
            politeness_delay: Duration::from_millis(self.delay_ms),
            infer_type: self.infer_type,
            fetch: self.fetch_config(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["job_feed"]);

        assert_eq!(cli.sources, PathBuf::from("Job boards list.xlsx"));
        assert_eq!(cli.output, PathBuf::from("jobs.json"));
        assert!(!cli.infer_type);

        let config = cli.run_config();
        assert_eq!(config.politeness_delay, Duration::from_millis(500));
        assert_eq!(config.fetch.timeout, Duration::from_secs(25));
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.fetch.backoff_base, Duration::from_millis(700));
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "job_feed",
            "-s",
            "/tmp/roster.xlsx",
            "-o",
            "/tmp/out/jobs.json",
        ]);

        assert_eq!(cli.sources, PathBuf::from("/tmp/roster.xlsx"));
        assert_eq!(cli.output, PathBuf::from("/tmp/out/jobs.json"));
    }

    #[test]
    fn test_cli_tuning_flags() {
        let cli = Cli::parse_from([
            "job_feed",
            "--timeout-secs",
            "10",
            "--max-attempts",
            "5",
            "--backoff-ms",
            "100",
            "--delay-ms",
            "0",
            "--infer-type",
        ]);

        let config = cli.run_config();
        assert!(config.infer_type);
        assert!(config.politeness_delay.is_zero());
        assert_eq!(config.fetch.timeout, Duration::from_secs(10));
        assert_eq!(config.fetch.max_attempts, 5);
        assert_eq!(config.fetch.backoff_base, Duration::from_millis(100));
    }

    #[test]
    fn test_cli_rejects_zero_attempts() {
        assert!(Cli::try_parse_from(["job_feed", "--max-attempts", "0"]).is_err());
    }
}
