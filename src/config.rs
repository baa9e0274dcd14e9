use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};

/// Harvest API root used when `--base-url` is not given.
pub const DEFAULT_BASE_URL: &str = "https://harvest.greenhouse.io/v1";

/// Page size requested from every paginated endpoint.
pub const PAGE_SIZE: u32 = 500;

/// Maximum number of ids sent in one `candidate_ids` filter.
pub const CANDIDATE_CHUNK_SIZE: usize = 50;

// ------------------------------------------------------------
// Command line
// ------------------------------------------------------------
//
// Every setting can be passed as a flag. The credential and the
// API root can also come from the environment (or a `.env` file,
// loaded in `main` before parsing).
//
#[derive(Debug, Parser)]
#[command(
    name = "greenhouse-scorecards",
    version,
    about = "Collects accepted offers, candidates and interview scorecards from Greenhouse into one JSON report"
)]
pub struct Cli {
    /// Harvest API token (sent as Basic auth with an empty password)
    #[arg(long, env = "GREENHOUSE_API_TOKEN", hide_env_values = true)]
    pub api_token: String,

    /// Harvest API root
    #[arg(long, env = "GREENHOUSE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Only offers starting after this date (YYYY-MM-DD) are collected
    #[arg(long, default_value = "2023-07-01")]
    pub start_date: NaiveDate,

    /// Where the JSON report is written
    #[arg(long, short, default_value = "scorecards_data.json")]
    pub output: PathBuf,

    /// Number of concurrent scorecard requests
    #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: u16,

    /// Attempts per scorecard request before a 429 becomes fatal
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_rate_limit_attempts: u32,

    /// Wait used when a 429 response carries no Retry-After header
    #[arg(long, default_value_t = 10)]
    pub default_retry_after_secs: u64,

    /// Per-request timeout
    #[arg(long, default_value_t = 60)]
    pub request_timeout_secs: u64,

    /// What to do when some scorecard fetches failed
    #[arg(long, value_enum, default_value_t = ScorecardFailurePolicy::Tolerate)]
    pub on_scorecard_failure: ScorecardFailurePolicy,
}

// ------------------------------------------------------------
// Scorecard failure policy
// ------------------------------------------------------------
//
// The scorecard phase never aborts on a single failed request.
// This policy decides what the rest of the run does about it.
//
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScorecardFailurePolicy {
    /// Offers whose scorecards could not be fetched are reported
    /// with an empty scorecard list.
    Tolerate,

    /// Any failed scorecard fetch fails the run before collation.
    Abort,
}

// ------------------------------------------------------------
// Root configuration
// ------------------------------------------------------------
//
// Built once at startup. Each component receives only the
// section it needs.
//
#[derive(Debug, Clone)]
pub struct Config {
    pub harvest: HarvestConfig,
    pub collector: CollectorConfig,
    pub report: ReportConfig,
}

// ------------------------------------------------------------
// Harvest API configuration
// ------------------------------------------------------------
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// API root, without trailing slash
    pub base_url: String,

    /// Raw API token. Never logged.
    pub api_token: String,

    pub page_size: u32,
    pub candidate_chunk_size: usize,
    pub request_timeout: Duration,
    pub rate_limit: RateLimitConfig,
}

/// Retry settings for 429 responses.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Total attempts, including the first request
    pub max_attempts: u32,

    /// Base wait when the server sends no Retry-After
    pub default_retry_after: Duration,

    /// Upper bound for the computed fallback wait
    pub max_backoff: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            default_retry_after: Duration::from_secs(10),
            max_backoff: Duration::from_secs(120),
        }
    }
}

// ------------------------------------------------------------
// Scorecard collector configuration
// ------------------------------------------------------------
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Size of the worker pool
    pub workers: usize,

    pub failure_policy: ScorecardFailurePolicy,
}

// ------------------------------------------------------------
// Report configuration
// ------------------------------------------------------------
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub start_date: NaiveDate,
    pub output: PathBuf,
}

impl Config {
    /// Validates the parsed command line and builds the runtime config.
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let api_token = cli.api_token.trim().to_string();
        if api_token.is_empty() {
            anyhow::bail!("GREENHOUSE_API_TOKEN is empty");
        }

        let base_url = cli.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            anyhow::bail!("base URL is empty");
        }

        Ok(Self {
            harvest: HarvestConfig {
                base_url,
                api_token,
                page_size: PAGE_SIZE,
                candidate_chunk_size: CANDIDATE_CHUNK_SIZE,
                request_timeout: Duration::from_secs(cli.request_timeout_secs),
                rate_limit: RateLimitConfig {
                    max_attempts: cli.max_rate_limit_attempts,
                    default_retry_after: Duration::from_secs(cli.default_retry_after_secs),
                    ..RateLimitConfig::default()
                },
            },
            collector: CollectorConfig {
                workers: usize::from(cli.workers),
                failure_policy: cli.on_scorecard_failure,
            },
            report: ReportConfig {
                start_date: cli.start_date,
                output: cli.output,
            },
        })
    }
}

#[cfg(test)]
impl HarvestConfig {
    /// Config pointing at a mock server, with fast rate-limit settings.
    pub fn for_tests(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: "test-token".to_string(),
            page_size: PAGE_SIZE,
            candidate_chunk_size: CANDIDATE_CHUNK_SIZE,
            request_timeout: Duration::from_secs(5),
            rate_limit: RateLimitConfig {
                max_attempts: 3,
                default_retry_after: Duration::from_millis(10),
                max_backoff: Duration::from_millis(50),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let mut argv = vec!["greenhouse-scorecards"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv)
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let cli = parse(&["--api-token", "abc", "--base-url", DEFAULT_BASE_URL]).unwrap();
        let cfg = Config::from_cli(cli).unwrap();

        assert_eq!(cfg.harvest.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.harvest.page_size, 500);
        assert_eq!(cfg.harvest.candidate_chunk_size, 50);
        assert_eq!(cfg.harvest.rate_limit.max_attempts, 5);
        assert_eq!(cfg.harvest.rate_limit.default_retry_after, Duration::from_secs(10));
        assert_eq!(cfg.collector.workers, 6);
        assert_eq!(cfg.collector.failure_policy, ScorecardFailurePolicy::Tolerate);
        assert_eq!(
            cfg.report.start_date,
            NaiveDate::from_ymd_opt(2023, 7, 1).unwrap()
        );
        assert_eq!(cfg.report.output, PathBuf::from("scorecards_data.json"));
    }

    #[test]
    fn overrides_are_applied() {
        let cli = parse(&[
            "--api-token",
            "abc",
            "--base-url",
            "http://localhost:9000/v1/",
            "--start-date",
            "2024-01-15",
            "--workers",
            "2",
            "--on-scorecard-failure",
            "abort",
            "-o",
            "out.json",
        ])
        .unwrap();
        let cfg = Config::from_cli(cli).unwrap();

        assert_eq!(cfg.harvest.base_url, "http://localhost:9000/v1");
        assert_eq!(cfg.collector.workers, 2);
        assert_eq!(cfg.collector.failure_policy, ScorecardFailurePolicy::Abort);
        assert_eq!(
            cfg.report.start_date,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(cfg.report.output, PathBuf::from("out.json"));
    }

    #[test]
    fn blank_token_is_rejected() {
        let cli = parse(&["--api-token", "   ", "--base-url", DEFAULT_BASE_URL]).unwrap();
        assert!(Config::from_cli(cli).is_err());
    }

    #[test]
    fn invalid_start_date_fails_to_parse() {
        let res = parse(&["--api-token", "abc", "--start-date", "2023-13-01"]);
        assert!(res.is_err());
    }

    #[test]
    fn zero_workers_fails_to_parse() {
        let res = parse(&["--api-token", "abc", "--workers", "0"]);
        assert!(res.is_err());
    }
}
