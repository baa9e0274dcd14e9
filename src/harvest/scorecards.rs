use std::future::Future;
use std::time::Duration;

use log::{info, warn};
use rand::random_range;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use super::client::{HarvestClient, read_json};
use crate::collector::source::ScorecardSource;
use crate::config::RateLimitConfig;
use crate::error::HarvestError;
use crate::metrics::RunMetrics;
use crate::schema::Scorecard;

/// Outcome of a single rate-limited request attempt.
pub(crate) enum Attempt<T> {
    Done(T),

    /// HTTP 429, with the server's Retry-After if it sent one.
    RateLimited(Option<Duration>),
}

/// Reads `Retry-After` as whole seconds.
///
/// HTTP-date values and negative numbers are treated as absent.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Wait before the next attempt.
///
/// The server's Retry-After wins. Without it the configured default
/// is doubled for every earlier attempt, capped at `max_backoff`,
/// plus up to 10% jitter.
pub(crate) fn retry_delay(policy: &RateLimitConfig, retry_after: Option<Duration>, attempt: u32) -> Duration {
    if let Some(wait) = retry_after {
        return wait;
    }

    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    let base = policy
        .default_retry_after
        .saturating_mul(factor)
        .min(policy.max_backoff);

    let jitter_ms = u64::try_from(base.as_millis() / 10).unwrap_or(u64::MAX);
    base + Duration::from_millis(random_range(0..=jitter_ms))
}

/// Runs `send` until it stops being rate limited or the attempt
/// budget in `policy` is spent.
pub(crate) async fn retry_on_rate_limit<T, F, Fut>(
    policy: &RateLimitConfig,
    url: &str,
    metrics: &RunMetrics,
    mut send: F,
) -> Result<T, HarvestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Attempt<T>, HarvestError>>,
{
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        let retry_after = match send().await? {
            Attempt::Done(value) => return Ok(value),
            Attempt::RateLimited(retry_after) => retry_after,
        };

        RunMetrics::incr(&metrics.rate_limited);

        if attempt >= policy.max_attempts {
            return Err(HarvestError::RateLimited {
                url: url.to_string(),
                attempts: attempt,
            });
        }

        let wait = retry_delay(policy, retry_after, attempt);
        warn!(
            "Rate limited on {url} (attempt {attempt}/{}). Waiting {:.1}s...",
            policy.max_attempts,
            wait.as_secs_f64()
        );
        tokio::time::sleep(wait).await;
    }
}

impl HarvestClient {
    /// All scorecards for one application. A `null` body counts as none.
    pub async fn fetch_scorecards(&self, application_id: u64) -> Result<Vec<Scorecard>, HarvestError> {
        info!("Fetching scorecards for application {application_id}");

        let path = format!("/applications/{application_id}/scorecards");
        let path = path.as_str();
        let client = self;

        retry_on_rate_limit(&self.config().rate_limit, path, self.metrics(), || async move {
            let response = client.get(path, &[]).await?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                return Ok(Attempt::RateLimited(parse_retry_after(response.headers())));
            }

            let scorecards: Option<Vec<Scorecard>> = read_json(response).await?;
            Ok::<_, HarvestError>(Attempt::Done(scorecards.unwrap_or_default()))
        })
        .await
    }
}

#[async_trait::async_trait]
impl ScorecardSource for HarvestClient {
    async fn scorecards_for(&self, application_id: u64) -> Result<Vec<Scorecard>, HarvestError> {
        self.fetch_scorecards(application_id).await
    }
}
