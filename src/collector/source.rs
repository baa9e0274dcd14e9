use crate::error::HarvestError;
use crate::schema::Scorecard;

/// Anything that can fetch the scorecards of one application.
///
/// Implemented by `HarvestClient`. Instances are shared across
/// worker tasks, so implementations must be `Send + Sync`.
#[async_trait::async_trait]
pub trait ScorecardSource: Send + Sync {
    async fn scorecards_for(&self, application_id: u64) -> Result<Vec<Scorecard>, HarvestError>;
}
