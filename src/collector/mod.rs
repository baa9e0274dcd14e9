/// Scorecard collector
///
/// Fans scorecard requests for every accepted offer out over a
/// bounded worker pool and gathers the results by application id.
///
/// - `source`: the seam between the collector and the Harvest client
/// - `runner`: the worker pool itself
///
/// A failed request never aborts its siblings. What a failure means
/// for the report is decided by the caller (`ScorecardFailurePolicy`).
pub mod runner;
pub mod source;
