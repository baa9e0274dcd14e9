use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, error, info};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::source::ScorecardSource;
use crate::metrics::RunMetrics;
use crate::schema::{Offer, Scorecard};

/// Result of the scorecard phase.
#[derive(Debug, Default)]
pub struct ScorecardBatch {
    /// Scorecards per application id, for every successful fetch.
    pub by_application: HashMap<u64, Vec<Scorecard>>,

    /// Application ids whose fetch failed or whose task died.
    pub failed: Vec<u64>,
}

/// Fetches scorecards for every offer's application on a pool of
/// `workers` concurrent tasks.
///
/// BEHAVIOR:
/// - One task per distinct application id
/// - At most `workers` requests in flight (semaphore permits)
/// - Results are recorded in completion order by this loop only
/// - A failing or panicking task is logged and listed in `failed`;
///   the remaining tasks keep running
///
/// No cancellation: once spawned, every task runs to completion.
pub async fn collect_scorecards(
    source: Arc<dyn ScorecardSource>,
    offers: &[Offer],
    workers: usize,
    metrics: &RunMetrics,
) -> ScorecardBatch {
    let mut seen = HashSet::new();
    let application_ids: Vec<u64> = offers
        .iter()
        .map(|o| o.application_id)
        .filter(|id| seen.insert(*id))
        .collect();

    if application_ids.len() < offers.len() {
        debug!(
            "{} offers share an application; fetching {} distinct applications",
            offers.len() - application_ids.len(),
            application_ids.len()
        );
    }

    let total = application_ids.len();
    let permits = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();

    info!("Processing {total} applications in parallel ({workers} workers)...");

    for &application_id in &application_ids {
        let source = source.clone();
        let permits = permits.clone();

        tasks.spawn(async move {
            // Held until the request finishes.
            let _permit = permits.acquire_owned().await.ok();
            (application_id, source.scorecards_for(application_id).await)
        });
        RunMetrics::incr(&metrics.scorecard_tasks);
    }

    let mut by_application = HashMap::with_capacity(total);
    let mut completed = 0usize;

    while let Some(joined) = tasks.join_next().await {
        completed += 1;
        if completed % 10 == 0 {
            info!("Processed {completed} of {total} applications");
        }

        match joined {
            Ok((application_id, Ok(scorecards))) => {
                by_application.insert(application_id, scorecards);
            }
            Ok((application_id, Err(e))) => {
                error!("Scorecard fetch for application {application_id} failed: {e}");
            }
            Err(e) => {
                error!("Scorecard task did not complete: {e}");
            }
        }
    }

    // Covers both reported errors and tasks that panicked.
    let failed: Vec<u64> = application_ids
        .into_iter()
        .filter(|id| !by_application.contains_key(id))
        .collect();

    for _ in &failed {
        RunMetrics::incr(&metrics.scorecard_failures);
    }

    ScorecardBatch {
        by_application,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarvestError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeSource {
        fail: HashSet<u64>,
        panic_on: HashSet<u64>,
        calls: Mutex<Vec<u64>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeSource {
        fn new(fail: &[u64], panic_on: &[u64]) -> Self {
            Self {
                fail: fail.iter().copied().collect(),
                panic_on: panic_on.iter().copied().collect(),
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl ScorecardSource for FakeSource {
        async fn scorecards_for(&self, application_id: u64) -> Result<Vec<Scorecard>, HarvestError> {
            self.calls.lock().unwrap().push(application_id);

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.panic_on.contains(&application_id) {
                panic!("boom");
            }
            if self.fail.contains(&application_id) {
                return Err(HarvestError::RateLimited {
                    url: format!("/applications/{application_id}/scorecards"),
                    attempts: 5,
                });
            }

            let card: Scorecard = serde_json::from_value(serde_json::json!({
                "interview": format!("interview for {application_id}")
            }))
            .unwrap();
            Ok(vec![card])
        }
    }

    fn offers(application_ids: &[u64]) -> Vec<Offer> {
        application_ids
            .iter()
            .enumerate()
            .map(|(i, &application_id)| Offer {
                id: i as u64 + 1,
                application_id,
                candidate_id: 1000 + i as u64,
                starts_at: None,
                status: Some("accepted".to_string()),
            })
            .collect()
    }

    #[tokio::test]
    async fn one_failure_does_not_affect_siblings() {
        let source = Arc::new(FakeSource::new(&[3], &[]));
        let metrics = RunMetrics::default();

        let batch = collect_scorecards(source, &offers(&[1, 2, 3, 4, 5]), 2, &metrics).await;

        assert_eq!(batch.by_application.len(), 4);
        assert!(!batch.by_application.contains_key(&3));
        assert_eq!(batch.failed, vec![3]);
        assert_eq!(
            batch.by_application[&5][0].interview.as_deref(),
            Some("interview for 5")
        );
        assert_eq!(metrics.scorecard_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.scorecard_tasks.load(Ordering::Relaxed), 5);
    }

    #[tokio::test]
    async fn panicking_task_is_reported_as_failed() {
        let source = Arc::new(FakeSource::new(&[], &[2]));
        let metrics = RunMetrics::default();

        let batch = collect_scorecards(source, &offers(&[1, 2, 3]), 3, &metrics).await;

        assert_eq!(batch.by_application.len(), 2);
        assert_eq!(batch.failed, vec![2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_worker_count() {
        let source = Arc::new(FakeSource::new(&[], &[]));
        let metrics = RunMetrics::default();
        let ids: Vec<u64> = (1..=30).collect();

        let batch = collect_scorecards(source.clone(), &offers(&ids), 3, &metrics).await;

        assert_eq!(batch.by_application.len(), 30);
        assert!(batch.failed.is_empty());
        let max = source.max_in_flight.load(Ordering::SeqCst);
        assert!(max >= 1 && max <= 3, "max in flight = {max}");
    }

    #[tokio::test]
    async fn shared_application_is_fetched_once() {
        let source = Arc::new(FakeSource::new(&[], &[]));
        let metrics = RunMetrics::default();

        let batch = collect_scorecards(source.clone(), &offers(&[7, 7, 8]), 6, &metrics).await;

        assert_eq!(batch.by_application.len(), 2);
        let mut calls = source.calls.lock().unwrap().clone();
        calls.sort_unstable();
        assert_eq!(calls, vec![7, 8]);
    }

    #[tokio::test]
    async fn no_offers_means_empty_batch() {
        let source = Arc::new(FakeSource::new(&[], &[]));
        let metrics = RunMetrics::default();

        let batch = collect_scorecards(source, &[], 6, &metrics).await;

        assert!(batch.by_application.is_empty());
        assert!(batch.failed.is_empty());
    }
}
