use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for one report run.
///
/// Shared through an `Arc` between the Harvest client and the
/// scorecard collector. Lock-free, updated from any task.
#[derive(Debug, Default)]
pub struct RunMetrics {
    // HTTP
    pub requests_sent: AtomicUsize,
    pub pages_fetched: AtomicUsize,
    pub rate_limited: AtomicUsize,

    // Scorecard phase
    pub scorecard_tasks: AtomicUsize,
    pub scorecard_failures: AtomicUsize,
}

impl RunMetrics {
    pub fn incr(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// One-line summary logged at the end of the run.
    pub fn summary(&self) -> String {
        format!(
            "[METRICS] requests={} pages={} rate_limited={} scorecard_tasks={} scorecard_failures={}",
            self.requests_sent.load(Ordering::Relaxed),
            self.pages_fetched.load(Ordering::Relaxed),
            self.rate_limited.load(Ordering::Relaxed),
            self.scorecard_tasks.load(Ordering::Relaxed),
            self.scorecard_failures.load(Ordering::Relaxed),
        )
    }
}
