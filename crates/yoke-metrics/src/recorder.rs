//! Metrics Recorder: idempotent per-session upsert with conflict retry
use std::thread;

use tracing::{info, warn};
use yoke_quality::SessionMetrics;

use crate::backoff::{Backoff, RetryPolicy};
use crate::error::StoreError;
use crate::store::MetricsStore;

pub struct MetricsRecorder<S: MetricsStore> {
    store: S,
    retry: RetryPolicy,
}

impl<S: MetricsStore> MetricsRecorder<S> {
    pub fn new(store: S) -> Self {
        Self::with_retry(store, RetryPolicy::default())
    }

    pub fn with_retry(store: S, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Upsert `metrics` for `session_id`. Conflicts with another writer are
    /// retried with backoff; any other failure is returned immediately.
    pub fn upsert(&self, session_id: &str, metrics: &SessionMetrics) -> Result<(), StoreError> {
        let mut backoff = Backoff::new(&self.retry);
        let max_retries = self.retry.max_attempts.saturating_sub(1);

        loop {
            match self.store.upsert(session_id, metrics) {
                Ok(()) => {
                    info!(
                        session_id,
                        rating = metrics.overall_rating,
                        playwright = metrics.playwright_count,
                        "metrics recorded"
                    );
                    return Ok(());
                }
                Err(e) if e.is_conflict() && !backoff.exceeded_max_attempts(max_retries) => {
                    let delay = backoff.next_delay();
                    warn!(
                        session_id,
                        attempt = backoff.attempt,
                        delay_ms = delay.as_millis() as u64,
                        "storage conflict, retrying upsert"
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoredCheck;
    use std::sync::Mutex;
    use yoke_quality::LogCompleteness;

    /// Fails with a conflict a fixed number of times, then succeeds.
    struct FlakyStore {
        conflicts_left: Mutex<u32>,
        writes: Mutex<u32>,
    }

    impl FlakyStore {
        fn new(conflicts: u32) -> Self {
            Self {
                conflicts_left: Mutex::new(conflicts),
                writes: Mutex::new(0),
            }
        }
    }

    impl MetricsStore for FlakyStore {
        fn upsert(&self, _: &str, _: &SessionMetrics) -> Result<(), StoreError> {
            let mut left = self.conflicts_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(StoreError::Conflict("database is locked".into()));
            }
            *self.writes.lock().unwrap() += 1;
            Ok(())
        }

        fn load(&self, _: &str) -> Result<Option<StoredCheck>, StoreError> {
            Ok(None)
        }
    }

    fn metrics() -> SessionMetrics {
        SessionMetrics {
            playwright_count: 1,
            playwright_screenshot_count: 1,
            total_tool_uses: 4,
            error_count: 0,
            error_rate: 0.0,
            critical_issues: vec![],
            warnings: vec![],
            overall_rating: 10,
            completeness: LogCompleteness::Complete,
            duration_seconds: None,
            tool_usage: Default::default(),
        }
    }

    #[test]
    fn test_conflicts_are_retried() {
        let recorder = MetricsRecorder::with_retry(FlakyStore::new(2), RetryPolicy::immediate(3));
        recorder.upsert("s1", &metrics()).unwrap();
        assert_eq!(*recorder.store().writes.lock().unwrap(), 1);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let recorder = MetricsRecorder::with_retry(FlakyStore::new(5), RetryPolicy::immediate(3));
        let err = recorder.upsert("s1", &metrics()).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(*recorder.store().conflicts_left.lock().unwrap(), 2);
    }
}
