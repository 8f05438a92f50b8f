// Per-job mutual exclusion
//
// Acquire by job id, run a scoped body, release on every exit path
// (success, error, panic, cancellation). Slots are created on demand and
// dropped once nobody holds or waits for them.

use crate::domain::JobId;
use crate::error::{AppError, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

type Slot = Arc<AsyncMutex<()>>;

/// Keyed async lock serializing snapshot/rollback mutations of one job.
/// Different jobs never contend.
#[derive(Default)]
pub struct JobLock {
    slots: Mutex<HashMap<JobId, Slot>>,
    timeout: Option<Duration>,
}

impl JobLock {
    /// Lock that waits indefinitely
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock that gives up with `AppError::LockContention` after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            timeout: Some(timeout),
        }
    }

    /// Whether some body currently runs (or waits) for `job_id`.
    /// Runtime trackers use this to skip jobs mid-rollback.
    pub fn is_held(&self, job_id: &str) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(job_id)
            .map(|slot| slot.try_lock().is_err())
            .unwrap_or(false)
    }

    /// Run `body` while holding the lock of `job_id`; the body's result is returned as-is
    ///
    /// # Errors
    /// - AppError::LockContention if a timeout is configured and expires
    /// - whatever `body` returns
    pub async fn run_exclusive<F, Fut, T>(&self, job_id: &str, body: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let _held = self.acquire(job_id).await?;
        body().await
    }

    async fn acquire(&self, job_id: &str) -> Result<HeldSlot<'_>> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(job_id.to_string()).or_default())
        };
        let mut held = HeldSlot {
            lock: self,
            job_id: job_id.to_string(),
            slot: Arc::clone(&slot),
            guard: None,
        };

        let guard = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, slot.lock_owned())
                .await
                .map_err(|_| AppError::LockContention {
                    job_id: job_id.to_string(),
                    waited_ms: timeout.as_millis() as u64,
                })?,
            None => slot.lock_owned().await,
        };
        held.guard = Some(guard);
        debug!(job_id = %job_id, "Job lock acquired");
        Ok(held)
    }

    fn release_slot(&self, job_id: &str, slot: &Slot) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // map + this handle; anyone else waiting keeps the slot alive
        if Arc::strong_count(slot) == 2 {
            slots.remove(job_id);
        }
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

struct HeldSlot<'a> {
    lock: &'a JobLock,
    job_id: String,
    slot: Slot,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for HeldSlot<'_> {
    fn drop(&mut self) {
        if self.guard.take().is_some() {
            debug!(job_id = %self.job_id, "Job lock released");
        }
        self.lock.release_slot(&self.job_id, &self.slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Barrier;

    fn panicking_body() -> bool {
        true
    }

    #[tokio::test]
    async fn test_same_job_is_serialized() {
        let lock = Arc::new(JobLock::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let lock = Arc::clone(&lock);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            handles.push(tokio::spawn(async move {
                lock.run_exclusive("job-1", || async {
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(lock.slot_count(), 0);
    }

    #[tokio::test]
    async fn test_different_jobs_run_in_parallel() {
        let lock = Arc::new(JobLock::new());
        let barrier = Arc::new(Barrier::new(2));

        let mut handles = Vec::new();
        for job in ["job-a", "job-b"] {
            let lock = Arc::clone(&lock);
            let barrier = Arc::clone(&barrier);
            handles.push(tokio::spawn(async move {
                lock.run_exclusive(job, || async {
                    // Both bodies must be inside at once to pass the barrier
                    barrier.wait().await;
                    Ok(())
                })
                .await
            }));
        }

        for handle in handles {
            tokio::time::timeout(Duration::from_secs(2), handle)
                .await
                .expect("jobs should not block each other")
                .unwrap()
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_released_after_error() {
        let lock = JobLock::new();
        let result: Result<()> = lock
            .run_exclusive("job-1", || async { Err(AppError::Database("boom".to_string())) })
            .await;
        assert!(result.is_err());
        assert!(!lock.is_held("job-1"));

        let value = lock.run_exclusive("job-1", || async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_released_after_panic() {
        let lock = Arc::new(JobLock::new());
        let panicking = Arc::clone(&lock);
        let handle = tokio::spawn(async move {
            panicking
                .run_exclusive("job-1", || async {
                    if panicking_body() {
                        panic!("body panicked");
                    }
                    Ok(())
                })
                .await
        });
        assert!(handle.await.unwrap_err().is_panic());

        let value = tokio::time::timeout(
            Duration::from_secs(1),
            lock.run_exclusive("job-1", || async { Ok("after") }),
        )
        .await
        .expect("lock must be free after a panic")
        .unwrap();
        assert_eq!(value, "after");
    }

    #[tokio::test]
    async fn test_timeout_reports_contention() {
        let lock = Arc::new(JobLock::with_timeout(Duration::from_millis(50)));
        let (entered_tx, entered_rx) = tokio::sync::oneshot::channel();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let holder = Arc::clone(&lock);
        let handle = tokio::spawn(async move {
            holder
                .run_exclusive("job-1", || async move {
                    let _ = entered_tx.send(());
                    let _ = release_rx.await;
                    Ok(())
                })
                .await
        });
        entered_rx.await.unwrap();
        assert!(lock.is_held("job-1"));

        let err = lock
            .run_exclusive("job-1", || async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LockContention { ref job_id, .. } if job_id == "job-1"));

        release_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
        assert!(!lock.is_held("job-1"));
    }
}
