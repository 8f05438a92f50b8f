// Job Repository Port (Interface)

use crate::domain::{Job, JobId, LaunchState};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for job descriptors.
/// The job registry belongs to the surrounding system; this engine reads
/// descriptors and flips the launch state.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a new job
    async fn insert(&self, job: &Job) -> Result<()>;

    /// Find job by ID
    async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>>;

    /// Update launch state only
    ///
    /// # Errors
    /// - AppError::NotFound if the job does not exist
    async fn update_launch_state(&self, id: &JobId, state: LaunchState) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    pub struct InMemoryJobRepository {
        jobs: Arc<Mutex<HashMap<JobId, Job>>>,
        fail_launch_updates: Arc<AtomicBool>,
    }

    impl InMemoryJobRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_job(job: Job) -> Self {
            let repo = Self::new();
            repo.jobs.lock().unwrap().insert(job.id.clone(), job);
            repo
        }

        pub fn set_fail_launch_updates(&self, fail: bool) {
            self.fail_launch_updates.store(fail, Ordering::SeqCst);
        }

        pub fn get(&self, id: &str) -> Option<Job> {
            self.jobs.lock().unwrap().get(id).cloned()
        }
    }

    #[async_trait]
    impl JobRepository for InMemoryJobRepository {
        async fn insert(&self, job: &Job) -> Result<()> {
            let mut jobs = self.jobs.lock().unwrap();
            if jobs.contains_key(&job.id) {
                return Err(AppError::Database(format!(
                    "Unique constraint violation: job {}",
                    job.id
                )));
            }
            jobs.insert(job.id.clone(), job.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>> {
            Ok(self.jobs.lock().unwrap().get(id).cloned())
        }

        async fn update_launch_state(&self, id: &JobId, state: LaunchState) -> Result<()> {
            if self.fail_launch_updates.load(Ordering::SeqCst) {
                return Err(AppError::Database("injected launch update failure".to_string()));
            }
            match self.jobs.lock().unwrap().get_mut(id) {
                Some(job) => {
                    job.launch_state = state;
                    Ok(())
                }
                None => Err(AppError::NotFound(format!("Job {} not found", id))),
            }
        }
    }
}
