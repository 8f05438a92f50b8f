// Rollback Outcome Repository Port

use crate::domain::{JobId, RollbackOutcome};
use crate::error::Result;
use async_trait::async_trait;

/// Persistence for rollback outcome records
#[async_trait]
pub trait RollbackOutcomeRepository: Send + Sync {
    async fn insert(&self, outcome: &RollbackOutcome) -> Result<()>;

    async fn update(&self, outcome: &RollbackOutcome) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<RollbackOutcome>>;

    /// Most recently submitted rollback of a job
    async fn find_latest_by_job(&self, job_id: &JobId) -> Result<Option<RollbackOutcome>>;

    /// Outcomes still SUBMITTED or RUNNING, oldest first
    async fn find_unfinished(&self) -> Result<Vec<RollbackOutcome>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    pub struct InMemoryOutcomeRepository {
        outcomes: Arc<Mutex<Vec<RollbackOutcome>>>,
    }

    impl InMemoryOutcomeRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn all(&self) -> Vec<RollbackOutcome> {
            self.outcomes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RollbackOutcomeRepository for InMemoryOutcomeRepository {
        async fn insert(&self, outcome: &RollbackOutcome) -> Result<()> {
            self.outcomes.lock().unwrap().push(outcome.clone());
            Ok(())
        }

        async fn update(&self, outcome: &RollbackOutcome) -> Result<()> {
            let mut outcomes = self.outcomes.lock().unwrap();
            match outcomes.iter_mut().find(|o| o.id == outcome.id) {
                Some(existing) => {
                    *existing = outcome.clone();
                    Ok(())
                }
                None => Err(AppError::NotFound(format!(
                    "Rollback outcome {} not found",
                    outcome.id
                ))),
            }
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<RollbackOutcome>> {
            Ok(self.outcomes.lock().unwrap().iter().find(|o| o.id == id).cloned())
        }

        async fn find_latest_by_job(&self, job_id: &JobId) -> Result<Option<RollbackOutcome>> {
            Ok(self
                .outcomes
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|o| &o.job_id == job_id)
                .cloned())
        }

        async fn find_unfinished(&self) -> Result<Vec<RollbackOutcome>> {
            Ok(self
                .outcomes
                .lock()
                .unwrap()
                .iter()
                .filter(|o| !o.status.is_terminal())
                .cloned()
                .collect())
        }
    }
}
