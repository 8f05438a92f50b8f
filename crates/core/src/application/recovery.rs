// Startup recovery of rollback outcomes left open by a previous process

use crate::port::{RollbackOutcomeRepository, TimeProvider};
use std::sync::Arc;
use tracing::{info, warn};

/// Closes SUBMITTED and RUNNING outcomes that no live worker owns.
///
/// Must run before the rollback executor accepts work, otherwise it would
/// close records of rollbacks this process just submitted.
pub struct RollbackRecovery {
    outcomes: Arc<dyn RollbackOutcomeRepository>,
    time_provider: Arc<dyn TimeProvider>,
}

impl RollbackRecovery {
    pub fn new(
        outcomes: Arc<dyn RollbackOutcomeRepository>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            outcomes,
            time_provider,
        }
    }

    /// Mark every unfinished outcome FAILED.
    ///
    /// Rollbacks that never started are closed as harmless; ones that were
    /// running are flagged `needs_repair`. Returns the number of outcomes closed.
    pub async fn recover_interrupted(&self) -> crate::error::Result<usize> {
        let unfinished = self.outcomes.find_unfinished().await?;
        let now = self.time_provider.now_millis();
        let mut recovered = 0;

        for mut outcome in unfinished {
            let was = outcome.status;
            outcome.interrupt(now)?;
            self.outcomes.update(&outcome).await?;
            recovered += 1;

            if outcome.needs_repair {
                warn!(
                    outcome_id = %outcome.id,
                    job_id = %outcome.job_id,
                    snapshot_id = %outcome.snapshot_id,
                    "Rollback was interrupted while running, job needs repair"
                );
            } else {
                info!(
                    outcome_id = %outcome.id,
                    job_id = %outcome.job_id,
                    status = %was,
                    "Closed rollback that never started"
                );
            }
        }

        info!(recovered, "Rollback recovery complete");
        Ok(recovered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RollbackOutcome, RollbackStatus, RollbackStep};
    use crate::port::rollback_outcome::mocks::InMemoryOutcomeRepository;
    use crate::port::time_provider::mocks::SteppingTimeProvider;

    fn recovery(outcomes: &InMemoryOutcomeRepository) -> RollbackRecovery {
        RollbackRecovery::new(
            Arc::new(outcomes.clone()),
            Arc::new(SteppingTimeProvider::new(10_000, 1)),
        )
    }

    #[tokio::test]
    async fn test_unfinished_outcomes_are_closed() {
        let outcomes = InMemoryOutcomeRepository::new();
        let queued = RollbackOutcome::submitted("r-1", "job-1", "s-1", 1_000);
        outcomes.insert(&queued).await.unwrap();

        let mut running = RollbackOutcome::submitted("r-2", "job-2", "s-2", 1_000);
        running.start().unwrap();
        outcomes.insert(&running).await.unwrap();

        let mut failed = RollbackOutcome::submitted("r-3", "job-3", "s-3", 1_000);
        failed.start().unwrap();
        failed.fail(RollbackStep::PointerRestore, "boom", 2_000);
        outcomes.insert(&failed).await.unwrap();

        assert_eq!(recovery(&outcomes).recover_interrupted().await.unwrap(), 2);

        let queued = outcomes.find_by_id("r-1").await.unwrap().unwrap();
        assert_eq!(queued.status, RollbackStatus::Failed);
        assert!(!queued.needs_repair);
        assert_eq!(queued.finished_at, Some(10_000));

        let running = outcomes.find_by_id("r-2").await.unwrap().unwrap();
        assert_eq!(running.status, RollbackStatus::Failed);
        assert!(running.needs_repair);

        // Terminal records are left as they were
        assert_eq!(outcomes.find_by_id("r-3").await.unwrap().unwrap(), failed);
    }

    #[tokio::test]
    async fn test_nothing_to_recover() {
        let outcomes = InMemoryOutcomeRepository::new();
        assert_eq!(recovery(&outcomes).recover_interrupted().await.unwrap(), 0);
        assert!(outcomes.all().is_empty());
    }
}
