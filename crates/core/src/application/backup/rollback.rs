// Rollback orchestration
//
// A rollback is accepted synchronously (validation + outcome record) and
// executed on the rollback executor while holding the job lock:
//
//   1. pre-rollback backup (optional)
//   2. restore effective pointers
//   3. delete the job's artifact home
//   4. copy the snapshot into the artifact home
//   5. flag the job NEED_RESTART
//
// Failures are recorded on the outcome with the step that failed; steps 3-5
// leave the job without consistent artifacts and mark it for manual repair.

use super::snapshot::SnapshotManager;
use super::BackupPorts;
use crate::application::executor::RollbackExecutor;
use crate::application::job_lock::JobLock;
use crate::domain::{
    BackupSnapshot, EffectiveKind, Job, JobId, LaunchState, RollbackOutcome, RollbackRequest,
    RollbackStep, ScriptId,
};
use crate::error::{AppError, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug)]
struct StepFailure {
    step: RollbackStep,
    error: AppError,
}

impl StepFailure {
    fn at(step: RollbackStep) -> impl FnOnce(AppError) -> StepFailure {
        move |error| StepFailure { step, error }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({}) failed: {}", self.step.number(), self.step, self.error)
    }
}

/// Restores a job from one of its snapshots
#[derive(Clone)]
pub struct RollbackOrchestrator {
    ports: BackupPorts,
    snapshots: Arc<SnapshotManager>,
    lock: Arc<JobLock>,
    executor: Arc<RollbackExecutor>,
}

impl RollbackOrchestrator {
    pub fn new(
        ports: BackupPorts,
        snapshots: Arc<SnapshotManager>,
        lock: Arc<JobLock>,
        executor: Arc<RollbackExecutor>,
    ) -> Self {
        Self {
            ports,
            snapshots,
            lock,
            executor,
        }
    }

    /// Validate and enqueue a rollback; returns the outcome ticket id.
    ///
    /// # Errors
    /// - AppError::NotFound if the snapshot or its job does not exist
    /// - AppError::InvalidState if the snapshot directory is gone
    /// - AppError::ExecutorSaturated if the executor cannot take the task
    pub async fn rollback(&self, req: RollbackRequest) -> Result<String> {
        let snapshot = self
            .ports
            .backups
            .find_by_id(&req.snapshot_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Snapshot {} not found", req.snapshot_id)))?;

        if self.ports.jobs.find_by_id(&snapshot.job_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Job {} of snapshot {} not found",
                snapshot.job_id, snapshot.id
            )));
        }

        if !self.ports.store.exists(&snapshot.path).await {
            return Err(AppError::InvalidState(format!(
                "Snapshot {} has no artifacts at {}",
                snapshot.id, snapshot.path
            )));
        }

        let outcome = RollbackOutcome::submitted(
            self.ports.id_provider.generate_id(),
            &snapshot.job_id,
            &snapshot.id,
            self.ports.time_provider.now_millis(),
        );
        self.ports.outcomes.insert(&outcome).await?;
        let ticket = outcome.id.clone();
        let job_id = snapshot.job_id.clone();

        let this = self.clone();
        let task_outcome = outcome.clone();
        if let Err(e) = self
            .executor
            .submit(async move { this.run(req, snapshot, task_outcome).await })
        {
            let mut rejected = outcome;
            rejected.reject(e.to_string(), self.ports.time_provider.now_millis());
            if let Err(update_err) = self.ports.outcomes.update(&rejected).await {
                warn!(ticket = %ticket, error = %update_err, "Could not record rejected rollback");
            }
            return Err(e);
        }

        info!(job_id = %job_id, ticket = %ticket, "Rollback submitted");
        Ok(ticket)
    }

    /// Point CONFIG and FLINKSQL back at the snapshot that captured `sql_id`.
    /// Artifacts are left untouched.
    pub async fn rollback_script(&self, job_id: &JobId, sql_id: &ScriptId) -> Result<()> {
        let snapshot = self
            .ports
            .backups
            .find_by_script(job_id, sql_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No snapshot of job {} captured script {}", job_id, sql_id))
            })?;

        self.lock
            .run_exclusive(job_id, || async {
                match &snapshot.config_id {
                    Some(config_id) => {
                        self.ports
                            .pointers
                            .set_effective(job_id, EffectiveKind::Config, config_id)
                            .await?
                    }
                    None => warn!(
                        job_id = %job_id,
                        snapshot_id = %snapshot.id,
                        "Snapshot carries no config, CONFIG pointer unchanged"
                    ),
                }
                self.ports
                    .pointers
                    .set_effective(job_id, EffectiveKind::FlinkSql, sql_id)
                    .await?;
                info!(job_id = %job_id, sql_id = %sql_id, snapshot_id = %snapshot.id, "Script rolled back");
                Ok(())
            })
            .await
    }

    async fn run(&self, req: RollbackRequest, snapshot: BackupSnapshot, mut outcome: RollbackOutcome) {
        let job_id = snapshot.job_id.clone();
        let slot = &mut outcome;
        let locked = self
            .lock
            .run_exclusive(&job_id, move || async move {
                self.run_locked(&req, &snapshot, slot).await;
                Ok(())
            })
            .await;

        if let Err(e) = locked {
            error!(job_id = %job_id, ticket = %outcome.id, error = %e, "Rollback aborted before start");
            outcome.abort(e.to_string(), self.ports.time_provider.now_millis());
            self.record(&outcome).await;
        }
    }

    async fn run_locked(
        &self,
        req: &RollbackRequest,
        snapshot: &BackupSnapshot,
        outcome: &mut RollbackOutcome,
    ) {
        if let Err(e) = outcome.start() {
            error!(ticket = %outcome.id, error = %e, "Rollback outcome not startable");
            return;
        }
        self.record(outcome).await;

        // Reloaded under the lock; an earlier rollback may have changed it
        let job = match self.ports.jobs.find_by_id(&snapshot.job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                self.abort(outcome, format!("Job {} no longer exists", snapshot.job_id));
                self.record(outcome).await;
                return;
            }
            Err(e) => {
                self.abort(outcome, e.to_string());
                self.record(outcome).await;
                return;
            }
        };

        match self.execute_steps(&job, req, snapshot).await {
            Ok(()) => {
                let now = self.ports.time_provider.now_millis();
                if let Err(e) = outcome.succeed(now) {
                    error!(ticket = %outcome.id, error = %e, "Rollback outcome not completable");
                }
                info!(
                    job_id = %job.id,
                    snapshot_id = %snapshot.id,
                    ticket = %outcome.id,
                    "Rollback completed"
                );
            }
            Err(failure) => {
                error!(
                    job_id = %job.id,
                    snapshot_id = %snapshot.id,
                    ticket = %outcome.id,
                    step = failure.step.number(),
                    step_name = %failure.step,
                    error = %failure.error,
                    "Rollback failed"
                );
                if failure.step.leaves_job_damaged() {
                    error!(
                        job_id = %job.id,
                        app_home = %job.app_home,
                        "Job artifacts are inconsistent after failed rollback, manual repair required"
                    );
                }
                outcome.fail(
                    failure.step,
                    failure.to_string(),
                    self.ports.time_provider.now_millis(),
                );
            }
        }
        self.record(outcome).await;
    }

    async fn execute_steps(
        &self,
        job: &Job,
        req: &RollbackRequest,
        snapshot: &BackupSnapshot,
    ) -> std::result::Result<(), StepFailure> {
        if req.backup_before {
            self.pre_backup(job, req.description.clone())
                .await
                .map_err(StepFailure::at(RollbackStep::PreBackup))?;
        }

        self.restore_pointers(job, snapshot)
            .await
            .map_err(StepFailure::at(RollbackStep::PointerRestore))?;

        self.ports
            .store
            .delete(&job.app_home)
            .await
            .map_err(|e| StepFailure::at(RollbackStep::ArtifactDelete)(e.into()))?;

        self.ports
            .store
            .copy_dir(&snapshot.path, &job.app_home)
            .await
            .map_err(|e| StepFailure::at(RollbackStep::ArtifactRestore)(e.into()))?;

        self.ports
            .jobs
            .update_launch_state(&job.id, LaunchState::NeedRestart)
            .await
            .map_err(StepFailure::at(RollbackStep::LaunchStateUpdate))?;

        Ok(())
    }

    async fn pre_backup(&self, job: &Job, description: Option<String>) -> Result<()> {
        let script = if job.is_flink_sql() {
            self.ports.scripts.get_effective(&job.id).await?
        } else {
            None
        };
        self.snapshots.backup(job, script.as_ref(), description).await?;
        Ok(())
    }

    async fn restore_pointers(&self, job: &Job, snapshot: &BackupSnapshot) -> Result<()> {
        if job.running {
            // Staged as latest; takes effect at the next restart
            match &snapshot.config_id {
                Some(config_id) => {
                    self.ports
                        .configs
                        .set_latest_or_effective(true, config_id, &job.id)
                        .await?
                }
                None => warn!(job_id = %job.id, "Snapshot carries no config, nothing staged"),
            }
            if job.is_flink_sql() {
                warn!(
                    job_id = %job.id,
                    "Running job: FLINKSQL pointer left unchanged"
                );
            }
            return Ok(());
        }

        match &snapshot.config_id {
            Some(config_id) => {
                self.ports
                    .pointers
                    .set_effective(&job.id, EffectiveKind::Config, config_id)
                    .await?
            }
            None => warn!(job_id = %job.id, "Snapshot carries no config, CONFIG pointer unchanged"),
        }
        if job.is_flink_sql() {
            match &snapshot.sql_id {
                Some(sql_id) => {
                    self.ports
                        .pointers
                        .set_effective(&job.id, EffectiveKind::FlinkSql, sql_id)
                        .await?
                }
                None => warn!(job_id = %job.id, "Snapshot carries no script, FLINKSQL pointer unchanged"),
            }
        }
        Ok(())
    }

    fn abort(&self, outcome: &mut RollbackOutcome, reason: String) {
        error!(ticket = %outcome.id, job_id = %outcome.job_id, reason = %reason, "Rollback aborted");
        outcome.abort(reason, self.ports.time_provider.now_millis());
    }

    async fn record(&self, outcome: &RollbackOutcome) {
        if let Err(e) = self.ports.outcomes.update(outcome).await {
            error!(ticket = %outcome.id, status = %outcome.status, error = %e, "Could not persist rollback outcome");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;
    use crate::domain::{JobKind, RollbackStatus};
    use crate::port::{ArtifactStore, BackupRepository, RollbackOutcomeRepository};
    use std::time::Duration;

    fn request(snapshot_id: &str, backup_before: bool) -> RollbackRequest {
        RollbackRequest {
            snapshot_id: snapshot_id.to_string(),
            backup_before,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_stopped_job_restored_and_flagged() {
        let fx = Fixture::new();
        let job = fx.add_job("job-1", JobKind::Other).await;
        fx.catalog.add_config("cfg-1", "job-1", 1);
        fx.catalog.point("job-1", EffectiveKind::Config, "cfg-1");
        fx.store.write_file("/apps/job-1/app.jar", b"v1");
        let snapshot_id = fx.snapshot_manager().backup(&job, None, None).await.unwrap().unwrap();

        // Deploy v2
        fx.catalog.add_config("cfg-2", "job-1", 2);
        fx.catalog.point("job-1", EffectiveKind::Config, "cfg-2");
        fx.store.write_file("/apps/job-1/app.jar", b"v2");
        fx.store.write_file("/apps/job-1/extra.jar", b"new");

        let (orchestrator, executor) = fx.orchestrator();
        let ticket = orchestrator.rollback(request(&snapshot_id, false)).await.unwrap();
        assert!(executor.shutdown(Duration::from_secs(5)).await);

        let outcome = fx.outcomes.find_by_id(&ticket).await.unwrap().unwrap();
        assert_eq!(outcome.status, RollbackStatus::RolledBack);
        assert_eq!(fx.store.read_file("/apps/job-1/app.jar"), Some(b"v1".to_vec()));
        assert_eq!(fx.store.read_file("/apps/job-1/extra.jar"), None);
        assert_eq!(fx.catalog.pointer("job-1", EffectiveKind::Config).as_deref(), Some("cfg-1"));
        assert_eq!(fx.jobs.get("job-1").unwrap().launch_state, LaunchState::NeedRestart);
    }

    #[tokio::test]
    async fn test_running_job_stages_config_only() {
        let fx = Fixture::new();
        let job = fx.add_running_job("job-1", JobKind::FlinkSql).await;
        fx.catalog.add_config("cfg-1", "job-1", 1);
        fx.catalog.point("job-1", EffectiveKind::Config, "cfg-1");
        let script = fx.catalog.add_script("sql-1", "job-1", 1);
        fx.catalog.point("job-1", EffectiveKind::FlinkSql, "sql-1");
        fx.store.write_file("/apps/job-1/job.sql", b"v1");
        let snapshot_id = fx
            .snapshot_manager()
            .backup(&job, Some(&script), None)
            .await
            .unwrap()
            .unwrap();

        fx.catalog.add_config("cfg-2", "job-1", 2);
        fx.catalog.point("job-1", EffectiveKind::Config, "cfg-2");
        fx.catalog.add_script("sql-2", "job-1", 2);
        fx.catalog.point("job-1", EffectiveKind::FlinkSql, "sql-2");

        let (orchestrator, executor) = fx.orchestrator();
        let ticket = orchestrator.rollback(request(&snapshot_id, false)).await.unwrap();
        assert!(executor.shutdown(Duration::from_secs(5)).await);

        let outcome = fx.outcomes.find_by_id(&ticket).await.unwrap().unwrap();
        assert_eq!(outcome.status, RollbackStatus::RolledBack);
        assert_eq!(fx.catalog.latest_config("job-1").as_deref(), Some("cfg-1"));
        assert_eq!(fx.catalog.pointer("job-1", EffectiveKind::Config).as_deref(), Some("cfg-2"));
        assert_eq!(fx.catalog.pointer("job-1", EffectiveKind::FlinkSql).as_deref(), Some("sql-2"));
    }

    #[tokio::test]
    async fn test_backup_before_rollback_captures_current_state() {
        let fx = Fixture::new();
        let job = fx.add_job("job-1", JobKind::Other).await;
        fx.store.write_file("/apps/job-1/app.jar", b"v1");
        let snapshot_id = fx.snapshot_manager().backup(&job, None, None).await.unwrap().unwrap();
        fx.store.write_file("/apps/job-1/app.jar", b"v2");

        let (orchestrator, executor) = fx.orchestrator();
        orchestrator.rollback(request(&snapshot_id, true)).await.unwrap();
        assert!(executor.shutdown(Duration::from_secs(5)).await);

        let latest = fx.backups.find_latest(&"job-1".to_string()).await.unwrap().unwrap();
        assert_ne!(latest.id, snapshot_id);
        assert_eq!(
            fx.store.read_file(&format!("{}/app.jar", latest.path)),
            Some(b"v2".to_vec())
        );
        assert_eq!(fx.store.read_file("/apps/job-1/app.jar"), Some(b"v1".to_vec()));
    }

    #[tokio::test]
    async fn test_unknown_snapshot_is_not_found() {
        let fx = Fixture::new();
        let (orchestrator, _executor) = fx.orchestrator();
        let err = orchestrator.rollback(request("missing", false)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(fx.outcomes.all().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_without_artifacts_is_rejected_up_front() {
        let fx = Fixture::new();
        let job = fx.add_job("job-1", JobKind::Other).await;
        fx.store.write_file("/apps/job-1/app.jar", b"v1");
        let snapshot_id = fx.snapshot_manager().backup(&job, None, None).await.unwrap().unwrap();
        let path = fx.backups.rows()[0].path.clone();
        fx.store.delete(&path).await.unwrap();

        let (orchestrator, _executor) = fx.orchestrator();
        let err = orchestrator.rollback(request(&snapshot_id, false)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(fx.store.read_file("/apps/job-1/app.jar"), Some(b"v1".to_vec()));
    }

    #[tokio::test]
    async fn test_copy_failure_marks_job_for_repair() {
        let fx = Fixture::new();
        let job = fx.add_job("job-1", JobKind::Other).await;
        fx.store.write_file("/apps/job-1/app.jar", b"v1");
        let snapshot_id = fx.snapshot_manager().backup(&job, None, None).await.unwrap().unwrap();
        fx.store.fail_on("copy_dir", "/apps/job-1");

        let (orchestrator, executor) = fx.orchestrator();
        let ticket = orchestrator.rollback(request(&snapshot_id, false)).await.unwrap();
        assert!(executor.shutdown(Duration::from_secs(5)).await);

        let outcome = fx.outcomes.find_by_id(&ticket).await.unwrap().unwrap();
        assert_eq!(outcome.status, RollbackStatus::Failed);
        assert_eq!(outcome.failed_step, Some(RollbackStep::ArtifactRestore));
        assert!(outcome.needs_repair);
        assert_eq!(fx.jobs.get("job-1").unwrap().launch_state, LaunchState::Done);
    }

    #[tokio::test]
    async fn test_pointer_failure_leaves_artifacts_alone() {
        let fx = Fixture::new();
        let job = fx.add_job("job-1", JobKind::Other).await;
        fx.catalog.add_config("cfg-1", "job-1", 1);
        fx.catalog.point("job-1", EffectiveKind::Config, "cfg-1");
        fx.store.write_file("/apps/job-1/app.jar", b"v1");
        let snapshot_id = fx.snapshot_manager().backup(&job, None, None).await.unwrap().unwrap();
        fx.store.write_file("/apps/job-1/app.jar", b"v2");
        fx.catalog.set_fail_writes(true);

        let (orchestrator, executor) = fx.orchestrator();
        let ticket = orchestrator.rollback(request(&snapshot_id, false)).await.unwrap();
        assert!(executor.shutdown(Duration::from_secs(5)).await);

        let outcome = fx.outcomes.find_by_id(&ticket).await.unwrap().unwrap();
        assert_eq!(outcome.failed_step, Some(RollbackStep::PointerRestore));
        assert!(!outcome.needs_repair);
        assert_eq!(fx.store.read_file("/apps/job-1/app.jar"), Some(b"v2".to_vec()));
    }

    #[tokio::test]
    async fn test_rollbacks_of_one_job_do_not_interleave() {
        let fx = Fixture::new();
        let job = fx.add_job("job-1", JobKind::Other).await;
        fx.store.write_file("/apps/job-1/app.jar", b"v1");
        let first = fx.snapshot_manager().backup(&job, None, None).await.unwrap().unwrap();
        fx.store.write_file("/apps/job-1/app.jar", b"v2");
        let second = fx.snapshot_manager().backup(&job, None, None).await.unwrap().unwrap();
        fx.store.set_copy_delay(Duration::from_millis(20));

        let (orchestrator, executor) = fx.orchestrator();
        orchestrator.rollback(request(&first, false)).await.unwrap();
        orchestrator.rollback(request(&second, false)).await.unwrap();
        assert!(executor.shutdown(Duration::from_secs(5)).await);

        // Every delete of the artifact home is followed by its own restore
        let ops: Vec<String> = fx
            .store
            .ops()
            .into_iter()
            .filter(|op| op.starts_with("delete:/apps") || op.ends_with("->/apps/job-1"))
            .collect();
        assert_eq!(ops.len(), 4, "ops: {:?}", ops);
        for pair in ops.chunks(2) {
            assert_eq!(pair[0], "delete:/apps/job-1");
            assert!(pair[1].starts_with("copy_dir:/ws/backups/job-1/"));
        }
        assert!(fx
            .outcomes
            .all()
            .iter()
            .all(|o| o.status == RollbackStatus::RolledBack));
    }

    #[tokio::test]
    async fn test_saturated_executor_records_rejection() {
        let fx = Fixture::new();
        let job = fx.add_job("job-1", JobKind::Other).await;
        fx.store.write_file("/apps/job-1/app.jar", b"v1");
        let snapshot_id = fx.snapshot_manager().backup(&job, None, None).await.unwrap().unwrap();
        fx.store.set_copy_delay(Duration::from_millis(200));

        let (orchestrator, executor) = fx.orchestrator_with(crate::application::ExecutorConfig {
            core_workers: 1,
            max_workers: 1,
            keep_alive: Duration::from_secs(1),
            queue_capacity: 1,
        });

        let mut accepted = 0;
        let mut rejected = None;
        for _ in 0..4 {
            match orchestrator.rollback(request(&snapshot_id, false)).await {
                Ok(_) => accepted += 1,
                Err(e) => {
                    rejected = Some(e);
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(accepted, 2);
        assert!(matches!(rejected, Some(AppError::ExecutorSaturated { .. })));
        assert!(fx
            .outcomes
            .all()
            .iter()
            .any(|o| o.status == RollbackStatus::Rejected));

        assert!(executor.shutdown(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn test_shutdown_deadline_lets_running_rollback_finish() {
        let fx = Fixture::new();
        let job = fx.add_job("job-1", JobKind::Other).await;
        fx.store.write_file("/apps/job-1/app.jar", b"v1");
        let snapshot_id = fx.snapshot_manager().backup(&job, None, None).await.unwrap().unwrap();
        fx.store.write_file("/apps/job-1/app.jar", b"v2");
        fx.store.set_copy_delay(Duration::from_millis(300));

        let (orchestrator, executor) = fx.orchestrator_with(crate::application::ExecutorConfig {
            core_workers: 1,
            max_workers: 1,
            keep_alive: Duration::from_secs(1),
            queue_capacity: 4,
        });
        let running = orchestrator.rollback(request(&snapshot_id, false)).await.unwrap();
        while fx.outcomes.find_by_id(&running).await.unwrap().unwrap().status
            != RollbackStatus::Running
        {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let queued = orchestrator.rollback(request(&snapshot_id, false)).await.unwrap();

        assert!(!executor.shutdown(Duration::from_millis(50)).await);

        let finished = fx.outcomes.find_by_id(&running).await.unwrap().unwrap();
        assert_eq!(finished.status, RollbackStatus::RolledBack);
        assert_eq!(fx.store.read_file("/apps/job-1/app.jar"), Some(b"v1".to_vec()));

        // The dropped one stays open until the next start closes it
        let dropped = fx.outcomes.find_by_id(&queued).await.unwrap().unwrap();
        assert_eq!(dropped.status, RollbackStatus::Submitted);
        let recovery = crate::application::RollbackRecovery::new(
            Arc::new(fx.outcomes.clone()),
            Arc::new(crate::port::time_provider::SystemTimeProvider),
        );
        assert_eq!(recovery.recover_interrupted().await.unwrap(), 1);
        let closed = fx.outcomes.find_by_id(&queued).await.unwrap().unwrap();
        assert_eq!(closed.status, RollbackStatus::Failed);
        assert!(!closed.needs_repair);
    }

    #[tokio::test]
    async fn test_rollback_script_flips_both_pointers() {
        let fx = Fixture::new();
        let job = fx.add_job("job-1", JobKind::FlinkSql).await;
        fx.catalog.add_config("cfg-1", "job-1", 1);
        fx.catalog.point("job-1", EffectiveKind::Config, "cfg-1");
        let script = fx.catalog.add_script("sql-1", "job-1", 1);
        fx.store.write_file("/apps/job-1/job.sql", b"v1");
        fx.snapshot_manager()
            .backup(&job, Some(&script), None)
            .await
            .unwrap();
        fx.catalog.point("job-1", EffectiveKind::Config, "cfg-9");
        fx.catalog.point("job-1", EffectiveKind::FlinkSql, "sql-9");

        let (orchestrator, _executor) = fx.orchestrator();
        orchestrator
            .rollback_script(&"job-1".to_string(), &"sql-1".to_string())
            .await
            .unwrap();

        assert_eq!(fx.catalog.pointer("job-1", EffectiveKind::Config).as_deref(), Some("cfg-1"));
        assert_eq!(fx.catalog.pointer("job-1", EffectiveKind::FlinkSql).as_deref(), Some("sql-1"));

        let err = orchestrator
            .rollback_script(&"job-1".to_string(), &"sql-404".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
