// Shared wiring for backup use-case tests

use super::{BackupPorts, BackupService, RetentionReaper, RollbackOrchestrator, SnapshotManager};
use crate::application::executor::{ExecutorConfig, RollbackExecutor};
use crate::application::job_lock::JobLock;
use crate::domain::{Job, JobKind, Workspace};
use crate::port::backup_repository::mocks::InMemoryBackupRepository;
use crate::port::effective_pointer::mocks::InMemoryCatalog;
use crate::port::id_provider::mocks::SequentialIdProvider;
use crate::port::job_repository::mocks::InMemoryJobRepository;
use crate::port::rollback_outcome::mocks::InMemoryOutcomeRepository;
use crate::port::artifact_store::mocks::InMemoryArtifactStore;
use crate::port::time_provider::mocks::SteppingTimeProvider;
use crate::port::{IdProvider, JobRepository, TimeProvider};
use std::sync::Arc;
use std::time::Duration;

pub(crate) struct Fixture {
    pub jobs: InMemoryJobRepository,
    pub backups: InMemoryBackupRepository,
    pub outcomes: InMemoryOutcomeRepository,
    pub store: Arc<InMemoryArtifactStore>,
    pub catalog: InMemoryCatalog,
    pub lock: Arc<JobLock>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            jobs: InMemoryJobRepository::new(),
            backups: InMemoryBackupRepository::new(),
            outcomes: InMemoryOutcomeRepository::new(),
            store: Arc::new(InMemoryArtifactStore::new()),
            catalog: InMemoryCatalog::new(),
            lock: Arc::new(JobLock::new()),
            id_provider: Arc::new(SequentialIdProvider::new("id")),
            time_provider: Arc::new(SteppingTimeProvider::new(1_000, 10)),
        }
    }

    pub fn workspace(&self) -> Workspace {
        Workspace::new("/ws")
    }

    pub fn ports(&self) -> BackupPorts {
        BackupPorts {
            jobs: Arc::new(self.jobs.clone()),
            backups: Arc::new(self.backups.clone()),
            backup_tx: Arc::new(self.backups.clone()),
            outcomes: Arc::new(self.outcomes.clone()),
            store: self.store.clone(),
            pointers: Arc::new(self.catalog.clone()),
            configs: Arc::new(self.catalog.clone()),
            scripts: Arc::new(self.catalog.clone()),
            id_provider: Arc::clone(&self.id_provider),
            time_provider: Arc::clone(&self.time_provider),
        }
    }

    /// Stopped job with artifacts under /apps/<id> and build output under /dist/<id>
    pub async fn add_job(&self, id: &str, kind: JobKind) -> Job {
        let job = Job::new(
            id,
            format!("{} app", id),
            kind,
            format!("/apps/{}", id),
            format!("/dist/{}", id),
            0,
        );
        self.jobs.insert(&job).await.unwrap();
        job
    }

    pub async fn add_running_job(&self, id: &str, kind: JobKind) -> Job {
        let mut job = Job::new(
            id,
            format!("{} app", id),
            kind,
            format!("/apps/{}", id),
            format!("/dist/{}", id),
            0,
        );
        job.running = true;
        self.jobs.insert(&job).await.unwrap();
        job
    }

    pub fn snapshot_manager(&self) -> SnapshotManager {
        SnapshotManager::new(self.ports(), self.workspace())
    }

    pub fn reaper(&self) -> RetentionReaper {
        RetentionReaper::new(self.ports(), self.workspace(), Arc::clone(&self.lock))
    }

    pub fn orchestrator(&self) -> (RollbackOrchestrator, Arc<RollbackExecutor>) {
        self.orchestrator_with(ExecutorConfig::from_parallelism(1))
    }

    pub fn orchestrator_with(
        &self,
        config: ExecutorConfig,
    ) -> (RollbackOrchestrator, Arc<RollbackExecutor>) {
        let executor = Arc::new(RollbackExecutor::start(config).unwrap());
        let orchestrator = RollbackOrchestrator::new(
            self.ports(),
            Arc::new(self.snapshot_manager()),
            Arc::clone(&self.lock),
            Arc::clone(&executor),
        );
        (orchestrator, executor)
    }

    pub fn service(&self) -> (BackupService, Arc<RollbackExecutor>) {
        let executor = Arc::new(
            RollbackExecutor::start(ExecutorConfig {
                core_workers: 2,
                max_workers: 4,
                keep_alive: Duration::from_secs(1),
                queue_capacity: 16,
            })
            .unwrap(),
        );
        let service = BackupService::new(
            self.ports(),
            self.workspace(),
            Arc::clone(&self.lock),
            Arc::clone(&executor),
        );
        (service, executor)
    }
}
