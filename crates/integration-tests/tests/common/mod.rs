//! Shared end-to-end wiring: SQLite file + on-disk artifact trees under a TempDir

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use snapback_core::application::{
    BackupPorts, BackupService, ExecutorConfig, JobLock, RollbackExecutor,
};
use snapback_core::domain::{ConfigRecord, EffectiveKind, Job, JobKind, ScriptRecord};
use snapback_core::port::id_provider::UuidProvider;
use snapback_core::port::time_provider::SystemTimeProvider;
use snapback_core::port::{
    ArtifactError, ArtifactStore, EffectivePointerService, JobRepository, TimeProvider,
};
use snapback_infra_fs::LocalArtifactStore;
use snapback_infra_sqlite::{
    create_pool, run_migrations, SqliteBackupRepository, SqliteCatalog, SqliteJobRepository,
    SqliteOutcomeRepository,
};
use sqlx::SqlitePool;
use tempfile::TempDir;

pub struct Harness {
    pub dir: TempDir,
    pub pool: SqlitePool,
    pub service: BackupService,
    pub executor: Arc<RollbackExecutor>,
    pub jobs: Arc<SqliteJobRepository>,
    pub catalog: Arc<SqliteCatalog>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_executor(ExecutorConfig::from_parallelism(1)).await
    }

    pub async fn with_executor(config: ExecutorConfig) -> Self {
        let store: Arc<dyn ArtifactStore> = Arc::new(LocalArtifactStore::new());
        Self::with_store(config, move |_| store).await
    }

    /// Custom artifact store, built from the harness root
    pub async fn with_store(
        config: ExecutorConfig,
        store: impl FnOnce(&Path) -> Arc<dyn ArtifactStore>,
    ) -> Self {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("meta.db").display());
        let pool = create_pool(&url).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
        let jobs = Arc::new(SqliteJobRepository::new(pool.clone()));
        let backups = Arc::new(SqliteBackupRepository::new(pool.clone()));
        let catalog = Arc::new(SqliteCatalog::new(pool.clone(), Arc::clone(&time_provider)));

        let ports = BackupPorts {
            jobs: jobs.clone(),
            backups: backups.clone(),
            backup_tx: backups,
            outcomes: Arc::new(SqliteOutcomeRepository::new(pool.clone())),
            store: store(dir.path()),
            pointers: catalog.clone(),
            configs: catalog.clone(),
            scripts: catalog.clone(),
            id_provider: Arc::new(UuidProvider),
            time_provider,
        };

        let executor = Arc::new(RollbackExecutor::start(config).unwrap());
        let workspace = snapback_core::domain::Workspace::new(
            dir.path().join("ws").to_string_lossy().into_owned(),
        );
        let service = BackupService::new(
            ports,
            workspace,
            Arc::new(JobLock::new()),
            Arc::clone(&executor),
        );

        Self {
            dir,
            pool,
            service,
            executor,
            jobs,
            catalog,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn app_home(&self, job_id: &str) -> PathBuf {
        self.root().join("apps").join(job_id)
    }

    pub fn dist_home(&self, job_id: &str) -> PathBuf {
        self.root().join("dist").join(job_id)
    }

    pub fn backups_dir(&self, job_id: &str) -> PathBuf {
        self.root().join("ws").join("backups").join(job_id)
    }

    pub fn app_workspace(&self) -> PathBuf {
        self.root().join("ws").join("workspace")
    }

    pub async fn register_job(&self, id: &str, kind: JobKind, running: bool) -> Job {
        let mut job = Job::new(
            id,
            format!("{} app", id),
            kind,
            self.app_home(id).to_string_lossy().into_owned(),
            self.dist_home(id).to_string_lossy().into_owned(),
            SystemTimeProvider.now_millis(),
        );
        job.running = running;
        self.jobs.insert(&job).await.unwrap();
        job
    }

    /// Register a config version and point CONFIG at it
    pub async fn use_config(&self, job_id: &str, config_id: &str, version: i32) {
        let record = ConfigRecord {
            id: config_id.to_string(),
            job_id: job_id.to_string(),
            version,
        };
        self.catalog.insert_config(&record, None).await.unwrap();
        self.catalog
            .set_effective(&job_id.to_string(), EffectiveKind::Config, config_id)
            .await
            .unwrap();
    }

    /// Register a script version and point FLINKSQL at it
    pub async fn use_script(&self, job_id: &str, sql_id: &str, version: i32) {
        let record = ScriptRecord {
            id: sql_id.to_string(),
            job_id: job_id.to_string(),
            version,
        };
        self.catalog.insert_script(&record, None).await.unwrap();
        self.catalog
            .set_effective(&job_id.to_string(), EffectiveKind::FlinkSql, sql_id)
            .await
            .unwrap();
    }

    pub async fn pointer(&self, job_id: &str, kind: EffectiveKind) -> Option<String> {
        self.catalog
            .get_effective(&job_id.to_string(), kind)
            .await
            .unwrap()
    }

    pub async fn drain(&self) {
        assert!(
            self.executor.shutdown(Duration::from_secs(10)).await,
            "rollbacks did not finish in time"
        );
    }
}

/// Local store whose copies into `slow_prefix` take `delay` longer
pub struct SlowCopyStore {
    inner: LocalArtifactStore,
    slow_prefix: String,
    delay: Duration,
}

impl SlowCopyStore {
    pub fn new(slow_prefix: &Path, delay: Duration) -> Self {
        Self {
            inner: LocalArtifactStore::new(),
            slow_prefix: slow_prefix.to_string_lossy().into_owned(),
            delay,
        }
    }
}

#[async_trait]
impl ArtifactStore for SlowCopyStore {
    async fn exists(&self, path: &str) -> bool {
        self.inner.exists(path).await
    }

    async fn mkdirs(&self, path: &str) -> Result<(), ArtifactError> {
        self.inner.mkdirs(path).await
    }

    async fn copy_dir(&self, src: &str, dst: &str) -> Result<(), ArtifactError> {
        if dst.starts_with(&self.slow_prefix) {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.copy_dir(src, dst).await
    }

    async fn move_to(&self, src: &str, dst_dir: &str) -> Result<(), ArtifactError> {
        self.inner.move_to(src, dst_dir).await
    }

    async fn delete(&self, path: &str) -> Result<(), ArtifactError> {
        self.inner.delete(path).await
    }
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Relative path -> content of every file below `root`
pub fn tree(root: &Path) -> BTreeMap<String, String> {
    fn walk(base: &Path, dir: &Path, out: &mut BTreeMap<String, String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                let rel = path.strip_prefix(base).unwrap().to_string_lossy().into_owned();
                out.insert(rel, fs::read_to_string(&path).unwrap());
            }
        }
    }

    let mut out = BTreeMap::new();
    if root.exists() {
        walk(root, root, &mut out);
    }
    out
}
