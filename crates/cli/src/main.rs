//! Snapback CLI - snapshot, roll back and prune deployed job artifacts

mod commands;
mod settings;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use snapback_core::application::{
    BackupPorts, BackupService, JobLock, RollbackExecutor, RollbackRecovery,
};
use snapback_core::port::id_provider::UuidProvider;
use snapback_core::port::time_provider::SystemTimeProvider;
use snapback_core::port::TimeProvider;
use snapback_infra_fs::LocalArtifactStore;
use snapback_infra_sqlite::{
    create_pool, run_migrations, SqliteBackupRepository, SqliteCatalog, SqliteJobRepository,
    SqliteOutcomeRepository,
};

use commands::Commands;
use settings::Settings;

#[derive(Parser)]
#[command(name = "snapback")]
#[command(about = "Snapshot and rollback engine for deployed job artifacts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    settings: Settings,
}

/// Everything a command needs, wired once per invocation
pub struct App {
    pub service: BackupService,
    pub executor: Arc<RollbackExecutor>,
    pub jobs: Arc<SqliteJobRepository>,
    pub catalog: Arc<SqliteCatalog>,
    pub settings: Settings,
}

impl App {
    async fn wire(settings: Settings) -> Result<Self> {
        // 1. Metadata store
        let db_path = settings.db_path();
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let pool = create_pool(&settings.database_url())
            .await
            .context("Failed to open metadata database")?;
        run_migrations(&pool)
            .await
            .context("Failed to run migrations")?;
        info!(db_path = %db_path.display(), "Metadata database ready");

        // 2. Adapters
        let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
        let jobs = Arc::new(SqliteJobRepository::new(pool.clone()));
        let backups = Arc::new(SqliteBackupRepository::new(pool.clone()));
        let catalog = Arc::new(SqliteCatalog::new(pool.clone(), Arc::clone(&time_provider)));

        let outcomes = Arc::new(SqliteOutcomeRepository::new(pool));

        // 3. Close rollbacks an earlier process left open
        let recovery = RollbackRecovery::new(outcomes.clone(), Arc::clone(&time_provider));
        match recovery.recover_interrupted().await {
            Ok(recovered) => info!(recovered, "Rollback recovery completed"),
            Err(e) => error!(error = %e, "Rollback recovery failed"),
        }

        let ports = BackupPorts {
            jobs: jobs.clone(),
            backups: backups.clone(),
            backup_tx: backups,
            outcomes,
            store: Arc::new(LocalArtifactStore::new()),
            pointers: catalog.clone(),
            configs: catalog.clone(),
            scripts: catalog.clone(),
            id_provider: Arc::new(UuidProvider),
            time_provider,
        };

        // 4. Use cases
        let lock = Arc::new(match settings.lock_timeout() {
            Some(timeout) => JobLock::with_timeout(timeout),
            None => JobLock::new(),
        });
        let executor = Arc::new(
            RollbackExecutor::start(settings.executor_config())
                .context("Failed to start rollback executor")?,
        );
        let service = BackupService::new(ports, settings.workspace(), lock, Arc::clone(&executor));

        Ok(Self {
            service,
            executor,
            jobs,
            catalog,
            settings,
        })
    }

    /// Wait for submitted rollbacks; false if queued ones had to be dropped at the deadline
    pub async fn drain(&self) -> bool {
        self.executor.shutdown(self.settings.shutdown_grace()).await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = telemetry::init_logging(&cli.settings)?;
    info!("Snapback v{} starting", snapback_core::VERSION);

    let app = App::wire(cli.settings).await?;
    let result = commands::run(cli.command, &app).await;

    if !app.drain().await {
        warn!("Queued rollbacks were dropped at shutdown and will be closed on the next start");
    }

    result
}
