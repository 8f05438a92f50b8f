// Runtime settings: flags with SNAPBACK_* environment fallbacks

use clap::{Args, ValueEnum};
use snapback_core::application::executor::constants::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_SHUTDOWN_GRACE,
};
use snapback_core::application::ExecutorConfig;
use snapback_core::domain::Workspace;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "~/.snapback/meta.db";
pub const DEFAULT_WORKSPACE: &str = "~/.snapback";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// SQLite metadata database
    #[arg(long, global = true, env = "SNAPBACK_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: String,

    /// Root of the snapshot tree (`<root>/backups`, `<root>/workspace`)
    #[arg(long, global = true, env = "SNAPBACK_WORKSPACE", default_value = DEFAULT_WORKSPACE)]
    pub workspace: String,

    #[arg(long, global = true, env = "SNAPBACK_LOG_FORMAT", value_enum, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Also write json logs into daily files under this directory
    #[arg(long, global = true, env = "SNAPBACK_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Give up waiting for a job's lock after this many seconds (waits forever if unset)
    #[arg(long, global = true, env = "SNAPBACK_LOCK_TIMEOUT_SECS")]
    pub lock_timeout_secs: Option<u64>,

    #[arg(
        long,
        global = true,
        env = "SNAPBACK_ROLLBACK_QUEUE_CAPACITY",
        default_value_t = DEFAULT_QUEUE_CAPACITY
    )]
    pub rollback_queue_capacity: usize,

    /// How long to wait for submitted rollbacks before exiting
    #[arg(
        long,
        global = true,
        env = "SNAPBACK_SHUTDOWN_GRACE_SECS",
        default_value_t = DEFAULT_SHUTDOWN_GRACE.as_secs()
    )]
    pub shutdown_grace_secs: u64,
}

impl Settings {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(expand(&self.db_path))
    }

    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.db_path().display())
    }

    pub fn workspace(&self) -> Workspace {
        Workspace::new(expand(&self.workspace))
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir.as_deref().map(|dir| PathBuf::from(expand(dir)))
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_secs.map(Duration::from_secs)
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig::default().with_queue_capacity(self.rollback_queue_capacity)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn expand(path: &str) -> String {
    shellexpand::tilde(path).into_owned()
}
