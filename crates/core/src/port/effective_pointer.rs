// Effective Pointer Ports
// Which config / script row of a job is "effective", and lookups of the rows themselves.

use crate::domain::{ConfigId, ConfigRecord, EffectiveKind, JobId, ScriptRecord};
use crate::error::Result;
use async_trait::async_trait;

/// Flips the effective pointers of a job
#[async_trait]
pub trait EffectivePointerService: Send + Sync {
    /// Point `kind` of `job_id` at `target_id` (insert or update)
    async fn set_effective(&self, job_id: &JobId, kind: EffectiveKind, target_id: &str)
        -> Result<()>;

    /// Current target of `kind` for `job_id`
    async fn get_effective(&self, job_id: &JobId, kind: EffectiveKind) -> Result<Option<String>>;
}

/// Versioned configuration rows of a job
#[async_trait]
pub trait ConfigService: Send + Sync {
    /// Config row the CONFIG pointer currently targets
    async fn get_effective(&self, job_id: &JobId) -> Result<Option<ConfigRecord>>;

    /// `latest == true`: stage the config as the job's latest candidate, picked up
    /// at the next restart (running jobs). `latest == false`: make it effective now.
    async fn set_latest_or_effective(
        &self,
        latest: bool,
        config_id: &ConfigId,
        job_id: &JobId,
    ) -> Result<()>;
}

/// Versioned SQL script rows of a job
#[async_trait]
pub trait ScriptService: Send + Sync {
    /// Script row the FLINKSQL pointer currently targets
    async fn get_effective(&self, job_id: &JobId) -> Result<Option<ScriptRecord>>;
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

    /// One in-memory catalog backing all three effective-pointer ports
    #[derive(Default, Clone)]
    pub struct InMemoryCatalog {
        configs: Arc<Mutex<HashMap<String, ConfigRecord>>>,
        scripts: Arc<Mutex<HashMap<String, ScriptRecord>>>,
        pointers: Arc<Mutex<HashMap<(JobId, EffectiveKind), String>>>,
        latest: Arc<Mutex<HashMap<JobId, ConfigId>>>,
        fail_writes: Arc<AtomicBool>,
    }

    impl InMemoryCatalog {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_config(&self, id: &str, job_id: &str, version: i32) -> ConfigRecord {
            let record = ConfigRecord {
                id: id.to_string(),
                job_id: job_id.to_string(),
                version,
            };
            self.configs
                .lock()
                .unwrap()
                .insert(id.to_string(), record.clone());
            record
        }

        pub fn add_script(&self, id: &str, job_id: &str, version: i32) -> ScriptRecord {
            let record = ScriptRecord {
                id: id.to_string(),
                job_id: job_id.to_string(),
                version,
            };
            self.scripts
                .lock()
                .unwrap()
                .insert(id.to_string(), record.clone());
            record
        }

        /// Set a pointer directly, bypassing failure injection
        pub fn point(&self, job_id: &str, kind: EffectiveKind, target_id: &str) {
            self.pointers
                .lock()
                .unwrap()
                .insert((job_id.to_string(), kind), target_id.to_string());
        }

        pub fn pointer(&self, job_id: &str, kind: EffectiveKind) -> Option<String> {
            self.pointers
                .lock()
                .unwrap()
                .get(&(job_id.to_string(), kind))
                .cloned()
        }

        pub fn latest_config(&self, job_id: &str) -> Option<ConfigId> {
            self.latest.lock().unwrap().get(job_id).cloned()
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        fn check_write(&self) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(AppError::Database("injected pointer write failure".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl EffectivePointerService for InMemoryCatalog {
        async fn set_effective(
            &self,
            job_id: &JobId,
            kind: EffectiveKind,
            target_id: &str,
        ) -> Result<()> {
            self.check_write()?;
            self.point(job_id, kind, target_id);
            Ok(())
        }

        async fn get_effective(
            &self,
            job_id: &JobId,
            kind: EffectiveKind,
        ) -> Result<Option<String>> {
            Ok(self.pointer(job_id, kind))
        }
    }

    #[async_trait]
    impl ConfigService for InMemoryCatalog {
        async fn get_effective(&self, job_id: &JobId) -> Result<Option<ConfigRecord>> {
            let id = self.pointer(job_id, EffectiveKind::Config);
            Ok(id.and_then(|id| self.configs.lock().unwrap().get(&id).cloned()))
        }

        async fn set_latest_or_effective(
            &self,
            latest: bool,
            config_id: &ConfigId,
            job_id: &JobId,
        ) -> Result<()> {
            self.check_write()?;
            if latest {
                self.latest
                    .lock()
                    .unwrap()
                    .insert(job_id.clone(), config_id.clone());
            } else {
                self.point(job_id, EffectiveKind::Config, config_id);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ScriptService for InMemoryCatalog {
        async fn get_effective(&self, job_id: &JobId) -> Result<Option<ScriptRecord>> {
            let id = self.pointer(job_id, EffectiveKind::FlinkSql);
            Ok(id.and_then(|id| self.scripts.lock().unwrap().get(&id).cloned()))
        }
    }
}
