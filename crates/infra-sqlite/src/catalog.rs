// SQLite catalog: versioned configs and scripts plus their effective pointers

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use snapback_core::domain::{ConfigId, ConfigRecord, EffectiveKind, JobId, ScriptRecord};
use snapback_core::error::{AppError, Result};
use snapback_core::port::{ConfigService, EffectivePointerService, ScriptService, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

pub struct SqliteCatalog {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    /// Register a config version of a job
    pub async fn insert_config(&self, record: &ConfigRecord, content: Option<&str>) -> Result<()> {
        sqlx::query(
            "INSERT INTO job_configs (id, job_id, version, content, latest, created_at) VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(&record.id)
        .bind(&record.job_id)
        .bind(record.version)
        .bind(content)
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Register a SQL script version of a job
    pub async fn insert_script(&self, record: &ScriptRecord, content: Option<&str>) -> Result<()> {
        sqlx::query(
            "INSERT INTO flink_sqls (id, job_id, version, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.job_id)
        .bind(record.version)
        .bind(content)
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Config staged for the job's next restart
    pub async fn latest_config(&self, job_id: &JobId) -> Result<Option<ConfigId>> {
        sqlx::query_scalar("SELECT id FROM job_configs WHERE job_id = ? AND latest = 1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn stage_latest(&self, config_id: &ConfigId, job_id: &JobId) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("UPDATE job_configs SET latest = 0 WHERE job_id = ?")
            .bind(job_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let result = sqlx::query("UPDATE job_configs SET latest = 1 WHERE id = ? AND job_id = ?")
            .bind(config_id)
            .bind(job_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            // tx dropped here: rolled back
            return Err(AppError::NotFound(format!(
                "Config {} of job {} not found",
                config_id, job_id
            )));
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        debug!(job_id = %job_id, config_id = %config_id, "Config staged as latest");
        Ok(())
    }
}

#[async_trait]
impl EffectivePointerService for SqliteCatalog {
    async fn set_effective(
        &self,
        job_id: &JobId,
        kind: EffectiveKind,
        target_id: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO effective (job_id, kind, target_id, updated_at) VALUES (?, ?, ?, ?)
            ON CONFLICT(job_id, kind) DO UPDATE SET
                target_id = excluded.target_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(job_id)
        .bind(kind.to_string())
        .bind(target_id)
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(job_id = %job_id, kind = %kind, target_id = %target_id, "Effective pointer set");
        Ok(())
    }

    async fn get_effective(&self, job_id: &JobId, kind: EffectiveKind) -> Result<Option<String>> {
        sqlx::query_scalar("SELECT target_id FROM effective WHERE job_id = ? AND kind = ?")
            .bind(job_id)
            .bind(kind.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl ConfigService for SqliteCatalog {
    async fn get_effective(&self, job_id: &JobId) -> Result<Option<ConfigRecord>> {
        let row: Option<(String, String, i32)> = sqlx::query_as(
            r#"
            SELECT c.id, c.job_id, c.version
            FROM effective e
            JOIN job_configs c ON c.id = e.target_id
            WHERE e.job_id = ? AND e.kind = ?
            "#,
        )
        .bind(job_id)
        .bind(EffectiveKind::Config.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|(id, job_id, version)| ConfigRecord {
            id,
            job_id,
            version,
        }))
    }

    async fn set_latest_or_effective(
        &self,
        latest: bool,
        config_id: &ConfigId,
        job_id: &JobId,
    ) -> Result<()> {
        if latest {
            self.stage_latest(config_id, job_id).await
        } else {
            EffectivePointerService::set_effective(self, job_id, EffectiveKind::Config, config_id)
                .await
        }
    }
}

#[async_trait]
impl ScriptService for SqliteCatalog {
    async fn get_effective(&self, job_id: &JobId) -> Result<Option<ScriptRecord>> {
        let row: Option<(String, String, i32)> = sqlx::query_as(
            r#"
            SELECT s.id, s.job_id, s.version
            FROM effective e
            JOIN flink_sqls s ON s.id = e.target_id
            WHERE e.job_id = ? AND e.kind = ?
            "#,
        )
        .bind(job_id)
        .bind(EffectiveKind::FlinkSql.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|(id, job_id, version)| ScriptRecord {
            id,
            job_id,
            version,
        }))
    }
}
