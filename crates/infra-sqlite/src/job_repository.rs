// SQLite JobRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use snapback_core::domain::{Job, JobId, JobKind, LaunchState};
use snapback_core::error::{AppError, Result};
use snapback_core::port::JobRepository;
use sqlx::SqlitePool;

pub struct SqliteJobRepository {
    pool: SqlitePool,
}

impl SqliteJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Flip the running flag (maintained by the runtime tracker)
    pub async fn set_running(&self, id: &JobId, running: bool) -> Result<()> {
        let result = sqlx::query("UPDATE jobs SET running = ? WHERE id = ?")
            .bind(running)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Job {} not found", id)));
        }
        Ok(())
    }

    /// Remove the job row; returns false if it did not exist
    pub async fn delete(&self, id: &JobId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    async fn insert(&self, job: &Job) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, name, kind, running, app_home, dist_home, launch_state, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.id)
        .bind(&job.name)
        .bind(job.kind.to_string())
        .bind(job.running)
        .bind(&job.app_home)
        .bind(&job.dist_home)
        .bind(job.launch_state.to_string())
        .bind(job.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(JobRow::try_into_job).transpose()
    }

    async fn update_launch_state(&self, id: &JobId, state: LaunchState) -> Result<()> {
        let result = sqlx::query("UPDATE jobs SET launch_state = ? WHERE id = ?")
            .bind(state.to_string())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Job {} not found", id)));
        }
        Ok(())
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: String,
    name: String,
    kind: String,
    running: bool,
    app_home: String,
    dist_home: String,
    launch_state: String,
    created_at: i64,
}

impl JobRow {
    fn try_into_job(self) -> Result<Job> {
        Ok(Job {
            kind: self.kind.parse::<JobKind>()?,
            launch_state: self.launch_state.parse::<LaunchState>()?,
            id: self.id,
            name: self.name,
            running: self.running,
            app_home: self.app_home,
            dist_home: self.dist_home,
            created_at: self.created_at,
        })
    }
}
