// SQLite RollbackOutcomeRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use snapback_core::domain::{JobId, RollbackOutcome, RollbackStatus, RollbackStep};
use snapback_core::error::{AppError, Result};
use snapback_core::port::RollbackOutcomeRepository;
use sqlx::SqlitePool;

pub struct SqliteOutcomeRepository {
    pool: SqlitePool,
}

impl SqliteOutcomeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RollbackOutcomeRepository for SqliteOutcomeRepository {
    async fn insert(&self, outcome: &RollbackOutcome) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO rollback_outcomes (
                id, job_id, snapshot_id, status, failed_step, error,
                needs_repair, submitted_at, finished_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&outcome.id)
        .bind(&outcome.job_id)
        .bind(&outcome.snapshot_id)
        .bind(outcome.status.to_string())
        .bind(outcome.failed_step.map(|s| s.to_string()))
        .bind(&outcome.error)
        .bind(outcome.needs_repair)
        .bind(outcome.submitted_at)
        .bind(outcome.finished_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn update(&self, outcome: &RollbackOutcome) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE rollback_outcomes
            SET status = ?, failed_step = ?, error = ?, needs_repair = ?, finished_at = ?
            WHERE id = ?
            "#,
        )
        .bind(outcome.status.to_string())
        .bind(outcome.failed_step.map(|s| s.to_string()))
        .bind(&outcome.error)
        .bind(outcome.needs_repair)
        .bind(outcome.finished_at)
        .bind(&outcome.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Rollback outcome {} not found",
                outcome.id
            )));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<RollbackOutcome>> {
        let row = sqlx::query_as::<_, OutcomeRow>("SELECT * FROM rollback_outcomes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(OutcomeRow::try_into_outcome).transpose()
    }

    async fn find_latest_by_job(&self, job_id: &JobId) -> Result<Option<RollbackOutcome>> {
        let row = sqlx::query_as::<_, OutcomeRow>(
            r#"
            SELECT * FROM rollback_outcomes
            WHERE job_id = ?
            ORDER BY submitted_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(OutcomeRow::try_into_outcome).transpose()
    }

    async fn find_unfinished(&self) -> Result<Vec<RollbackOutcome>> {
        let rows = sqlx::query_as::<_, OutcomeRow>(
            r#"
            SELECT * FROM rollback_outcomes
            WHERE status IN (?, ?)
            ORDER BY submitted_at ASC, rowid ASC
            "#,
        )
        .bind(RollbackStatus::Submitted.to_string())
        .bind(RollbackStatus::Running.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(OutcomeRow::try_into_outcome).collect()
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct OutcomeRow {
    id: String,
    job_id: String,
    snapshot_id: String,
    status: String,
    failed_step: Option<String>,
    error: Option<String>,
    needs_repair: bool,
    submitted_at: i64,
    finished_at: Option<i64>,
}

impl OutcomeRow {
    fn try_into_outcome(self) -> Result<RollbackOutcome> {
        let failed_step = self
            .failed_step
            .as_deref()
            .map(str::parse::<RollbackStep>)
            .transpose()?;

        Ok(RollbackOutcome {
            status: self.status.parse::<RollbackStatus>()?,
            failed_step,
            id: self.id,
            job_id: self.job_id,
            snapshot_id: self.snapshot_id,
            error: self.error,
            needs_repair: self.needs_repair,
            submitted_at: self.submitted_at,
            finished_at: self.finished_at,
        })
    }
}
