// SQLite BackupRepository Implementation

use crate::error::map_sqlx_error;
use crate::SqliteBackupTransaction;
use async_trait::async_trait;
use snapback_core::domain::{BackupSnapshot, JobId, Page, PageRequest, ScriptId, SnapshotId};
use snapback_core::error::Result;
use snapback_core::port::{
    BackupRepository, BackupRepositoryTransaction, TransactionalBackupRepository,
};
use sqlx::{SqliteConnection, SqlitePool};

const NEWEST_FIRST: &str = "ORDER BY created_at DESC, rowid DESC";

pub struct SqliteBackupRepository {
    pool: SqlitePool,
}

impl SqliteBackupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

pub(crate) async fn insert_snapshot(
    conn: &mut SqliteConnection,
    snapshot: &BackupSnapshot,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO backups (
            id, job_id, path, version, config_id, sql_id, description, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&snapshot.id)
    .bind(&snapshot.job_id)
    .bind(&snapshot.path)
    .bind(snapshot.version)
    .bind(&snapshot.config_id)
    .bind(&snapshot.sql_id)
    .bind(&snapshot.description)
    .bind(snapshot.created_at)
    .execute(conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(())
}

#[async_trait]
impl BackupRepository for SqliteBackupRepository {
    async fn find_by_id(&self, id: &SnapshotId) -> Result<Option<BackupSnapshot>> {
        let row = sqlx::query_as::<_, BackupRow>("SELECT * FROM backups WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(BackupRow::into_snapshot))
    }

    async fn page_by_job(
        &self,
        job_id: &JobId,
        sql_id: Option<&ScriptId>,
        page: PageRequest,
    ) -> Result<Page<BackupSnapshot>> {
        // `? IS NULL` turns the script filter off
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM backups WHERE job_id = ? AND (? IS NULL OR sql_id = ?)",
        )
        .bind(job_id)
        .bind(sql_id)
        .bind(sql_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let rows: Vec<BackupRow> = sqlx::query_as(&format!(
            "SELECT * FROM backups WHERE job_id = ? AND (? IS NULL OR sql_id = ?) {} LIMIT ? OFFSET ?",
            NEWEST_FIRST
        ))
        .bind(job_id)
        .bind(sql_id)
        .bind(sql_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(Page {
            records: rows.into_iter().map(BackupRow::into_snapshot).collect(),
            total,
            page: page.page,
            size: page.size,
        })
    }

    async fn find_latest(&self, job_id: &JobId) -> Result<Option<BackupSnapshot>> {
        let row = sqlx::query_as::<_, BackupRow>(&format!(
            "SELECT * FROM backups WHERE job_id = ? {} LIMIT 1",
            NEWEST_FIRST
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(BackupRow::into_snapshot))
    }

    async fn find_by_script(
        &self,
        job_id: &JobId,
        sql_id: &ScriptId,
    ) -> Result<Option<BackupSnapshot>> {
        let row = sqlx::query_as::<_, BackupRow>(&format!(
            "SELECT * FROM backups WHERE job_id = ? AND sql_id = ? {} LIMIT 1",
            NEWEST_FIRST
        ))
        .bind(job_id)
        .bind(sql_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(BackupRow::into_snapshot))
    }

    async fn count_by_script(&self, job_id: &JobId, sql_id: &ScriptId) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM backups WHERE job_id = ? AND sql_id = ?")
            .bind(job_id)
            .bind(sql_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete(&self, id: &SnapshotId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM backups WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_job(&self, job_id: &JobId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM backups WHERE job_id = ?")
            .bind(job_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TransactionalBackupRepository for SqliteBackupRepository {
    async fn begin_transaction(&self) -> Result<Box<dyn BackupRepositoryTransaction>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteBackupTransaction::new(tx)))
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct BackupRow {
    id: String,
    job_id: String,
    path: String,
    version: i32,
    config_id: Option<String>,
    sql_id: Option<String>,
    description: Option<String>,
    created_at: i64,
}

impl BackupRow {
    fn into_snapshot(self) -> BackupSnapshot {
        BackupSnapshot {
            id: self.id,
            job_id: self.job_id,
            path: self.path,
            version: self.version,
            config_id: self.config_id,
            sql_id: self.sql_id,
            description: self.description,
            created_at: self.created_at,
        }
    }
}
