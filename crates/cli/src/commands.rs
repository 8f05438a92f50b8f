// Subcommands and their handlers

use crate::App;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

use snapback_core::domain::{
    validate_path_segment, BackupSnapshot, ConfigRecord, EffectiveKind, Job, JobKind,
    PageRequest, RollbackOutcome, RollbackRequest, RollbackStatus, ScriptRecord,
};
use snapback_core::port::time_provider::SystemTimeProvider;
use snapback_core::port::{EffectivePointerService, JobRepository, TimeProvider};

#[derive(Subcommand)]
pub enum Commands {
    /// Snapshot a job's current artifacts
    Backup {
        job_id: String,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Restore a job from a snapshot (runs on the rollback executor)
    Rollback {
        snapshot_id: String,

        /// Snapshot the current state first
        #[arg(long)]
        backup_before: bool,

        /// Description for the pre-rollback snapshot
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Point a job back at an older SQL script, artifacts untouched
    RollbackScript { job_id: String, sql_id: String },

    /// Undo the newest snapshot of a job
    Revoke { job_id: String },

    /// Delete a single snapshot
    Delete { snapshot_id: String },

    /// Drop a job together with all of its snapshots
    RemoveJob {
        #[arg(value_parser = parse_job_id)]
        job_id: String,
    },

    /// List snapshots of a job, newest first
    List {
        job_id: String,

        /// Only snapshots that captured this SQL script
        #[arg(long)]
        sql_id: Option<String>,

        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value = "10")]
        size: u32,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a rollback outcome by ticket, or the latest one of a job
    Outcome {
        #[arg(required_unless_present = "job", conflicts_with = "job")]
        ticket: Option<String>,

        #[arg(long)]
        job: Option<String>,
    },

    /// Register a job and, optionally, its effective config and SQL script
    RegisterJob {
        /// Also the job's directory name under the backups root
        #[arg(value_parser = parse_job_id)]
        id: String,

        #[arg(long)]
        name: Option<String>,

        /// CUSTOM_CODE_CICD, FLINK_SQL or OTHER
        #[arg(long, value_parser = parse_job_kind, default_value = "OTHER")]
        kind: JobKind,

        /// Directory the runtime reads artifacts from
        #[arg(long)]
        app_home: String,

        /// Build output directory (defaults to app home)
        #[arg(long)]
        dist_home: Option<String>,

        #[arg(long)]
        running: bool,

        #[arg(long, requires = "config_version")]
        config_id: Option<String>,

        #[arg(long)]
        config_version: Option<i32>,

        #[arg(long, requires = "sql_version")]
        sql_id: Option<String>,

        #[arg(long)]
        sql_version: Option<i32>,
    },
}

#[derive(Serialize, Tabled)]
struct SnapshotRow {
    id: String,
    version: i32,
    config: String,
    sql: String,
    description: String,
    created: String,
}

impl From<BackupSnapshot> for SnapshotRow {
    fn from(s: BackupSnapshot) -> Self {
        Self {
            id: s.id,
            version: s.version,
            config: s.config_id.unwrap_or_else(|| "-".to_string()),
            sql: s.sql_id.unwrap_or_else(|| "-".to_string()),
            description: s.description.unwrap_or_default(),
            created: format_millis(s.created_at),
        }
    }
}

pub async fn run(command: Commands, app: &App) -> Result<()> {
    match command {
        Commands::Backup {
            job_id,
            description,
        } => match app.service.backup(&job_id, description).await? {
            Some(id) => println!("{} {}", "✓ Snapshot created:".green().bold(), id),
            None => println!(
                "{}",
                format!("Job {} has no artifacts to back up", job_id).yellow()
            ),
        },

        Commands::Rollback {
            snapshot_id,
            backup_before,
            description,
        } => {
            let ticket = app
                .service
                .rollback(RollbackRequest {
                    snapshot_id,
                    backup_before,
                    description,
                })
                .await?;
            println!("{} {}", "Rollback submitted, ticket:".cyan().bold(), ticket);

            if !app.drain().await {
                println!(
                    "{}",
                    "Rollback still running; poll it with `snapback outcome`".yellow()
                );
            }
            let outcome = app
                .service
                .rollback_outcome(&ticket)
                .await?
                .context("Rollback outcome disappeared")?;
            print_outcome(&outcome)?;
        }

        Commands::RollbackScript { job_id, sql_id } => {
            app.service.rollback_script(&job_id, &sql_id).await?;
            println!(
                "{}",
                format!("✓ Job {} now points at script {}", job_id, sql_id)
                    .green()
                    .bold()
            );
        }

        Commands::Revoke { job_id } => match app.service.revoke(&job_id).await? {
            Some(id) => println!("{} {}", "✓ Snapshot revoked:".green().bold(), id),
            None => println!("{}", format!("Job {} has no snapshots", job_id).yellow()),
        },

        Commands::Delete { snapshot_id } => {
            app.service.delete_snapshot(&snapshot_id).await?;
            println!("{} {}", "✓ Snapshot deleted:".green().bold(), snapshot_id);
        }

        Commands::RemoveJob { job_id } => {
            app.service.remove_job(&job_id).await;
            if app.jobs.delete(&job_id).await? {
                println!("{}", format!("✓ Job {} removed", job_id).green().bold());
            } else {
                println!("{}", format!("Job {} was not registered", job_id).yellow());
            }
        }

        Commands::List {
            job_id,
            sql_id,
            page,
            size,
            json,
        } => {
            let result = app
                .service
                .page(&job_id, sql_id.as_ref(), PageRequest::new(page, size))
                .await?;
            let total = result.total;
            let rows: Vec<SnapshotRow> = result.records.into_iter().map(Into::into).collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("{}", format!("No snapshots for job {}", job_id).yellow());
            } else {
                println!("{}", Table::new(rows));
                println!("page {}, {} snapshots in total", page, total);
            }
        }

        Commands::Outcome { ticket, job } => {
            let outcome = match (ticket, job) {
                (Some(ticket), _) => app.service.rollback_outcome(&ticket).await?,
                (None, Some(job_id)) => app.service.latest_rollback_outcome(&job_id).await?,
                (None, None) => bail!("Either a ticket or --job is required"),
            };
            match outcome {
                Some(outcome) => print_outcome(&outcome)?,
                None => println!("{}", "No rollback outcome found".yellow()),
            }
        }

        Commands::RegisterJob {
            id,
            name,
            kind,
            app_home,
            dist_home,
            running,
            config_id,
            config_version,
            sql_id,
            sql_version,
        } => {
            let now = SystemTimeProvider.now_millis();
            let dist_home = dist_home.unwrap_or_else(|| app_home.clone());
            let mut job = Job::new(
                id.clone(),
                name.unwrap_or_else(|| id.clone()),
                kind,
                app_home,
                dist_home,
                now,
            );
            job.running = running;
            app.jobs.insert(&job).await?;

            if let (Some(config_id), Some(version)) = (config_id, config_version) {
                let record = ConfigRecord {
                    id: config_id,
                    job_id: id.clone(),
                    version,
                };
                app.catalog.insert_config(&record, None).await?;
                app.catalog
                    .set_effective(&id, EffectiveKind::Config, &record.id)
                    .await?;
            }
            if let (Some(sql_id), Some(version)) = (sql_id, sql_version) {
                let record = ScriptRecord {
                    id: sql_id,
                    job_id: id.clone(),
                    version,
                };
                app.catalog.insert_script(&record, None).await?;
                app.catalog
                    .set_effective(&id, EffectiveKind::FlinkSql, &record.id)
                    .await?;
            }

            println!("{}", format!("✓ Job {} registered", id).green().bold());
        }
    }

    Ok(())
}

fn print_outcome(outcome: &RollbackOutcome) -> Result<()> {
    let headline = match outcome.status {
        RollbackStatus::RolledBack => "✓ Rolled back".green().bold(),
        RollbackStatus::Failed if outcome.needs_repair => {
            "✗ Rollback failed, job needs repair".red().bold()
        }
        RollbackStatus::Failed | RollbackStatus::Rejected => {
            format!("✗ Rollback {}", outcome.status).red().bold()
        }
        _ => format!("… Rollback {}", outcome.status).yellow(),
    };
    println!("{}", headline);
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}

fn parse_job_kind(s: &str) -> std::result::Result<JobKind, String> {
    s.to_ascii_uppercase()
        .replace('-', "_")
        .parse()
        .map_err(|e| format!("{}", e))
}

fn parse_job_id(s: &str) -> std::result::Result<String, String> {
    validate_path_segment("job", s)
        .map(|()| s.to_string())
        .map_err(|e| format!("{}", e))
}

fn format_millis(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_kind_accepts_cli_spellings() {
        assert_eq!(parse_job_kind("flink-sql").unwrap(), JobKind::FlinkSql);
        assert_eq!(parse_job_kind("CUSTOM_CODE_CICD").unwrap(), JobKind::CustomCodeCicd);
        assert!(parse_job_kind("spark").is_err());
    }

    #[test]
    fn test_parse_job_id_rejects_path_like_ids() {
        assert_eq!(parse_job_id("job-42").unwrap(), "job-42");
        for bad in ["", ".", "..", "a/b", "../etc"] {
            assert!(parse_job_id(bad).is_err(), "{:?} accepted", bad);
        }
    }

    #[test]
    fn test_snapshot_row_fills_missing_columns() {
        let row = SnapshotRow::from(BackupSnapshot {
            id: "s1".to_string(),
            job_id: "job-1".to_string(),
            path: "/ws/backups/job-1/s1".to_string(),
            version: 2,
            config_id: None,
            sql_id: Some("sql-2".to_string()),
            description: None,
            created_at: 0,
        });
        assert_eq!(row.config, "-");
        assert_eq!(row.sql, "sql-2");
        assert_eq!(row.description, "");
        assert_eq!(row.created, "1970-01-01 00:00:00");
    }
}
