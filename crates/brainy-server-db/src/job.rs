// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background job bookkeeping: registered job definitions and their runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{DbError, Result};
use crate::time::{fmt_ts, parse_opt_ts, parse_ts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
	Running,
	Succeeded,
	Failed,
	Cancelled,
}

impl JobStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			JobStatus::Running => "running",
			JobStatus::Succeeded => "succeeded",
			JobStatus::Failed => "failed",
			JobStatus::Cancelled => "cancelled",
		}
	}
}

impl std::str::FromStr for JobStatus {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"running" => Ok(JobStatus::Running),
			"succeeded" => Ok(JobStatus::Succeeded),
			"failed" => Ok(JobStatus::Failed),
			"cancelled" => Ok(JobStatus::Cancelled),
			_ => Err(format!("unknown job status: {s}")),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
	Schedule,
	Manual,
	Retry,
}

impl TriggerSource {
	pub fn as_str(&self) -> &'static str {
		match self {
			TriggerSource::Schedule => "schedule",
			TriggerSource::Manual => "manual",
			TriggerSource::Retry => "retry",
		}
	}
}

impl std::str::FromStr for TriggerSource {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"schedule" => Ok(TriggerSource::Schedule),
			"manual" => Ok(TriggerSource::Manual),
			"retry" => Ok(TriggerSource::Retry),
			_ => Err(format!("unknown trigger source: {s}")),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
	pub id: String,
	pub name: String,
	pub description: String,
	pub job_type: String,
	pub interval_secs: Option<i64>,
	pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
	pub id: String,
	pub job_id: String,
	pub status: JobStatus,
	pub started_at: DateTime<Utc>,
	pub completed_at: Option<DateTime<Utc>>,
	pub duration_ms: Option<i64>,
	pub error_message: Option<String>,
	pub retry_count: u32,
	pub triggered_by: TriggerSource,
	pub metadata: Option<serde_json::Value>,
}

type JobRunRow = (
	String,
	String,
	String,
	String,
	Option<String>,
	Option<i64>,
	Option<String>,
	i64,
	String,
	Option<String>,
);

const JOB_RUN_COLUMNS: &str = "id, job_id, status, started_at, completed_at, duration_ms, \
	error_message, retry_count, triggered_by, metadata";

fn row_to_run(row: JobRunRow) -> Result<JobRun> {
	let (
		id,
		job_id,
		status,
		started_at,
		completed_at,
		duration_ms,
		error_message,
		retry_count,
		triggered_by,
		metadata,
	) = row;

	Ok(JobRun {
		id,
		job_id,
		status: status.parse().map_err(DbError::Internal)?,
		started_at: parse_ts(&started_at, "started_at")?,
		completed_at: parse_opt_ts(completed_at, "completed_at")?,
		duration_ms,
		error_message,
		retry_count: retry_count as u32,
		triggered_by: triggered_by.parse().map_err(DbError::Internal)?,
		metadata: metadata
			.as_deref()
			.map(serde_json::from_str::<serde_json::Value>)
			.transpose()?,
	})
}

#[derive(Clone)]
pub struct JobRepository {
	pool: SqlitePool,
}

impl JobRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, def), fields(job_id = %def.id))]
	pub async fn upsert_definition(&self, def: &JobDefinition) -> Result<()> {
		let now = fmt_ts(Utc::now());
		sqlx::query(
			r#"
            INSERT INTO job_definitions (id, name, description, job_type, interval_secs, enabled, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                job_type = excluded.job_type,
                interval_secs = excluded.interval_secs,
                enabled = excluded.enabled,
                updated_at = excluded.updated_at
            "#,
		)
		.bind(&def.id)
		.bind(&def.name)
		.bind(&def.description)
		.bind(&def.job_type)
		.bind(def.interval_secs)
		.bind(def.enabled)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self, run), fields(run_id = %run.id, job_id = %run.job_id))]
	pub async fn record_run_start(&self, run: &JobRun) -> Result<()> {
		sqlx::query(
			r#"
            INSERT INTO job_runs (id, job_id, status, started_at, retry_count, triggered_by)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
		)
		.bind(&run.id)
		.bind(&run.job_id)
		.bind(run.status.as_str())
		.bind(fmt_ts(run.started_at))
		.bind(run.retry_count as i64)
		.bind(run.triggered_by.as_str())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self, metadata))]
	pub async fn record_run_complete(
		&self,
		run_id: &str,
		status: JobStatus,
		retry_count: u32,
		error: Option<String>,
		metadata: Option<serde_json::Value>,
	) -> Result<()> {
		let now = fmt_ts(Utc::now());
		let metadata_str = metadata.map(|m| m.to_string());

		let result = sqlx::query(
			r#"
            UPDATE job_runs
            SET status = ?,
                completed_at = ?,
                duration_ms = CAST((julianday(?) - julianday(started_at)) * 86400000 AS INTEGER),
                retry_count = ?,
                error_message = ?,
                metadata = ?
            WHERE id = ?
            "#,
		)
		.bind(status.as_str())
		.bind(&now)
		.bind(&now)
		.bind(retry_count as i64)
		.bind(error)
		.bind(metadata_str)
		.bind(run_id)
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("job run {run_id}")));
		}
		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_run(&self, run_id: &str) -> Result<Option<JobRun>> {
		let row: Option<JobRunRow> =
			sqlx::query_as(&format!("SELECT {JOB_RUN_COLUMNS} FROM job_runs WHERE id = ?"))
				.bind(run_id)
				.fetch_optional(&self.pool)
				.await?;

		row.map(row_to_run).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_last_run(&self, job_id: &str) -> Result<Option<JobRun>> {
		let row: Option<JobRunRow> = sqlx::query_as(&format!(
			"SELECT {JOB_RUN_COLUMNS} FROM job_runs WHERE job_id = ? ORDER BY started_at DESC, rowid DESC LIMIT 1"
		))
		.bind(job_id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(row_to_run).transpose()
	}

	/// Failed runs since the most recent non-failed run.
	#[tracing::instrument(skip(self))]
	pub async fn count_consecutive_failures(&self, job_id: &str) -> Result<u32> {
		let row = sqlx::query_as::<_, (i64,)>(
			r#"
            WITH ranked AS (
                SELECT status,
                       ROW_NUMBER() OVER (ORDER BY started_at DESC, rowid DESC) as rn
                FROM job_runs
                WHERE job_id = ?
            )
            SELECT COUNT(*) as count
            FROM ranked
            WHERE status = 'failed'
              AND rn <= (
                  SELECT COALESCE(MIN(rn) - 1, (SELECT COUNT(*) FROM ranked))
                  FROM ranked
                  WHERE status != 'failed'
              )
            "#,
		)
		.bind(job_id)
		.fetch_one(&self.pool)
		.await?;

		Ok(row.0 as u32)
	}

	/// Delete completed runs that finished before `before`.
	#[tracing::instrument(skip(self))]
	pub async fn delete_old_runs(&self, before: DateTime<Utc>) -> Result<u64> {
		let result =
			sqlx::query("DELETE FROM job_runs WHERE completed_at IS NOT NULL AND completed_at < ?")
				.bind(fmt_ts(before))
				.execute(&self.pool)
				.await?;

		Ok(result.rows_affected())
	}
}

#[async_trait]
pub trait JobStore: Send + Sync {
	async fn upsert_definition(&self, def: &JobDefinition) -> Result<()>;
	async fn record_run_start(&self, run: &JobRun) -> Result<()>;
	async fn record_run_complete(
		&self,
		run_id: &str,
		status: JobStatus,
		retry_count: u32,
		error: Option<String>,
		metadata: Option<serde_json::Value>,
	) -> Result<()>;
	async fn get_run(&self, run_id: &str) -> Result<Option<JobRun>>;
	async fn get_last_run(&self, job_id: &str) -> Result<Option<JobRun>>;
	async fn count_consecutive_failures(&self, job_id: &str) -> Result<u32>;
	async fn delete_old_runs(&self, before: DateTime<Utc>) -> Result<u64>;
}

#[async_trait]
impl JobStore for JobRepository {
	async fn upsert_definition(&self, def: &JobDefinition) -> Result<()> {
		self.upsert_definition(def).await
	}

	async fn record_run_start(&self, run: &JobRun) -> Result<()> {
		self.record_run_start(run).await
	}

	async fn record_run_complete(
		&self,
		run_id: &str,
		status: JobStatus,
		retry_count: u32,
		error: Option<String>,
		metadata: Option<serde_json::Value>,
	) -> Result<()> {
		self
			.record_run_complete(run_id, status, retry_count, error, metadata)
			.await
	}

	async fn get_run(&self, run_id: &str) -> Result<Option<JobRun>> {
		self.get_run(run_id).await
	}

	async fn get_last_run(&self, job_id: &str) -> Result<Option<JobRun>> {
		self.get_last_run(job_id).await
	}

	async fn count_consecutive_failures(&self, job_id: &str) -> Result<u32> {
		self.count_consecutive_failures(job_id).await
	}

	async fn delete_old_runs(&self, before: DateTime<Utc>) -> Result<u64> {
		self.delete_old_runs(before).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;
	use chrono::Duration;

	async fn repo_with_job(id: &str) -> JobRepository {
		let repo = JobRepository::new(create_test_pool().await);
		repo
			.upsert_definition(&JobDefinition {
				id: id.to_string(),
				name: "Test Job".to_string(),
				description: "Test description".to_string(),
				job_type: "periodic".to_string(),
				interval_secs: Some(60),
				enabled: true,
			})
			.await
			.unwrap();
		repo
	}

	fn running(run_id: &str, job_id: &str, started_at: DateTime<Utc>) -> JobRun {
		JobRun {
			id: run_id.to_string(),
			job_id: job_id.to_string(),
			status: JobStatus::Running,
			started_at,
			completed_at: None,
			duration_ms: None,
			error_message: None,
			retry_count: 0,
			triggered_by: TriggerSource::Schedule,
			metadata: None,
		}
	}

	async fn record(repo: &JobRepository, run_id: &str, started_at: DateTime<Utc>, status: JobStatus) {
		repo
			.record_run_start(&running(run_id, "job-1", started_at))
			.await
			.unwrap();
		repo
			.record_run_complete(run_id, status, 0, None, None)
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn records_run_lifecycle() {
		let repo = repo_with_job("job-1").await;
		repo
			.record_run_start(&running("run-1", "job-1", Utc::now()))
			.await
			.unwrap();

		let run = repo.get_run("run-1").await.unwrap().unwrap();
		assert_eq!(run.status, JobStatus::Running);
		assert!(run.completed_at.is_none());

		repo
			.record_run_complete(
				"run-1",
				JobStatus::Failed,
				2,
				Some("Something went wrong".to_string()),
				Some(serde_json::json!({"emitted": 0})),
			)
			.await
			.unwrap();

		let run = repo.get_run("run-1").await.unwrap().unwrap();
		assert_eq!(run.status, JobStatus::Failed);
		assert_eq!(run.retry_count, 2);
		assert_eq!(run.error_message.as_deref(), Some("Something went wrong"));
		assert!(run.completed_at.is_some());
		assert!(run.duration_ms.unwrap() >= 0);
		assert_eq!(run.metadata.unwrap()["emitted"], 0);
	}

	#[tokio::test]
	async fn complete_unknown_run_is_not_found() {
		let repo = repo_with_job("job-1").await;
		let result = repo
			.record_run_complete("missing", JobStatus::Succeeded, 0, None, None)
			.await;
		assert!(matches!(result, Err(DbError::NotFound(_))));
	}

	#[tokio::test]
	async fn last_run_and_consecutive_failures() {
		let repo = repo_with_job("job-1").await;
		assert!(repo.get_last_run("job-1").await.unwrap().is_none());
		assert_eq!(repo.count_consecutive_failures("job-1").await.unwrap(), 0);

		let base = Utc::now() - Duration::minutes(10);
		record(&repo, "run-1", base, JobStatus::Failed).await;
		record(&repo, "run-2", base + Duration::minutes(1), JobStatus::Succeeded).await;
		record(&repo, "run-3", base + Duration::minutes(2), JobStatus::Failed).await;
		record(&repo, "run-4", base + Duration::minutes(3), JobStatus::Failed).await;

		let last = repo.get_last_run("job-1").await.unwrap().unwrap();
		assert_eq!(last.id, "run-4");
		assert_eq!(repo.count_consecutive_failures("job-1").await.unwrap(), 2);
	}

	#[tokio::test]
	async fn all_failed_counts_every_run() {
		let repo = repo_with_job("job-1").await;
		let base = Utc::now() - Duration::minutes(10);
		for i in 0..3 {
			record(&repo, &format!("run-{i}"), base + Duration::minutes(i), JobStatus::Failed).await;
		}
		assert_eq!(repo.count_consecutive_failures("job-1").await.unwrap(), 3);
	}

	#[tokio::test]
	async fn delete_old_runs_keeps_recent_and_running() {
		let repo = repo_with_job("job-1").await;
		record(&repo, "run-1", Utc::now(), JobStatus::Succeeded).await;
		repo
			.record_run_start(&running("run-2", "job-1", Utc::now()))
			.await
			.unwrap();

		let deleted = repo
			.delete_old_runs(Utc::now() - Duration::days(1))
			.await
			.unwrap();
		assert_eq!(deleted, 0);

		let deleted = repo
			.delete_old_runs(Utc::now() + Duration::seconds(5))
			.await
			.unwrap();
		assert_eq!(deleted, 1);
		assert!(repo.get_run("run-1").await.unwrap().is_none());
		assert!(repo.get_run("run-2").await.unwrap().is_some());
	}
}
