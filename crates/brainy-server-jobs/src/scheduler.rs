// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::context::{CancellationToken, JobContext};
use crate::error::{JobError, Result};
use crate::health::{determine_health_state, JobHealthStatus, JobsHealthStatus, HealthState};
use crate::job::Job;
use crate::types::{JobDefinition, JobRun, JobStatus, TriggerSource};
use brainy_server_db::JobStore;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, instrument, warn};

const BASE_RETRY_DELAY_SECS: u64 = 1;
const MAX_RETRY_DELAY_SECS: u64 = 60;
const RETRY_FACTOR: f64 = 2.0;
const MAX_RETRIES: u32 = 3;

struct RegisteredJob {
	job: Arc<dyn Job>,
	interval: Duration,
	cancellation_token: CancellationToken,
}

/// Runs registered periodic jobs until [`JobScheduler::shutdown`].
pub struct JobScheduler {
	jobs: HashMap<String, RegisteredJob>,
	store: Arc<dyn JobStore>,
	shutdown_tx: broadcast::Sender<()>,
	handles: Mutex<Vec<JoinHandle<()>>>,
}

impl JobScheduler {
	pub fn new(store: Arc<dyn JobStore>) -> Self {
		let (shutdown_tx, _) = broadcast::channel(1);
		Self {
			jobs: HashMap::new(),
			store,
			shutdown_tx,
			handles: Mutex::new(Vec::new()),
		}
	}

	/// Register a job to run immediately on start and then every `interval`.
	pub fn register_periodic(&mut self, job: Arc<dyn Job>, interval: Duration) {
		let id = job.id().to_string();
		self.jobs.insert(
			id,
			RegisteredJob {
				job,
				interval,
				cancellation_token: CancellationToken::new(),
			},
		);
	}

	#[instrument(skip(self))]
	pub async fn start(&self) -> Result<()> {
		let mut handles = self.handles.lock().await;

		for (job_id, registered) in &self.jobs {
			let def = JobDefinition {
				id: job_id.clone(),
				name: registered.job.name().to_string(),
				description: registered.job.description().to_string(),
				job_type: "periodic".to_string(),
				interval_secs: Some(registered.interval.as_secs() as i64),
				enabled: true,
			};
			self.store.upsert_definition(&def).await?;

			let job = Arc::clone(&registered.job);
			let store = Arc::clone(&self.store);
			let mut shutdown_rx = self.shutdown_tx.subscribe();
			let cancellation_token = registered.cancellation_token.clone();
			let interval = registered.interval;
			let job_id = job_id.clone();

			let handle = tokio::spawn(async move {
				// The first tick completes immediately.
				let mut ticker = tokio::time::interval(interval);
				ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

				loop {
					tokio::select! {
						biased;
						_ = shutdown_rx.recv() => {
							info!(job_id = %job_id, "Shutting down periodic job");
							break;
						}
						_ = ticker.tick() => {
							if cancellation_token.is_cancelled() {
								break;
							}
							let result = run_job_with_retry(
								&job,
								&store,
								TriggerSource::Schedule,
								&cancellation_token,
							).await;
							report_scheduled_run(&job_id, &result);
						}
					}
				}
			});

			handles.push(handle);
		}

		info!(job_count = handles.len(), "Job scheduler started");
		Ok(())
	}

	/// Stop every job loop and wait for them to exit. A pass already running
	/// finishes first; its pending retries see the cancelled token.
	#[instrument(skip(self))]
	pub async fn shutdown(&self) {
		for registered in self.jobs.values() {
			registered.cancellation_token.cancel();
		}
		let _ = self.shutdown_tx.send(());

		let mut handles = self.handles.lock().await;
		for handle in handles.drain(..) {
			let _ = handle.await;
		}

		info!("Job scheduler shut down");
	}

	pub fn job_ids(&self) -> Vec<String> {
		self.jobs.keys().cloned().collect()
	}

	#[instrument(skip(self))]
	pub async fn job_status(&self, job_id: &str) -> Option<JobHealthStatus> {
		let registered = self.jobs.get(job_id)?;

		let last_run = self.store.get_last_run(job_id).await.ok().flatten();
		let consecutive_failures = self
			.store
			.count_consecutive_failures(job_id)
			.await
			.unwrap_or(0);

		let status = determine_health_state(last_run.as_ref(), consecutive_failures);

		Some(JobHealthStatus {
			job_id: job_id.to_string(),
			name: registered.job.name().to_string(),
			status,
			last_run: last_run.map(Into::into),
			consecutive_failures,
		})
	}

	/// Health of every job; the overall state is the worst of them.
	#[instrument(skip(self))]
	pub async fn health_status(&self) -> JobsHealthStatus {
		let mut jobs = Vec::new();
		let mut worst_state = HealthState::Healthy;

		let mut ids = self.job_ids();
		ids.sort();
		for job_id in ids {
			if let Some(status) = self.job_status(&job_id).await {
				worst_state = worst_state.max(status.status);
				jobs.push(status);
			}
		}

		JobsHealthStatus {
			status: worst_state,
			jobs,
		}
	}
}

async fn run_job_with_retry(
	job: &Arc<dyn Job>,
	store: &Arc<dyn JobStore>,
	triggered_by: TriggerSource,
	cancellation_token: &CancellationToken,
) -> Result<String> {
	let mut retry_count = 0u32;
	let run_id = uuid::Uuid::new_v4().to_string();

	store
		.record_run_start(&JobRun {
			id: run_id.clone(),
			job_id: job.id().to_string(),
			status: JobStatus::Running,
			started_at: Utc::now(),
			completed_at: None,
			duration_ms: None,
			error_message: None,
			retry_count,
			triggered_by,
			metadata: None,
		})
		.await?;

	loop {
		let ctx = JobContext {
			run_id: run_id.clone(),
			triggered_by: if retry_count > 0 {
				TriggerSource::Retry
			} else {
				triggered_by
			},
			cancellation_token: cancellation_token.clone(),
		};

		match job.run(&ctx).await {
			Ok(output) => {
				store
					.record_run_complete(&run_id, JobStatus::Succeeded, retry_count, None, output.metadata)
					.await?;
				info!(job_id = %job.id(), run_id = %run_id, message = %output.message, "Job completed successfully");
				return Ok(run_id);
			}
			Err(JobError::Cancelled) => {
				store
					.record_run_complete(&run_id, JobStatus::Cancelled, retry_count, None, None)
					.await?;
				info!(job_id = %job.id(), run_id = %run_id, "Job cancelled");
				return Err(JobError::Cancelled);
			}
			Err(JobError::Failed { message, retryable }) => {
				if retryable && retry_count < MAX_RETRIES {
					retry_count += 1;
					let delay_secs = calculate_backoff_delay(retry_count);
					warn!(
						job_id = %job.id(),
						run_id = %run_id,
						retry_count,
						delay_secs,
						error = %message,
						"Job failed, retrying"
					);
					tokio::time::sleep(Duration::from_secs(delay_secs)).await;
					continue;
				}

				store
					.record_run_complete(
						&run_id,
						JobStatus::Failed,
						retry_count,
						Some(message.clone()),
						None,
					)
					.await?;
				warn!(job_id = %job.id(), run_id = %run_id, error = %message, "Job failed");
				return Err(JobError::Failed { message, retryable });
			}
			Err(e) => {
				let message = e.to_string();
				store
					.record_run_complete(&run_id, JobStatus::Failed, retry_count, Some(message.clone()), None)
					.await?;
				warn!(job_id = %job.id(), run_id = %run_id, error = %message, "Job failed with error");
				return Err(e);
			}
		}
	}
}

/// Job failures are logged where they happen. Anything else means the run
/// could not be recorded, so the pass was skipped or its outcome lost.
/// Returns whether a warning was emitted here.
fn report_scheduled_run(job_id: &str, result: &Result<String>) -> bool {
	match result {
		Ok(_) | Err(JobError::Failed { .. }) | Err(JobError::Cancelled) => false,
		Err(e) => {
			warn!(job_id = %job_id, error = %e, "Scheduled job run could not be recorded");
			true
		}
	}
}

pub(crate) fn calculate_backoff_delay(retry_count: u32) -> u64 {
	let delay = BASE_RETRY_DELAY_SECS as f64 * RETRY_FACTOR.powi(retry_count as i32 - 1);
	(delay as u64).min(MAX_RETRY_DELAY_SECS)
}
