// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Health check handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use brainy_server_jobs::{HealthState, JobsHealthStatus};
use serde::Serialize;
use tokio::time::Instant;

use crate::api::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
	Healthy,
	Degraded,
	Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
	pub status: HealthStatus,
	pub latency_ms: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: HealthStatus,
	pub timestamp: String,
	pub version: &'static str,
	pub database: DatabaseHealth,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub jobs: Option<JobsHealthStatus>,
}

/// GET /health - database ping plus background job health.
///
/// A failing database is unhealthy (503). Unhealthy jobs only degrade the
/// service since requests are still served.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let database = check_database(&state).await;
	let jobs = match &state.job_scheduler {
		Some(scheduler) => Some(scheduler.health_status().await),
		None => None,
	};

	let status = aggregate_status(&database, jobs.as_ref());
	let http_status = match status {
		HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
		HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
	};

	let response = HealthResponse {
		status,
		timestamp: chrono::Utc::now().to_rfc3339(),
		version: env!("CARGO_PKG_VERSION"),
		database,
		jobs,
	};
	(http_status, Json(response))
}

async fn check_database(state: &AppState) -> DatabaseHealth {
	let start = Instant::now();
	let result = sqlx::query("SELECT 1").execute(&state.pool).await;
	let latency_ms = start.elapsed().as_millis() as u64;
	match result {
		Ok(_) => DatabaseHealth {
			status: HealthStatus::Healthy,
			latency_ms,
			error: None,
		},
		Err(e) => {
			tracing::warn!(error = %e, "database health check failed");
			DatabaseHealth {
				status: HealthStatus::Unhealthy,
				latency_ms,
				error: Some(e.to_string()),
			}
		}
	}
}

fn aggregate_status(database: &DatabaseHealth, jobs: Option<&JobsHealthStatus>) -> HealthStatus {
	if database.status == HealthStatus::Unhealthy {
		return HealthStatus::Unhealthy;
	}
	match jobs.map(|j| j.status) {
		Some(HealthState::Degraded) | Some(HealthState::Unhealthy) => HealthStatus::Degraded,
		_ => HealthStatus::Healthy,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::routes::test_support::TestApp;

	#[tokio::test]
	async fn healthy_database_reports_ok() {
		let app = TestApp::new().await;
		let (status, body) = app.send("GET", "/health", None, None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "healthy");
		assert_eq!(body["database"]["status"], "healthy");
		assert!(body.get("jobs").is_none());
	}

	#[tokio::test]
	async fn closed_database_is_unavailable() {
		let app = TestApp::new().await;
		app.state.pool.close().await;
		let (status, body) = app.send("GET", "/health", None, None).await;
		assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
		assert_eq!(body["status"], "unhealthy");
		assert!(body["database"]["error"].is_string());
	}

	#[test]
	fn failing_jobs_degrade() {
		let db = DatabaseHealth {
			status: HealthStatus::Healthy,
			latency_ms: 1,
			error: None,
		};
		let jobs = JobsHealthStatus {
			status: HealthState::Unhealthy,
			jobs: Vec::new(),
		};
		assert_eq!(aggregate_status(&db, Some(&jobs)), HealthStatus::Degraded);
		assert_eq!(aggregate_status(&db, None), HealthStatus::Healthy);
	}
}
