// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Brainy server binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use brainy_server::jobs::{JobHistoryCleanupJob, ScheduledContentJob};
use brainy_server::{create_app_state, create_router};
use brainy_server_db::{ContentRepository, JobRepository};
use brainy_server_jobs::JobScheduler;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Brainy server - access control and notifications for Brainy.
#[derive(Parser, Debug)]
#[command(name = "brainy-server", about = "Brainy server", version)]
struct Args {
	/// Path to a TOML config file (default: /etc/brainy/server.toml)
	#[arg(long, env = "BRAINY_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version information
	Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("brainy-server version: {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => brainy_server_config::load_config_with_file(path)?,
		None => brainy_server_config::load_config()?,
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting brainy-server"
	);

	let pool = brainy_server_db::create_pool(&config.database.url).await?;
	brainy_server_db::run_migrations(&pool).await?;

	let mut state = create_app_state(pool.clone(), &config);

	let job_repo = Arc::new(JobRepository::new(pool.clone()));
	let mut scheduler = JobScheduler::new(job_repo.clone());

	if config.watcher.enabled {
		scheduler.register_periodic(
			Arc::new(ScheduledContentJob::new(
				Arc::new(ContentRepository::new(pool.clone())),
				Arc::new(state.emitter.clone()),
				config.watcher.lookahead_minutes,
			)),
			config.watcher.interval(),
		);
		tracing::info!(
			interval_secs = config.watcher.interval_secs,
			lookahead_minutes = config.watcher.lookahead_minutes,
			"Registered scheduled content watcher"
		);
	}

	scheduler.register_periodic(
		Arc::new(JobHistoryCleanupJob::new(
			job_repo,
			config.jobs.history_retention_days,
		)),
		Duration::from_secs(config.jobs.history_cleanup_interval_secs),
	);

	let scheduler = Arc::new(scheduler);
	state.job_scheduler = Some(Arc::clone(&scheduler));

	if let Err(e) = scheduler.start().await {
		tracing::error!(error = %e, "Failed to start job scheduler");
	}

	let app = create_router(state);

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);
	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
			tracing::info!("Shutting down job scheduler...");
			scheduler.shutdown().await;
		}
	}

	tracing::info!("Server shutdown complete");
	Ok(())
}
