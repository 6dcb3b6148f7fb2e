// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for Brainy server.
//!
//! This crate provides:
//! - Layered configuration from defaults, a TOML file and the environment
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`BRAINY_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use brainy_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub auth: AuthConfig,
	pub logging: LoggingConfig,
	pub watcher: WatcherConfig,
	pub jobs: JobsConfig,
	pub notifications: NotificationsConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`BRAINY_SERVER_*`)
/// 2. Config file (`/etc/brainy/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Merge the given sources in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		http: layer.http.unwrap_or_default().finalize(),
		database: layer.database.unwrap_or_default().finalize(),
		auth: layer.auth.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
		watcher: layer.watcher.unwrap_or_default().finalize(),
		jobs: layer.jobs.unwrap_or_default().finalize(),
		notifications: layer.notifications.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		user_header = %config.auth.user_header,
		watcher_enabled = config.watcher.enabled,
		watcher_interval_secs = config.watcher.interval_secs,
		lookahead_minutes = config.watcher.lookahead_minutes,
		"Server configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	if config.watcher.interval_secs == 0 {
		return Err(ConfigError::Validation(
			"watcher.interval_secs must be greater than zero".to_string(),
		));
	}
	if config.watcher.lookahead_minutes == 0 {
		return Err(ConfigError::Validation(
			"watcher.lookahead_minutes must be greater than zero".to_string(),
		));
	}
	if config.jobs.history_cleanup_interval_secs == 0 {
		return Err(ConfigError::Validation(
			"jobs.history_cleanup_interval_secs must be greater than zero".to_string(),
		));
	}
	if config.notifications.channel_capacity == 0 {
		return Err(ConfigError::Validation(
			"notifications.channel_capacity must be greater than zero".to_string(),
		));
	}

	Ok(())
}
