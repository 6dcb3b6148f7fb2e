// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AuthConfigLayer, DatabaseConfigLayer, HttpConfigLayer, JobsConfigLayer, LoggingConfigLayer,
	NotificationsConfigLayer, WatcherConfigLayer,
};

pub const SYSTEM_CONFIG_PATH: &str = "/etc/brainy/server.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: BRAINY_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_from_lookup(|name| std::env::var(name).ok())
	}
}

/// Builds a layer from an arbitrary variable lookup so tests need not touch
/// the process environment.
pub(crate) fn load_from_lookup<F>(lookup: F) -> Result<ServerConfigLayer, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	let env = EnvReader { lookup };
	Ok(ServerConfigLayer {
		http: Some(HttpConfigLayer {
			host: env.var("BRAINY_SERVER_HOST"),
			port: env.parse("BRAINY_SERVER_PORT")?,
		}),
		database: Some(DatabaseConfigLayer {
			url: env.var("BRAINY_SERVER_DATABASE_URL"),
		}),
		auth: Some(AuthConfigLayer {
			user_header: env.var("BRAINY_SERVER_AUTH_USER_HEADER"),
		}),
		logging: Some(LoggingConfigLayer {
			level: env.var("BRAINY_SERVER_LOG_LEVEL"),
		}),
		watcher: Some(WatcherConfigLayer {
			enabled: env.bool("BRAINY_SERVER_WATCHER_ENABLED"),
			interval_secs: env.parse("BRAINY_SERVER_WATCHER_INTERVAL_SECS")?,
			lookahead_minutes: env.parse("BRAINY_SERVER_WATCHER_LOOKAHEAD_MINUTES")?,
		}),
		jobs: Some(JobsConfigLayer {
			history_retention_days: env.parse("BRAINY_SERVER_JOB_HISTORY_RETENTION_DAYS")?,
			history_cleanup_interval_secs: env
				.parse("BRAINY_SERVER_JOB_HISTORY_CLEANUP_INTERVAL_SECS")?,
		}),
		notifications: Some(NotificationsConfigLayer {
			channel_capacity: env.parse("BRAINY_SERVER_NOTIFICATION_CHANNEL_CAPACITY")?,
		}),
	})
}

struct EnvReader<F> {
	lookup: F,
}

impl<F> EnvReader<F>
where
	F: Fn(&str) -> Option<String>,
{
	fn var(&self, name: &str) -> Option<String> {
		(self.lookup)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Option<bool> {
		self.var(name)
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn parse<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, ConfigError> {
		match self.var(name) {
			Some(v) => v
				.trim()
				.parse()
				.map(Some)
				.map_err(|_| ConfigError::InvalidValue {
					key: name.to_string(),
					message: format!("invalid {} value '{v}'", std::any::type_name::<T>()),
				}),
			None => Ok(None),
		}
	}
}
