// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scheduled-content watcher configuration section.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_INTERVAL_SECS: u64 = 300;
const DEFAULT_LOOKAHEAD_MINUTES: u32 = 30;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct WatcherConfigLayer {
	pub enabled: Option<bool>,
	pub interval_secs: Option<u64>,
	pub lookahead_minutes: Option<u32>,
}

impl WatcherConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.interval_secs.is_some() {
			self.interval_secs = other.interval_secs;
		}
		if other.lookahead_minutes.is_some() {
			self.lookahead_minutes = other.lookahead_minutes;
		}
	}

	pub fn finalize(self) -> WatcherConfig {
		WatcherConfig {
			enabled: self.enabled.unwrap_or(true),
			interval_secs: self.interval_secs.unwrap_or(DEFAULT_INTERVAL_SECS),
			lookahead_minutes: self.lookahead_minutes.unwrap_or(DEFAULT_LOOKAHEAD_MINUTES),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatcherConfig {
	pub enabled: bool,
	pub interval_secs: u64,
	/// Window ahead of "now" in which scheduled items trigger a reminder.
	pub lookahead_minutes: u32,
}

impl WatcherConfig {
	pub fn interval(&self) -> Duration {
		Duration::from_secs(self.interval_secs)
	}
}

impl Default for WatcherConfig {
	fn default() -> Self {
		WatcherConfigLayer::default().finalize()
	}
}
