// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notification fan-out configuration.

use serde::Deserialize;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct NotificationsConfigLayer {
	pub channel_capacity: Option<usize>,
}

impl NotificationsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.channel_capacity.is_some() {
			self.channel_capacity = other.channel_capacity;
		}
	}

	pub fn finalize(self) -> NotificationsConfig {
		NotificationsConfig {
			channel_capacity: self.channel_capacity.unwrap_or(DEFAULT_CHANNEL_CAPACITY),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationsConfig {
	/// Broadcast buffer size. Slow subscribers past this lag and skip.
	pub channel_capacity: usize,
}

impl Default for NotificationsConfig {
	fn default() -> Self {
		Self {
			channel_capacity: DEFAULT_CHANNEL_CAPACITY,
		}
	}
}
