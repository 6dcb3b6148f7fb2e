// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication configuration section.
//!
//! Brainy does not authenticate users itself. An upstream identity gateway
//! verifies the session and forwards the user id in a request header.

use serde::Deserialize;

pub const DEFAULT_USER_HEADER: &str = "x-brainy-user-id";

#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// Header carrying the authenticated user id. Always lowercase.
	pub user_header: String,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			user_header: DEFAULT_USER_HEADER.to_string(),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub user_header: Option<String>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.user_header.is_some() {
			self.user_header = other.user_header;
		}
	}

	pub fn finalize(self) -> AuthConfig {
		AuthConfig {
			user_header: self
				.user_header
				.map(|h| h.trim().to_ascii_lowercase())
				.filter(|h| !h.is_empty())
				.unwrap_or_else(|| DEFAULT_USER_HEADER.to_string()),
		}
	}
}
