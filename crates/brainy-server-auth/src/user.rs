// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User entity as seen by the access layer.
//!
//! Users are created by the identity provider at signup; this service only
//! reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// An authenticated person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	pub id: UserId,
	pub email: String,
	pub full_name: Option<String>,
	pub created_at: DateTime<Utc>,
}

impl User {
	pub fn new(email: impl Into<String>, full_name: Option<String>) -> Self {
		Self {
			id: UserId::generate(),
			email: email.into(),
			full_name,
			created_at: Utc::now(),
		}
	}

	/// Name to show in notifications and member lists.
	pub fn display_name(&self) -> &str {
		self.full_name.as_deref().unwrap_or(&self.email)
	}
}
