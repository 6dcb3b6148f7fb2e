// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for identity and authorization.
//!
//! - **ID newtypes**: Type-safe wrappers around UUIDs for each entity
//!   ([`UserId`], [`OrgId`], [`BrandId`], ...) so they cannot be mixed up
//! - **Role enums**: closed sets for global ([`GlobalRole`]) and organization
//!   ([`OrgRole`]) scopes, stored as lowercase strings
//!
//! All ID types serialize transparently as UUID strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Uuid::parse_str(s).map(Self)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(UserId, "Unique identifier for a user.");
define_id_type!(OrgId, "Unique identifier for an organization.");
define_id_type!(BrandId, "Unique identifier for a brand.");
define_id_type!(NotificationId, "Unique identifier for a notification.");
define_id_type!(ContentItemId, "Unique identifier for a content item.");

/// A stored or submitted role string that is not one of the known roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {scope} role: {value}")]
pub struct RoleParseError {
	pub scope: &'static str,
	pub value: String,
}

// =============================================================================
// Global Roles
// =============================================================================

/// Organization-independent roles. Absence of a row means [`GlobalRole::User`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalRole {
	/// Unconditionally allowed every action.
	Admin,
	/// Reserved for content moderation tooling; no access override.
	Moderator,
	/// Default role.
	#[default]
	User,
}

impl GlobalRole {
	/// Returns all available global roles.
	pub fn all() -> &'static [GlobalRole] {
		&[GlobalRole::Admin, GlobalRole::Moderator, GlobalRole::User]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			GlobalRole::Admin => "admin",
			GlobalRole::Moderator => "moderator",
			GlobalRole::User => "user",
		}
	}
}

impl fmt::Display for GlobalRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for GlobalRole {
	type Err = RoleParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"admin" => Ok(GlobalRole::Admin),
			"moderator" => Ok(GlobalRole::Moderator),
			"user" => Ok(GlobalRole::User),
			_ => Err(RoleParseError {
				scope: "global",
				value: s.to_string(),
			}),
		}
	}
}

// =============================================================================
// Organization Roles
// =============================================================================

/// Roles within an organization. Brands inherit these; they have no ACL of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgRole {
	/// Full control, including deleting the organization.
	Owner,
	/// Manage settings, members and brands; cannot delete the organization.
	Admin,
	/// Create and edit brands and content.
	Editor,
	/// Read-only access.
	Viewer,
	/// Plain membership without elevated capabilities.
	Member,
}

impl OrgRole {
	/// Returns all available organization roles.
	pub fn all() -> &'static [OrgRole] {
		&[
			OrgRole::Owner,
			OrgRole::Admin,
			OrgRole::Editor,
			OrgRole::Viewer,
			OrgRole::Member,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			OrgRole::Owner => "owner",
			OrgRole::Admin => "admin",
			OrgRole::Editor => "editor",
			OrgRole::Viewer => "viewer",
			OrgRole::Member => "member",
		}
	}
}

impl fmt::Display for OrgRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for OrgRole {
	type Err = RoleParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"owner" => Ok(OrgRole::Owner),
			"admin" => Ok(OrgRole::Admin),
			"editor" => Ok(OrgRole::Editor),
			"viewer" => Ok(OrgRole::Viewer),
			"member" => Ok(OrgRole::Member),
			_ => Err(RoleParseError {
				scope: "organization",
				value: s.to_string(),
			}),
		}
	}
}
