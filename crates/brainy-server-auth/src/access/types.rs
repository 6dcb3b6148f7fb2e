// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subject and action types for permission evaluation.

use serde::{Deserialize, Serialize};

use crate::{OrgRole, UserId};

/// Attributes describing the user requesting access, already resolved
/// against one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectAttrs {
	pub user_id: UserId,
	pub is_global_admin: bool,
	/// Effective role in the target organization, `None` when the user has
	/// no access.
	pub org_role: Option<OrgRole>,
}

impl SubjectAttrs {
	/// Creates a subject with no global override and no organization role.
	pub fn new(user_id: UserId) -> Self {
		Self {
			user_id,
			is_global_admin: false,
			org_role: None,
		}
	}

	pub fn with_global_admin(mut self, is_global_admin: bool) -> Self {
		self.is_global_admin = is_global_admin;
		self
	}

	pub fn with_org_role(mut self, role: OrgRole) -> Self {
		self.org_role = Some(role);
		self
	}
}

/// Which kind of resource an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
	Organization,
	Brand,
}

/// Gated operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
	ViewOrganization,
	EditOrganization,
	DeleteOrganization,
	ManageMembers,
	CreateBrand,
	ViewBrand,
	EditBrand,
	DeleteBrand,
}

impl Action {
	pub fn all() -> &'static [Action] {
		&[
			Action::ViewOrganization,
			Action::EditOrganization,
			Action::DeleteOrganization,
			Action::ManageMembers,
			Action::CreateBrand,
			Action::ViewBrand,
			Action::EditBrand,
			Action::DeleteBrand,
		]
	}

	/// Creating a brand is checked against the parent organization, so it is
	/// an organization action.
	pub fn resource_kind(&self) -> ResourceKind {
		match self {
			Action::ViewOrganization
			| Action::EditOrganization
			| Action::DeleteOrganization
			| Action::ManageMembers
			| Action::CreateBrand => ResourceKind::Organization,
			Action::ViewBrand | Action::EditBrand | Action::DeleteBrand => ResourceKind::Brand,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Action::ViewOrganization => "view_organization",
			Action::EditOrganization => "edit_organization",
			Action::DeleteOrganization => "delete_organization",
			Action::ManageMembers => "manage_members",
			Action::CreateBrand => "create_brand",
			Action::ViewBrand => "view_brand",
			Action::EditBrand => "edit_brand",
			Action::DeleteBrand => "delete_brand",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn brand_actions_target_brands() {
		for action in Action::all() {
			let expected = matches!(
				action,
				Action::ViewBrand | Action::EditBrand | Action::DeleteBrand
			);
			assert_eq!(action.resource_kind() == ResourceKind::Brand, expected, "{action:?}");
		}
	}

	#[test]
	fn action_serializes_as_snake_case() {
		let json = serde_json::to_string(&Action::ManageMembers).unwrap();
		assert_eq!(json, "\"manage_members\"");
		for action in Action::all() {
			assert_eq!(
				serde_json::to_string(action).unwrap(),
				format!("\"{}\"", action.as_str())
			);
		}
	}
}
