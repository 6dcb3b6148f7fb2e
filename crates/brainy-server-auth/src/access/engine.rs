// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permission evaluation.
//!
//! [`is_allowed`] is the single decision point. Global admins short-circuit
//! to allowed; everyone else is checked against a static per-action
//! allow-list of organization roles.

use super::types::{Action, SubjectAttrs};
use crate::OrgRole;
use tracing::instrument;

const ALL_ROLES: &[OrgRole] = &[
	OrgRole::Owner,
	OrgRole::Admin,
	OrgRole::Editor,
	OrgRole::Viewer,
	OrgRole::Member,
];
const OWNER_ONLY: &[OrgRole] = &[OrgRole::Owner];
const OWNER_ADMIN: &[OrgRole] = &[OrgRole::Owner, OrgRole::Admin];
const OWNER_ADMIN_EDITOR: &[OrgRole] = &[OrgRole::Owner, OrgRole::Admin, OrgRole::Editor];

/// Roles permitted to perform `action`.
pub fn allowed_roles(action: Action) -> &'static [OrgRole] {
	match action {
		Action::ViewOrganization | Action::ViewBrand => ALL_ROLES,
		Action::EditOrganization => OWNER_ADMIN,
		Action::DeleteOrganization => OWNER_ONLY,
		Action::ManageMembers => OWNER_ADMIN,
		Action::CreateBrand => OWNER_ADMIN_EDITOR,
		Action::EditBrand => OWNER_ADMIN_EDITOR,
		Action::DeleteBrand => OWNER_ADMIN,
	}
}

/// Evaluates whether a subject is allowed to perform an action.
///
/// Returns `true` for global admins regardless of role. Otherwise the
/// subject's effective organization role must appear in
/// [`allowed_roles`]; a subject without a role is always denied.
#[instrument(
	level = "debug",
	skip(subject),
	fields(
		user_id = %subject.user_id,
		action = ?action,
		org_role = ?subject.org_role,
	)
)]
pub fn is_allowed(subject: &SubjectAttrs, action: Action) -> bool {
	if subject.is_global_admin {
		return true;
	}

	match subject.org_role {
		Some(role) => allowed_roles(action).contains(&role),
		None => false,
	}
}
