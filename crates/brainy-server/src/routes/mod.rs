// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP route handlers.

pub mod brands;
pub mod health;
pub mod me;
pub mod members;
pub mod notifications;
pub mod orgs;

use brainy_server_auth::{Action, OrgId, Organization};

use crate::api::AppState;
use crate::error::ServerError;
use crate::identity::CurrentUser;

/// Loads the organization or answers 404.
pub(crate) async fn require_org(
	state: &AppState,
	org_id: &OrgId,
) -> Result<Organization, ServerError> {
	state
		.orgs
		.get_org_by_id(org_id)
		.await?
		.ok_or_else(|| ServerError::NotFound(format!("Organization not found: {org_id}")))
}

/// Answers 403 unless the gate allows `action`. Store failures also deny.
pub(crate) async fn authorize_org(
	state: &AppState,
	current: &CurrentUser,
	org_id: &OrgId,
	action: Action,
) -> Result<(), ServerError> {
	if state.gate.can_org(&current.access, org_id, action).await {
		Ok(())
	} else {
		tracing::debug!(user_id = %current.id(), %org_id, action = action.as_str(), "permission denied");
		Err(ServerError::forbidden())
	}
}
