// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Organization-level read endpoints.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::Json;
use brainy_server_auth::{Action, OrgId, OrgRole, Organization, TrialStatus};
use serde::Serialize;

use crate::api::AppState;
use crate::error::ServerError;
use crate::identity::RequireUser;
use crate::routes::{authorize_org, require_org};

#[derive(Debug, Serialize)]
pub struct OrgListResponse {
	pub organizations: Vec<Organization>,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
	pub org_id: OrgId,
	pub role: Option<OrgRole>,
	pub is_global_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
	pub permissions: BTreeMap<&'static str, bool>,
}

/// GET /api/orgs
pub async fn list_orgs(
	State(state): State<AppState>,
	RequireUser(current): RequireUser,
) -> Result<Json<OrgListResponse>, ServerError> {
	let organizations = state.orgs.list_orgs_for_user(&current.id()).await?;
	Ok(Json(OrgListResponse { organizations }))
}

/// GET /api/orgs/{org_id}/role
///
/// `role` is null when the user has no access or the lookup failed.
pub async fn get_role(
	State(state): State<AppState>,
	RequireUser(current): RequireUser,
	Path(org_id): Path<OrgId>,
) -> Json<RoleResponse> {
	let role = state.resolver().resolve_org_role(&current.id(), &org_id).await;
	Json(RoleResponse {
		org_id,
		role,
		is_global_admin: current.access.is_global_admin,
	})
}

/// GET /api/orgs/{org_id}/permissions
pub async fn get_permissions(
	State(state): State<AppState>,
	RequireUser(current): RequireUser,
	Path(org_id): Path<OrgId>,
) -> Json<PermissionsResponse> {
	let permissions = state.gate.org_permissions(&current.access, &org_id).await;
	Json(PermissionsResponse { permissions })
}

/// GET /api/orgs/{org_id}/trial
pub async fn get_trial(
	State(state): State<AppState>,
	RequireUser(current): RequireUser,
	Path(org_id): Path<OrgId>,
) -> Result<Json<TrialStatus>, ServerError> {
	require_org(&state, &org_id).await?;
	authorize_org(&state, &current, &org_id, Action::ViewOrganization).await?;
	Ok(Json(state.trial.resolve(&org_id).await))
}
