// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Organization membership endpoints.
//!
//! The owner is fixed by `organizations.owner_id`: the owner role cannot be
//! granted here, and the owner's own membership cannot be changed or removed.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use brainy_server_auth::{Action, OrgId, OrgRole, Organization, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::ServerError;
use crate::identity::RequireUser;
use crate::routes::{authorize_org, require_org};

#[derive(Debug, Serialize)]
pub struct MemberResponse {
	pub user_id: UserId,
	pub email: String,
	pub display_name: String,
	pub role: OrgRole,
	pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MemberListResponse {
	pub members: Vec<MemberResponse>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
	pub user_id: UserId,
	pub role: OrgRole,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
	pub role: OrgRole,
}

fn reject_owner_grant(role: OrgRole) -> Result<(), ServerError> {
	if role == OrgRole::Owner {
		return Err(ServerError::BadRequest(
			"The owner role cannot be assigned to members".to_string(),
		));
	}
	Ok(())
}

fn reject_owner_target(org: &Organization, user_id: &UserId) -> Result<(), ServerError> {
	if org.is_owned_by(*user_id) {
		return Err(ServerError::Conflict(
			"The organization owner's membership cannot be changed".to_string(),
		));
	}
	Ok(())
}

/// GET /api/orgs/{org_id}/members
pub async fn list_members(
	State(state): State<AppState>,
	RequireUser(current): RequireUser,
	Path(org_id): Path<OrgId>,
) -> Result<Json<MemberListResponse>, ServerError> {
	require_org(&state, &org_id).await?;
	authorize_org(&state, &current, &org_id, Action::ViewOrganization).await?;

	let members = state
		.orgs
		.list_members(&org_id)
		.await?
		.into_iter()
		.map(|(membership, user)| MemberResponse {
			user_id: user.id,
			display_name: user.display_name().to_string(),
			email: user.email,
			role: membership.role,
			joined_at: membership.created_at,
		})
		.collect();
	Ok(Json(MemberListResponse { members }))
}

/// POST /api/orgs/{org_id}/members
pub async fn add_member(
	State(state): State<AppState>,
	RequireUser(current): RequireUser,
	Path(org_id): Path<OrgId>,
	Json(payload): Json<AddMemberRequest>,
) -> Result<StatusCode, ServerError> {
	require_org(&state, &org_id).await?;
	authorize_org(&state, &current, &org_id, Action::ManageMembers).await?;
	reject_owner_grant(payload.role)?;

	if state.users.get_user_by_id(&payload.user_id).await?.is_none() {
		return Err(ServerError::NotFound(format!(
			"User not found: {}",
			payload.user_id
		)));
	}

	state
		.orgs
		.add_member(&org_id, &payload.user_id, payload.role)
		.await?;
	tracing::info!(%org_id, user_id = %payload.user_id, role = payload.role.as_str(), added_by = %current.id(), "member added");
	Ok(StatusCode::CREATED)
}

/// PATCH /api/orgs/{org_id}/members/{user_id}
pub async fn update_member(
	State(state): State<AppState>,
	RequireUser(current): RequireUser,
	Path((org_id, user_id)): Path<(OrgId, UserId)>,
	Json(payload): Json<UpdateMemberRequest>,
) -> Result<StatusCode, ServerError> {
	let org = require_org(&state, &org_id).await?;
	authorize_org(&state, &current, &org_id, Action::ManageMembers).await?;
	reject_owner_target(&org, &user_id)?;
	reject_owner_grant(payload.role)?;

	state
		.orgs
		.update_member_role(&org_id, &user_id, payload.role)
		.await?;
	tracing::info!(%org_id, %user_id, role = payload.role.as_str(), updated_by = %current.id(), "member role updated");
	Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/orgs/{org_id}/members/{user_id}
pub async fn remove_member(
	State(state): State<AppState>,
	RequireUser(current): RequireUser,
	Path((org_id, user_id)): Path<(OrgId, UserId)>,
) -> Result<StatusCode, ServerError> {
	let org = require_org(&state, &org_id).await?;
	authorize_org(&state, &current, &org_id, Action::ManageMembers).await?;
	reject_owner_target(&org, &user_id)?;

	if !state.orgs.remove_member(&org_id, &user_id).await? {
		return Err(ServerError::NotFound(format!("Member not found: {user_id}")));
	}
	tracing::info!(%org_id, %user_id, removed_by = %current.id(), "member removed");
	Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
	use axum::http::StatusCode;
	use brainy_server_auth::OrgRole;
	use serde_json::json;

	use crate::routes::test_support::TestApp;

	#[tokio::test]
	async fn admin_manages_members() {
		let app = TestApp::new().await;
		let owner = app.user("owner@example.com").await;
		let admin = app.user("admin@example.com").await;
		let newbie = app.user("new@example.com").await;
		let org = app.org(&owner, "acme").await;
		app.state.orgs.add_member(&org.id, &admin.id, OrgRole::Admin).await.unwrap();
		let base = format!("/api/orgs/{}/members", org.id);

		let (status, _) = app
			.send("POST", &base, Some(admin.id), Some(json!({"user_id": newbie.id, "role": "viewer"})))
			.await;
		assert_eq!(status, StatusCode::CREATED);

		let (status, _) = app
			.send("POST", &base, Some(admin.id), Some(json!({"user_id": newbie.id, "role": "viewer"})))
			.await;
		assert_eq!(status, StatusCode::CONFLICT);

		let (status, _) = app
			.send(
				"PATCH",
				&format!("{base}/{}", newbie.id),
				Some(admin.id),
				Some(json!({"role": "editor"})),
			)
			.await;
		assert_eq!(status, StatusCode::NO_CONTENT);

		let (status, body) = app.send("GET", &base, Some(newbie.id), None).await;
		assert_eq!(status, StatusCode::OK);
		let members = body["members"].as_array().unwrap();
		assert_eq!(members.len(), 3);
		assert!(members
			.iter()
			.any(|m| m["email"] == "new@example.com" && m["role"] == "editor"));

		let (status, _) = app
			.send("DELETE", &format!("{base}/{}", newbie.id), Some(admin.id), None)
			.await;
		assert_eq!(status, StatusCode::NO_CONTENT);

		let (status, _) = app
			.send("DELETE", &format!("{base}/{}", newbie.id), Some(admin.id), None)
			.await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn editor_cannot_manage_members() {
		let app = TestApp::new().await;
		let owner = app.user("owner@example.com").await;
		let editor = app.user("editor@example.com").await;
		let other = app.user("other@example.com").await;
		let org = app.org(&owner, "acme").await;
		app.state.orgs.add_member(&org.id, &editor.id, OrgRole::Editor).await.unwrap();

		let (status, body) = app
			.send(
				"POST",
				&format!("/api/orgs/{}/members", org.id),
				Some(editor.id),
				Some(json!({"user_id": other.id, "role": "viewer"})),
			)
			.await;
		assert_eq!(status, StatusCode::FORBIDDEN);
		assert_eq!(body["error"], "forbidden");
	}

	#[tokio::test]
	async fn owner_membership_is_protected() {
		let app = TestApp::new().await;
		let owner = app.user("owner@example.com").await;
		let admin = app.user("admin@example.com").await;
		let org = app.org(&owner, "acme").await;
		app.state.orgs.add_member(&org.id, &admin.id, OrgRole::Admin).await.unwrap();
		let owner_path = format!("/api/orgs/{}/members/{}", org.id, owner.id);

		let (status, _) = app.send("DELETE", &owner_path, Some(admin.id), None).await;
		assert_eq!(status, StatusCode::CONFLICT);

		let (status, _) = app
			.send("PATCH", &owner_path, Some(admin.id), Some(json!({"role": "viewer"})))
			.await;
		assert_eq!(status, StatusCode::CONFLICT);

		let (status, _) = app
			.send(
				"PATCH",
				&format!("/api/orgs/{}/members/{}", org.id, admin.id),
				Some(owner.id),
				Some(json!({"role": "owner"})),
			)
			.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn unknown_user_and_org_are_not_found() {
		let app = TestApp::new().await;
		let owner = app.user("owner@example.com").await;
		let org = app.org(&owner, "acme").await;

		let (status, _) = app
			.send(
				"POST",
				&format!("/api/orgs/{}/members", org.id),
				Some(owner.id),
				Some(json!({"user_id": brainy_server_auth::UserId::generate(), "role": "viewer"})),
			)
			.await;
		assert_eq!(status, StatusCode::NOT_FOUND);

		let (status, _) = app
			.send(
				"GET",
				&format!("/api/orgs/{}/members", brainy_server_auth::OrgId::generate()),
				Some(owner.id),
				None,
			)
			.await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}
}
