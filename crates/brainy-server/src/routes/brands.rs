// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Brand endpoints. Brands inherit the owning organization's permissions.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use brainy_server_auth::{Action, Brand, BrandId, OrgId};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::ServerError;
use crate::identity::RequireUser;
use crate::routes::{authorize_org, require_org};

#[derive(Debug, Serialize)]
pub struct BrandListResponse {
	pub brands: Vec<Brand>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBrandRequest {
	pub name: String,
	#[serde(default)]
	pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BrandPermissionsResponse {
	pub brand_id: BrandId,
	pub permissions: BTreeMap<&'static str, bool>,
}

/// GET /api/orgs/{org_id}/brands
pub async fn list_brands(
	State(state): State<AppState>,
	RequireUser(current): RequireUser,
	Path(org_id): Path<OrgId>,
) -> Result<Json<BrandListResponse>, ServerError> {
	require_org(&state, &org_id).await?;
	authorize_org(&state, &current, &org_id, Action::ViewOrganization).await?;
	let brands = state.brands.list_brands_for_org(&org_id).await?;
	Ok(Json(BrandListResponse { brands }))
}

/// POST /api/orgs/{org_id}/brands
pub async fn create_brand(
	State(state): State<AppState>,
	RequireUser(current): RequireUser,
	Path(org_id): Path<OrgId>,
	Json(payload): Json<CreateBrandRequest>,
) -> Result<(StatusCode, Json<Brand>), ServerError> {
	require_org(&state, &org_id).await?;
	authorize_org(&state, &current, &org_id, Action::CreateBrand).await?;

	let name = payload.name.trim();
	if name.is_empty() {
		return Err(ServerError::BadRequest("Brand name is required".to_string()));
	}
	let description = payload
		.description
		.map(|d| d.trim().to_string())
		.filter(|d| !d.is_empty());

	let brand = Brand::new(org_id, name, description);
	state.brands.create_brand(&brand).await?;
	tracing::info!(brand_id = %brand.id, %org_id, created_by = %current.id(), "brand created");
	Ok((StatusCode::CREATED, Json(brand)))
}

/// GET /api/brands/{brand_id}/permissions
pub async fn get_brand_permissions(
	State(state): State<AppState>,
	RequireUser(current): RequireUser,
	Path(brand_id): Path<BrandId>,
) -> Json<BrandPermissionsResponse> {
	let permissions = state.gate.brand_permissions(&current.access, &brand_id).await;
	Json(BrandPermissionsResponse {
		brand_id,
		permissions,
	})
}

/// DELETE /api/brands/{brand_id}
pub async fn delete_brand(
	State(state): State<AppState>,
	RequireUser(current): RequireUser,
	Path(brand_id): Path<BrandId>,
) -> Result<StatusCode, ServerError> {
	let Some(org_id) = state.brands.get_brand_org(&brand_id).await? else {
		return Err(ServerError::NotFound(format!("Brand not found: {brand_id}")));
	};
	if !state
		.gate
		.can_brand(&current.access, &brand_id, Action::DeleteBrand)
		.await
	{
		tracing::debug!(user_id = %current.id(), %brand_id, %org_id, "brand delete denied");
		return Err(ServerError::forbidden());
	}

	if !state.brands.delete_brand(&brand_id).await? {
		return Err(ServerError::NotFound(format!("Brand not found: {brand_id}")));
	}
	tracing::info!(%brand_id, %org_id, deleted_by = %current.id(), "brand deleted");
	Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
	use axum::http::StatusCode;
	use brainy_server_auth::{BrandId, OrgRole};
	use serde_json::json;

	use crate::routes::test_support::TestApp;

	#[tokio::test]
	async fn editor_creates_but_cannot_delete_brand() {
		let app = TestApp::new().await;
		let owner = app.user("owner@example.com").await;
		let editor = app.user("editor@example.com").await;
		let org = app.org(&owner, "acme").await;
		app.state.orgs.add_member(&org.id, &editor.id, OrgRole::Editor).await.unwrap();

		let (status, brand) = app
			.send(
				"POST",
				&format!("/api/orgs/{}/brands", org.id),
				Some(editor.id),
				Some(json!({"name": "  Spring Launch ", "description": ""})),
			)
			.await;
		assert_eq!(status, StatusCode::CREATED);
		assert_eq!(brand["name"], "Spring Launch");
		assert!(brand["description"].is_null());
		let brand_id = brand["id"].as_str().unwrap().to_string();

		let (_, perms) = app
			.send("GET", &format!("/api/brands/{brand_id}/permissions"), Some(editor.id), None)
			.await;
		assert_eq!(perms["permissions"]["edit_brand"], true);
		assert_eq!(perms["permissions"]["delete_brand"], false);

		let (status, _) = app
			.send("DELETE", &format!("/api/brands/{brand_id}"), Some(editor.id), None)
			.await;
		assert_eq!(status, StatusCode::FORBIDDEN);

		let (status, _) = app
			.send("DELETE", &format!("/api/brands/{brand_id}"), Some(owner.id), None)
			.await;
		assert_eq!(status, StatusCode::NO_CONTENT);

		let (_, list) = app
			.send("GET", &format!("/api/orgs/{}/brands", org.id), Some(editor.id), None)
			.await;
		assert!(list["brands"].as_array().unwrap().is_empty());
	}

	#[tokio::test]
	async fn viewer_cannot_create_brand() {
		let app = TestApp::new().await;
		let owner = app.user("owner@example.com").await;
		let viewer = app.user("viewer@example.com").await;
		let org = app.org(&owner, "acme").await;
		app.state.orgs.add_member(&org.id, &viewer.id, OrgRole::Viewer).await.unwrap();

		let (status, _) = app
			.send(
				"POST",
				&format!("/api/orgs/{}/brands", org.id),
				Some(viewer.id),
				Some(json!({"name": "Nope"})),
			)
			.await;
		assert_eq!(status, StatusCode::FORBIDDEN);
	}

	#[tokio::test]
	async fn blank_name_is_rejected_and_missing_brand_is_not_found() {
		let app = TestApp::new().await;
		let owner = app.user("owner@example.com").await;
		let org = app.org(&owner, "acme").await;

		let (status, _) = app
			.send(
				"POST",
				&format!("/api/orgs/{}/brands", org.id),
				Some(owner.id),
				Some(json!({"name": "   "})),
			)
			.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);

		let (status, _) = app
			.send("DELETE", &format!("/api/brands/{}", BrandId::generate()), Some(owner.id), None)
			.await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}
}
