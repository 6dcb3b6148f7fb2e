// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::Json;
use brainy_server_auth::UserId;
use serde::Serialize;

use crate::identity::RequireUser;

#[derive(Debug, Serialize)]
pub struct MeResponse {
	pub id: UserId,
	pub email: String,
	pub full_name: Option<String>,
	pub display_name: String,
	pub is_global_admin: bool,
}

/// GET /api/me
pub async fn get_me(RequireUser(current): RequireUser) -> Json<MeResponse> {
	let display_name = current.user.display_name().to_string();
	Json(MeResponse {
		id: current.user.id,
		email: current.user.email,
		full_name: current.user.full_name,
		display_name,
		is_global_admin: current.access.is_global_admin,
	})
}
