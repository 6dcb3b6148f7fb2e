// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Current-user extraction.
//!
//! An upstream identity gateway authenticates the session and forwards the
//! user id in a configured header. This module only turns that header into a
//! known [`User`] plus its [`AccessContext`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use brainy_server_auth::{User, UserId};
use tracing::instrument;

use crate::api::AppState;
use crate::authz::AccessContext;
use crate::error::ServerError;

/// Authenticated user for the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
	pub user: User,
	pub access: AccessContext,
}

impl CurrentUser {
	pub fn id(&self) -> UserId {
		self.user.id
	}
}

/// Extractor that rejects the request with 401 unless the identity header
/// names an existing user.
///
/// ```ignore
/// async fn handler(RequireUser(current): RequireUser) -> impl IntoResponse {
///     current.user.display_name().to_string()
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

impl FromRequestParts<AppState> for RequireUser {
	type Rejection = ServerError;

	#[instrument(name = "RequireUser::from_request_parts", skip_all)]
	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let Some(raw) = parts
			.headers
			.get(state.user_header.as_str())
			.and_then(|v| v.to_str().ok())
		else {
			tracing::debug!("identity header missing");
			return Err(unauthorized());
		};

		let Ok(user_id) = raw.trim().parse::<UserId>() else {
			tracing::debug!("identity header is not a user id");
			return Err(unauthorized());
		};

		let Some(user) = state.users.get_user_by_id(&user_id).await? else {
			tracing::debug!(%user_id, "identity header names an unknown user");
			return Err(unauthorized());
		};

		let access = AccessContext::load(state.users.as_ref(), user.id).await;
		tracing::debug!(%user_id, is_global_admin = access.is_global_admin, "request authenticated");
		Ok(RequireUser(CurrentUser { user, access }))
	}
}

fn unauthorized() -> ServerError {
	ServerError::Unauthorized("Authentication required".to_string())
}
