// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use brainy_server_db::DbError;
use brainy_server_notifications::NotifyError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("Database error: {0}")]
	Db(#[from] DbError),

	#[error("Notification error: {0}")]
	Notify(#[from] NotifyError),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Invalid request: {0}")]
	BadRequest(String),

	#[error("Unauthorized: {0}")]
	Unauthorized(String),

	#[error("Forbidden: {0}")]
	Forbidden(String),

	#[error("Internal error: {0}")]
	Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

impl ErrorResponse {
	fn new(error: &str, message: impl Into<String>) -> Self {
		Self {
			error: error.to_string(),
			message: message.into(),
		}
	}
}

impl ServerError {
	pub fn forbidden() -> Self {
		ServerError::Forbidden("You do not have permission to perform this action".to_string())
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, body) = match self {
			ServerError::Db(DbError::NotFound(what)) => {
				(StatusCode::NOT_FOUND, ErrorResponse::new("not_found", what))
			}
			ServerError::Db(DbError::Conflict(what)) => {
				(StatusCode::CONFLICT, ErrorResponse::new("conflict", what))
			}
			ServerError::Db(e) => {
				tracing::error!(error = %e, "database error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse::new("database_error", "A database error occurred"),
				)
			}
			ServerError::Notify(NotifyError::InvalidInput(msg)) => {
				(StatusCode::BAD_REQUEST, ErrorResponse::new("bad_request", msg))
			}
			ServerError::Notify(e) => {
				tracing::error!(error = %e, "notification error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse::new("internal_error", "An internal error occurred"),
				)
			}
			ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new("not_found", msg)),
			ServerError::Conflict(msg) => (StatusCode::CONFLICT, ErrorResponse::new("conflict", msg)),
			ServerError::BadRequest(msg) => {
				(StatusCode::BAD_REQUEST, ErrorResponse::new("bad_request", msg))
			}
			ServerError::Unauthorized(msg) => {
				(StatusCode::UNAUTHORIZED, ErrorResponse::new("unauthorized", msg))
			}
			ServerError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorResponse::new("forbidden", msg)),
			ServerError::Internal(msg) => {
				tracing::error!(error = %msg, "internal error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse::new("internal_error", "An internal error occurred"),
				)
			}
		};

		(status, Json(body)).into_response()
	}
}
