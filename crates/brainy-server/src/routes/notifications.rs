// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notification inbox endpoints and the realtime SSE feed.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use brainy_server_auth::NotificationId;
use brainy_server_notifications::Notification;
use futures::future;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::ServerError;
use crate::identity::RequireUser;

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct ListNotificationsQuery {
	#[serde(default)]
	pub unread_only: bool,
	pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
	pub notifications: Vec<Notification>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
	pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
	pub updated: u64,
}

/// GET /api/notifications?unread_only=&limit=
pub async fn list_notifications(
	State(state): State<AppState>,
	RequireUser(current): RequireUser,
	Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<NotificationListResponse>, ServerError> {
	let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
	let notifications = state
		.notifications
		.list_for_user(&current.id(), limit, query.unread_only)
		.await?;
	Ok(Json(NotificationListResponse { notifications }))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
	State(state): State<AppState>,
	RequireUser(current): RequireUser,
) -> Result<Json<UnreadCountResponse>, ServerError> {
	let count = state.notifications.count_unread(&current.id()).await?;
	Ok(Json(UnreadCountResponse { count }))
}

/// POST /api/notifications/{notification_id}/read
///
/// Someone else's notification is reported as not found.
pub async fn mark_read(
	State(state): State<AppState>,
	RequireUser(current): RequireUser,
	Path(notification_id): Path<NotificationId>,
) -> Result<axum::http::StatusCode, ServerError> {
	if !state
		.notifications
		.mark_read(&current.id(), &notification_id)
		.await?
	{
		return Err(ServerError::NotFound(format!(
			"Notification not found: {notification_id}"
		)));
	}
	Ok(axum::http::StatusCode::NO_CONTENT)
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
	State(state): State<AppState>,
	RequireUser(current): RequireUser,
) -> Result<Json<MarkAllReadResponse>, ServerError> {
	let updated = state.notifications.mark_all_read(&current.id()).await?;
	Ok(Json(MarkAllReadResponse { updated }))
}

/// GET /api/notifications/stream
///
/// Server-Sent Events of notifications for the current user as they are
/// emitted. Nothing is replayed; clients load history from the list endpoint.
pub async fn notification_stream(
	State(state): State<AppState>,
	RequireUser(current): RequireUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
	let user_id = current.id();
	tracing::debug!(%user_id, "notification stream opened");

	let stream = state
		.emitter
		.hub()
		.subscribe(user_id)
		.into_stream()
		.filter_map(|notification| {
			let event = match Event::default().event("notification").json_data(&notification) {
				Ok(event) => Some(Ok::<_, Infallible>(event)),
				Err(e) => {
					tracing::warn!(notification_id = %notification.id, error = %e, "failed to encode notification event");
					None
				}
			};
			future::ready(event)
		});

	Sse::new(stream).keep_alive(
		KeepAlive::new()
			.interval(Duration::from_secs(15))
			.text("keep-alive"),
	)
}

#[cfg(test)]
mod tests {
	use axum::body::Body;
	use axum::http::{Request, StatusCode};
	use brainy_server_notifications::{NewNotification, NotificationKind, NotificationSink};
	use futures::StreamExt;
	use tower::ServiceExt;

	use crate::routes::test_support::{TestApp, USER_HEADER};

	async fn emit(app: &TestApp, user: brainy_server_auth::UserId, title: &str) {
		app.state
			.emitter
			.emit(NewNotification::new(user, title, "body", NotificationKind::Info))
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn inbox_lifecycle() {
		let app = TestApp::new().await;
		let ada = app.user("ada@example.com").await;
		let bob = app.user("bob@example.com").await;
		emit(&app, ada.id, "first").await;
		emit(&app, ada.id, "second").await;
		emit(&app, bob.id, "bob's").await;

		let (status, body) = app.send("GET", "/api/notifications", Some(ada.id), None).await;
		assert_eq!(status, StatusCode::OK);
		let list = body["notifications"].as_array().unwrap();
		assert_eq!(list.len(), 2);
		assert_eq!(list[0]["title"], "second");
		assert_eq!(list[0]["type"], "info");

		let (_, body) = app
			.send("GET", "/api/notifications/unread-count", Some(ada.id), None)
			.await;
		assert_eq!(body["count"], 2);

		let first_id = list[1]["id"].as_str().unwrap().to_string();
		let (status, _) = app
			.send("POST", &format!("/api/notifications/{first_id}/read"), Some(bob.id), None)
			.await;
		assert_eq!(status, StatusCode::NOT_FOUND);

		let (status, _) = app
			.send("POST", &format!("/api/notifications/{first_id}/read"), Some(ada.id), None)
			.await;
		assert_eq!(status, StatusCode::NO_CONTENT);

		let (_, body) = app
			.send("GET", "/api/notifications?unread_only=true", Some(ada.id), None)
			.await;
		assert_eq!(body["notifications"].as_array().unwrap().len(), 1);

		let (_, body) = app
			.send("POST", "/api/notifications/read-all", Some(ada.id), None)
			.await;
		assert_eq!(body["updated"], 1);

		let (_, body) = app
			.send("GET", "/api/notifications/unread-count", Some(bob.id), None)
			.await;
		assert_eq!(body["count"], 1);
	}

	#[tokio::test]
	async fn limit_is_applied() {
		let app = TestApp::new().await;
		let ada = app.user("ada@example.com").await;
		for i in 0..3 {
			emit(&app, ada.id, &format!("n{i}")).await;
		}
		let (_, body) = app
			.send("GET", "/api/notifications?limit=2", Some(ada.id), None)
			.await;
		assert_eq!(body["notifications"].as_array().unwrap().len(), 2);
	}

	#[tokio::test]
	async fn stream_delivers_only_own_notifications() {
		let app = TestApp::new().await;
		let ada = app.user("ada@example.com").await;
		let bob = app.user("bob@example.com").await;

		let request = Request::builder()
			.uri("/api/notifications/stream")
			.header(USER_HEADER, ada.id.to_string())
			.body(Body::empty())
			.unwrap();
		let response = app.router.clone().oneshot(request).await.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(
			response.headers()["content-type"].to_str().unwrap(),
			"text/event-stream"
		);

		emit(&app, bob.id, "not for ada").await;
		emit(&app, ada.id, "for ada").await;

		let mut body = response.into_body().into_data_stream();
		let chunk = tokio::time::timeout(std::time::Duration::from_secs(2), body.next())
			.await
			.expect("event within timeout")
			.expect("stream open")
			.unwrap();
		let text = String::from_utf8(chunk.to_vec()).unwrap();
		assert!(text.contains("event: notification"));
		assert!(text.contains("for ada"));
		assert!(!text.contains("not for ada"));
	}
}
