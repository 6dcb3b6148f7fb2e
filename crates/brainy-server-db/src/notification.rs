// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notification repository.
//!
//! Notifications are insert-only. The only mutation is flipping `is_read`,
//! always scoped to the owning user.

use async_trait::async_trait;
use brainy_server_auth::{NotificationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePool, Row};
use std::fmt;
use std::str::FromStr;

use crate::error::DbError;
use crate::time::{fmt_ts, parse_ts};

/// Severity/category shown with a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
	#[default]
	Info,
	Success,
	Warning,
	Error,
	Reminder,
}

impl NotificationKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			NotificationKind::Info => "info",
			NotificationKind::Success => "success",
			NotificationKind::Warning => "warning",
			NotificationKind::Error => "error",
			NotificationKind::Reminder => "reminder",
		}
	}
}

impl fmt::Display for NotificationKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for NotificationKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"info" => Ok(NotificationKind::Info),
			"success" => Ok(NotificationKind::Success),
			"warning" => Ok(NotificationKind::Warning),
			"error" => Ok(NotificationKind::Error),
			"reminder" => Ok(NotificationKind::Reminder),
			_ => Err(format!("unknown notification type: {s}")),
		}
	}
}

/// A persisted notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
	pub id: NotificationId,
	pub user_id: UserId,
	pub title: String,
	pub message: String,
	#[serde(rename = "type")]
	pub kind: NotificationKind,
	pub entity_type: Option<String>,
	pub entity_id: Option<String>,
	pub is_read: bool,
	pub created_at: DateTime<Utc>,
}

/// Fields supplied by whoever raises a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
	pub user_id: UserId,
	pub title: String,
	pub message: String,
	#[serde(rename = "type")]
	pub kind: NotificationKind,
	pub entity_type: Option<String>,
	pub entity_id: Option<String>,
}

impl NewNotification {
	pub fn new(
		user_id: UserId,
		title: impl Into<String>,
		message: impl Into<String>,
		kind: NotificationKind,
	) -> Self {
		Self {
			user_id,
			title: title.into(),
			message: message.into(),
			kind,
			entity_type: None,
			entity_id: None,
		}
	}

	pub fn with_entity(
		mut self,
		entity_type: impl Into<String>,
		entity_id: impl Into<String>,
	) -> Self {
		self.entity_type = Some(entity_type.into());
		self.entity_id = Some(entity_id.into());
		self
	}
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
	async fn create_notification(&self, new: &NewNotification) -> Result<Notification, DbError>;
	async fn list_for_user(
		&self,
		user_id: &UserId,
		limit: u32,
		unread_only: bool,
	) -> Result<Vec<Notification>, DbError>;
	async fn count_unread(&self, user_id: &UserId) -> Result<i64, DbError>;
	async fn mark_read(&self, user_id: &UserId, id: &NotificationId) -> Result<bool, DbError>;
	async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, DbError>;
}

#[derive(Clone)]
pub struct NotificationRepository {
	pool: SqlitePool,
}

impl NotificationRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a notification and return the stored row.
	#[tracing::instrument(skip(self, new), fields(user_id = %new.user_id, kind = %new.kind))]
	pub async fn create_notification(&self, new: &NewNotification) -> Result<Notification, DbError> {
		let notification = Notification {
			id: NotificationId::generate(),
			user_id: new.user_id,
			title: new.title.clone(),
			message: new.message.clone(),
			kind: new.kind,
			entity_type: new.entity_type.clone(),
			entity_id: new.entity_id.clone(),
			is_read: false,
			created_at: Utc::now(),
		};

		sqlx::query(
			r#"
			INSERT INTO notifications
				(id, user_id, title, message, type, entity_type, entity_id, is_read, created_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)
			"#,
		)
		.bind(notification.id.to_string())
		.bind(notification.user_id.to_string())
		.bind(&notification.title)
		.bind(&notification.message)
		.bind(notification.kind.as_str())
		.bind(&notification.entity_type)
		.bind(&notification.entity_id)
		.bind(fmt_ts(notification.created_at))
		.execute(&self.pool)
		.await?;

		tracing::debug!(notification_id = %notification.id, "notification created");
		Ok(notification)
	}

	/// Most recent first. Insertion order breaks timestamp ties.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn list_for_user(
		&self,
		user_id: &UserId,
		limit: u32,
		unread_only: bool,
	) -> Result<Vec<Notification>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, user_id, title, message, type, entity_type, entity_id, is_read, created_at
			FROM notifications
			WHERE user_id = ? AND (? = 0 OR is_read = 0)
			ORDER BY created_at DESC, rowid DESC
			LIMIT ?
			"#,
		)
		.bind(user_id.to_string())
		.bind(unread_only)
		.bind(i64::from(limit))
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_notification).collect()
	}

	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn count_unread(&self, user_id: &UserId) -> Result<i64, DbError> {
		let (count,): (i64,) =
			sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0")
				.bind(user_id.to_string())
				.fetch_one(&self.pool)
				.await?;
		Ok(count)
	}

	/// # Returns
	/// `false` if no notification with this id belongs to the user.
	#[tracing::instrument(skip(self), fields(user_id = %user_id, notification_id = %id))]
	pub async fn mark_read(&self, user_id: &UserId, id: &NotificationId) -> Result<bool, DbError> {
		let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
			.bind(id.to_string())
			.bind(user_id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	/// # Returns
	/// Number of notifications that changed from unread to read.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, DbError> {
		let result =
			sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
				.bind(user_id.to_string())
				.execute(&self.pool)
				.await?;

		Ok(result.rows_affected())
	}
}

fn row_to_notification(row: &sqlx::sqlite::SqliteRow) -> Result<Notification, DbError> {
	let id: String = row.get("id");
	let user_id: String = row.get("user_id");
	let kind: String = row.get("type");
	let is_read: i64 = row.get("is_read");
	let created_at: String = row.get("created_at");

	Ok(Notification {
		id: id
			.parse()
			.map_err(|e| DbError::Internal(format!("Invalid notification ID: {e}")))?,
		user_id: user_id
			.parse()
			.map_err(|e| DbError::Internal(format!("Invalid user_id: {e}")))?,
		title: row.get("title"),
		message: row.get("message"),
		kind: kind.parse().unwrap_or_default(),
		entity_type: row.get("entity_type"),
		entity_id: row.get("entity_id"),
		is_read: is_read != 0,
		created_at: parse_ts(&created_at, "created_at")?,
	})
}

#[async_trait]
impl NotificationStore for NotificationRepository {
	async fn create_notification(&self, new: &NewNotification) -> Result<Notification, DbError> {
		self.create_notification(new).await
	}

	async fn list_for_user(
		&self,
		user_id: &UserId,
		limit: u32,
		unread_only: bool,
	) -> Result<Vec<Notification>, DbError> {
		self.list_for_user(user_id, limit, unread_only).await
	}

	async fn count_unread(&self, user_id: &UserId) -> Result<i64, DbError> {
		self.count_unread(user_id).await
	}

	async fn mark_read(&self, user_id: &UserId, id: &NotificationId) -> Result<bool, DbError> {
		self.mark_read(user_id, id).await
	}

	async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, DbError> {
		self.mark_all_read(user_id).await
	}
}
