// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Content item repository.
//!
//! Only the slice of the content calendar needed for pre-publish reminders
//! lives here: creating items and finding scheduled ones inside a window.

use async_trait::async_trait;
use brainy_server_auth::{BrandId, ContentItemId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePool, Row};
use std::fmt;
use std::str::FromStr;

use crate::error::DbError;
use crate::time::{fmt_ts, parse_opt_ts, parse_ts};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
	#[default]
	Draft,
	PendingApproval,
	Approved,
	Scheduled,
	Published,
	Archived,
}

impl ContentStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			ContentStatus::Draft => "draft",
			ContentStatus::PendingApproval => "pending_approval",
			ContentStatus::Approved => "approved",
			ContentStatus::Scheduled => "scheduled",
			ContentStatus::Published => "published",
			ContentStatus::Archived => "archived",
		}
	}
}

impl fmt::Display for ContentStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ContentStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"draft" => Ok(ContentStatus::Draft),
			"pending_approval" => Ok(ContentStatus::PendingApproval),
			"approved" => Ok(ContentStatus::Approved),
			"scheduled" => Ok(ContentStatus::Scheduled),
			"published" => Ok(ContentStatus::Published),
			"archived" => Ok(ContentStatus::Archived),
			_ => Err(format!("unknown content status: {s}")),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
	pub id: ContentItemId,
	pub brand_id: Option<BrandId>,
	/// Author, and recipient of reminders for this item.
	pub user_id: UserId,
	pub title: String,
	pub status: ContentStatus,
	pub scheduled_date: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
}

impl ContentItem {
	pub fn scheduled(
		user_id: UserId,
		brand_id: Option<BrandId>,
		title: impl Into<String>,
		scheduled_date: DateTime<Utc>,
	) -> Self {
		Self {
			id: ContentItemId::generate(),
			brand_id,
			user_id,
			title: title.into(),
			status: ContentStatus::Scheduled,
			scheduled_date: Some(scheduled_date),
			created_at: Utc::now(),
		}
	}
}

#[async_trait]
pub trait ContentStore: Send + Sync {
	async fn create_content_item(&self, item: &ContentItem) -> Result<(), DbError>;
	async fn list_scheduled_between(
		&self,
		from: DateTime<Utc>,
		to: DateTime<Utc>,
	) -> Result<Vec<ContentItem>, DbError>;
}

#[derive(Clone)]
pub struct ContentRepository {
	pool: SqlitePool,
}

impl ContentRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, item), fields(content_id = %item.id, status = %item.status))]
	pub async fn create_content_item(&self, item: &ContentItem) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO content_items (id, brand_id, user_id, title, status, scheduled_date, created_at)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(item.id.to_string())
		.bind(item.brand_id.map(|b| b.to_string()))
		.bind(item.user_id.to_string())
		.bind(&item.title)
		.bind(item.status.as_str())
		.bind(item.scheduled_date.map(fmt_ts))
		.bind(fmt_ts(item.created_at))
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	/// Items with status `scheduled` and `from <= scheduled_date <= to`,
	/// soonest first.
	#[tracing::instrument(skip(self))]
	pub async fn list_scheduled_between(
		&self,
		from: DateTime<Utc>,
		to: DateTime<Utc>,
	) -> Result<Vec<ContentItem>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, brand_id, user_id, title, status, scheduled_date, created_at
			FROM content_items
			WHERE status = 'scheduled'
				AND scheduled_date IS NOT NULL
				AND scheduled_date >= ?
				AND scheduled_date <= ?
			ORDER BY scheduled_date ASC
			"#,
		)
		.bind(fmt_ts(from))
		.bind(fmt_ts(to))
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_content_item).collect()
	}
}

fn row_to_content_item(row: &sqlx::sqlite::SqliteRow) -> Result<ContentItem, DbError> {
	let id: String = row.get("id");
	let brand_id: Option<String> = row.get("brand_id");
	let user_id: String = row.get("user_id");
	let status: String = row.get("status");
	let scheduled_date: Option<String> = row.get("scheduled_date");
	let created_at: String = row.get("created_at");

	Ok(ContentItem {
		id: id
			.parse()
			.map_err(|e| DbError::Internal(format!("Invalid content item ID: {e}")))?,
		brand_id: brand_id
			.map(|b| b.parse::<BrandId>())
			.transpose()
			.map_err(|e| DbError::Internal(format!("Invalid brand_id: {e}")))?,
		user_id: user_id
			.parse()
			.map_err(|e| DbError::Internal(format!("Invalid user_id: {e}")))?,
		title: row.get("title"),
		status: status.parse().map_err(DbError::Internal)?,
		scheduled_date: parse_opt_ts(scheduled_date, "scheduled_date")?,
		created_at: parse_ts(&created_at, "created_at")?,
	})
}

#[async_trait]
impl ContentStore for ContentRepository {
	async fn create_content_item(&self, item: &ContentItem) -> Result<(), DbError> {
		self.create_content_item(item).await
	}

	async fn list_scheduled_between(
		&self,
		from: DateTime<Utc>,
		to: DateTime<Utc>,
	) -> Result<Vec<ContentItem>, DbError> {
		self.list_scheduled_between(from, to).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;
	use crate::user::UserRepository;
	use brainy_server_auth::User;
	use chrono::{Duration, TimeZone};

	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
	}

	async fn setup() -> (ContentRepository, UserId) {
		let pool = create_test_pool().await;
		let user = User::new("author@example.com", None);
		UserRepository::new(pool.clone())
			.create_user(&user)
			.await
			.unwrap();
		(ContentRepository::new(pool), user.id)
	}

	#[tokio::test]
	async fn window_is_inclusive_and_ordered() {
		let (repo, user) = setup().await;
		let window_end = now() + Duration::minutes(30);

		let at_start = ContentItem::scheduled(user, None, "at start", now());
		let later = ContentItem::scheduled(user, None, "later", now() + Duration::minutes(20));
		let at_end = ContentItem::scheduled(user, None, "at end", window_end);
		let past = ContentItem::scheduled(user, None, "past", now() - Duration::seconds(1));
		let beyond = ContentItem::scheduled(user, None, "beyond", window_end + Duration::seconds(1));
		for item in [&later, &at_end, &past, &beyond, &at_start] {
			repo.create_content_item(item).await.unwrap();
		}

		let titles: Vec<String> = repo
			.list_scheduled_between(now(), window_end)
			.await
			.unwrap()
			.into_iter()
			.map(|i| i.title)
			.collect();
		assert_eq!(titles, vec!["at start", "later", "at end"]);
	}

	#[tokio::test]
	async fn only_scheduled_status_is_eligible() {
		let (repo, user) = setup().await;
		let mut draft = ContentItem::scheduled(user, None, "draft", now() + Duration::minutes(5));
		draft.status = ContentStatus::Draft;
		let mut published =
			ContentItem::scheduled(user, None, "published", now() + Duration::minutes(5));
		published.status = ContentStatus::Published;
		let mut unscheduled = ContentItem::scheduled(user, None, "undated", now());
		unscheduled.scheduled_date = None;

		for item in [&draft, &published, &unscheduled] {
			repo.create_content_item(item).await.unwrap();
		}

		assert!(repo
			.list_scheduled_between(now(), now() + Duration::minutes(30))
			.await
			.unwrap()
			.is_empty());
	}
}
