// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User and global role repository.
//!
//! Users are provisioned by the identity provider; the server reads them to
//! authenticate requests. Global roles live in a sparse `user_roles` table
//! where the absence of a row means the default `user` role.

use async_trait::async_trait;
use brainy_server_auth::{GlobalRole, User, UserId};
use chrono::Utc;
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::time::{fmt_ts, parse_ts};

#[async_trait]
pub trait UserStore: Send + Sync {
	async fn create_user(&self, user: &User) -> Result<(), DbError>;
	async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError>;
	async fn list_global_roles(&self, user_id: &UserId) -> Result<Vec<GlobalRole>, DbError>;
	async fn grant_global_role(&self, user_id: &UserId, role: GlobalRole) -> Result<(), DbError>;
	async fn is_global_admin(&self, user_id: &UserId) -> Result<bool, DbError>;
}

#[derive(Clone)]
pub struct UserRepository {
	pool: SqlitePool,
}

impl UserRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a user.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if the email is already registered.
	#[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
	pub async fn create_user(&self, user: &User) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO users (id, email, full_name, created_at)
			VALUES (?, ?, ?, ?)
			"#,
		)
		.bind(user.id.to_string())
		.bind(&user.email)
		.bind(&user.full_name)
		.bind(fmt_ts(user.created_at))
		.execute(&self.pool)
		.await
		.map_err(|e| DbError::conflict_on_unique(e, format!("email {} already registered", user.email)))?;

		tracing::debug!(user_id = %user.id, "user created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, email, full_name, created_at
			FROM users
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_user(&r)).transpose()
	}

	/// Roles explicitly granted to a user. Empty means the default `user` role.
	///
	/// Unrecognised role strings are skipped so they never grant anything.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn list_global_roles(&self, user_id: &UserId) -> Result<Vec<GlobalRole>, DbError> {
		let rows: Vec<(String,)> = sqlx::query_as(
			r#"
			SELECT role FROM user_roles
			WHERE user_id = ?
			ORDER BY role
			"#,
		)
		.bind(user_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		Ok(
			rows
				.into_iter()
				.filter_map(|(role,)| match role.parse::<GlobalRole>() {
					Ok(r) => Some(r),
					Err(e) => {
						tracing::warn!(user_id = %user_id, error = %e, "ignoring unknown global role");
						None
					}
				})
				.collect(),
		)
	}

	/// Grant a global role. Granting an already held role is a no-op.
	#[tracing::instrument(skip(self), fields(user_id = %user_id, role = %role))]
	pub async fn grant_global_role(&self, user_id: &UserId, role: GlobalRole) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO user_roles (user_id, role, created_at)
			VALUES (?, ?, ?)
			ON CONFLICT(user_id, role) DO NOTHING
			"#,
		)
		.bind(user_id.to_string())
		.bind(role.as_str())
		.bind(fmt_ts(Utc::now()))
		.execute(&self.pool)
		.await?;

		tracing::debug!(user_id = %user_id, role = %role, "global role granted");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn is_global_admin(&self, user_id: &UserId) -> Result<bool, DbError> {
		let row = sqlx::query(
			r#"
			SELECT EXISTS(
				SELECT 1 FROM user_roles WHERE user_id = ? AND role = 'admin'
			) AS is_admin
			"#,
		)
		.bind(user_id.to_string())
		.fetch_one(&self.pool)
		.await?;

		let is_admin: i64 = row.get("is_admin");
		Ok(is_admin != 0)
	}
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, DbError> {
	let id: String = row.get("id");
	let created_at: String = row.get("created_at");

	Ok(User {
		id: id
			.parse()
			.map_err(|e| DbError::Internal(format!("Invalid user ID: {e}")))?,
		email: row.get("email"),
		full_name: row.get("full_name"),
		created_at: parse_ts(&created_at, "created_at")?,
	})
}

#[async_trait]
impl UserStore for UserRepository {
	async fn create_user(&self, user: &User) -> Result<(), DbError> {
		self.create_user(user).await
	}

	async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError> {
		self.get_user_by_id(id).await
	}

	async fn list_global_roles(&self, user_id: &UserId) -> Result<Vec<GlobalRole>, DbError> {
		self.list_global_roles(user_id).await
	}

	async fn grant_global_role(&self, user_id: &UserId, role: GlobalRole) -> Result<(), DbError> {
		self.grant_global_role(user_id, role).await
	}

	async fn is_global_admin(&self, user_id: &UserId) -> Result<bool, DbError> {
		self.is_global_admin(user_id).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;
	use chrono::SubsecRound;

	async fn make_repo() -> UserRepository {
		UserRepository::new(create_test_pool().await)
	}

	#[tokio::test]
	async fn create_and_get_user() {
		let repo = make_repo().await;
		let user = User::new("ada@example.com", Some("Ada".to_string()));
		repo.create_user(&user).await.unwrap();

		let fetched = repo.get_user_by_id(&user.id).await.unwrap().unwrap();
		assert_eq!(fetched.email, "ada@example.com");
		assert_eq!(fetched.full_name.as_deref(), Some("Ada"));
		assert_eq!(fetched.created_at, user.created_at.trunc_subsecs(6));
	}

	#[tokio::test]
	async fn missing_user_is_none() {
		let repo = make_repo().await;
		assert!(repo
			.get_user_by_id(&UserId::generate())
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn duplicate_email_is_conflict() {
		let repo = make_repo().await;
		repo
			.create_user(&User::new("dup@example.com", None))
			.await
			.unwrap();
		let result = repo.create_user(&User::new("dup@example.com", None)).await;
		assert!(matches!(result, Err(DbError::Conflict(_))));
	}

	#[tokio::test]
	async fn global_admin_requires_admin_row() {
		let repo = make_repo().await;
		let user = User::new("mod@example.com", None);
		repo.create_user(&user).await.unwrap();

		assert!(!repo.is_global_admin(&user.id).await.unwrap());
		assert!(repo.list_global_roles(&user.id).await.unwrap().is_empty());

		repo
			.grant_global_role(&user.id, GlobalRole::Moderator)
			.await
			.unwrap();
		assert!(!repo.is_global_admin(&user.id).await.unwrap());

		repo
			.grant_global_role(&user.id, GlobalRole::Admin)
			.await
			.unwrap();
		repo
			.grant_global_role(&user.id, GlobalRole::Admin)
			.await
			.unwrap();
		assert!(repo.is_global_admin(&user.id).await.unwrap());
		assert_eq!(
			repo.list_global_roles(&user.id).await.unwrap(),
			vec![GlobalRole::Admin, GlobalRole::Moderator]
		);
	}
}
