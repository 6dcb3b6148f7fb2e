// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Organization repository for database operations.
//!
//! This module provides database access for:
//! - Organization records, including ownership and subscription state
//! - Membership management (owner, admin, editor, viewer, member)
//!
//! Ownership is recorded twice: `organizations.owner_id` is authoritative,
//! and [`OrgRepository::create_org`] also writes an `owner` membership row so
//! member listings include the owner.

use async_trait::async_trait;
use brainy_server_auth::{
	OrgId, OrgMembership, OrgRole, Organization, SubscriptionStatus, User, UserId,
};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::DbError;
use crate::time::{fmt_ts, parse_opt_ts, parse_ts};

#[async_trait]
pub trait OrgStore: Send + Sync {
	async fn create_org(&self, org: &Organization) -> Result<(), DbError>;
	async fn get_org_by_id(&self, id: &OrgId) -> Result<Option<Organization>, DbError>;
	async fn get_org_owner(&self, id: &OrgId) -> Result<Option<UserId>, DbError>;
	async fn list_orgs_for_user(&self, user_id: &UserId) -> Result<Vec<Organization>, DbError>;
	async fn update_subscription(
		&self,
		id: &OrgId,
		status: SubscriptionStatus,
		trial_ends_at: Option<DateTime<Utc>>,
	) -> Result<(), DbError>;
	async fn add_member(
		&self,
		org_id: &OrgId,
		user_id: &UserId,
		role: OrgRole,
	) -> Result<(), DbError>;
	async fn get_membership(
		&self,
		org_id: &OrgId,
		user_id: &UserId,
	) -> Result<Option<OrgMembership>, DbError>;
	async fn update_member_role(
		&self,
		org_id: &OrgId,
		user_id: &UserId,
		role: OrgRole,
	) -> Result<(), DbError>;
	async fn remove_member(&self, org_id: &OrgId, user_id: &UserId) -> Result<bool, DbError>;
	async fn list_members(&self, org_id: &OrgId) -> Result<Vec<(OrgMembership, User)>, DbError>;
}

/// Repository for organization database operations.
///
/// All IDs are UUIDs stored as strings in SQLite.
#[derive(Clone)]
pub struct OrgRepository {
	pool: SqlitePool,
}

impl OrgRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	// =========================================================================
	// Organizations
	// =========================================================================

	/// Create a new organization together with the owner's membership row.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if the slug is taken.
	///
	/// # Database Constraints
	/// - `slug` must be unique
	/// - `owner_id` must reference an existing user
	#[tracing::instrument(skip(self, org), fields(org_id = %org.id, slug = %org.slug))]
	pub async fn create_org(&self, org: &Organization) -> Result<(), DbError> {
		let mut tx = self.pool.begin().await?;

		sqlx::query(
			r#"
			INSERT INTO organizations
				(id, name, slug, owner_id, subscription_status, trial_ends_at, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(org.id.to_string())
		.bind(&org.name)
		.bind(&org.slug)
		.bind(org.owner_id.to_string())
		.bind(org.subscription_status.as_str())
		.bind(org.trial_ends_at.map(fmt_ts))
		.bind(fmt_ts(org.created_at))
		.bind(fmt_ts(org.updated_at))
		.execute(&mut *tx)
		.await
		.map_err(|e| DbError::conflict_on_unique(e, format!("slug {} already taken", org.slug)))?;

		sqlx::query(
			r#"
			INSERT INTO organization_members (id, organization_id, user_id, role, created_at)
			VALUES (?, ?, ?, 'owner', ?)
			"#,
		)
		.bind(Uuid::new_v4().to_string())
		.bind(org.id.to_string())
		.bind(org.owner_id.to_string())
		.bind(fmt_ts(org.created_at))
		.execute(&mut *tx)
		.await?;

		tx.commit().await?;

		tracing::debug!(org_id = %org.id, slug = %org.slug, "organization created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(org_id = %id))]
	pub async fn get_org_by_id(&self, id: &OrgId) -> Result<Option<Organization>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, slug, owner_id, subscription_status, trial_ends_at, created_at, updated_at
			FROM organizations
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_org(&r)).transpose()
	}

	/// Owner of an organization, `None` if the organization does not exist.
	#[tracing::instrument(skip(self), fields(org_id = %id))]
	pub async fn get_org_owner(&self, id: &OrgId) -> Result<Option<UserId>, DbError> {
		let row: Option<(String,)> = sqlx::query_as("SELECT owner_id FROM organizations WHERE id = ?")
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row
			.map(|(owner,)| parse_user_id(&owner, "owner_id"))
			.transpose()
	}

	/// Organizations the user owns or belongs to, ordered by name.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn list_orgs_for_user(&self, user_id: &UserId) -> Result<Vec<Organization>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT o.id, o.name, o.slug, o.owner_id, o.subscription_status, o.trial_ends_at,
				o.created_at, o.updated_at
			FROM organizations o
			WHERE o.owner_id = ?
				OR EXISTS (
					SELECT 1 FROM organization_members m
					WHERE m.organization_id = o.id AND m.user_id = ?
				)
			ORDER BY o.name ASC
			"#,
		)
		.bind(user_id.to_string())
		.bind(user_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_org).collect()
	}

	/// Set billing state.
	///
	/// # Errors
	/// Returns `DbError::NotFound` if the organization does not exist.
	#[tracing::instrument(skip(self), fields(org_id = %id, status = %status))]
	pub async fn update_subscription(
		&self,
		id: &OrgId,
		status: SubscriptionStatus,
		trial_ends_at: Option<DateTime<Utc>>,
	) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			UPDATE organizations
			SET subscription_status = ?, trial_ends_at = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(status.as_str())
		.bind(trial_ends_at.map(fmt_ts))
		.bind(fmt_ts(Utc::now()))
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("organization {id}")));
		}

		tracing::debug!(org_id = %id, status = %status, "subscription updated");
		Ok(())
	}

	// =========================================================================
	// Membership
	// =========================================================================

	/// Add a member to an organization.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if the user is already a member.
	#[tracing::instrument(skip(self), fields(org_id = %org_id, user_id = %user_id, role = %role))]
	pub async fn add_member(
		&self,
		org_id: &OrgId,
		user_id: &UserId,
		role: OrgRole,
	) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO organization_members (id, organization_id, user_id, role, created_at)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(Uuid::new_v4().to_string())
		.bind(org_id.to_string())
		.bind(user_id.to_string())
		.bind(role.as_str())
		.bind(fmt_ts(Utc::now()))
		.execute(&self.pool)
		.await
		.map_err(|e| DbError::conflict_on_unique(e, format!("user {user_id} is already a member")))?;

		tracing::debug!(org_id = %org_id, user_id = %user_id, role = %role, "member added to organization");
		Ok(())
	}

	/// Get a membership for a user in an organization.
	///
	/// # Returns
	/// `None` if the user has no membership row. Ownership alone does not
	/// produce a row here; see [`OrgRepository::get_org_owner`].
	#[tracing::instrument(skip(self), fields(org_id = %org_id, user_id = %user_id))]
	pub async fn get_membership(
		&self,
		org_id: &OrgId,
		user_id: &UserId,
	) -> Result<Option<OrgMembership>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT organization_id, user_id, role, created_at
			FROM organization_members
			WHERE organization_id = ? AND user_id = ?
			"#,
		)
		.bind(org_id.to_string())
		.bind(user_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_membership(&r)).transpose()
	}

	/// Update a member's role.
	///
	/// # Errors
	/// Returns `DbError::NotFound` if the user is not a member.
	#[tracing::instrument(skip(self), fields(org_id = %org_id, user_id = %user_id, role = %role))]
	pub async fn update_member_role(
		&self,
		org_id: &OrgId,
		user_id: &UserId,
		role: OrgRole,
	) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			UPDATE organization_members
			SET role = ?
			WHERE organization_id = ? AND user_id = ?
			"#,
		)
		.bind(role.as_str())
		.bind(org_id.to_string())
		.bind(user_id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!(
				"membership of {user_id} in {org_id}"
			)));
		}

		tracing::debug!(org_id = %org_id, user_id = %user_id, role = %role, "member role updated");
		Ok(())
	}

	/// Remove a member from an organization.
	///
	/// # Returns
	/// `true` if a member was removed, `false` if not found.
	#[tracing::instrument(skip(self), fields(org_id = %org_id, user_id = %user_id))]
	pub async fn remove_member(&self, org_id: &OrgId, user_id: &UserId) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM organization_members
			WHERE organization_id = ? AND user_id = ?
			"#,
		)
		.bind(org_id.to_string())
		.bind(user_id.to_string())
		.execute(&self.pool)
		.await?;

		let removed = result.rows_affected() > 0;
		if removed {
			tracing::debug!(org_id = %org_id, user_id = %user_id, "member removed from organization");
		}
		Ok(removed)
	}

	/// List all members of an organization with their user info, ordered by
	/// join date.
	#[tracing::instrument(skip(self), fields(org_id = %org_id))]
	pub async fn list_members(&self, org_id: &OrgId) -> Result<Vec<(OrgMembership, User)>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT
				m.organization_id, m.user_id, m.role, m.created_at,
				u.email, u.full_name, u.created_at AS u_created_at
			FROM organization_members m
			INNER JOIN users u ON m.user_id = u.id
			WHERE m.organization_id = ?
			ORDER BY m.created_at ASC
			"#,
		)
		.bind(org_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		let mut result = Vec::with_capacity(rows.len());
		for row in &rows {
			let membership = row_to_membership(row)?;
			let u_created_at: String = row.get("u_created_at");
			let user = User {
				id: membership.user_id,
				email: row.get("email"),
				full_name: row.get("full_name"),
				created_at: parse_ts(&u_created_at, "users.created_at")?,
			};
			result.push((membership, user));
		}
		Ok(result)
	}
}

// =========================================================================
// Helpers
// =========================================================================

fn parse_user_id(value: &str, column: &str) -> Result<UserId, DbError> {
	value
		.parse()
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

/// An unknown stored role is a row error, never an implicit grant.
fn parse_role(value: &str) -> Result<OrgRole, DbError> {
	value
		.parse()
		.map_err(|e| DbError::Internal(format!("Invalid organization role: {e}")))
}

/// Unknown stored statuses degrade to expired.
fn parse_status(value: &str) -> SubscriptionStatus {
	value.parse().unwrap_or_else(|e: String| {
		tracing::warn!(error = %e, "unknown subscription status, treating as expired");
		SubscriptionStatus::Expired
	})
}

fn row_to_org(row: &sqlx::sqlite::SqliteRow) -> Result<Organization, DbError> {
	let id: String = row.get("id");
	let owner_id: String = row.get("owner_id");
	let status: String = row.get("subscription_status");
	let trial_ends_at: Option<String> = row.get("trial_ends_at");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(Organization {
		id: id
			.parse()
			.map_err(|e| DbError::Internal(format!("Invalid org ID: {e}")))?,
		name: row.get("name"),
		slug: row.get("slug"),
		owner_id: parse_user_id(&owner_id, "owner_id")?,
		subscription_status: parse_status(&status),
		trial_ends_at: parse_opt_ts(trial_ends_at, "trial_ends_at")?,
		created_at: parse_ts(&created_at, "created_at")?,
		updated_at: parse_ts(&updated_at, "updated_at")?,
	})
}

fn row_to_membership(row: &sqlx::sqlite::SqliteRow) -> Result<OrgMembership, DbError> {
	let org_id: String = row.get("organization_id");
	let user_id: String = row.get("user_id");
	let role: String = row.get("role");
	let created_at: String = row.get("created_at");

	Ok(OrgMembership {
		org_id: org_id
			.parse()
			.map_err(|e| DbError::Internal(format!("Invalid organization_id: {e}")))?,
		user_id: parse_user_id(&user_id, "user_id")?,
		role: parse_role(&role)?,
		created_at: parse_ts(&created_at, "created_at")?,
	})
}

#[async_trait]
impl OrgStore for OrgRepository {
	async fn create_org(&self, org: &Organization) -> Result<(), DbError> {
		self.create_org(org).await
	}

	async fn get_org_by_id(&self, id: &OrgId) -> Result<Option<Organization>, DbError> {
		self.get_org_by_id(id).await
	}

	async fn get_org_owner(&self, id: &OrgId) -> Result<Option<UserId>, DbError> {
		self.get_org_owner(id).await
	}

	async fn list_orgs_for_user(&self, user_id: &UserId) -> Result<Vec<Organization>, DbError> {
		self.list_orgs_for_user(user_id).await
	}

	async fn update_subscription(
		&self,
		id: &OrgId,
		status: SubscriptionStatus,
		trial_ends_at: Option<DateTime<Utc>>,
	) -> Result<(), DbError> {
		self.update_subscription(id, status, trial_ends_at).await
	}

	async fn add_member(
		&self,
		org_id: &OrgId,
		user_id: &UserId,
		role: OrgRole,
	) -> Result<(), DbError> {
		self.add_member(org_id, user_id, role).await
	}

	async fn get_membership(
		&self,
		org_id: &OrgId,
		user_id: &UserId,
	) -> Result<Option<OrgMembership>, DbError> {
		self.get_membership(org_id, user_id).await
	}

	async fn update_member_role(
		&self,
		org_id: &OrgId,
		user_id: &UserId,
		role: OrgRole,
	) -> Result<(), DbError> {
		self.update_member_role(org_id, user_id, role).await
	}

	async fn remove_member(&self, org_id: &OrgId, user_id: &UserId) -> Result<bool, DbError> {
		self.remove_member(org_id, user_id).await
	}

	async fn list_members(&self, org_id: &OrgId) -> Result<Vec<(OrgMembership, User)>, DbError> {
		self.list_members(org_id).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;
	use crate::user::UserRepository;
	use chrono::Duration;
	use proptest::prelude::*;
	use std::collections::HashSet;

	proptest! {
		#[test]
		fn org_id_generation_is_unique(count in 1..500usize) {
			let mut ids = HashSet::new();
			for _ in 0..count {
				prop_assert!(ids.insert(OrgId::generate()), "Generated duplicate OrgId");
			}
		}
	}

	struct Fixture {
		orgs: OrgRepository,
		users: UserRepository,
	}

	async fn fixture() -> Fixture {
		let pool = create_test_pool().await;
		Fixture {
			orgs: OrgRepository::new(pool.clone()),
			users: UserRepository::new(pool),
		}
	}

	async fn make_user(f: &Fixture, email: &str) -> User {
		let user = User::new(email, None);
		f.users.create_user(&user).await.unwrap();
		user
	}

	#[tokio::test]
	async fn create_org_records_owner_membership() {
		let f = fixture().await;
		let owner = make_user(&f, "owner@example.com").await;
		let org = Organization::new("Acme", "acme", owner.id);
		f.orgs.create_org(&org).await.unwrap();

		let fetched = f.orgs.get_org_by_id(&org.id).await.unwrap().unwrap();
		assert_eq!(fetched.slug, "acme");
		assert_eq!(fetched.owner_id, owner.id);
		assert_eq!(fetched.subscription_status, SubscriptionStatus::Trial);
		assert!(fetched.trial_ends_at.is_some());

		assert_eq!(f.orgs.get_org_owner(&org.id).await.unwrap(), Some(owner.id));
		let membership = f
			.orgs
			.get_membership(&org.id, &owner.id)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(membership.role, OrgRole::Owner);
	}

	#[tokio::test]
	async fn duplicate_slug_is_conflict_and_rolls_back() {
		let f = fixture().await;
		let owner = make_user(&f, "owner@example.com").await;
		f.orgs
			.create_org(&Organization::new("Acme", "acme", owner.id))
			.await
			.unwrap();

		let second = Organization::new("Acme Two", "acme", owner.id);
		let result = f.orgs.create_org(&second).await;
		assert!(matches!(result, Err(DbError::Conflict(_))));
		assert!(f.orgs.get_org_by_id(&second.id).await.unwrap().is_none());
		assert!(f
			.orgs
			.get_membership(&second.id, &owner.id)
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn owner_of_missing_org_is_none() {
		let f = fixture().await;
		assert!(f
			.orgs
			.get_org_owner(&OrgId::generate())
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn membership_lifecycle() {
		let f = fixture().await;
		let owner = make_user(&f, "owner@example.com").await;
		let editor = make_user(&f, "editor@example.com").await;
		let org = Organization::new("Acme", "acme", owner.id);
		f.orgs.create_org(&org).await.unwrap();

		f.orgs
			.add_member(&org.id, &editor.id, OrgRole::Editor)
			.await
			.unwrap();
		let dup = f.orgs.add_member(&org.id, &editor.id, OrgRole::Viewer).await;
		assert!(matches!(dup, Err(DbError::Conflict(_))));

		f.orgs
			.update_member_role(&org.id, &editor.id, OrgRole::Admin)
			.await
			.unwrap();
		let m = f
			.orgs
			.get_membership(&org.id, &editor.id)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(m.role, OrgRole::Admin);

		let members = f.orgs.list_members(&org.id).await.unwrap();
		assert_eq!(members.len(), 2);
		assert_eq!(members[0].1.email, "owner@example.com");

		assert!(f.orgs.remove_member(&org.id, &editor.id).await.unwrap());
		assert!(!f.orgs.remove_member(&org.id, &editor.id).await.unwrap());

		let missing = f
			.orgs
			.update_member_role(&org.id, &editor.id, OrgRole::Viewer)
			.await;
		assert!(matches!(missing, Err(DbError::NotFound(_))));
	}

	#[tokio::test]
	async fn list_orgs_includes_owned_and_member_orgs() {
		let f = fixture().await;
		let alice = make_user(&f, "alice@example.com").await;
		let bob = make_user(&f, "bob@example.com").await;

		let a = Organization::new("Alpha", "alpha", alice.id);
		let b = Organization::new("Beta", "beta", bob.id);
		let c = Organization::new("Gamma", "gamma", bob.id);
		for org in [&a, &b, &c] {
			f.orgs.create_org(org).await.unwrap();
		}
		f.orgs
			.add_member(&b.id, &alice.id, OrgRole::Viewer)
			.await
			.unwrap();

		let names: Vec<String> = f
			.orgs
			.list_orgs_for_user(&alice.id)
			.await
			.unwrap()
			.into_iter()
			.map(|o| o.name)
			.collect();
		assert_eq!(names, vec!["Alpha", "Beta"]);
	}

	#[tokio::test]
	async fn owner_without_membership_row_still_listed() {
		let f = fixture().await;
		let owner = make_user(&f, "owner@example.com").await;
		let org = Organization::new("Acme", "acme", owner.id);
		f.orgs.create_org(&org).await.unwrap();
		f.orgs.remove_member(&org.id, &owner.id).await.unwrap();

		let orgs = f.orgs.list_orgs_for_user(&owner.id).await.unwrap();
		assert_eq!(orgs.len(), 1);
	}

	#[tokio::test]
	async fn update_subscription_changes_status() {
		let f = fixture().await;
		let owner = make_user(&f, "owner@example.com").await;
		let org = Organization::new("Acme", "acme", owner.id);
		f.orgs.create_org(&org).await.unwrap();

		let ends = Utc::now() + Duration::days(30);
		f.orgs
			.update_subscription(&org.id, SubscriptionStatus::Active, Some(ends))
			.await
			.unwrap();
		let fetched = f.orgs.get_org_by_id(&org.id).await.unwrap().unwrap();
		assert_eq!(fetched.subscription_status, SubscriptionStatus::Active);

		let missing = f
			.orgs
			.update_subscription(&OrgId::generate(), SubscriptionStatus::Active, None)
			.await;
		assert!(matches!(missing, Err(DbError::NotFound(_))));
	}

	#[tokio::test]
	async fn unknown_role_errors_and_unknown_status_expires() {
		let f = fixture().await;
		let owner = make_user(&f, "owner@example.com").await;
		let other = make_user(&f, "other@example.com").await;
		let org = Organization::new("Acme", "acme", owner.id);
		f.orgs.create_org(&org).await.unwrap();
		f.orgs
			.add_member(&org.id, &other.id, OrgRole::Editor)
			.await
			.unwrap();

		sqlx::query("UPDATE organization_members SET role = 'superuser' WHERE user_id = ?")
			.bind(other.id.to_string())
			.execute(&f.orgs.pool)
			.await
			.unwrap();
		sqlx::query("UPDATE organizations SET subscription_status = 'lifetime' WHERE id = ?")
			.bind(org.id.to_string())
			.execute(&f.orgs.pool)
			.await
			.unwrap();

		let m = f.orgs.get_membership(&org.id, &other.id).await;
		assert!(matches!(m, Err(DbError::Internal(_))));
		let fetched = f.orgs.get_org_by_id(&org.id).await.unwrap().unwrap();
		assert_eq!(fetched.subscription_status, SubscriptionStatus::Expired);
	}
}
