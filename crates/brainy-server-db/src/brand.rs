// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Brand repository.
//!
//! Brands carry no ACL of their own. Access checks look up the owning
//! organization with [`BrandRepository::get_brand_org`] and evaluate against
//! it.

use async_trait::async_trait;
use brainy_server_auth::{Brand, BrandId, OrgId};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::time::{fmt_ts, parse_ts};

#[async_trait]
pub trait BrandStore: Send + Sync {
	async fn create_brand(&self, brand: &Brand) -> Result<(), DbError>;
	async fn get_brand_by_id(&self, id: &BrandId) -> Result<Option<Brand>, DbError>;
	async fn get_brand_org(&self, id: &BrandId) -> Result<Option<OrgId>, DbError>;
	async fn list_brands_for_org(&self, org_id: &OrgId) -> Result<Vec<Brand>, DbError>;
	async fn delete_brand(&self, id: &BrandId) -> Result<bool, DbError>;
}

#[derive(Clone)]
pub struct BrandRepository {
	pool: SqlitePool,
}

impl BrandRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, brand), fields(brand_id = %brand.id, org_id = %brand.org_id))]
	pub async fn create_brand(&self, brand: &Brand) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO brands (id, organization_id, name, description, created_at)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(brand.id.to_string())
		.bind(brand.org_id.to_string())
		.bind(&brand.name)
		.bind(&brand.description)
		.bind(fmt_ts(brand.created_at))
		.execute(&self.pool)
		.await?;

		tracing::debug!(brand_id = %brand.id, "brand created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(brand_id = %id))]
	pub async fn get_brand_by_id(&self, id: &BrandId) -> Result<Option<Brand>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, organization_id, name, description, created_at
			FROM brands
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_brand(&r)).transpose()
	}

	/// Owning organization of a brand, `None` if the brand does not exist.
	#[tracing::instrument(skip(self), fields(brand_id = %id))]
	pub async fn get_brand_org(&self, id: &BrandId) -> Result<Option<OrgId>, DbError> {
		let row: Option<(String,)> =
			sqlx::query_as("SELECT organization_id FROM brands WHERE id = ?")
				.bind(id.to_string())
				.fetch_optional(&self.pool)
				.await?;

		row
			.map(|(org_id,)| {
				org_id
					.parse()
					.map_err(|e| DbError::Internal(format!("Invalid organization_id: {e}")))
			})
			.transpose()
	}

	#[tracing::instrument(skip(self), fields(org_id = %org_id))]
	pub async fn list_brands_for_org(&self, org_id: &OrgId) -> Result<Vec<Brand>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, organization_id, name, description, created_at
			FROM brands
			WHERE organization_id = ?
			ORDER BY name ASC
			"#,
		)
		.bind(org_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_brand).collect()
	}

	/// # Returns
	/// `true` if a brand was deleted, `false` if not found.
	#[tracing::instrument(skip(self), fields(brand_id = %id))]
	pub async fn delete_brand(&self, id: &BrandId) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM brands WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		let deleted = result.rows_affected() > 0;
		if deleted {
			tracing::debug!(brand_id = %id, "brand deleted");
		}
		Ok(deleted)
	}
}

fn row_to_brand(row: &sqlx::sqlite::SqliteRow) -> Result<Brand, DbError> {
	let id: String = row.get("id");
	let org_id: String = row.get("organization_id");
	let created_at: String = row.get("created_at");

	Ok(Brand {
		id: id
			.parse()
			.map_err(|e| DbError::Internal(format!("Invalid brand ID: {e}")))?,
		org_id: org_id
			.parse()
			.map_err(|e| DbError::Internal(format!("Invalid organization_id: {e}")))?,
		name: row.get("name"),
		description: row.get("description"),
		created_at: parse_ts(&created_at, "created_at")?,
	})
}

#[async_trait]
impl BrandStore for BrandRepository {
	async fn create_brand(&self, brand: &Brand) -> Result<(), DbError> {
		self.create_brand(brand).await
	}

	async fn get_brand_by_id(&self, id: &BrandId) -> Result<Option<Brand>, DbError> {
		self.get_brand_by_id(id).await
	}

	async fn get_brand_org(&self, id: &BrandId) -> Result<Option<OrgId>, DbError> {
		self.get_brand_org(id).await
	}

	async fn list_brands_for_org(&self, org_id: &OrgId) -> Result<Vec<Brand>, DbError> {
		self.list_brands_for_org(org_id).await
	}

	async fn delete_brand(&self, id: &BrandId) -> Result<bool, DbError> {
		self.delete_brand(id).await
	}
}
