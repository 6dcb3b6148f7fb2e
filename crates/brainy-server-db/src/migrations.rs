// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

const MIGRATIONS: &[(&str, &str)] = &[(
	"001_initial",
	include_str!("../migrations/001_initial.sql"),
)];

/// Run all database migrations.
///
/// Every statement is `CREATE ... IF NOT EXISTS`, so this is safe to run on
/// each startup.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for (name, sql) in MIGRATIONS {
		for stmt in sql.split(';').filter(|s| !is_blank(s)) {
			sqlx::query(stmt).execute(pool).await?;
		}
		tracing::debug!(migration = %name, "migration applied");
	}
	Ok(())
}

fn is_blank(stmt: &str) -> bool {
	stmt
		.lines()
		.map(str::trim)
		.all(|line| line.is_empty() || line.starts_with("--"))
}
