// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! # brainy-server-db
//!
//! Persistence layer for the Brainy server using SQLite via sqlx.
//!
//! ## Repository Pattern
//!
//! Each domain has two components:
//! - **`*Store` trait**: the interface the server depends on (e.g. `OrgStore`)
//! - **`*Repository` struct**: the SQLite implementation holding a `SqlitePool`
//!
//! Trait methods delegate to inherent methods on the repository, which carry
//! the `#[tracing::instrument]` spans.
//!
//! ## Error Handling
//!
//! | Variant | When |
//! |---------|------|
//! | `NotFound` | An update targeted a row that does not exist |
//! | `Conflict` | Unique constraint violation (slug, email, membership) |
//! | `Sqlx` | Anything unexpected from the database |
//! | `Internal` | Stored data that cannot be decoded (bad UUID, bad timestamp) |
//!
//! Lookups where absence is normal return `Result<Option<T>>`.
//!
//! ## Stored Enums
//!
//! Roles and statuses are stored as lowercase strings. An unrecognised
//! organization role fails the read with [`DbError::Internal`], so callers
//! that resolve access deny it. Unknown global roles are skipped and unknown
//! subscription statuses decode to `expired`.

pub mod brand;
pub mod content;
mod error;
pub mod job;
pub mod migrations;
pub mod notification;
pub mod org;
pub mod pool;
mod time;
pub mod user;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use brand::{BrandRepository, BrandStore};
pub use content::{ContentItem, ContentRepository, ContentStatus, ContentStore};
pub use error::{DbError, Result};
pub use job::{JobDefinition, JobRepository, JobRun, JobStatus, JobStore, TriggerSource};
pub use migrations::run_migrations;
pub use notification::{
	NewNotification, Notification, NotificationKind, NotificationRepository, NotificationStore,
};
pub use org::{OrgRepository, OrgStore};
pub use pool::create_pool;
pub use user::{UserRepository, UserStore};
