// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Brainy server: access control, trial status, notifications and the
//! scheduled-content watcher behind an HTTP API.

pub mod api;
pub mod authz;
pub mod error;
pub mod identity;
pub mod jobs;
pub mod routes;
pub mod trial;

pub use api::{create_app_state, create_router, AppState};
pub use authz::{AccessContext, PermissionGate, RoleResolver};
pub use error::ServerError;
pub use identity::{CurrentUser, RequireUser};
pub use trial::TrialResolver;
