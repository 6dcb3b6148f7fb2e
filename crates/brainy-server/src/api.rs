// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and route table.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use brainy_server_config::ServerConfig;
use brainy_server_db::{
	BrandRepository, BrandStore, NotificationRepository, NotificationStore, OrgRepository, OrgStore,
	UserRepository, UserStore,
};
use brainy_server_jobs::JobScheduler;
use brainy_server_notifications::{NotificationEmitter, NotificationHub};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use crate::authz::{PermissionGate, RoleResolver};
use crate::routes;
use crate::trial::TrialResolver;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub users: Arc<dyn UserStore>,
	pub orgs: Arc<dyn OrgStore>,
	pub brands: Arc<dyn BrandStore>,
	pub notifications: Arc<dyn NotificationStore>,
	pub gate: PermissionGate,
	pub trial: TrialResolver,
	pub emitter: NotificationEmitter,
	/// Lowercase name of the identity header.
	pub user_header: String,
	pub job_scheduler: Option<Arc<JobScheduler>>,
}

impl AppState {
	pub fn resolver(&self) -> &RoleResolver {
		self.gate.resolver()
	}
}

/// Wires repositories over `pool`. The job scheduler is attached later by
/// the binary once jobs are registered.
pub fn create_app_state(pool: SqlitePool, config: &ServerConfig) -> AppState {
	let users: Arc<dyn UserStore> = Arc::new(UserRepository::new(pool.clone()));
	let orgs: Arc<dyn OrgStore> = Arc::new(OrgRepository::new(pool.clone()));
	let brands: Arc<dyn BrandStore> = Arc::new(BrandRepository::new(pool.clone()));
	let notifications: Arc<dyn NotificationStore> =
		Arc::new(NotificationRepository::new(pool.clone()));

	let hub = NotificationHub::new(config.notifications.channel_capacity);
	let emitter = NotificationEmitter::new(Arc::clone(&notifications), hub);
	let gate = PermissionGate::new(RoleResolver::new(Arc::clone(&orgs)), Arc::clone(&brands));
	let trial = TrialResolver::new(Arc::clone(&orgs));

	AppState {
		pool,
		users,
		orgs,
		brands,
		notifications,
		gate,
		trial,
		emitter,
		user_header: config.auth.user_header.clone(),
		job_scheduler: None,
	}
}

pub fn create_router(state: AppState) -> Router {
	let api = Router::new()
		.route("/me", get(routes::me::get_me))
		.route("/orgs", get(routes::orgs::list_orgs))
		.route("/orgs/{org_id}/role", get(routes::orgs::get_role))
		.route("/orgs/{org_id}/permissions", get(routes::orgs::get_permissions))
		.route("/orgs/{org_id}/trial", get(routes::orgs::get_trial))
		.route(
			"/orgs/{org_id}/members",
			get(routes::members::list_members).post(routes::members::add_member),
		)
		.route(
			"/orgs/{org_id}/members/{user_id}",
			axum::routing::patch(routes::members::update_member)
				.delete(routes::members::remove_member),
		)
		.route(
			"/orgs/{org_id}/brands",
			get(routes::brands::list_brands).post(routes::brands::create_brand),
		)
		.route(
			"/brands/{brand_id}",
			axum::routing::delete(routes::brands::delete_brand),
		)
		.route(
			"/brands/{brand_id}/permissions",
			get(routes::brands::get_brand_permissions),
		)
		.route(
			"/notifications",
			get(routes::notifications::list_notifications),
		)
		.route(
			"/notifications/unread-count",
			get(routes::notifications::unread_count),
		)
		.route(
			"/notifications/read-all",
			post(routes::notifications::mark_all_read),
		)
		.route(
			"/notifications/stream",
			get(routes::notifications::notification_stream),
		)
		.route(
			"/notifications/{notification_id}/read",
			post(routes::notifications::mark_read),
		);

	Router::new()
		.route("/health", get(routes::health::health_check))
		.nest("/api", api)
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}
