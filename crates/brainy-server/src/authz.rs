// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role resolution and permission checks against stored organizations.
//!
//! Effective role precedence is fixed:
//!
//! 1. global admin (checked once per request, short-circuits everything)
//! 2. organization owner (`organizations.owner_id`)
//! 3. membership role (`organization_members.role`)
//! 4. no access
//!
//! Every check has a `try_*` form that surfaces store errors and a plain form
//! that fails closed: the error is logged and the caller gets "no role" or
//! `false`.

use std::collections::BTreeMap;
use std::sync::Arc;

use brainy_server_auth::access::ResourceKind;
use brainy_server_auth::{is_allowed, Action, BrandId, OrgId, OrgRole, SubjectAttrs, UserId};
use brainy_server_db::{BrandStore, DbError, OrgStore, UserStore};
use tracing::instrument;

/// Who is asking, resolved once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessContext {
	pub user_id: UserId,
	pub is_global_admin: bool,
}

impl AccessContext {
	pub fn new(user_id: UserId, is_global_admin: bool) -> Self {
		Self {
			user_id,
			is_global_admin,
		}
	}

	/// Loads the global admin flag. A lookup failure leaves the flag unset.
	pub async fn load(users: &dyn UserStore, user_id: UserId) -> Self {
		let is_global_admin = match users.is_global_admin(&user_id).await {
			Ok(admin) => admin,
			Err(e) => {
				tracing::warn!(%user_id, error = %e, "global admin lookup failed, treating as non-admin");
				false
			}
		};
		Self::new(user_id, is_global_admin)
	}

	fn subject(&self, org_role: Option<OrgRole>) -> SubjectAttrs {
		let subject = SubjectAttrs::new(self.user_id).with_global_admin(self.is_global_admin);
		match org_role {
			Some(role) => subject.with_org_role(role),
			None => subject,
		}
	}
}

/// Resolves a user's effective role in an organization.
#[derive(Clone)]
pub struct RoleResolver {
	orgs: Arc<dyn OrgStore>,
}

impl RoleResolver {
	pub fn new(orgs: Arc<dyn OrgStore>) -> Self {
		Self { orgs }
	}

	/// Owner first, then membership. Two point lookups, never a join, and the
	/// membership lookup is skipped for the owner.
	#[instrument(level = "debug", skip_all, fields(%user_id, %org_id))]
	pub async fn try_resolve_org_role(
		&self,
		user_id: &UserId,
		org_id: &OrgId,
	) -> Result<Option<OrgRole>, DbError> {
		if self.orgs.get_org_owner(org_id).await? == Some(*user_id) {
			return Ok(Some(OrgRole::Owner));
		}

		let membership = self.orgs.get_membership(org_id, user_id).await?;
		Ok(membership.map(|m| m.role))
	}

	pub async fn resolve_org_role(&self, user_id: &UserId, org_id: &OrgId) -> Option<OrgRole> {
		match self.try_resolve_org_role(user_id, org_id).await {
			Ok(role) => role,
			Err(e) => {
				tracing::warn!(%user_id, %org_id, error = %e, "role resolution failed, denying access");
				None
			}
		}
	}
}

/// Boolean decisions for organization and brand actions.
#[derive(Clone)]
pub struct PermissionGate {
	resolver: RoleResolver,
	brands: Arc<dyn BrandStore>,
}

impl PermissionGate {
	pub fn new(resolver: RoleResolver, brands: Arc<dyn BrandStore>) -> Self {
		Self { resolver, brands }
	}

	pub fn resolver(&self) -> &RoleResolver {
		&self.resolver
	}

	pub async fn try_can_org(
		&self,
		ctx: &AccessContext,
		org_id: &OrgId,
		action: Action,
	) -> Result<bool, DbError> {
		if ctx.is_global_admin {
			return Ok(true);
		}
		let role = self.resolver.try_resolve_org_role(&ctx.user_id, org_id).await?;
		Ok(is_allowed(&ctx.subject(role), action))
	}

	/// Brands carry no ACL of their own; the owning organization decides.
	/// A brand that does not exist is denied.
	pub async fn try_can_brand(
		&self,
		ctx: &AccessContext,
		brand_id: &BrandId,
		action: Action,
	) -> Result<bool, DbError> {
		if ctx.is_global_admin {
			return Ok(true);
		}
		match self.brands.get_brand_org(brand_id).await? {
			Some(org_id) => self.try_can_org(ctx, &org_id, action).await,
			None => Ok(false),
		}
	}

	pub async fn can_org(&self, ctx: &AccessContext, org_id: &OrgId, action: Action) -> bool {
		match self.try_can_org(ctx, org_id, action).await {
			Ok(allowed) => allowed,
			Err(e) => {
				tracing::warn!(user_id = %ctx.user_id, %org_id, action = action.as_str(), error = %e, "permission check failed, denying");
				false
			}
		}
	}

	pub async fn can_brand(&self, ctx: &AccessContext, brand_id: &BrandId, action: Action) -> bool {
		match self.try_can_brand(ctx, brand_id, action).await {
			Ok(allowed) => allowed,
			Err(e) => {
				tracing::warn!(user_id = %ctx.user_id, %brand_id, action = action.as_str(), error = %e, "permission check failed, denying");
				false
			}
		}
	}

	pub async fn can_edit_organization(&self, ctx: &AccessContext, org_id: &OrgId) -> bool {
		self.can_org(ctx, org_id, Action::EditOrganization).await
	}

	pub async fn can_delete_organization(&self, ctx: &AccessContext, org_id: &OrgId) -> bool {
		self.can_org(ctx, org_id, Action::DeleteOrganization).await
	}

	pub async fn can_manage_members(&self, ctx: &AccessContext, org_id: &OrgId) -> bool {
		self.can_org(ctx, org_id, Action::ManageMembers).await
	}

	pub async fn can_create_brand(&self, ctx: &AccessContext, org_id: &OrgId) -> bool {
		self.can_org(ctx, org_id, Action::CreateBrand).await
	}

	pub async fn can_edit_brand(&self, ctx: &AccessContext, brand_id: &BrandId) -> bool {
		self.can_brand(ctx, brand_id, Action::EditBrand).await
	}

	pub async fn can_delete_brand(&self, ctx: &AccessContext, brand_id: &BrandId) -> bool {
		self.can_brand(ctx, brand_id, Action::DeleteBrand).await
	}

	/// Every organization-scoped action with its decision, resolving the role
	/// once. Fails closed to all-`false` (all-`true` for global admins).
	pub async fn org_permissions(
		&self,
		ctx: &AccessContext,
		org_id: &OrgId,
	) -> BTreeMap<&'static str, bool> {
		let role = if ctx.is_global_admin {
			None
		} else {
			self.resolver.resolve_org_role(&ctx.user_id, org_id).await
		};
		decisions(ctx, role, ResourceKind::Organization)
	}

	/// Every brand-scoped action with its decision.
	pub async fn brand_permissions(
		&self,
		ctx: &AccessContext,
		brand_id: &BrandId,
	) -> BTreeMap<&'static str, bool> {
		let role = if ctx.is_global_admin {
			None
		} else {
			match self.brands.get_brand_org(brand_id).await {
				Ok(Some(org_id)) => self.resolver.resolve_org_role(&ctx.user_id, &org_id).await,
				Ok(None) => None,
				Err(e) => {
					tracing::warn!(user_id = %ctx.user_id, %brand_id, error = %e, "brand lookup failed, denying");
					None
				}
			}
		};
		decisions(ctx, role, ResourceKind::Brand)
	}
}

fn decisions(
	ctx: &AccessContext,
	role: Option<OrgRole>,
	kind: ResourceKind,
) -> BTreeMap<&'static str, bool> {
	let subject = ctx.subject(role);
	Action::all()
		.iter()
		.filter(|a| a.resource_kind() == kind)
		.map(|a| (a.as_str(), is_allowed(&subject, *a)))
		.collect()
}
