// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity, role and access policy types for Brainy.
//!
//! Everything in this crate is pure: no database access, no clocks read
//! implicitly. Callers load the facts (ownership, membership, global roles,
//! subscription state) and hand them to the policy and trial functions here.
//!
//! - [`types`]: ID newtypes and the closed role enums
//! - [`user`], [`org`]: entity records shared by the persistence and HTTP layers
//! - [`access`]: the action allow-list and [`is_allowed`]
//! - [`trial`]: trial/subscription status computation

pub mod access;
pub mod org;
pub mod trial;
pub mod types;
pub mod user;

pub use access::{is_allowed, Action, SubjectAttrs};
pub use org::{Brand, OrgMembership, Organization, SubscriptionStatus};
pub use trial::TrialStatus;
pub use types::{
	BrandId, ContentItemId, GlobalRole, NotificationId, OrgId, OrgRole, RoleParseError, UserId,
};
pub use user::User;
