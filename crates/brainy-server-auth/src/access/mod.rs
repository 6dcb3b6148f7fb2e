// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role-based permission policy.
//!
//! Decisions are a pure function of who is asking ([`SubjectAttrs`]) and what
//! they want to do ([`Action`]). All lookups (global admin flag, effective
//! organization role) happen before evaluation, so the policy itself never
//! touches the database.
//!
//! ```text
//! is_allowed(subject, action)
//!     │
//!     ├── Global admin → always allowed
//!     │
//!     └── Effective org role in action.allowed_roles()?
//!         ├── yes → allowed
//!         └── no role / not listed → denied
//! ```
//!
//! # Example
//!
//! ```
//! use brainy_server_auth::access::{is_allowed, Action, SubjectAttrs};
//! use brainy_server_auth::{OrgRole, UserId};
//!
//! let subject = SubjectAttrs::new(UserId::generate()).with_org_role(OrgRole::Editor);
//!
//! assert!(is_allowed(&subject, Action::CreateBrand));
//! assert!(!is_allowed(&subject, Action::DeleteOrganization));
//! ```

pub mod engine;
pub mod types;

pub use engine::*;
pub use types::*;
