// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Organization, membership and brand records.
//!
//! An [`Organization`] is the tenant. It has exactly one owner (`owner_id`)
//! and any number of [`OrgMembership`] rows. A [`Brand`] belongs to one
//! organization and inherits its access control.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{BrandId, OrgId, OrgRole, UserId};

/// Length of the trial granted to newly created organizations.
pub const DEFAULT_TRIAL_DAYS: i64 = 14;

/// Billing state of an organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
	#[default]
	Trial,
	Active,
	PastDue,
	Canceled,
	Expired,
}

impl SubscriptionStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			SubscriptionStatus::Trial => "trial",
			SubscriptionStatus::Active => "active",
			SubscriptionStatus::PastDue => "past_due",
			SubscriptionStatus::Canceled => "canceled",
			SubscriptionStatus::Expired => "expired",
		}
	}
}

impl fmt::Display for SubscriptionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SubscriptionStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"trial" => Ok(SubscriptionStatus::Trial),
			"active" => Ok(SubscriptionStatus::Active),
			"past_due" => Ok(SubscriptionStatus::PastDue),
			"canceled" | "cancelled" => Ok(SubscriptionStatus::Canceled),
			"expired" => Ok(SubscriptionStatus::Expired),
			_ => Err(format!("unknown subscription status: {s}")),
		}
	}
}

/// A tenant that owns brands and members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
	pub id: OrgId,
	pub name: String,
	pub slug: String,
	pub owner_id: UserId,
	pub subscription_status: SubscriptionStatus,
	pub trial_ends_at: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Organization {
	/// Create a new organization on a fresh trial.
	pub fn new(name: impl Into<String>, slug: impl Into<String>, owner_id: UserId) -> Self {
		let now = Utc::now();
		Self {
			id: OrgId::generate(),
			name: name.into(),
			slug: slug.into(),
			owner_id,
			subscription_status: SubscriptionStatus::Trial,
			trial_ends_at: Some(now + Duration::days(DEFAULT_TRIAL_DAYS)),
			created_at: now,
			updated_at: now,
		}
	}

	pub fn is_owned_by(&self, user_id: UserId) -> bool {
		self.owner_id == user_id
	}
}

/// A user's membership in an organization. Unique per `(org_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMembership {
	pub org_id: OrgId,
	pub user_id: UserId,
	pub role: OrgRole,
	pub created_at: DateTime<Utc>,
}

/// A marketing identity scoped to one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
	pub id: BrandId,
	pub org_id: OrgId,
	pub name: String,
	pub description: Option<String>,
	pub created_at: DateTime<Utc>,
}

impl Brand {
	pub fn new(org_id: OrgId, name: impl Into<String>, description: Option<String>) -> Self {
		Self {
			id: BrandId::generate(),
			org_id,
			name: name.into(),
			description,
			created_at: Utc::now(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_org_starts_on_trial() {
		let owner = UserId::generate();
		let org = Organization::new("Acme", "acme", owner);
		assert_eq!(org.subscription_status, SubscriptionStatus::Trial);
		assert!(org.is_owned_by(owner));
		assert!(!org.is_owned_by(UserId::generate()));

		let ends = org.trial_ends_at.unwrap();
		assert_eq!((ends - org.created_at).num_days(), DEFAULT_TRIAL_DAYS);
	}

	#[test]
	fn subscription_status_accepts_both_spellings_of_canceled() {
		assert_eq!(
			"cancelled".parse::<SubscriptionStatus>().unwrap(),
			SubscriptionStatus::Canceled
		);
		assert_eq!(
			"canceled".parse::<SubscriptionStatus>().unwrap(),
			SubscriptionStatus::Canceled
		);
	}

	#[test]
	fn subscription_status_roundtrips_through_str() {
		for status in [
			SubscriptionStatus::Trial,
			SubscriptionStatus::Active,
			SubscriptionStatus::PastDue,
			SubscriptionStatus::Canceled,
			SubscriptionStatus::Expired,
		] {
			assert_eq!(status.as_str().parse::<SubscriptionStatus>().unwrap(), status);
		}
		assert!("lifetime".parse::<SubscriptionStatus>().is_err());
	}
}
