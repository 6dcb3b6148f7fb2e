// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Trial status lookup for stored organizations.

use std::sync::Arc;

use brainy_server_auth::{OrgId, TrialStatus};
use brainy_server_db::{DbError, OrgStore};
use chrono::{DateTime, Utc};

#[derive(Clone)]
pub struct TrialResolver {
	orgs: Arc<dyn OrgStore>,
}

impl TrialResolver {
	pub fn new(orgs: Arc<dyn OrgStore>) -> Self {
		Self { orgs }
	}

	/// Errors with `NotFound` for an unknown organization.
	#[tracing::instrument(level = "debug", skip_all, fields(%org_id))]
	pub async fn try_resolve(
		&self,
		org_id: &OrgId,
		now: DateTime<Utc>,
	) -> Result<TrialStatus, DbError> {
		let org = self
			.orgs
			.get_org_by_id(org_id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("organization {org_id}")))?;
		Ok(TrialStatus::compute(
			org.trial_ends_at,
			org.subscription_status,
			now,
		))
	}

	/// Fails closed to "not in trial".
	pub async fn resolve(&self, org_id: &OrgId) -> TrialStatus {
		match self.try_resolve(org_id, Utc::now()).await {
			Ok(status) => status,
			Err(e) => {
				tracing::warn!(%org_id, error = %e, "trial status lookup failed, reporting no trial");
				TrialStatus::default()
			}
		}
	}
}
