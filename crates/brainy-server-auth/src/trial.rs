// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Trial and subscription status.
//!
//! An organization is "in trial" only while both hold:
//!
//! - at least one (partial) day remains before `trial_ends_at`
//! - `subscription_status` is still `trial`
//!
//! A paid organization with a future `trial_ends_at` is therefore not in
//! trial, and an expired trial is never in trial whatever the stored status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::org::SubscriptionStatus;

const DAY_MS: i64 = 86_400_000;

/// Resolved trial state for one organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialStatus {
	pub is_in_trial: bool,
	pub days_remaining: i64,
	pub trial_ends_at: Option<DateTime<Utc>>,
	pub subscription_status: Option<SubscriptionStatus>,
}

impl TrialStatus {
	/// Computes trial state at `now`.
	///
	/// A missing `trial_ends_at` yields the default (not in trial, zero days)
	/// with the stored status attached.
	pub fn compute(
		trial_ends_at: Option<DateTime<Utc>>,
		subscription_status: SubscriptionStatus,
		now: DateTime<Utc>,
	) -> Self {
		let Some(ends_at) = trial_ends_at else {
			return Self {
				subscription_status: Some(subscription_status),
				..Self::default()
			};
		};

		let days_remaining = days_until(ends_at, now);
		Self {
			is_in_trial: days_remaining > 0 && subscription_status == SubscriptionStatus::Trial,
			days_remaining,
			trial_ends_at: Some(ends_at),
			subscription_status: Some(subscription_status),
		}
	}
}

/// Whole days left before `ends_at`, rounded up, never negative.
fn days_until(ends_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
	let ms = (ends_at - now).num_milliseconds();
	if ms <= 0 {
		return 0;
	}
	(ms + DAY_MS - 1) / DAY_MS
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, TimeZone};
	use proptest::prelude::*;

	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
	}

	#[test]
	fn ends_exactly_now_is_zero_days_and_not_in_trial() {
		for status in [SubscriptionStatus::Trial, SubscriptionStatus::Active] {
			let t = TrialStatus::compute(Some(now()), status, now());
			assert_eq!(t.days_remaining, 0);
			assert!(!t.is_in_trial);
		}
	}

	#[test]
	fn active_subscription_with_future_end_is_not_in_trial() {
		let t = TrialStatus::compute(
			Some(now() + Duration::days(10)),
			SubscriptionStatus::Active,
			now(),
		);
		assert_eq!(t.days_remaining, 10);
		assert!(!t.is_in_trial);
	}

	#[test]
	fn expired_trial_is_clamped_to_zero() {
		let t = TrialStatus::compute(
			Some(now() - Duration::days(1)),
			SubscriptionStatus::Trial,
			now(),
		);
		assert_eq!(t.days_remaining, 0);
		assert!(!t.is_in_trial);
		assert_eq!(t.subscription_status, Some(SubscriptionStatus::Trial));
	}

	#[test]
	fn partial_days_round_up() {
		let t = TrialStatus::compute(
			Some(now() + Duration::hours(1)),
			SubscriptionStatus::Trial,
			now(),
		);
		assert_eq!(t.days_remaining, 1);
		assert!(t.is_in_trial);

		let t = TrialStatus::compute(
			Some(now() + Duration::days(3) + Duration::milliseconds(1)),
			SubscriptionStatus::Trial,
			now(),
		);
		assert_eq!(t.days_remaining, 4);
	}

	#[test]
	fn missing_end_is_default() {
		let t = TrialStatus::compute(None, SubscriptionStatus::Trial, now());
		assert!(!t.is_in_trial);
		assert_eq!(t.days_remaining, 0);
		assert_eq!(t.trial_ends_at, None);
		assert_eq!(t.subscription_status, Some(SubscriptionStatus::Trial));
	}

	#[test]
	fn serializes_with_camel_case_keys() {
		let t = TrialStatus::compute(
			Some(now() + Duration::days(2)),
			SubscriptionStatus::Trial,
			now(),
		);
		let json = serde_json::to_value(t).unwrap();
		assert_eq!(json["isInTrial"], true);
		assert_eq!(json["daysRemaining"], 2);
		assert_eq!(json["subscriptionStatus"], "trial");
	}

	fn arb_status() -> impl Strategy<Value = SubscriptionStatus> {
		prop_oneof![
			Just(SubscriptionStatus::Trial),
			Just(SubscriptionStatus::Active),
			Just(SubscriptionStatus::PastDue),
			Just(SubscriptionStatus::Canceled),
			Just(SubscriptionStatus::Expired),
		]
	}

	/// Offsets of `trial_ends_at` from now, up to 60 days either way.
	fn arb_offset_ms() -> impl Strategy<Value = i64> {
		-60 * DAY_MS..=60 * DAY_MS
	}

	proptest! {
		#[test]
		fn days_remaining_is_never_negative(offset in arb_offset_ms(), status in arb_status()) {
			let t = TrialStatus::compute(Some(now() + Duration::milliseconds(offset)), status, now());
			prop_assert!(t.days_remaining >= 0);
		}

		#[test]
		fn in_trial_needs_trial_status_and_days_left(offset in arb_offset_ms(), status in arb_status()) {
			let t = TrialStatus::compute(Some(now() + Duration::milliseconds(offset)), status, now());
			if t.is_in_trial {
				prop_assert_eq!(status, SubscriptionStatus::Trial);
				prop_assert!(t.days_remaining > 0);
			}
		}

		#[test]
		fn ended_trial_is_never_in_trial(offset in -60 * DAY_MS..=0i64, status in arb_status()) {
			let t = TrialStatus::compute(Some(now() + Duration::milliseconds(offset)), status, now());
			prop_assert!(!t.is_in_trial);
			prop_assert_eq!(t.days_remaining, 0);
		}
	}
}
