// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pre-publish reminders for scheduled content.
//!
//! Each pass looks for items with `status = scheduled` due within
//! `[now, now + lookahead]` and reminds the author once per item for the
//! lifetime of this job. Ids are remembered in memory only; the stored
//! notification row is the durable record. An id is forgotten once its
//! scheduled time has passed, since it can no longer fall in the window.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use brainy_server_auth::ContentItemId;
use brainy_server_db::{ContentItem, ContentStore, DbError};
use brainy_server_jobs::{Job, JobContext, JobError, JobOutput};
use brainy_server_notifications::{NewNotification, NotificationKind, NotificationSink};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

pub const JOB_ID: &str = "scheduled-content-watcher";
pub const ENTITY_TYPE: &str = "content_item";

/// Counts from one check pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
	/// Items found in the window.
	pub due: usize,
	pub emitted: usize,
	pub already_notified: usize,
	pub failed: usize,
}

pub struct ScheduledContentJob {
	content: Arc<dyn ContentStore>,
	sink: Arc<dyn NotificationSink>,
	lookahead: Duration,
	notified: Mutex<HashMap<ContentItemId, DateTime<Utc>>>,
}

impl ScheduledContentJob {
	pub fn new(
		content: Arc<dyn ContentStore>,
		sink: Arc<dyn NotificationSink>,
		lookahead_minutes: u32,
	) -> Self {
		Self {
			content,
			sink,
			lookahead: Duration::minutes(i64::from(lookahead_minutes)),
			notified: Mutex::new(HashMap::new()),
		}
	}

	/// Runs one pass at `now`.
	///
	/// Only the window query can fail the pass. A failed reminder is logged
	/// and counted, and the item is not retried.
	#[tracing::instrument(skip(self), fields(lookahead_minutes = self.lookahead.num_minutes()))]
	pub async fn check(&self, now: DateTime<Utc>) -> Result<CheckOutcome, DbError> {
		let items = self
			.content
			.list_scheduled_between(now, now + self.lookahead)
			.await?;

		let mut outcome = CheckOutcome {
			due: items.len(),
			..CheckOutcome::default()
		};

		let fresh = self.claim_unnotified(items, now, &mut outcome).await;

		for (item, scheduled_at) in fresh {
			let minutes = minutes_until(scheduled_at, now);
			match self.sink.emit(reminder(&item, minutes)).await {
				Ok(notification_id) => {
					outcome.emitted += 1;
					tracing::debug!(content_item_id = %item.id, %notification_id, minutes, "reminder sent");
				}
				Err(e) => {
					outcome.failed += 1;
					tracing::warn!(content_item_id = %item.id, user_id = %item.user_id, error = %e, "failed to send reminder");
				}
			}
		}

		if outcome.due > 0 {
			tracing::info!(
				due = outcome.due,
				emitted = outcome.emitted,
				already_notified = outcome.already_notified,
				failed = outcome.failed,
				"scheduled content check finished"
			);
		}
		Ok(outcome)
	}

	/// Marks items as notified before any reminder goes out, so overlapping
	/// passes never remind twice.
	async fn claim_unnotified(
		&self,
		items: Vec<ContentItem>,
		now: DateTime<Utc>,
		outcome: &mut CheckOutcome,
	) -> Vec<(ContentItem, DateTime<Utc>)> {
		let mut notified = self.notified.lock().await;
		notified.retain(|_, scheduled_at| *scheduled_at >= now);

		let mut fresh = Vec::new();
		for item in items {
			let Some(scheduled_at) = item.scheduled_date else {
				continue;
			};
			if notified.insert(item.id, scheduled_at).is_some() {
				outcome.already_notified += 1;
			} else {
				fresh.push((item, scheduled_at));
			}
		}
		fresh
	}
}

/// Whole minutes from `now` to `at`, rounded to nearest.
fn minutes_until(at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
	((at - now).num_milliseconds() as f64 / 60_000.0).round() as i64
}

fn reminder(item: &ContentItem, minutes: i64) -> NewNotification {
	let unit = if minutes == 1 { "minute" } else { "minutes" };
	NewNotification::new(
		item.user_id,
		"Content publishing soon",
		format!("\"{}\" is scheduled to publish in {minutes} {unit}", item.title),
		NotificationKind::Reminder,
	)
	.with_entity(ENTITY_TYPE, item.id.to_string())
}

#[async_trait]
impl Job for ScheduledContentJob {
	fn id(&self) -> &str {
		JOB_ID
	}

	fn name(&self) -> &str {
		"Scheduled Content Watcher"
	}

	fn description(&self) -> &str {
		"Reminds authors about content due to publish soon"
	}

	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		if ctx.cancellation_token.is_cancelled() {
			return Err(JobError::Cancelled);
		}

		let outcome = self
			.check(Utc::now())
			.await
			.map_err(|e| JobError::transient(format!("scheduled content query failed: {e}")))?;

		Ok(JobOutput {
			message: format!(
				"Sent {} of {} reminders ({} failed)",
				outcome.emitted,
				outcome.due - outcome.already_notified,
				outcome.failed
			),
			metadata: serde_json::to_value(outcome).ok(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use brainy_server_auth::{NotificationId, User, UserId};
	use brainy_server_db::testing::create_test_pool;
	use brainy_server_db::{ContentRepository, NotificationRepository, UserRepository};
	use brainy_server_jobs::{CancellationToken, TriggerSource};
	use brainy_server_notifications::{NotificationEmitter, NotificationHub, NotifyError};
	use futures::StreamExt;
	use sqlx::SqlitePool;

	/// Records reminders; fails for titles containing "fail".
	#[derive(Default)]
	struct RecordingSink {
		sent: std::sync::Mutex<Vec<NewNotification>>,
	}

	impl RecordingSink {
		fn sent(&self) -> Vec<NewNotification> {
			self.sent.lock().unwrap().clone()
		}
	}

	#[async_trait]
	impl NotificationSink for RecordingSink {
		async fn emit(
			&self,
			notification: NewNotification,
		) -> brainy_server_notifications::Result<NotificationId> {
			if notification.message.contains("fail") {
				return Err(NotifyError::InvalidInput("refused".to_string()));
			}
			self.sent.lock().unwrap().push(notification);
			Ok(NotificationId::generate())
		}
	}

	struct Fixture {
		pool: SqlitePool,
		content: Arc<ContentRepository>,
		author: UserId,
	}

	async fn fixture() -> Fixture {
		let pool = create_test_pool().await;
		let author = User::new("author@example.com", None);
		UserRepository::new(pool.clone()).create_user(&author).await.unwrap();
		Fixture {
			content: Arc::new(ContentRepository::new(pool.clone())),
			pool,
			author: author.id,
		}
	}

	async fn schedule(f: &Fixture, title: &str, at: DateTime<Utc>) -> ContentItem {
		let item = ContentItem::scheduled(f.author, None, title, at);
		f.content.create_content_item(&item).await.unwrap();
		item
	}

	fn job_with(f: &Fixture, sink: Arc<dyn NotificationSink>) -> ScheduledContentJob {
		ScheduledContentJob::new(f.content.clone(), sink, 30)
	}

	#[test]
	fn minutes_round_to_nearest() {
		let now = Utc::now();
		assert_eq!(minutes_until(now + Duration::minutes(20), now), 20);
		assert_eq!(minutes_until(now + Duration::seconds(89), now), 1);
		assert_eq!(minutes_until(now + Duration::seconds(90), now), 2);
		assert_eq!(minutes_until(now, now), 0);
	}

	#[tokio::test]
	async fn item_is_reminded_once_per_session() {
		let f = fixture().await;
		let now = Utc::now();
		let item = schedule(&f, "Launch post", now + Duration::minutes(20)).await;
		let sink = Arc::new(RecordingSink::default());
		let job = job_with(&f, sink.clone());

		let first = job.check(now).await.unwrap();
		assert_eq!(first.due, 1);
		assert_eq!(first.emitted, 1);

		let second = job.check(now + Duration::minutes(1)).await.unwrap();
		assert_eq!(second.due, 1);
		assert_eq!(second.emitted, 0);
		assert_eq!(second.already_notified, 1);

		let sent = sink.sent();
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].user_id, f.author);
		assert_eq!(sent[0].kind, NotificationKind::Reminder);
		assert_eq!(sent[0].entity_type.as_deref(), Some(ENTITY_TYPE));
		assert_eq!(sent[0].entity_id, Some(item.id.to_string()));
		assert!(sent[0].message.contains("in 20 minutes"));
	}

	#[tokio::test]
	async fn only_items_inside_window_are_reminded() {
		let f = fixture().await;
		let now = Utc::now();
		schedule(&f, "past", now - Duration::minutes(1)).await;
		schedule(&f, "later", now + Duration::minutes(45)).await;
		schedule(&f, "soon", now + Duration::minutes(5)).await;
		let sink = Arc::new(RecordingSink::default());

		let outcome = job_with(&f, sink.clone()).check(now).await.unwrap();
		assert_eq!(outcome.due, 1);
		assert_eq!(sink.sent()[0].message, "\"soon\" is scheduled to publish in 5 minutes");
	}

	#[tokio::test]
	async fn one_failed_reminder_does_not_stop_the_rest() {
		let f = fixture().await;
		let now = Utc::now();
		schedule(&f, "will fail", now + Duration::minutes(2)).await;
		schedule(&f, "fine", now + Duration::minutes(3)).await;
		let sink = Arc::new(RecordingSink::default());
		let job = job_with(&f, sink.clone());

		let outcome = job.check(now).await.unwrap();
		assert_eq!(outcome.failed, 1);
		assert_eq!(outcome.emitted, 1);
		assert_eq!(sink.sent().len(), 1);

		let again = job.check(now).await.unwrap();
		assert_eq!(again.already_notified, 2);
		assert_eq!(again.failed, 0);
	}

	#[tokio::test]
	async fn passed_items_are_forgotten() {
		let f = fixture().await;
		let now = Utc::now();
		schedule(&f, "soon", now + Duration::minutes(10)).await;
		let job = job_with(&f, Arc::new(RecordingSink::default()));

		job.check(now).await.unwrap();
		assert_eq!(job.notified.lock().await.len(), 1);

		job.check(now + Duration::minutes(11)).await.unwrap();
		assert!(job.notified.lock().await.is_empty());
	}

	#[tokio::test]
	async fn reminders_are_stored_through_the_emitter() {
		let f = fixture().await;
		let now = Utc::now();
		schedule(&f, "Newsletter", now + Duration::minutes(30)).await;
		let store = Arc::new(NotificationRepository::new(f.pool.clone()));
		let hub = NotificationHub::new(8);
		let subscription = hub.subscribe(f.author).into_stream();
		tokio::pin!(subscription);
		let emitter = Arc::new(NotificationEmitter::new(store.clone(), hub));

		let outcome = job_with(&f, emitter).check(now).await.unwrap();
		assert_eq!(outcome.emitted, 1);

		let stored = store.list_for_user(&f.author, 10, true).await.unwrap();
		assert_eq!(stored.len(), 1);
		assert_eq!(stored[0].kind, NotificationKind::Reminder);
		assert_eq!(stored[0].title, "Content publishing soon");

		let pushed = subscription.next().await.unwrap();
		assert_eq!(pushed.id, stored[0].id);
	}

	#[tokio::test]
	async fn query_failure_fails_the_run_as_retryable() {
		let f = fixture().await;
		let job = job_with(&f, Arc::new(RecordingSink::default()));
		f.pool.close().await;

		let ctx = JobContext {
			run_id: "run".to_string(),
			triggered_by: TriggerSource::Manual,
			cancellation_token: CancellationToken::new(),
		};
		match job.run(&ctx).await {
			Err(JobError::Failed { retryable, .. }) => assert!(retryable),
			Err(other) => panic!("unexpected error: {other}"),
			Ok(_) => panic!("expected failure"),
		}
	}
}
