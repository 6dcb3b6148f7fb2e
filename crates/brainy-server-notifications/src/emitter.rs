// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use brainy_server_auth::NotificationId;
use brainy_server_db::{NewNotification, NotificationStore};
use std::sync::Arc;

use crate::error::{NotifyError, Result};
use crate::hub::NotificationHub;

/// Anything that can raise a notification for a user.
#[async_trait]
pub trait NotificationSink: Send + Sync {
	/// Store the notification and deliver it to live sessions.
	///
	/// Storage failures are returned so the caller decides whether to retry.
	async fn emit(&self, notification: NewNotification) -> Result<NotificationId>;
}

/// Persists notifications, then pushes them to the realtime hub.
#[derive(Clone)]
pub struct NotificationEmitter {
	store: Arc<dyn NotificationStore>,
	hub: NotificationHub,
}

impl NotificationEmitter {
	pub fn new(store: Arc<dyn NotificationStore>, hub: NotificationHub) -> Self {
		Self { store, hub }
	}

	pub fn hub(&self) -> &NotificationHub {
		&self.hub
	}
}

fn validate(notification: &NewNotification) -> Result<()> {
	if notification.title.trim().is_empty() {
		return Err(NotifyError::InvalidInput("title must not be empty".to_string()));
	}
	if notification.message.trim().is_empty() {
		return Err(NotifyError::InvalidInput(
			"message must not be empty".to_string(),
		));
	}
	if notification.entity_type.is_some() != notification.entity_id.is_some() {
		return Err(NotifyError::InvalidInput(
			"entity_type and entity_id must be set together".to_string(),
		));
	}
	Ok(())
}

#[async_trait]
impl NotificationSink for NotificationEmitter {
	#[tracing::instrument(skip(self, notification), fields(user_id = %notification.user_id, kind = %notification.kind))]
	async fn emit(&self, notification: NewNotification) -> Result<NotificationId> {
		validate(&notification)?;

		let stored = match self.store.create_notification(&notification).await {
			Ok(stored) => stored,
			Err(e) => {
				tracing::warn!(user_id = %notification.user_id, error = %e, "failed to store notification");
				return Err(e.into());
			}
		};

		let id = stored.id;
		let delivered = self.hub.publish(stored);
		tracing::debug!(notification_id = %id, delivered, "notification emitted");
		Ok(id)
	}
}
