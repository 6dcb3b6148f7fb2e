// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process fan-out of newly stored notifications.

use brainy_server_auth::UserId;
use brainy_server_db::Notification;
use futures::Stream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::StreamExt;

/// Broadcasts every published notification to all subscriptions; each
/// subscription keeps only its own user's notifications.
#[derive(Clone)]
pub struct NotificationHub {
	tx: broadcast::Sender<Notification>,
}

impl NotificationHub {
	pub fn new(capacity: usize) -> Self {
		let (tx, _) = broadcast::channel(capacity.max(1));
		Self { tx }
	}

	/// Returns how many subscriptions received the notification.
	pub fn publish(&self, notification: Notification) -> usize {
		match self.tx.send(notification) {
			Ok(receivers) => receivers,
			Err(_) => 0,
		}
	}

	pub fn subscribe(&self, user_id: UserId) -> NotificationSubscription {
		NotificationSubscription {
			user_id,
			rx: self.tx.subscribe(),
		}
	}
}

pub struct NotificationSubscription {
	user_id: UserId,
	rx: broadcast::Receiver<Notification>,
}

impl NotificationSubscription {
	pub fn user_id(&self) -> UserId {
		self.user_id
	}

	/// Notifications for this user as they are published. The stream ends
	/// once the hub is gone. A subscription that falls behind skips what it
	/// missed and carries on.
	pub fn into_stream(self) -> impl Stream<Item = Notification> + Send + 'static {
		let user_id = self.user_id;
		BroadcastStream::new(self.rx).filter_map(move |result| match result {
			Ok(n) if n.user_id == user_id => Some(n),
			Ok(_) => None,
			Err(BroadcastStreamRecvError::Lagged(skipped)) => {
				tracing::warn!(user_id = %user_id, skipped, "notification stream lagged");
				None
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use brainy_server_auth::NotificationId;
	use brainy_server_db::NotificationKind;

	fn notification(user_id: UserId, title: &str) -> Notification {
		Notification {
			id: NotificationId::generate(),
			user_id,
			title: title.to_string(),
			message: "m".to_string(),
			kind: NotificationKind::Info,
			entity_type: None,
			entity_id: None,
			is_read: false,
			created_at: chrono::Utc::now(),
		}
	}

	#[tokio::test]
	async fn publish_without_subscribers_is_fine() {
		let hub = NotificationHub::new(8);
		assert_eq!(hub.publish(notification(UserId::generate(), "t")), 0);
	}

	#[tokio::test]
	async fn subscription_sees_only_its_user() {
		let hub = NotificationHub::new(8);
		let alice = UserId::generate();
		let bob = UserId::generate();
		let sub = hub.subscribe(alice).into_stream();
		tokio::pin!(sub);

		hub.publish(notification(bob, "for bob"));
		hub.publish(notification(alice, "for alice"));

		let got = sub.next().await.unwrap();
		assert_eq!(got.title, "for alice");
	}

	#[tokio::test]
	async fn lagging_subscription_keeps_going() {
		let hub = NotificationHub::new(2);
		let user = UserId::generate();
		let sub = hub.subscribe(user).into_stream();
		tokio::pin!(sub);

		for i in 0..5 {
			hub.publish(notification(user, &format!("n{i}")));
		}

		assert_eq!(sub.next().await.unwrap().title, "n3");
		assert_eq!(sub.next().await.unwrap().title, "n4");
	}

	#[tokio::test]
	async fn stream_ends_when_hub_dropped() {
		let hub = NotificationHub::new(2);
		let sub = hub.subscribe(UserId::generate()).into_stream();
		tokio::pin!(sub);
		drop(hub);
		assert!(sub.next().await.is_none());
	}
}
