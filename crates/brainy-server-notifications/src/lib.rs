// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notification delivery for Brainy server.
//!
//! [`NotificationEmitter`] persists a notification and then publishes it on
//! the [`NotificationHub`]. The row is the durable record; the hub only
//! reaches sessions connected at that moment, and having none connected is
//! not an error.

pub mod emitter;
pub mod error;
pub mod hub;

pub use brainy_server_db::{NewNotification, Notification, NotificationKind};
pub use emitter::{NotificationEmitter, NotificationSink};
pub use error::{NotifyError, Result};
pub use hub::{NotificationHub, NotificationSubscription};
