// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for brainy-server.

pub mod auth;
pub mod database;
pub mod http;
pub mod jobs;
pub mod logging;
pub mod notifications;
pub mod watcher;

pub use auth::{AuthConfig, AuthConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use jobs::{JobsConfig, JobsConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use notifications::{NotificationsConfig, NotificationsConfigLayer};
pub use watcher::{WatcherConfig, WatcherConfigLayer};
