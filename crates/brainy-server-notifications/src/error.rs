// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use brainy_server_db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
	#[error("Failed to store notification: {0}")]
	Store(#[from] DbError),

	#[error("Invalid notification: {0}")]
	InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, NotifyError>;
