// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background jobs registered with the scheduler.

pub mod job_history_cleanup;
pub mod scheduled_content;

pub use job_history_cleanup::JobHistoryCleanupJob;
pub use scheduled_content::{CheckOutcome, ScheduledContentJob};
