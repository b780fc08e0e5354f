// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the job engine.

use thiserror::Error;

/// Result type for job engine operations.
pub type Result<T> = std::result::Result<T, JobError>;

/// Errors that can occur in job engine operations.
#[derive(Debug, Error)]
pub enum JobError {
	#[error("job already registered: {0}")]
	AlreadyRegistered(String),

	#[error("job not found: {0}")]
	NotFound(String),

	#[error("invalid cron expression: {0}")]
	InvalidCronExpression(String),

	#[error("invalid timezone: {0}")]
	InvalidTimezone(String),

	#[error("queue is closed")]
	QueueClosed,

	#[error("job cancelled")]
	Cancelled,

	#[error("job failed: {message}")]
	Failed { message: String },

	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("internal error: {0}")]
	Internal(String),
}
