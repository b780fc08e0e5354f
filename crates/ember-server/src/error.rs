// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Server error type and HTTP mapping.

use axum::{http::StatusCode, response::IntoResponse, Json};
use ember_jobs::JobError;
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ServerError {
	#[error("validation error: {0}")]
	Validation(String),

	#[error("not found: {0}")]
	NotFound(String),

	#[error(transparent)]
	Job(#[from] JobError),

	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	#[error("internal error: {0}")]
	Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

impl IntoResponse for ServerError {
	fn into_response(self) -> axum::response::Response {
		let (status, error) = match &self {
			ServerError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
			ServerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
			// An unregistered job name or malformed schedule is a caller
			// mistake; an unavailable queue is an infrastructure failure
			// and must not be reported as fire-and-forget success.
			ServerError::Job(JobError::NotFound(_))
			| ServerError::Job(JobError::InvalidCronExpression(_))
			| ServerError::Job(JobError::InvalidTimezone(_)) => {
				(StatusCode::BAD_REQUEST, "validation_error")
			}
			ServerError::Job(JobError::QueueClosed) => {
				(StatusCode::SERVICE_UNAVAILABLE, "queue_unavailable")
			}
			_ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
		};

		if status.is_server_error() {
			tracing::error!(error = %self, "request failed");
		}

		(
			status,
			Json(ErrorResponse {
				error: error.to_string(),
				message: self.to_string(),
			}),
		)
			.into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_unknown_job_maps_to_bad_request() {
		let response =
			ServerError::Job(JobError::NotFound("missing".to_string())).into_response();
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	}

	#[test]
	fn test_queue_closed_maps_to_service_unavailable() {
		let response = ServerError::Job(JobError::QueueClosed).into_response();
		assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
	}

	#[test]
	fn test_not_found_maps_to_404() {
		let response = ServerError::NotFound("invocation x".to_string()).into_response();
		assert_eq!(response.status(), StatusCode::NOT_FOUND);
	}

	#[test]
	fn test_database_error_maps_to_500() {
		let response = ServerError::Database(sqlx::Error::PoolClosed).into_response();
		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}
}
