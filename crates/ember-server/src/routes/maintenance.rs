// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! On-demand maintenance triggers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use ember_jobs::TriggerSource;
use serde::Serialize;

use crate::{api::AppState, error::ServerError, jobs::HTTP_LOG_PURGE_JOB};

#[derive(Debug, Serialize)]
pub struct TriggerPurgeResponse {
	pub invocation_id: String,
	pub message: String,
}

/// POST /api/v1/maintenance/purge-http-logs
///
/// Enqueues one HTTP-log purge invocation with the short day threshold and
/// returns immediately. Fire-and-forget: a 202 says the invocation was
/// queued, nothing about its eventual outcome.
pub async fn trigger_purge(
	State(state): State<AppState>,
) -> Result<impl IntoResponse, ServerError> {
	let days = state.config.jobs.manual_purge_days;
	let invocation_id = state
		.scheduler
		.enqueue(
			HTTP_LOG_PURGE_JOB,
			serde_json::json!({ "days": days }),
			TriggerSource::Manual,
		)
		.await?;

	Ok((
		StatusCode::ACCEPTED,
		Json(TriggerPurgeResponse {
			invocation_id,
			message: format!("queued purge of http log entries older than {days} days"),
		}),
	))
}
