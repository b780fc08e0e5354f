// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Health HTTP handler.

use axum::{extract::State, Json};
use ember_jobs::InvocationState;
use serde::Serialize;

use crate::{api::AppState, error::ServerError};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: String,
	pub timestamp: String,
	pub queue_depth: usize,
	pub worker_count: usize,
	pub schedule_count: usize,
	pub dead_invocations: u32,
}

/// GET /health - queue and scheduler visibility.
pub async fn health_check(
	State(state): State<AppState>,
) -> Result<Json<HealthResponse>, ServerError> {
	let dead_invocations = state.repository.count_in_state(InvocationState::Dead).await?;

	Ok(Json(HealthResponse {
		status: "ok".to_string(),
		timestamp: chrono::Utc::now().to_rfc3339(),
		queue_depth: state.scheduler.queue_depth(),
		worker_count: state.scheduler.worker_count(),
		schedule_count: state.scheduler.schedule_count(),
		dead_invocations,
	}))
}
