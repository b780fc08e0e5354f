// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Read-only job observability routes.

use axum::{
	extract::{Path, Query, State},
	Json,
};
use ember_jobs::{InvocationRecord, RecurringSchedule};
use serde::{Deserialize, Serialize};

use crate::{api::AppState, error::ServerError};

#[derive(Debug, Serialize)]
pub struct JobInfo {
	pub name: String,
	pub description: String,
	pub max_attempts: u32,
}

#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
	pub jobs: Vec<JobInfo>,
}

#[derive(Debug, Serialize)]
pub struct ListSchedulesResponse {
	pub schedules: Vec<RecurringSchedule>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
	#[serde(default = "default_limit")]
	pub limit: u32,
	#[serde(default)]
	pub offset: u32,
}

fn default_limit() -> u32 {
	50
}

#[derive(Debug, Serialize)]
pub struct InvocationHistoryResponse {
	pub invocations: Vec<InvocationRecord>,
	pub limit: u32,
	pub offset: u32,
}

#[derive(Debug, Serialize)]
pub struct DeadInvocationsResponse {
	pub invocations: Vec<InvocationRecord>,
}

/// GET /api/v1/jobs - registered job handlers.
pub async fn list_jobs(State(state): State<AppState>) -> Json<ListJobsResponse> {
	let mut jobs: Vec<JobInfo> = state
		.scheduler
		.registry()
		.jobs()
		.map(|job| JobInfo {
			name: job.name().to_string(),
			description: job.description().to_string(),
			max_attempts: job.max_attempts(),
		})
		.collect();
	jobs.sort_by(|a, b| a.name.cmp(&b.name));

	Json(ListJobsResponse { jobs })
}

/// GET /api/v1/jobs/schedules - recurring schedules.
pub async fn list_schedules(State(state): State<AppState>) -> Json<ListSchedulesResponse> {
	Json(ListSchedulesResponse {
		schedules: state.scheduler.list_schedules(),
	})
}

/// GET /api/v1/jobs/invocations - invocation history, newest first.
pub async fn list_invocations(
	State(state): State<AppState>,
	Query(query): Query<HistoryQuery>,
) -> Result<Json<InvocationHistoryResponse>, ServerError> {
	let invocations = state.repository.list(query.limit, query.offset).await?;

	Ok(Json(InvocationHistoryResponse {
		invocations,
		limit: query.limit,
		offset: query.offset,
	}))
}

/// GET /api/v1/jobs/invocations/{id} - one invocation.
pub async fn get_invocation(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<InvocationRecord>, ServerError> {
	let record = state
		.repository
		.get(&id)
		.await?
		.ok_or_else(|| ServerError::NotFound(format!("invocation {id}")))?;

	Ok(Json(record))
}

/// GET /api/v1/jobs/dead - invocations that exhausted their retry budget.
pub async fn list_dead(
	State(state): State<AppState>,
) -> Result<Json<DeadInvocationsResponse>, ServerError> {
	let invocations = state.repository.list_dead(50).await?;
	Ok(Json(DeadInvocationsResponse { invocations }))
}
