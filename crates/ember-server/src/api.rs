// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Application state and router wiring.

use axum::{
	extract::{Request, State},
	middleware::{self, Next},
	response::Response,
	routing::{get, post},
	Router,
};
use ember_jobs::{InvocationRepository, JobRegistry, JobScheduler, SchedulerOptions};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};

use crate::{
	config::ServerConfig,
	error::ServerError,
	http_log::HttpLogRepository,
	jobs::HttpLogPurgeJob,
	routes,
};

#[derive(Clone)]
pub struct AppState {
	pub scheduler: Arc<JobScheduler>,
	pub repository: Arc<InvocationRepository>,
	pub http_log: HttpLogRepository,
	pub config: Arc<ServerConfig>,
}

/// Initialize storage, build the job registry, and assemble the scheduler.
///
/// The registry is sealed here: handlers are registered before the
/// scheduler or any HTTP route can observe it.
pub async fn create_app_state(
	pool: SqlitePool,
	config: &ServerConfig,
) -> Result<AppState, ServerError> {
	InvocationRepository::init_schema(&pool).await?;
	HttpLogRepository::init_schema(&pool).await?;

	let repository = Arc::new(InvocationRepository::new(pool.clone()));
	let http_log = HttpLogRepository::new(pool);

	let mut registry = JobRegistry::new();
	registry.register(Arc::new(HttpLogPurgeJob::new(http_log.clone())))?;

	let scheduler = Arc::new(JobScheduler::new(
		Arc::new(registry),
		Arc::clone(&repository),
		SchedulerOptions {
			worker_count: config.jobs.worker_count,
			tick_interval: Duration::from_secs(1),
		},
	));

	Ok(AppState {
		scheduler,
		repository,
		http_log,
		config: Arc::new(config.clone()),
	})
}

/// Record every request into the http_log table the purge job cleans up.
/// Logging failures never fail the request.
async fn http_log_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
	let method = req.method().to_string();
	let path = req.uri().path().to_string();

	let response = next.run(req).await;

	if let Err(e) = state
		.http_log
		.record(&method, &path, response.status().as_u16())
		.await
	{
		tracing::warn!(error = %e, "failed to record http log entry");
	}

	response
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.route(
			"/api/v1/maintenance/purge-http-logs",
			post(routes::maintenance::trigger_purge),
		)
		.route("/api/v1/jobs", get(routes::jobs::list_jobs))
		.route("/api/v1/jobs/schedules", get(routes::jobs::list_schedules))
		.route(
			"/api/v1/jobs/invocations",
			get(routes::jobs::list_invocations),
		)
		.route(
			"/api/v1/jobs/invocations/{id}",
			get(routes::jobs::get_invocation),
		)
		.route("/api/v1/jobs/dead", get(routes::jobs::list_dead))
		.layer(middleware::from_fn_with_state(
			state.clone(),
			http_log_middleware,
		))
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		)
		.with_state(state)
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::body::Body;
	use axum::http::{Request as HttpRequest, StatusCode};
	use chrono::Utc;
	use ember_jobs::InvocationState;
	use tempfile::tempdir;
	use tower::ServiceExt;

	async fn create_test_state() -> (AppState, SqlitePool, tempfile::TempDir) {
		let dir = tempdir().unwrap();
		let db_path = dir.path().join("test.db");
		let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
		let pool = crate::db::create_pool(&db_url).await.unwrap();

		let config = ServerConfig::default();
		let state = create_app_state(pool.clone(), &config).await.unwrap();
		(state, pool, dir)
	}

	async fn create_test_app() -> (Router, AppState, SqlitePool, tempfile::TempDir) {
		let (state, pool, dir) = create_test_state().await;
		(create_router(state.clone()), state, pool, dir)
	}

	async fn body_json(response: Response) -> serde_json::Value {
		let body = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		serde_json::from_slice(&body).unwrap()
	}

	#[tokio::test]
	async fn test_health_check() {
		let (app, _state, _pool, _dir) = create_test_app().await;

		let response = app
			.oneshot(
				HttpRequest::builder()
					.uri("/health")
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::OK);
		let health = body_json(response).await;
		assert_eq!(health["status"], "ok");
		assert_eq!(health["worker_count"], 40);
	}

	#[tokio::test]
	async fn test_trigger_purge_returns_accepted_with_invocation_id() {
		let (app, state, _pool, _dir) = create_test_app().await;

		let response = app
			.oneshot(
				HttpRequest::builder()
					.method("POST")
					.uri("/api/v1/maintenance/purge-http-logs")
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::ACCEPTED);
		let body = body_json(response).await;
		let invocation_id = body["invocation_id"].as_str().unwrap();

		// Recorded as pending; the worker pool was never started.
		let record = state.repository.get(invocation_id).await.unwrap().unwrap();
		assert_eq!(record.state, InvocationState::Pending);
		assert_eq!(record.args, serde_json::json!({ "days": 1 }));
	}

	#[tokio::test]
	async fn test_trigger_purge_after_shutdown_is_unavailable() {
		let (app, state, _pool, _dir) = create_test_app().await;
		state.scheduler.shutdown().await;

		let response = app
			.oneshot(
				HttpRequest::builder()
					.method("POST")
					.uri("/api/v1/maintenance/purge-http-logs")
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
	}

	#[tokio::test]
	async fn test_list_jobs_includes_purge_job() {
		let (app, _state, _pool, _dir) = create_test_app().await;

		let response = app
			.oneshot(
				HttpRequest::builder()
					.uri("/api/v1/jobs")
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::OK);
		let body = body_json(response).await;
		let jobs = body["jobs"].as_array().unwrap();
		assert_eq!(jobs.len(), 1);
		assert_eq!(jobs[0]["name"], "purge-http-logs");
		assert_eq!(jobs[0]["max_attempts"], 0);
	}

	#[tokio::test]
	async fn test_get_unknown_invocation_is_not_found() {
		let (app, _state, _pool, _dir) = create_test_app().await;

		let response = app
			.oneshot(
				HttpRequest::builder()
					.uri("/api/v1/jobs/invocations/no-such-id")
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_requests_are_recorded_in_http_log() {
		let (app, state, _pool, _dir) = create_test_app().await;

		let _ = app
			.oneshot(
				HttpRequest::builder()
					.uri("/health")
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();

		assert_eq!(state.http_log.count().await.unwrap(), 1);
	}

	#[tokio::test]
	async fn test_startup_schedule_registration_pattern() {
		let (state, _pool, _dir) = create_test_state().await;

		// Mirrors main: clear stale schedules, register the daily purge.
		state.scheduler.remove_all_schedules();
		state
			.scheduler
			.upsert_schedule(
				crate::jobs::HTTP_LOG_PURGE_JOB,
				&state.config.jobs.purge_cron,
				&state.config.jobs.timezone,
				crate::jobs::HTTP_LOG_PURGE_JOB,
				serde_json::json!({ "days": state.config.jobs.scheduled_purge_days }),
			)
			.unwrap();

		assert_eq!(state.scheduler.schedule_count(), 1);
	}

	#[tokio::test]
	async fn test_manual_purge_end_to_end() {
		let (app, state, pool, _dir) = create_test_app().await;
		state.scheduler.start().await;

		// Seed one stale log row for the purge to remove.
		state.http_log.record("GET", "/seed", 200).await.unwrap();
		sqlx::query("UPDATE http_log SET created_at = ?")
			.bind(Utc::now() - chrono::Duration::days(40))
			.execute(&pool)
			.await
			.unwrap();

		let response = app
			.oneshot(
				HttpRequest::builder()
					.method("POST")
					.uri("/api/v1/maintenance/purge-http-logs")
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::ACCEPTED);
		let body = body_json(response).await;
		let invocation_id = body["invocation_id"].as_str().unwrap().to_string();

		// Fire-and-forget: poll history until the worker finishes.
		let mut state_now = InvocationState::Pending;
		for _ in 0..100 {
			if let Some(record) = state.repository.get(&invocation_id).await.unwrap() {
				state_now = record.state;
				if state_now.is_terminal() {
					break;
				}
			}
			tokio::time::sleep(Duration::from_millis(20)).await;
		}

		assert_eq!(state_now, InvocationState::Succeeded);
		// The stale row is gone; only the POST recorded by the middleware remains.
		assert_eq!(state.http_log.count().await.unwrap(), 1);
		state.scheduler.shutdown().await;
	}
}
