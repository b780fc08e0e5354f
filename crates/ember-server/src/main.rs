// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Ember demo web service binary.

use clap::Parser;
use ember_server::jobs::HTTP_LOG_PURGE_JOB;
use ember_server::{create_router, load_config_from_env};

/// Ember server - demo web service for the Ember job engine.
#[derive(Parser, Debug)]
#[command(name = "ember-server", about = "Ember recurring-job demo server", version)]
struct Args {}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let _args = Args::parse();

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = load_config_from_env()?;

	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.init();

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		worker_count = config.jobs.worker_count,
		"starting ember-server"
	);

	let pool = ember_server::db::create_pool(&config.database.url).await?;
	let state = ember_server::api::create_app_state(pool, &config).await?;

	// Expire invocation history left over from earlier runs.
	let expired = state
		.repository
		.cleanup_expired(config.jobs.history_retention_days)
		.await?;
	if expired > 0 {
		tracing::info!(expired, "removed expired invocation history");
	}

	// Clear recurring schedules from a previous run, then register the
	// daily purge. This service assumes it is the only scheduler-owning
	// instance; running multiple replicas would race this startup step.
	state.scheduler.remove_all_schedules();
	state.scheduler.upsert_schedule(
		HTTP_LOG_PURGE_JOB,
		&config.jobs.purge_cron,
		&config.jobs.timezone,
		HTTP_LOG_PURGE_JOB,
		serde_json::json!({ "days": config.jobs.scheduled_purge_days }),
	)?;

	state.scheduler.start().await;

	let scheduler = std::sync::Arc::clone(&state.scheduler);
	let app = create_router(state);

	let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
	tracing::info!(addr = %listener.local_addr()?, "listening");

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	// Stop the tick, drain the queue, let in-flight invocations finish.
	scheduler.shutdown().await;

	Ok(())
}

async fn shutdown_signal() {
	let _ = tokio::signal::ctrl_c().await;
	tracing::info!("shutdown signal received");
}
