// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use ember_jobs::{Job, JobContext, JobError, JobOutput};
use serde::Deserialize;

use crate::http_log::HttpLogRepository;

pub const HTTP_LOG_PURGE_JOB: &str = "purge-http-logs";

/// Removes HTTP log rows older than the requested day threshold.
///
/// Declares a zero retry budget: a failed purge waits for the next
/// scheduled (or manual) run instead of retrying.
pub struct HttpLogPurgeJob {
	http_log: HttpLogRepository,
}

#[derive(Debug, Deserialize)]
struct PurgeArgs {
	days: u32,
}

impl HttpLogPurgeJob {
	pub fn new(http_log: HttpLogRepository) -> Self {
		Self { http_log }
	}
}

#[async_trait]
impl Job for HttpLogPurgeJob {
	fn name(&self) -> &str {
		HTTP_LOG_PURGE_JOB
	}

	fn description(&self) -> &str {
		"Removes HTTP log entries older than the requested number of days"
	}

	fn max_attempts(&self) -> u32 {
		0
	}

	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		if ctx.cancellation_token.is_cancelled() {
			return Err(JobError::Cancelled);
		}

		let args: PurgeArgs = serde_json::from_value(ctx.args.clone()).map_err(|e| {
			JobError::Failed {
				message: format!("invalid purge arguments: {e}"),
			}
		})?;

		match self.http_log.purge_older_than(args.days).await {
			Ok(count) => {
				tracing::info!(
					deleted = count,
					days = args.days,
					invocation = %ctx.invocation_id,
					"http log purge completed"
				);
				Ok(JobOutput {
					message: format!("purged {count} http log entries older than {} days", args.days),
					metadata: Some(serde_json::json!({
						"deleted_count": count,
						"days": args.days
					})),
				})
			}
			Err(e) => Err(JobError::Failed {
				message: format!("http log purge failed: {e}"),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use ember_jobs::{CancellationToken, TriggerSource};
	use sqlx::SqlitePool;

	async fn setup() -> (HttpLogPurgeJob, HttpLogRepository, SqlitePool) {
		let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
		HttpLogRepository::init_schema(&pool).await.unwrap();
		let repo = HttpLogRepository::new(pool.clone());
		(HttpLogPurgeJob::new(repo.clone()), repo, pool)
	}

	fn ctx(args: serde_json::Value) -> JobContext {
		JobContext {
			invocation_id: "inv-1".to_string(),
			attempt: 1,
			triggered_by: TriggerSource::Manual,
			args,
			cancellation_token: CancellationToken::new(),
		}
	}

	#[tokio::test]
	async fn test_purge_reports_deleted_count() {
		let (job, _repo, pool) = setup().await;

		sqlx::query("INSERT INTO http_log (method, path, status, created_at) VALUES (?, ?, ?, ?)")
			.bind("GET")
			.bind("/old")
			.bind(200_i64)
			.bind(Utc::now() - chrono::Duration::days(5))
			.execute(&pool)
			.await
			.unwrap();

		let output = job.run(&ctx(serde_json::json!({ "days": 1 }))).await.unwrap();
		assert_eq!(
			output.metadata.unwrap()["deleted_count"],
			serde_json::json!(1)
		);
	}

	#[tokio::test]
	async fn test_missing_args_fail_without_panicking() {
		let (job, _repo, _pool) = setup().await;

		let result = job.run(&ctx(serde_json::Value::Null)).await;
		assert!(matches!(result, Err(JobError::Failed { .. })));
	}

	#[tokio::test]
	async fn test_cancelled_before_start() {
		let (job, _repo, _pool) = setup().await;

		let ctx = ctx(serde_json::json!({ "days": 1 }));
		ctx.cancellation_token.cancel();

		let result = job.run(&ctx).await;
		assert!(matches!(result, Err(JobError::Cancelled)));
	}

	#[tokio::test]
	async fn test_zero_retry_budget() {
		let (job, _repo, _pool) = setup().await;
		assert_eq!(job.max_attempts(), 0);
	}
}
