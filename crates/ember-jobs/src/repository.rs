// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite-backed invocation history.
//!
//! Every invocation is recorded on enqueue and updated as it moves through
//! its lifecycle. Terminal records are kept for a retention window and then
//! expired by [`InvocationRepository::cleanup_expired`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::{JobError, Result};
use crate::types::{InvocationState, JobInvocation, TriggerSource};

type InvocationRow = (
	String,
	String,
	String,
	String,
	DateTime<Utc>,
	Option<DateTime<Utc>>,
	Option<DateTime<Utc>>,
	i64,
	Option<String>,
	String,
);

const SELECT_COLUMNS: &str = "id, job_name, args, state, enqueued_at, started_at, completed_at, attempt, error_message, triggered_by";

/// A persisted invocation and its lifecycle timestamps.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationRecord {
	pub id: String,
	pub job_name: String,
	pub args: serde_json::Value,
	pub state: InvocationState,
	pub enqueued_at: DateTime<Utc>,
	pub started_at: Option<DateTime<Utc>>,
	pub completed_at: Option<DateTime<Utc>>,
	pub attempt: u32,
	pub error_message: Option<String>,
	pub triggered_by: TriggerSource,
}

fn from_row(row: InvocationRow) -> Result<InvocationRecord> {
	let (
		id,
		job_name,
		args,
		state,
		enqueued_at,
		started_at,
		completed_at,
		attempt,
		error_message,
		triggered_by,
	) = row;

	Ok(InvocationRecord {
		id,
		job_name,
		args: serde_json::from_str(&args)?,
		state: state.parse().map_err(JobError::Internal)?,
		enqueued_at,
		started_at,
		completed_at,
		attempt: attempt as u32,
		error_message,
		triggered_by: triggered_by.parse().map_err(JobError::Internal)?,
	})
}

#[derive(Clone)]
pub struct InvocationRepository {
	pool: SqlitePool,
}

impl InvocationRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create the invocation history table if it does not exist.
	pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
		sqlx::query(
			r#"
            CREATE TABLE IF NOT EXISTS job_invocations (
                id TEXT PRIMARY KEY,
                job_name TEXT NOT NULL,
                args TEXT NOT NULL,
                state TEXT NOT NULL,
                enqueued_at TEXT NOT NULL,
                started_at TEXT,
                completed_at TEXT,
                attempt INTEGER NOT NULL DEFAULT 0,
                error_message TEXT,
                triggered_by TEXT NOT NULL
            )
            "#,
		)
		.execute(pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self, invocation), fields(invocation_id = %invocation.id, job = %invocation.job_name))]
	pub async fn record_enqueued(&self, invocation: &JobInvocation) -> Result<()> {
		sqlx::query(
			r#"
            INSERT INTO job_invocations (id, job_name, args, state, enqueued_at, attempt, triggered_by)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
		)
		.bind(&invocation.id)
		.bind(&invocation.job_name)
		.bind(invocation.args.to_string())
		.bind(invocation.state.as_str())
		.bind(invocation.enqueued_at)
		.bind(invocation.attempt as i64)
		.bind(invocation.triggered_by.as_str())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn mark_running(&self, invocation_id: &str, attempt: u32) -> Result<()> {
		sqlx::query(
			r#"
            UPDATE job_invocations
            SET state = 'running',
                attempt = ?,
                started_at = COALESCE(started_at, ?)
            WHERE id = ?
            "#,
		)
		.bind(attempt as i64)
		.bind(Utc::now())
		.bind(invocation_id)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self, error))]
	pub async fn mark_retrying(&self, invocation_id: &str, error: &str) -> Result<()> {
		sqlx::query("UPDATE job_invocations SET state = 'retrying', error_message = ? WHERE id = ?")
			.bind(error)
			.bind(invocation_id)
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	/// Record a terminal transition (Succeeded or Dead).
	#[tracing::instrument(skip(self, error))]
	pub async fn mark_completed(
		&self,
		invocation_id: &str,
		state: InvocationState,
		error: Option<String>,
	) -> Result<()> {
		sqlx::query(
			r#"
            UPDATE job_invocations
            SET state = ?,
                completed_at = ?,
                error_message = ?
            WHERE id = ?
            "#,
		)
		.bind(state.as_str())
		.bind(Utc::now())
		.bind(error)
		.bind(invocation_id)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn get(&self, invocation_id: &str) -> Result<Option<InvocationRecord>> {
		let row = sqlx::query_as::<_, InvocationRow>(&format!(
			"SELECT {SELECT_COLUMNS} FROM job_invocations WHERE id = ?"
		))
		.bind(invocation_id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(from_row).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn list(&self, limit: u32, offset: u32) -> Result<Vec<InvocationRecord>> {
		let rows = sqlx::query_as::<_, InvocationRow>(&format!(
			"SELECT {SELECT_COLUMNS} FROM job_invocations ORDER BY enqueued_at DESC LIMIT ? OFFSET ?"
		))
		.bind(limit as i64)
		.bind(offset as i64)
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(from_row).collect()
	}

	/// Invocations that exhausted their retry budget and await manual
	/// intervention.
	#[tracing::instrument(skip(self))]
	pub async fn list_dead(&self, limit: u32) -> Result<Vec<InvocationRecord>> {
		let rows = sqlx::query_as::<_, InvocationRow>(&format!(
			"SELECT {SELECT_COLUMNS} FROM job_invocations WHERE state = 'dead' ORDER BY completed_at DESC LIMIT ?"
		))
		.bind(limit as i64)
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(from_row).collect()
	}

	#[tracing::instrument(skip(self))]
	pub async fn count_in_state(&self, state: InvocationState) -> Result<u32> {
		let row =
			sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM job_invocations WHERE state = ?")
				.bind(state.as_str())
				.fetch_one(&self.pool)
				.await?;

		Ok(row.0 as u32)
	}

	/// Delete terminal records completed before the cutoff.
	#[tracing::instrument(skip(self))]
	pub async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64> {
		let result = sqlx::query(
			"DELETE FROM job_invocations WHERE state IN ('succeeded', 'dead') AND completed_at < ?",
		)
		.bind(before)
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected())
	}

	#[tracing::instrument(skip(self))]
	pub async fn cleanup_expired(&self, retention_days: u32) -> Result<u64> {
		let cutoff = Utc::now() - chrono::Duration::days(retention_days as i64);
		self.delete_expired(cutoff).await
	}
}
