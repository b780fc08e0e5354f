// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP request log storage: the table the purge job cleans up.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::ServerError;

#[derive(Clone)]
pub struct HttpLogRepository {
	pool: SqlitePool,
}

impl HttpLogRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create the http_log table if it does not exist.
	pub async fn init_schema(pool: &SqlitePool) -> Result<(), ServerError> {
		sqlx::query(
			r#"
            CREATE TABLE IF NOT EXISTS http_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                method TEXT NOT NULL,
                path TEXT NOT NULL,
                status INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
		)
		.execute(pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn record(&self, method: &str, path: &str, status: u16) -> Result<(), ServerError> {
		sqlx::query("INSERT INTO http_log (method, path, status, created_at) VALUES (?, ?, ?, ?)")
			.bind(method)
			.bind(path)
			.bind(status as i64)
			.bind(Utc::now())
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	/// Delete log rows older than the given number of days. Returns the
	/// number of deleted rows.
	#[tracing::instrument(skip(self))]
	pub async fn purge_older_than(&self, days: u32) -> Result<u64, ServerError> {
		let cutoff: DateTime<Utc> = Utc::now() - chrono::Duration::days(days as i64);
		let result = sqlx::query("DELETE FROM http_log WHERE created_at < ?")
			.bind(cutoff)
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected())
	}

	pub async fn count(&self) -> Result<u64, ServerError> {
		let row = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM http_log")
			.fetch_one(&self.pool)
			.await?;

		Ok(row.0 as u64)
	}
}
