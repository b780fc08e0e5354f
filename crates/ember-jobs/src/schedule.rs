// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Recurring schedule table: cron-defined rules that periodically produce
//! job invocations.
//!
//! Schedules are keyed by id. `due_schedules` is a pure function of the
//! caller-supplied clock so the tick loop and tests share one code path.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::RwLock;
use tracing::warn;

use crate::error::{JobError, Result};

/// Convert a standard 5-field Unix cron expression to the 7-field format
/// expected by the `cron` crate.
///
/// 5-field format: minute hour day-of-month month day-of-week
/// 7-field format: second minute hour day-of-month month day-of-week year
///
/// We add "0" for seconds (fire at :00 of the minute) and "*" for year.
fn convert_to_cron_crate_format(expression: &str) -> String {
	let field_count = expression.split_whitespace().count();
	if field_count >= 6 {
		// Already in extended format, use as-is
		expression.to_string()
	} else if field_count == 5 {
		format!("0 {} *", expression)
	} else {
		// Invalid format, return as-is and let the parser error
		expression.to_string()
	}
}

/// Validate a cron expression without calculating a next fire time.
pub fn validate_cron_expression(expression: &str) -> Result<()> {
	let cron_expr = convert_to_cron_crate_format(expression);
	Schedule::from_str(&cron_expr)
		.map_err(|e| JobError::InvalidCronExpression(e.to_string()))?;
	Ok(())
}

/// Validate an IANA timezone string.
pub fn validate_timezone(timezone: &str) -> Result<()> {
	let _: Tz = timezone
		.parse()
		.map_err(|_| JobError::InvalidTimezone(timezone.to_string()))?;
	Ok(())
}

/// A cron-defined rule that periodically produces invocations of one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringSchedule {
	pub id: String,
	pub cron_expression: String,
	pub timezone: String,
	pub job_name: String,
	pub args: serde_json::Value,
	pub registered_at: DateTime<Utc>,
	pub last_fired_at: Option<DateTime<Utc>>,
}

impl RecurringSchedule {
	/// Next fire time strictly after the last fire (or registration, if the
	/// schedule has never fired), in UTC.
	pub fn next_fire(&self) -> Result<DateTime<Utc>> {
		let cron_expr = convert_to_cron_crate_format(&self.cron_expression);
		let schedule = Schedule::from_str(&cron_expr)
			.map_err(|e| JobError::InvalidCronExpression(e.to_string()))?;
		let tz: Tz = self
			.timezone
			.parse()
			.map_err(|_| JobError::InvalidTimezone(self.timezone.clone()))?;

		let after = self.last_fired_at.unwrap_or(self.registered_at);
		let local_after = after.with_timezone(&tz);

		let next_local = schedule.after(&local_after).next().ok_or_else(|| {
			JobError::Internal("no next fire time for cron schedule".to_string())
		})?;

		Ok(next_local.with_timezone(&Utc))
	}
}

/// In-memory table of recurring schedules, shared between the scheduler tick
/// and administrative callers.
#[derive(Default)]
pub struct ScheduleTable {
	entries: RwLock<HashMap<String, RecurringSchedule>>,
}

impl ScheduleTable {
	pub fn new() -> Self {
		Self {
			entries: RwLock::new(HashMap::new()),
		}
	}

	/// Insert or replace the schedule with the given id.
	///
	/// The cron expression and timezone are validated here so a malformed
	/// schedule is rejected synchronously and never reaches the tick loop.
	pub fn upsert(
		&self,
		id: &str,
		cron_expression: &str,
		timezone: &str,
		job_name: &str,
		args: serde_json::Value,
	) -> Result<()> {
		validate_cron_expression(cron_expression)?;
		validate_timezone(timezone)?;

		let schedule = RecurringSchedule {
			id: id.to_string(),
			cron_expression: cron_expression.to_string(),
			timezone: timezone.to_string(),
			job_name: job_name.to_string(),
			args,
			registered_at: Utc::now(),
			last_fired_at: None,
		};

		self
			.entries
			.write()
			.expect("schedule table lock poisoned")
			.insert(id.to_string(), schedule);
		Ok(())
	}

	/// Remove one schedule. Returns whether an entry existed.
	pub fn remove(&self, id: &str) -> bool {
		self
			.entries
			.write()
			.expect("schedule table lock poisoned")
			.remove(id)
			.is_some()
	}

	/// Remove every schedule. A no-op on an empty table.
	pub fn remove_all(&self) {
		self
			.entries
			.write()
			.expect("schedule table lock poisoned")
			.clear();
	}

	/// Schedules whose next fire time is at or before `now`.
	pub fn due_schedules(&self, now: DateTime<Utc>) -> Vec<RecurringSchedule> {
		let entries = self.entries.read().expect("schedule table lock poisoned");
		let mut due = Vec::new();
		for schedule in entries.values() {
			match schedule.next_fire() {
				Ok(next) if next <= now => due.push(schedule.clone()),
				Ok(_) => {}
				Err(e) => {
					// Entries are validated at upsert, so this is unexpected.
					warn!(schedule = %schedule.id, error = %e, "skipping unparseable schedule");
				}
			}
		}
		due
	}

	/// Record a successful fire. Called only after the invocation was
	/// actually enqueued, so a failed enqueue is retried on the next tick.
	pub fn mark_fired(&self, id: &str, at: DateTime<Utc>) {
		if let Some(schedule) = self
			.entries
			.write()
			.expect("schedule table lock poisoned")
			.get_mut(id)
		{
			schedule.last_fired_at = Some(at);
		}
	}

	pub fn get(&self, id: &str) -> Option<RecurringSchedule> {
		self
			.entries
			.read()
			.expect("schedule table lock poisoned")
			.get(id)
			.cloned()
	}

	pub fn list(&self) -> Vec<RecurringSchedule> {
		let mut schedules: Vec<RecurringSchedule> = self
			.entries
			.read()
			.expect("schedule table lock poisoned")
			.values()
			.cloned()
			.collect();
		schedules.sort_by(|a, b| a.id.cmp(&b.id));
		schedules
	}

	pub fn len(&self) -> usize {
		self
			.entries
			.read()
			.expect("schedule table lock poisoned")
			.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
