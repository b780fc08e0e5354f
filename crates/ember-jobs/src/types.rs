// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a job invocation.
///
/// Pending → Running → {Succeeded | Retrying → Running … | Dead}.
/// Succeeded and Dead are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationState {
	Pending,
	Running,
	Succeeded,
	Retrying,
	Dead,
}

impl InvocationState {
	pub fn as_str(&self) -> &'static str {
		match self {
			InvocationState::Pending => "pending",
			InvocationState::Running => "running",
			InvocationState::Succeeded => "succeeded",
			InvocationState::Retrying => "retrying",
			InvocationState::Dead => "dead",
		}
	}

	pub fn is_terminal(&self) -> bool {
		matches!(self, InvocationState::Succeeded | InvocationState::Dead)
	}
}

impl std::str::FromStr for InvocationState {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"pending" => Ok(InvocationState::Pending),
			"running" => Ok(InvocationState::Running),
			"succeeded" => Ok(InvocationState::Succeeded),
			"retrying" => Ok(InvocationState::Retrying),
			"dead" => Ok(InvocationState::Dead),
			_ => Err(format!("unknown invocation state: {s}")),
		}
	}
}

/// What caused an invocation to be enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
	Schedule,
	Manual,
	Retry,
}

impl TriggerSource {
	pub fn as_str(&self) -> &'static str {
		match self {
			TriggerSource::Schedule => "schedule",
			TriggerSource::Manual => "manual",
			TriggerSource::Retry => "retry",
		}
	}
}

impl std::str::FromStr for TriggerSource {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"schedule" => Ok(TriggerSource::Schedule),
			"manual" => Ok(TriggerSource::Manual),
			"retry" => Ok(TriggerSource::Retry),
			_ => Err(format!("unknown trigger source: {s}")),
		}
	}
}

/// One concrete unit of work: a registered job name plus serialized
/// arguments, tracked through its lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInvocation {
	pub id: String,
	pub job_name: String,
	pub args: serde_json::Value,
	pub enqueued_at: DateTime<Utc>,
	pub attempt: u32,
	pub state: InvocationState,
	pub triggered_by: TriggerSource,
}

impl JobInvocation {
	pub fn new(job_name: &str, args: serde_json::Value, triggered_by: TriggerSource) -> Self {
		Self {
			id: uuid::Uuid::new_v4().to_string(),
			job_name: job_name.to_string(),
			args,
			enqueued_at: Utc::now(),
			attempt: 0,
			state: InvocationState::Pending,
			triggered_by,
		}
	}
}

/// Result payload reported by a successful job run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutput {
	pub message: String,
	pub metadata: Option<serde_json::Value>,
}
