// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::context::JobContext;
use crate::error::JobError;
use crate::types::JobOutput;
use async_trait::async_trait;

/// Default retry budget applied to jobs that do not declare their own.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// A named, asynchronous unit of work.
///
/// Implementations declare their own retry budget via [`Job::max_attempts`]:
/// the total number of executions an invocation may consume, with a floor of
/// one. `max_attempts() == 0` means the first failure is terminal.
#[async_trait]
pub trait Job: Send + Sync {
	/// Unique job name; invocations reference the handler by this name.
	fn name(&self) -> &str;

	/// Human-readable description, surfaced through the jobs API.
	fn description(&self) -> &str;

	/// Total attempt budget for one invocation.
	fn max_attempts(&self) -> u32 {
		DEFAULT_MAX_ATTEMPTS
	}

	/// Execute one attempt. Failures are reported, never panicked.
	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError>;
}
