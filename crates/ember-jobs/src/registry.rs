// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job registry: maps job names to handlers.
//!
//! The registry is populated once at startup, before the scheduler and any
//! HTTP handlers run, and is immutable afterwards. Registering a name twice
//! is rejected rather than silently overwritten.

use crate::error::{JobError, Result};
use crate::job::Job;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct JobRegistry {
	jobs: HashMap<String, Arc<dyn Job>>,
}

impl JobRegistry {
	pub fn new() -> Self {
		Self {
			jobs: HashMap::new(),
		}
	}

	pub fn register(&mut self, job: Arc<dyn Job>) -> Result<()> {
		let name = job.name().to_string();
		if self.jobs.contains_key(&name) {
			return Err(JobError::AlreadyRegistered(name));
		}
		self.jobs.insert(name, job);
		Ok(())
	}

	pub fn lookup(&self, name: &str) -> Result<Arc<dyn Job>> {
		self
			.jobs
			.get(name)
			.cloned()
			.ok_or_else(|| JobError::NotFound(name.to_string()))
	}

	pub fn contains(&self, name: &str) -> bool {
		self.jobs.contains_key(name)
	}

	pub fn names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.jobs.keys().cloned().collect();
		names.sort();
		names
	}

	pub fn jobs(&self) -> impl Iterator<Item = &Arc<dyn Job>> {
		self.jobs.values()
	}

	pub fn len(&self) -> usize {
		self.jobs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.jobs.is_empty()
	}
}
