// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Recurring-job scheduling engine for the Ember server.
//!
//! This crate provides a small background-job system: a typed job registry,
//! an in-process FIFO queue drained by a fixed worker pool, a cron-driven
//! scheduler tick for recurring jobs, bounded retry with exponential backoff,
//! and SQLite-backed invocation history.

pub mod context;
pub mod error;
pub mod job;
pub mod queue;
pub mod registry;
pub mod repository;
pub mod retry;
pub mod schedule;
pub mod scheduler;
pub mod types;

pub use context::{CancellationToken, JobContext};
pub use error::{JobError, Result};
pub use job::Job;
pub use queue::JobQueue;
pub use registry::JobRegistry;
pub use repository::{InvocationRecord, InvocationRepository};
pub use retry::RetryAction;
pub use schedule::{RecurringSchedule, ScheduleTable};
pub use scheduler::{JobScheduler, SchedulerOptions};
pub use types::{InvocationState, JobInvocation, JobOutput, TriggerSource};
