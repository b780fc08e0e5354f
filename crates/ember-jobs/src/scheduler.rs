// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scheduler: worker pool, periodic tick, and retry coordination.
//!
//! The scheduler owns the queue and the recurring schedule table. A fixed
//! set of workers drains the queue; a tick task evaluates recurring
//! schedules once a second and enqueues due invocations. Failed attempts are
//! retried in place on the worker that observed the failure, with
//! exponential backoff, until the job's attempt budget is exhausted.

use crate::context::{CancellationToken, JobContext};
use crate::error::{JobError, Result};
use crate::queue::JobQueue;
use crate::registry::JobRegistry;
use crate::repository::InvocationRepository;
use crate::retry::{self, RetryAction};
use crate::schedule::{RecurringSchedule, ScheduleTable};
use crate::types::{InvocationState, JobInvocation, TriggerSource};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct SchedulerOptions {
	/// Number of concurrent worker slots draining the queue.
	pub worker_count: usize,
	/// Period of the recurring-schedule evaluation tick.
	pub tick_interval: Duration,
}

impl Default for SchedulerOptions {
	fn default() -> Self {
		Self {
			worker_count: 40,
			tick_interval: Duration::from_secs(1),
		}
	}
}

pub struct JobScheduler {
	registry: Arc<JobRegistry>,
	queue: Arc<JobQueue>,
	schedules: Arc<ScheduleTable>,
	repository: Arc<InvocationRepository>,
	options: SchedulerOptions,
	shutdown_tx: broadcast::Sender<()>,
	handles: Mutex<Vec<JoinHandle<()>>>,
	cancellation_token: CancellationToken,
}

impl JobScheduler {
	pub fn new(
		registry: Arc<JobRegistry>,
		repository: Arc<InvocationRepository>,
		options: SchedulerOptions,
	) -> Self {
		let (shutdown_tx, _) = broadcast::channel(1);
		Self {
			registry,
			queue: Arc::new(JobQueue::new()),
			schedules: Arc::new(ScheduleTable::new()),
			repository,
			options,
			shutdown_tx,
			handles: Mutex::new(Vec::new()),
			cancellation_token: CancellationToken::new(),
		}
	}

	pub fn registry(&self) -> &Arc<JobRegistry> {
		&self.registry
	}

	pub fn queue_depth(&self) -> usize {
		self.queue.depth()
	}

	pub fn worker_count(&self) -> usize {
		self.options.worker_count
	}

	/// Insert or replace a recurring schedule after validating that the
	/// target job is registered.
	#[instrument(skip(self, args))]
	pub fn upsert_schedule(
		&self,
		id: &str,
		cron_expression: &str,
		timezone: &str,
		job_name: &str,
		args: serde_json::Value,
	) -> Result<()> {
		if !self.registry.contains(job_name) {
			return Err(JobError::NotFound(job_name.to_string()));
		}
		self
			.schedules
			.upsert(id, cron_expression, timezone, job_name, args)?;
		info!(schedule = id, cron = cron_expression, job = job_name, "recurring schedule registered");
		Ok(())
	}

	pub fn remove_schedule(&self, id: &str) -> bool {
		self.schedules.remove(id)
	}

	/// Clear every recurring schedule. Used at startup so a prior run's
	/// entries cannot linger.
	pub fn remove_all_schedules(&self) {
		self.schedules.remove_all();
	}

	pub fn list_schedules(&self) -> Vec<RecurringSchedule> {
		self.schedules.list()
	}

	pub fn schedule_count(&self) -> usize {
		self.schedules.len()
	}

	/// Enqueue one invocation of a registered job. Fire-and-forget: the
	/// returned id identifies the invocation, not its outcome.
	#[instrument(skip(self, args))]
	pub async fn enqueue(
		&self,
		job_name: &str,
		args: serde_json::Value,
		triggered_by: TriggerSource,
	) -> Result<String> {
		enqueue_invocation(
			&self.registry,
			&self.repository,
			&self.queue,
			job_name,
			args,
			triggered_by,
		)
		.await
	}

	/// Spawn the worker pool and the schedule tick.
	#[instrument(skip(self))]
	pub async fn start(&self) {
		let mut handles = self.handles.lock().await;

		for worker_id in 0..self.options.worker_count {
			let registry = Arc::clone(&self.registry);
			let queue = Arc::clone(&self.queue);
			let repository = Arc::clone(&self.repository);
			let cancellation_token = self.cancellation_token.clone();
			let mut shutdown_rx = self.shutdown_tx.subscribe();

			let handle = tokio::spawn(async move {
				loop {
					tokio::select! {
						invocation = queue.dequeue() => {
							let Some(invocation) = invocation else {
								break;
							};
							if let Err(e) =
								run_invocation(&registry, &repository, invocation, &cancellation_token).await
							{
								warn!(worker_id, error = %e, "invocation bookkeeping failed");
							}
						}
						_ = shutdown_rx.recv() => {
							debug!(worker_id, "worker shutting down");
							break;
						}
					}
				}
			});
			handles.push(handle);
		}

		{
			let registry = Arc::clone(&self.registry);
			let queue = Arc::clone(&self.queue);
			let schedules = Arc::clone(&self.schedules);
			let repository = Arc::clone(&self.repository);
			let tick_interval = self.options.tick_interval;
			let mut shutdown_rx = self.shutdown_tx.subscribe();

			let handle = tokio::spawn(async move {
				let mut interval = tokio::time::interval(tick_interval);
				loop {
					tokio::select! {
						_ = interval.tick() => {
							let now = Utc::now();
							for schedule in schedules.due_schedules(now) {
								match enqueue_invocation(
									&registry,
									&repository,
									&queue,
									&schedule.job_name,
									schedule.args.clone(),
									TriggerSource::Schedule,
								)
								.await
								{
									Ok(invocation_id) => {
										// Last-fired moves only after the enqueue landed;
										// a failed enqueue is retried on the next tick.
										schedules.mark_fired(&schedule.id, now);
										debug!(
											schedule = %schedule.id,
											invocation = %invocation_id,
											"recurring schedule fired"
										);
									}
									Err(e) => {
										warn!(schedule = %schedule.id, error = %e, "failed to enqueue due schedule");
									}
								}
							}
						}
						_ = shutdown_rx.recv() => {
							info!("schedule tick shutting down");
							break;
						}
					}
				}
			});
			handles.push(handle);
		}

		info!(
			worker_count = self.options.worker_count,
			"job scheduler started"
		);
	}

	/// Stop the tick, close the queue, and wait for in-flight work.
	#[instrument(skip(self))]
	pub async fn shutdown(&self) {
		let _ = self.shutdown_tx.send(());
		self.queue.close().await;

		let mut handles = self.handles.lock().await;
		for handle in handles.drain(..) {
			let _ = handle.await;
		}

		info!("job scheduler shut down");
	}
}

/// Validate, record, and enqueue one invocation.
async fn enqueue_invocation(
	registry: &Arc<JobRegistry>,
	repository: &Arc<InvocationRepository>,
	queue: &Arc<JobQueue>,
	job_name: &str,
	args: serde_json::Value,
	triggered_by: TriggerSource,
) -> Result<String> {
	if !registry.contains(job_name) {
		return Err(JobError::NotFound(job_name.to_string()));
	}

	let invocation = JobInvocation::new(job_name, args, triggered_by);
	let invocation_id = invocation.id.clone();
	repository.record_enqueued(&invocation).await?;

	match queue.enqueue(invocation) {
		Ok(id) => Ok(id),
		Err(e) => {
			// Don't leave a pending record nothing will ever run.
			repository
				.mark_completed(
					&invocation_id,
					InvocationState::Dead,
					Some("queue closed before dispatch".to_string()),
				)
				.await?;
			Err(e)
		}
	}
}

/// Execute an invocation through its attempt budget.
///
/// The invocation stays on this worker for its whole lifecycle, so at most
/// one execution of it is ever in flight.
async fn run_invocation(
	registry: &Arc<JobRegistry>,
	repository: &Arc<InvocationRepository>,
	invocation: JobInvocation,
	cancellation_token: &CancellationToken,
) -> Result<()> {
	let job = match registry.lookup(&invocation.job_name) {
		Ok(job) => job,
		Err(e) => {
			// Enqueue validates the name; only a registry/queue mismatch
			// could land here.
			repository
				.mark_completed(&invocation.id, InvocationState::Dead, Some(e.to_string()))
				.await?;
			return Ok(());
		}
	};

	let max_attempts = job.max_attempts();
	let mut attempt = invocation.attempt;

	loop {
		attempt += 1;
		repository.mark_running(&invocation.id, attempt).await?;

		let ctx = JobContext {
			invocation_id: invocation.id.clone(),
			attempt,
			triggered_by: if attempt > 1 {
				TriggerSource::Retry
			} else {
				invocation.triggered_by
			},
			args: invocation.args.clone(),
			cancellation_token: cancellation_token.clone(),
		};

		match job.run(&ctx).await {
			Ok(output) => {
				repository
					.mark_completed(&invocation.id, InvocationState::Succeeded, None)
					.await?;
				info!(
					job = %invocation.job_name,
					invocation = %invocation.id,
					attempt,
					message = %output.message,
					"invocation succeeded"
				);
				return Ok(());
			}
			Err(JobError::Cancelled) => {
				repository
					.mark_completed(
						&invocation.id,
						InvocationState::Dead,
						Some("job cancelled".to_string()),
					)
					.await?;
				info!(job = %invocation.job_name, invocation = %invocation.id, "invocation cancelled");
				return Ok(());
			}
			Err(e) => {
				let message = e.to_string();
				match retry::on_failure(attempt, max_attempts) {
					RetryAction::Retry { delay_secs } => {
						warn!(
							job = %invocation.job_name,
							invocation = %invocation.id,
							attempt,
							delay_secs,
							error = %message,
							"invocation failed, retrying"
						);
						repository.mark_retrying(&invocation.id, &message).await?;
						tokio::time::sleep(Duration::from_secs(delay_secs)).await;
					}
					RetryAction::GiveUp => {
						repository
							.mark_completed(&invocation.id, InvocationState::Dead, Some(message.clone()))
							.await?;
						warn!(
							job = %invocation.job_name,
							invocation = %invocation.id,
							attempt,
							error = %message,
							"invocation dead, retry budget exhausted"
						);
						return Ok(());
					}
				}
			}
		}
	}
}
