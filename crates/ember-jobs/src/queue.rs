// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process FIFO job queue.
//!
//! Enqueue never blocks the caller; dequeue suspends until an invocation is
//! available or the queue is closed. A single shared receiver guarantees an
//! atomic pop: no two dequeue calls can observe the same invocation.

use crate::error::{JobError, Result};
use crate::types::JobInvocation;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, Mutex};

pub struct JobQueue {
	tx: mpsc::UnboundedSender<JobInvocation>,
	rx: Mutex<mpsc::UnboundedReceiver<JobInvocation>>,
	depth: AtomicUsize,
}

impl JobQueue {
	pub fn new() -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		Self {
			tx,
			rx: Mutex::new(rx),
			depth: AtomicUsize::new(0),
		}
	}

	/// Append an invocation in FIFO order. Returns its id.
	pub fn enqueue(&self, invocation: JobInvocation) -> Result<String> {
		let id = invocation.id.clone();
		self
			.tx
			.send(invocation)
			.map_err(|_| JobError::QueueClosed)?;
		self.depth.fetch_add(1, Ordering::SeqCst);
		Ok(id)
	}

	/// Remove and return the oldest pending invocation.
	///
	/// Suspends until work arrives. Returns `None` once the queue is closed
	/// and fully drained.
	pub async fn dequeue(&self) -> Option<JobInvocation> {
		let mut rx = self.rx.lock().await;
		let invocation = rx.recv().await?;
		self.depth.fetch_sub(1, Ordering::SeqCst);
		Some(invocation)
	}

	/// Stop accepting new invocations. Already-enqueued work can still be
	/// drained by `dequeue`.
	pub async fn close(&self) {
		self.rx.lock().await.close();
	}

	/// Number of invocations currently waiting.
	pub fn depth(&self) -> usize {
		self.depth.load(Ordering::SeqCst)
	}
}

impl Default for JobQueue {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::TriggerSource;

	fn invocation(job_name: &str) -> JobInvocation {
		JobInvocation::new(job_name, serde_json::Value::Null, TriggerSource::Manual)
	}

	#[tokio::test]
	async fn test_fifo_order() {
		let queue = JobQueue::new();
		let first = queue.enqueue(invocation("a")).unwrap();
		let second = queue.enqueue(invocation("b")).unwrap();

		assert_eq!(queue.dequeue().await.unwrap().id, first);
		assert_eq!(queue.dequeue().await.unwrap().id, second);
	}

	#[tokio::test]
	async fn test_depth_tracks_pending() {
		let queue = JobQueue::new();
		assert_eq!(queue.depth(), 0);

		queue.enqueue(invocation("a")).unwrap();
		queue.enqueue(invocation("b")).unwrap();
		assert_eq!(queue.depth(), 2);

		queue.dequeue().await.unwrap();
		assert_eq!(queue.depth(), 1);
	}

	#[tokio::test]
	async fn test_enqueue_after_close_fails() {
		let queue = JobQueue::new();
		queue.close().await;

		let result = queue.enqueue(invocation("a"));
		assert!(matches!(result, Err(JobError::QueueClosed)));
	}

	#[tokio::test]
	async fn test_close_drains_pending_then_ends() {
		let queue = JobQueue::new();
		queue.enqueue(invocation("a")).unwrap();
		queue.close().await;

		assert!(queue.dequeue().await.is_some());
		assert!(queue.dequeue().await.is_none());
	}
}
