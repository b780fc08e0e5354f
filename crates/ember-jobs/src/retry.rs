// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Retry policy: bounded attempts with exponential backoff.
//!
//! `max_attempts` is the total attempt budget with a floor of one execution:
//! every invocation runs at least once, and runs again while the number of
//! completed attempts is below the budget. A budget of 0 therefore means the
//! first failure is terminal.

const BASE_RETRY_DELAY_SECS: u64 = 1;
const MAX_RETRY_DELAY_SECS: u64 = 60;
const RETRY_FACTOR: f64 = 2.0;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
	/// Run again after the given backoff delay, in seconds.
	Retry { delay_secs: u64 },
	/// Budget exhausted; the invocation is dead.
	GiveUp,
}

/// Decide the next action given the number of completed (failed) attempts.
pub fn on_failure(completed_attempts: u32, max_attempts: u32) -> RetryAction {
	if completed_attempts < max_attempts {
		RetryAction::Retry {
			delay_secs: calculate_backoff_delay(completed_attempts),
		}
	} else {
		RetryAction::GiveUp
	}
}

pub(crate) fn calculate_backoff_delay(retry_count: u32) -> u64 {
	let delay = BASE_RETRY_DELAY_SECS as f64 * RETRY_FACTOR.powi(retry_count as i32 - 1);
	(delay as u64).min(MAX_RETRY_DELAY_SECS)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_backoff_doubles() {
		assert_eq!(calculate_backoff_delay(1), BASE_RETRY_DELAY_SECS);
		assert_eq!(calculate_backoff_delay(2), 2);
		assert_eq!(calculate_backoff_delay(3), 4);
	}

	#[test]
	fn test_backoff_caps_at_max() {
		assert_eq!(calculate_backoff_delay(10), MAX_RETRY_DELAY_SECS);
		assert_eq!(calculate_backoff_delay(100), MAX_RETRY_DELAY_SECS);
	}

	#[test]
	fn test_zero_budget_is_terminal_after_first_attempt() {
		assert_eq!(on_failure(1, 0), RetryAction::GiveUp);
	}

	#[test]
	fn test_budget_of_three_allows_three_attempts() {
		assert!(matches!(on_failure(1, 3), RetryAction::Retry { .. }));
		assert!(matches!(on_failure(2, 3), RetryAction::Retry { .. }));
		assert_eq!(on_failure(3, 3), RetryAction::GiveUp);
	}

	#[test]
	fn test_retry_delays_grow_per_attempt() {
		let first = on_failure(1, 3);
		let second = on_failure(2, 3);
		assert_eq!(first, RetryAction::Retry { delay_secs: 1 });
		assert_eq!(second, RetryAction::Retry { delay_secs: 2 });
	}
}
