// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Background job implementations registered by this service.

mod http_log_purge;

pub use http_log_purge::{HttpLogPurgeJob, HTTP_LOG_PURGE_JOB};
