// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Ember demo web service.
//!
//! Wires the `ember-jobs` engine into an HTTP server: registers the
//! recurring HTTP-log purge schedule at startup, exposes an on-demand
//! enqueue endpoint, and serves read-only job observability routes.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod http_log;
pub mod jobs;
pub mod routes;

pub use api::{create_router, AppState};
pub use config::{load_config_from_env, ServerConfig};
pub use error::ServerError;
pub use http_log::HttpLogRepository;
