// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Server configuration.
//!
//! Environment variables (`EMBER_SERVER_*`) override built-in defaults.
//! There is deliberately no config file layer for this service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
	pub host: String,
	pub port: u16,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_string(),
			port: 8080,
		}
	}
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: "sqlite:./ember.db".to_string(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct JobsConfig {
	/// Concurrent worker slots draining the queue.
	pub worker_count: usize,
	/// Days a terminal invocation record is kept before expiration.
	pub history_retention_days: u32,
	/// Cron expression for the recurring HTTP-log purge.
	pub purge_cron: String,
	/// IANA timezone the purge cron is evaluated in.
	pub timezone: String,
	/// Day threshold used by the recurring purge.
	pub scheduled_purge_days: u32,
	/// Day threshold used by the HTTP-triggered purge.
	pub manual_purge_days: u32,
}

impl Default for JobsConfig {
	fn default() -> Self {
		Self {
			worker_count: 40,
			history_retention_days: 3,
			purge_cron: "0 3 * * *".to_string(),
			timezone: "UTC".to_string(),
			scheduled_purge_days: 10,
			manual_purge_days: 1,
		}
	}
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
	pub level: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
		}
	}
}

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub jobs: JobsConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

fn env_var(key: &str) -> Option<String> {
	std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
	T::Err: std::fmt::Display,
{
	match env_var(key) {
		Some(raw) => raw
			.parse()
			.map(Some)
			.map_err(|e: T::Err| ConfigError::InvalidValue {
				key: key.to_string(),
				message: e.to_string(),
			}),
		None => Ok(None),
	}
}

/// Load configuration from environment variables over built-in defaults.
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	let mut config = ServerConfig::default();

	if let Some(host) = env_var("EMBER_SERVER_HOST") {
		config.http.host = host;
	}
	if let Some(port) = parse_env("EMBER_SERVER_PORT")? {
		config.http.port = port;
	}
	if let Some(url) = env_var("EMBER_SERVER_DATABASE_URL") {
		config.database.url = url;
	}
	if let Some(count) = parse_env("EMBER_SERVER_WORKER_COUNT")? {
		config.jobs.worker_count = count;
	}
	if let Some(days) = parse_env("EMBER_SERVER_HISTORY_RETENTION_DAYS")? {
		config.jobs.history_retention_days = days;
	}
	if let Some(cron) = env_var("EMBER_SERVER_PURGE_CRON") {
		config.jobs.purge_cron = cron;
	}
	if let Some(timezone) = env_var("EMBER_SERVER_TIMEZONE") {
		config.jobs.timezone = timezone;
	}
	if let Some(days) = parse_env("EMBER_SERVER_SCHEDULED_PURGE_DAYS")? {
		config.jobs.scheduled_purge_days = days;
	}
	if let Some(days) = parse_env("EMBER_SERVER_MANUAL_PURGE_DAYS")? {
		config.jobs.manual_purge_days = days;
	}
	if let Some(level) = env_var("EMBER_SERVER_LOG_LEVEL") {
		config.logging.level = level;
	}

	Ok(config)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_match_demo_deployment() {
		let config = ServerConfig::default();
		assert_eq!(config.jobs.worker_count, 40);
		assert_eq!(config.jobs.purge_cron, "0 3 * * *");
		assert_eq!(config.jobs.scheduled_purge_days, 10);
		assert_eq!(config.jobs.manual_purge_days, 1);
		assert_eq!(config.jobs.history_retention_days, 3);
	}

	#[test]
	fn test_socket_addr() {
		let config = ServerConfig::default();
		assert_eq!(config.socket_addr(), "127.0.0.1:8080");
	}
}
