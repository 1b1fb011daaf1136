// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::endpoint::base_endpoint;
use crate::error::ConfigError;
use crate::payload::DEFAULT_COMPRESSION_LEVEL;
use crate::tags::Tags;
use std::env;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 5;
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration for a Loki sink and the host that drives it.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Sink URL, e.g. `loki://logs.internal:3100/?UNSAFE_secure=false`
    pub url: String,
    /// Labels attached to every pushed stream
    pub tags: Tags,
    /// Request timeout applied to the HTTP client
    pub timeout: Duration,
    /// gzip level, 0 to 9
    pub compression_level: u32,
    /// HTTPS proxy URL
    pub https_proxy: Option<String>,
    /// How often a host should call `sync`. Not used by the syncer itself.
    pub flush_interval: Duration,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            tags: Tags::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            https_proxy: None,
            flush_interval: Duration::from_secs(DEFAULT_FLUSH_INTERVAL_SECS),
            log_level: "info".to_string(),
        }
    }
}

impl SinkConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`SinkConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("LOKI_URL").ok_or(ConfigError::MissingUrl)?;
        let tags = match lookup("LOKI_TAGS") {
            Some(raw) => Tags::parse(&raw)?,
            None => Tags::new(),
        };
        let timeout = Duration::from_secs(parse_number(
            &lookup,
            "LOKI_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);
        let compression_level = parse_number(
            &lookup,
            "LOKI_COMPRESSION_LEVEL",
            DEFAULT_COMPRESSION_LEVEL,
        )?;
        let https_proxy = lookup("LOKI_HTTPS_PROXY").or_else(|| lookup("HTTPS_PROXY"));
        let flush_interval = Duration::from_secs(parse_number(
            &lookup,
            "LOKI_FLUSH_INTERVAL_SECS",
            DEFAULT_FLUSH_INTERVAL_SECS,
        )?);
        let log_level = lookup("LOKI_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|| "info".to_string());

        let config = Self {
            url,
            tags,
            timeout,
            compression_level,
            https_proxy,
            flush_interval,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        base_endpoint(&self.url).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.compression_level > 9 {
            return Err(ConfigError::Invalid(format!(
                "compression level must be between 0 and 9, got {}",
                self.compression_level
            )));
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "timeout must be greater than 0".to_string(),
            ));
        }

        if self.flush_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "flush interval must be greater than 0".to_string(),
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }
}

fn parse_number<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}
