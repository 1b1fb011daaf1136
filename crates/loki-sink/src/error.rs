// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::StatusCode;

/// Errors returned by the write-syncer.
///
/// None of these are fatal to the syncer: entries stay buffered and the next
/// call to `sync` resends them.
#[derive(Debug, thiserror::Error)]
pub enum LokiError {
    #[error("failed to encode push payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to compress push payload: {0}")]
    Compress(#[from] std::io::Error),

    #[error("failed to reach Loki: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(
        "expected HTTP 204 No Content, got {} {} with body: \n{body}",
        .status.as_u16(),
        .status.canonical_reason().unwrap_or("Unknown")
    )]
    Rejected { status: StatusCode, body: String },

    #[error("syncer is closed, push was cancelled")]
    Cancelled,

    #[error("invalid Loki endpoint: {0}")]
    InvalidEndpoint(String),
}

impl LokiError {
    /// Whether calling `sync` again may succeed without any change on the caller side.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Rejected { .. })
    }
}

/// Errors raised while loading [`crate::config::SinkConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("LOKI_URL is not set")]
    MissingUrl,

    #[error("Invalid value for {name}: {value}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("Invalid tags: {0}")]
    InvalidTags(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display() {
        let error = LokiError::Rejected {
            status: StatusCode::BAD_REQUEST,
            body: "entry out of order".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "expected HTTP 204 No Content, got 400 Bad Request with body: \nentry out of order"
        );
    }

    #[test]
    fn test_retryable() {
        let rejected = LokiError::Rejected {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        };
        assert!(rejected.is_retryable());
        assert!(!LokiError::Cancelled.is_retryable());
        assert!(!LokiError::InvalidEndpoint("no host".into()).is_retryable());
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::InvalidNumber {
            name: "LOKI_TIMEOUT_SECS",
            value: "soon".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid value for LOKI_TIMEOUT_SECS: soon");
    }
}
