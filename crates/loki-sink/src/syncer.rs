// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Write-syncer that pushes buffered log lines to Loki.
//!
//! ```text
//!   write(line) ──> BatchBuffer
//!                       │ snapshot
//!                       v
//!   sync() ───────> JSON ─> gzip ─> POST /loki/api/v1/push
//!                                         │
//!                      204 ───────────────┤──────────── other / error
//!                       │                                   │
//!                 clear snapshot                      keep everything
//! ```
//!
//! A `sync` never retries on its own. Entries stay buffered until a push that
//! carried them is answered with `204 No Content`, so calling `sync` again
//! after a failure resends the whole backlog.

use crate::buffer::BatchBuffer;
use crate::config::SinkConfig;
use crate::endpoint::{base_endpoint, push_url};
use crate::error::LokiError;
use crate::http::get_client;
use crate::payload::{PushRequest, DEFAULT_COMPRESSION_LEVEL};
use crate::tags::Tags;
use flate2::Compression;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Builds [`LokiWriteSyncer`]s that share one HTTP client.
#[derive(Debug, Clone)]
pub struct LokiSinkFactory {
    client: reqwest::Client,
    compression: Compression,
}

impl LokiSinkFactory {
    /// Uses `client` as is, TLS and timeouts included. `None` means reqwest defaults.
    #[must_use]
    pub fn new(client: Option<reqwest::Client>) -> Self {
        LokiSinkFactory {
            client: client.unwrap_or_default(),
            compression: Compression::new(DEFAULT_COMPRESSION_LEVEL),
        }
    }

    /// Client built from the timeout and proxy settings of `config`.
    #[must_use]
    pub fn from_config(config: &SinkConfig) -> Self {
        Self::new(Some(get_client(config))).with_compression_level(config.compression_level)
    }

    /// gzip level, clamped to 9.
    #[must_use]
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression = Compression::new(level.min(9));
        self
    }

    /// Creates a syncer pushing to the base endpoint derived from `url`.
    ///
    /// See [`base_endpoint`] for how the scheme is chosen.
    pub fn build(&self, url: &str, tags: Tags) -> Result<LokiWriteSyncer, LokiError> {
        let endpoint = base_endpoint(url)?;
        let push_url = push_url(&endpoint)?;
        debug!("LOKI | Created sink for {}", endpoint);
        Ok(LokiWriteSyncer {
            client: self.client.clone(),
            endpoint,
            push_url,
            tags,
            buffer: BatchBuffer::new(),
            compression: self.compression,
            flush_lock: Mutex::new(()),
            cancel_token: CancellationToken::new(),
        })
    }
}

/// Buffers log lines and pushes them to Loki when asked to.
///
/// Share it as `Arc<LokiWriteSyncer>`: every method takes `&self`.
#[derive(Debug)]
pub struct LokiWriteSyncer {
    client: reqwest::Client,
    endpoint: Url,
    push_url: Url,
    tags: Tags,
    buffer: BatchBuffer,
    compression: Compression,
    // Held for a whole push so two concurrent syncs never send the same entries.
    flush_lock: Mutex<()>,
    cancel_token: CancellationToken,
}

impl LokiWriteSyncer {
    /// Buffers one line. Does no I/O. Returns `line.len()`.
    pub fn write(&self, line: &[u8]) -> usize {
        self.buffer.append(line)
    }

    /// Pushes every buffered line in a single request.
    ///
    /// On success the pushed lines are dropped from the buffer; lines written
    /// while the request was in flight are kept for the next call. On any
    /// error nothing is dropped.
    pub async fn sync(&self) -> Result<(), LokiError> {
        if self.cancel_token.is_cancelled() {
            warn!("LOKI | Sync called on a closed sink, nothing sent");
            return Err(LokiError::Cancelled);
        }

        let _guard = tokio::select! {
            biased;
            () = self.cancel_token.cancelled() => return Err(LokiError::Cancelled),
            guard = self.flush_lock.lock() => guard,
        };

        let batch = self.buffer.snapshot();
        if batch.is_empty() {
            debug!("LOKI | Nothing to flush");
            return Ok(());
        }
        let n_entries = batch.len();

        let body = PushRequest::single(&self.tags, &batch).encode(self.compression)?;
        debug!(
            "LOKI | Flushing {} entries ({} bytes compressed)",
            n_entries,
            body.len()
        );

        let request = self
            .client
            .post(self.push_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_ENCODING, "gzip")
            .body(body)
            .build()?;

        let result = tokio::select! {
            biased;
            () = self.cancel_token.cancelled() => Err(LokiError::Cancelled),
            result = self.push(request) => result,
        };

        match result {
            Ok(()) => {
                self.buffer.clear(n_entries);
                debug!("LOKI | Successfully flushed {} entries", n_entries);
                Ok(())
            }
            Err(LokiError::Cancelled) => {
                warn!(
                    "LOKI | Sink closed while pushing, {} entries kept",
                    n_entries
                );
                Err(LokiError::Cancelled)
            }
            Err(e) => {
                error!("LOKI | Failed to push {} entries: {}", n_entries, e);
                Err(e)
            }
        }
    }

    async fn push(&self, request: reqwest::Request) -> Result<(), LokiError> {
        let response = self.client.execute(request).await?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(());
        }
        let body = response.text().await?;
        Err(LokiError::Rejected { status, body })
    }

    /// Cancels any in-flight push. Later calls to `sync` fail with
    /// [`LokiError::Cancelled`] without touching the network.
    pub fn close(&self) -> Result<(), LokiError> {
        if !self.cancel_token.is_cancelled() {
            debug!(
                "LOKI | Closing sink for {} with {} pending entries",
                self.endpoint,
                self.buffer.len()
            );
        }
        self.cancel_token.cancel();
        Ok(())
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Base endpoint, e.g. `https://logs.internal:3100/`.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[must_use]
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Number of buffered entries not yet confirmed by Loki.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn create_test_syncer(url: &str) -> LokiWriteSyncer {
        LokiSinkFactory::new(None)
            .build(url, Tags::new().with("service", "test"))
            .unwrap()
    }

    #[test]
    fn test_build_derives_endpoint() {
        let syncer = create_test_syncer("loki://localhost:3100/path?UNSAFE_secure=false");
        assert_eq!(syncer.endpoint().as_str(), "http://localhost:3100/");
        assert_eq!(
            syncer.push_url.as_str(),
            "http://localhost:3100/loki/api/v1/push"
        );
        assert_eq!(syncer.tags().get("service"), Some("test"));
    }

    #[test]
    fn test_build_rejects_bad_url() {
        let result = LokiSinkFactory::new(None).build("loki:nohost", Tags::new());
        assert!(matches!(result, Err(LokiError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_write_buffers_without_io() {
        let syncer = create_test_syncer("loki://localhost:1");
        assert_eq!(syncer.write(b"first"), 5);
        assert_eq!(syncer.write(b"second"), 6);
        assert_eq!(syncer.pending(), 2);
    }

    #[test]
    fn test_compression_level_is_clamped() {
        let factory = LokiSinkFactory::new(None).with_compression_level(42);
        assert_eq!(factory.compression.level(), 9);
    }

    #[tokio::test]
    async fn test_empty_sync_is_noop() {
        // Port 1 is never listening; an attempted request would fail.
        let syncer = create_test_syncer("loki://127.0.0.1:1/?UNSAFE_secure=false");
        assert!(syncer.sync().await.is_ok());
    }

    #[tokio::test]
    async fn test_transport_error_keeps_entries() {
        let syncer = create_test_syncer("loki://127.0.0.1:1/?UNSAFE_secure=false");
        syncer.write(b"kept");

        let result = syncer.sync().await;

        assert!(matches!(result, Err(LokiError::Transport(_))));
        assert_eq!(syncer.pending(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_push_failure_is_logged() {
        let syncer = create_test_syncer("loki://127.0.0.1:1/?UNSAFE_secure=false");
        syncer.write(b"line");

        assert!(syncer.sync().await.is_err());
        assert!(logs_contain("LOKI | Failed to push 1 entries"));
    }

    #[tokio::test]
    async fn test_sync_after_close_is_cancelled() {
        let syncer = create_test_syncer("loki://127.0.0.1:1/?UNSAFE_secure=false");
        syncer.write(b"never sent");

        assert!(syncer.close().is_ok());
        assert!(syncer.is_closed());
        assert!(matches!(syncer.sync().await, Err(LokiError::Cancelled)));
        assert_eq!(syncer.pending(), 1);
        // Closing twice is harmless.
        assert!(syncer.close().is_ok());
    }
}
