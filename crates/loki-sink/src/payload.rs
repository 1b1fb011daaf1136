// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Loki push API payload.
//!
//! ```json
//! {"streams":[{"stream":{"service":"x"},"values":[["1700000000000000000","line"]]}]}
//! ```
//!
//! The body is sent gzip compressed with `Content-Encoding: gzip`.

use crate::buffer::LogEntry;
use crate::error::LokiError;
use crate::tags::Tags;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use std::io::Write;

/// Path of the push API, relative to the base endpoint.
pub const PUSH_PATH: &str = "loki/api/v1/push";

pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

#[derive(Debug, Serialize)]
pub struct PushRequest<'a> {
    pub streams: Vec<Stream<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Stream<'a> {
    pub stream: &'a Tags,
    pub values: &'a [LogEntry],
}

impl<'a> PushRequest<'a> {
    /// A push carrying one stream.
    #[must_use]
    pub fn single(tags: &'a Tags, values: &'a [LogEntry]) -> Self {
        PushRequest {
            streams: vec![Stream {
                stream: tags,
                values,
            }],
        }
    }

    /// Serializes to JSON and gzips the result.
    pub fn encode(&self, compression: Compression) -> Result<Vec<u8>, LokiError> {
        let json = serde_json::to_vec(self)?;
        let mut encoder = GzEncoder::new(Vec::with_capacity(json.len() / 4), compression);
        encoder.write_all(&json)?;
        Ok(encoder.finish()?)
    }
}
