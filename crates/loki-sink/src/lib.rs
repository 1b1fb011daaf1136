// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Buffered write-syncer for the Loki push API.
//!
//! Lines are appended with [`LokiWriteSyncer::write`] and delivered, gzip
//! compressed, by an explicit [`LokiWriteSyncer::sync`]. Delivered lines are
//! dropped only once Loki answers `204 No Content`.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod buffer;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod payload;
pub mod syncer;
pub mod tags;
pub mod writer;

pub use error::{ConfigError, LokiError};
pub use syncer::{LokiSinkFactory, LokiWriteSyncer};
pub use tags::Tags;
