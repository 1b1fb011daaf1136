// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Adapter that lets a `tracing_subscriber::fmt` layer write into a syncer.
//!
//! ```rust,ignore
//! let syncer = Arc::new(LokiSinkFactory::new(None).build(url, tags)?);
//! tracing_subscriber::fmt()
//!     .with_writer(LokiMakeWriter::new(Arc::clone(&syncer)))
//!     .init();
//! // later, from the host's own schedule
//! syncer.sync().await?;
//! ```

use crate::syncer::LokiWriteSyncer;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Clone)]
pub struct LokiMakeWriter {
    syncer: Arc<LokiWriteSyncer>,
}

impl LokiMakeWriter {
    #[must_use]
    pub fn new(syncer: Arc<LokiWriteSyncer>) -> Self {
        LokiMakeWriter { syncer }
    }
}

impl<'a> MakeWriter<'a> for LokiMakeWriter {
    type Writer = LokiWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LokiWriter {
            syncer: &self.syncer,
        }
    }
}

/// Each `write` call becomes one log entry.
///
/// `flush` does no I/O; delivery only happens on [`LokiWriteSyncer::sync`].
#[derive(Debug)]
pub struct LokiWriter<'a> {
    syncer: &'a LokiWriteSyncer,
}

impl io::Write for LokiWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.syncer.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
