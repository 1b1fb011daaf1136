// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use loki_sink::{config::SinkConfig, LokiSinkFactory, LokiWriteSyncer};

#[tokio::main]
pub async fn main() {
    let config = match SinkConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // No subscriber yet, the level comes from this config.
            eprintln!("loki-forward: invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = format!(
        "h2=off,hyper=off,rustls=off,reqwest=off,{}",
        config.log_level
    );

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let syncer = match LokiSinkFactory::from_config(&config).build(&config.url, config.tags.clone())
    {
        Ok(syncer) => Arc::new(syncer),
        Err(e) => {
            error!("Error creating Loki sink: {e}");
            return;
        }
    };
    info!(
        "Forwarding stdin to {} every {:?}",
        syncer.endpoint(),
        config.flush_interval
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut flush_interval = interval(config.flush_interval);
    flush_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    flush_interval.tick().await; // discard first tick, which is instantaneous

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    syncer.write(line.as_bytes());
                }
                Ok(None) => {
                    debug!("stdin closed");
                    break;
                }
                Err(e) => {
                    error!("Failed to read stdin: {e}");
                    break;
                }
            },
            _ = flush_interval.tick() => flush(&syncer).await,
            _ = &mut ctrl_c => {
                info!("Interrupted, flushing pending lines");
                break;
            }
        }
    }

    flush(&syncer).await;
    if syncer.pending() > 0 {
        warn!("Exiting with {} undelivered lines", syncer.pending());
    }
    if let Err(e) = syncer.close() {
        error!("Failed to close Loki sink: {e}");
    }
}

async fn flush(syncer: &LokiWriteSyncer) {
    if syncer.pending() == 0 {
        return;
    }
    debug!("Flushing {} lines", syncer.pending());
    if let Err(e) = syncer.sync().await {
        // Lines stay buffered and go out with the next tick.
        error!("Flush failed, will retry: {e}");
    }
}
