// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP client construction for hosts that do not bring their own client.
//!
//! The syncer itself never configures TLS or timeouts; it uses whatever
//! `reqwest::Client` it was built with. This helper applies the timeout and
//! proxy settings from [`SinkConfig`].

use crate::config::SinkConfig;
use std::error::Error;
use tracing::error;

/// Creates a client from `config`, falling back to a direct connection when
/// the proxy settings are unusable.
#[must_use]
pub fn get_client(config: &SinkConfig) -> reqwest::Client {
    match build_client(config) {
        Ok(client) => client,
        Err(e) => {
            error!(
                "LOKI | Unable to parse proxy configuration: {}, falling back to direct connection",
                e
            );
            match build_client_without_proxy(config) {
                Ok(client) => client,
                Err(inner) => {
                    error!(
                        "LOKI | Failed to build HTTP client without proxy: {}, using reqwest defaults",
                        inner
                    );
                    reqwest::Client::new()
                }
            }
        }
    }
}

fn build_client(config: &SinkConfig) -> Result<reqwest::Client, Box<dyn Error>> {
    let mut builder = base_builder(config);
    if let Some(proxy) = &config.https_proxy {
        builder = builder.proxy(reqwest::Proxy::https(proxy)?);
    }
    Ok(builder.build()?)
}

fn build_client_without_proxy(config: &SinkConfig) -> Result<reqwest::Client, Box<dyn Error>> {
    Ok(base_builder(config).build()?)
}

fn base_builder(config: &SinkConfig) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(config.timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_with_proxy() {
        let config = SinkConfig {
            url: "loki://localhost:3100".to_string(),
            https_proxy: Some("http://proxy.internal:3128".to_string()),
            ..Default::default()
        };
        assert!(build_client(&config).is_ok());
    }

    #[test]
    fn test_invalid_proxy_falls_back() {
        let config = SinkConfig {
            url: "loki://localhost:3100".to_string(),
            https_proxy: Some("http://[invalid".to_string()),
            ..Default::default()
        };
        assert!(build_client(&config).is_err());
        // Falls back instead of failing.
        let _client = get_client(&config);
    }
}
