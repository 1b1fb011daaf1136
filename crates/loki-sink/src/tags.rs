// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::ConfigError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Stream labels attached to every batch a syncer pushes.
///
/// Loki only accepts string label values, so the set is a plain
/// string-to-string map. Keys are kept sorted so the serialized stream
/// object is stable across flushes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses `service=api,env=prod`. `service:api` is accepted too.
    ///
    /// Blank segments are skipped. A segment without a separator or with an
    /// empty key is rejected.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let mut tags = Self::new();
        for segment in input.split(',') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let Some((key, value)) = segment.split_once(['=', ':']) else {
                return Err(ConfigError::InvalidTags(format!(
                    "missing '=' in '{segment}'"
                )));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::InvalidTags(format!("empty key in '{segment}'")));
            }
            tags.insert(key, value.trim());
        }
        Ok(tags)
    }
}

impl<K, V> FromIterator<(K, V)> for Tags
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
