// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration for hvalctl.

use std::path::Path;

use anyhow::{Context, Result};
use hval_parse::{HeaderName, DEFAULT_MAX_LINE_LENGTH};
use serde::Deserialize;

/// Settings read from the optional JSON config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Treat headers without a typed value as errors
    pub reject_unknown: bool,

    /// If non-empty, only these headers are accepted (case-insensitive)
    pub allowed_headers: Vec<String>,

    /// Longest accepted physical line, in bytes
    pub max_line_length: usize,

    /// Stop at the first rejected header
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reject_unknown: false,
            allowed_headers: Vec::new(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            strict: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&contents).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(contents)?;
        if config.max_line_length == 0 {
            anyhow::bail!("max_line_length must be positive");
        }
        Ok(config)
    }

    /// Whether a header called `name` passes the allow list and the
    /// unknown-header policy.
    pub fn permits(&self, name: &HeaderName) -> bool {
        if self.reject_unknown && !name.is_known() {
            return false;
        }
        self.allowed_headers.is_empty()
            || self
                .allowed_headers
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = Config::from_json(r#"{"reject_unknown": true}"#).unwrap();
        assert!(config.reject_unknown);
        assert!(config.allowed_headers.is_empty());
        assert_eq!(config.max_line_length, DEFAULT_MAX_LINE_LENGTH);
        assert!(!config.strict);
    }

    #[test]
    fn zero_line_length_rejected() {
        assert!(Config::from_json(r#"{"max_line_length": 0}"#).is_err());
        assert!(Config::from_json("not json").is_err());
    }

    #[test]
    fn allow_list_ignores_case() {
        let config = Config {
            allowed_headers: vec!["content-type".into(), "x-trace".into()],
            ..Config::default()
        };
        assert!(config.permits(&HeaderName::CONTENT_TYPE));
        assert!(config.permits(&HeaderName::parse("X-Trace").unwrap()));
        assert!(!config.permits(&HeaderName::ACCEPT));
    }

    #[test]
    fn unknown_headers_rejected_when_configured() {
        let config = Config {
            reject_unknown: true,
            ..Config::default()
        };
        assert!(config.permits(&HeaderName::ETAG));
        assert!(!config.permits(&HeaderName::parse("X-Trace").unwrap()));
    }
}
