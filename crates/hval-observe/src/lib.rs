// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parse metrics and tracing integration for header parsing.
//!
//! The parser reports each accepted, rejected and formatted header to a
//! process-wide [`ParseMetrics`] sink. Nothing is reported until a sink is
//! installed.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use hval_observe::{parse_metrics, set_parse_metrics, TracingParseMetrics};
//! set_parse_metrics(Arc::new(TracingParseMetrics));
//! parse_metrics().on_header_parsed("content-type");
//! ```

use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::Level;

/// Metrics sink used by the header parser.
///
/// `header` is the lowercase header name and `reason` a short error kind such
/// as "invalid character"; neither carries header values.
pub trait ParseMetrics: Send + Sync + 'static {
    fn on_header_parsed(&self, header: &str);
    fn on_header_rejected(&self, header: &str, reason: &str);
    fn on_header_formatted(&self, header: &str);
}

#[derive(Debug, Default)]
struct NoopParseMetrics;

impl ParseMetrics for NoopParseMetrics {
    fn on_header_parsed(&self, _header: &str) {}
    fn on_header_rejected(&self, _header: &str, _reason: &str) {}
    fn on_header_formatted(&self, _header: &str) {}
}

static PARSE_METRICS: OnceCell<Arc<dyn ParseMetrics>> = OnceCell::new();
static NOOP_PARSE_METRICS: NoopParseMetrics = NoopParseMetrics;

/// Installs the global parse metrics implementation.
///
/// Returns `true` if the sink was installed, or `false` if one was already
/// configured.
pub fn set_parse_metrics(metrics: Arc<dyn ParseMetrics>) -> bool {
    PARSE_METRICS.set(metrics).is_ok()
}

/// Returns the currently configured sink.
pub fn parse_metrics() -> &'static dyn ParseMetrics {
    PARSE_METRICS
        .get()
        .map(|arc| arc.as_ref())
        .unwrap_or(&NOOP_PARSE_METRICS)
}

/// Creates a tracing span for work on one header field.
pub fn span_for_header(op: &'static str, header: &str) -> tracing::Span {
    tracing::span!(Level::DEBUG, "header", op = op, header = header)
}

/// Logs every event via `tracing`.
#[derive(Debug, Default)]
pub struct TracingParseMetrics;

impl ParseMetrics for TracingParseMetrics {
    fn on_header_parsed(&self, header: &str) {
        tracing::debug!(header, "header parsed");
    }

    fn on_header_rejected(&self, header: &str, reason: &str) {
        tracing::debug!(header, reason, "header rejected");
    }

    fn on_header_formatted(&self, header: &str) {
        tracing::trace!(header, "header formatted");
    }
}

/// Totals across all headers.
#[derive(Debug, Default)]
pub struct CountingParseMetrics {
    parsed: AtomicU64,
    rejected: AtomicU64,
    formatted: AtomicU64,
}

impl CountingParseMetrics {
    pub fn parsed(&self) -> u64 {
        self.parsed.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn formatted(&self) -> u64 {
        self.formatted.load(Ordering::Relaxed)
    }
}

impl ParseMetrics for CountingParseMetrics {
    fn on_header_parsed(&self, header: &str) {
        self.parsed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(header, "header parsed");
    }

    fn on_header_rejected(&self, header: &str, reason: &str) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(header, reason, "header rejected");
    }

    fn on_header_formatted(&self, _header: &str) {
        self.formatted.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_until_installed() {
        // Must not panic without a sink.
        parse_metrics().on_header_parsed("accept");
        parse_metrics().on_header_rejected("accept", "invalid character");
    }

    #[test]
    fn counting_metrics_tally_events() {
        let metrics = CountingParseMetrics::default();
        metrics.on_header_parsed("accept");
        metrics.on_header_parsed("etag");
        metrics.on_header_rejected("range", "invalid");
        metrics.on_header_formatted("accept");
        assert_eq!(metrics.parsed(), 2);
        assert_eq!(metrics.rejected(), 1);
        assert_eq!(metrics.formatted(), 1);
    }

    #[test]
    fn second_install_is_refused() {
        set_parse_metrics(Arc::new(CountingParseMetrics::default()));
        assert!(!set_parse_metrics(Arc::new(TracingParseMetrics)));
        parse_metrics().on_header_formatted("accept");
    }

    #[test]
    fn span_carries_header() {
        let span = span_for_header("parse", "cache-control");
        let _guard = span.enter();
    }
}
