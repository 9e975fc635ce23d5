// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured diagnostic sink for cache misses, retries, and continuation expirations.
//!
//! The default [`TracingSink`] writes `tracing` events and increments
//! `metrics` counters, so any installed recorder (Prometheus, statsd, ...)
//! picks them up.

use std::time::Duration;

use metrics::describe_counter;
use tracing::{debug, info, warn};

use crate::error::ErrorKind;
use crate::types::RecordType;

/// A diagnostic event emitted by the core.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    CacheHit {
        record_type: RecordType,
        count: usize,
    },
    CacheMiss {
        record_type: RecordType,
        count: usize,
    },
    /// A backend call failed and will be retried after `delay`.
    Retry {
        operation: String,
        attempt: u32,
        kind: ErrorKind,
        delay: Duration,
    },
    ContinuationOpened {
        search_id: String,
        total_pages: u32,
    },
    ContinuationExhausted {
        search_id: String,
    },
    ContinuationExpired {
        search_id: String,
        reason: String,
    },
    /// One identity of a field-fetch batch failed.
    FetchFailed {
        record_type: RecordType,
        kind: ErrorKind,
    },
}

/// Receiver of diagnostic events.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, event: DiagnosticEvent);
}

/// Register all Suitebridge metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!("suitebridge_cache_hits_total", "Field cache hits");
    describe_counter!("suitebridge_cache_misses_total", "Field cache misses");
    describe_counter!("suitebridge_retries_total", "Backend call retries");
    describe_counter!(
        "suitebridge_continuations_total",
        "Search continuation lifecycle transitions"
    );
    describe_counter!(
        "suitebridge_fetch_failures_total",
        "Per-identity field fetch failures"
    );
}

/// Sink that logs through `tracing` and counts through `metrics`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::CacheHit { record_type, count } => {
                debug!(record_type = %record_type, count, "field cache hit");
                metrics::counter!("suitebridge_cache_hits_total", "record_type" => record_type.to_string())
                    .increment(count as u64);
            }
            DiagnosticEvent::CacheMiss { record_type, count } => {
                debug!(record_type = %record_type, count, "field cache miss");
                metrics::counter!("suitebridge_cache_misses_total", "record_type" => record_type.to_string())
                    .increment(count as u64);
            }
            DiagnosticEvent::Retry {
                operation,
                attempt,
                kind,
                delay,
            } => {
                warn!(
                    operation = %operation,
                    attempt,
                    kind = %kind,
                    delay_ms = delay.as_millis() as u64,
                    "retrying backend call"
                );
                metrics::counter!("suitebridge_retries_total", "kind" => kind.to_string())
                    .increment(1);
            }
            DiagnosticEvent::ContinuationOpened {
                search_id,
                total_pages,
            } => {
                debug!(search_id = %search_id, total_pages, "search continuation opened");
                metrics::counter!("suitebridge_continuations_total", "state" => "active")
                    .increment(1);
            }
            DiagnosticEvent::ContinuationExhausted { search_id } => {
                debug!(search_id = %search_id, "search continuation exhausted");
                metrics::counter!("suitebridge_continuations_total", "state" => "exhausted")
                    .increment(1);
            }
            DiagnosticEvent::ContinuationExpired { search_id, reason } => {
                info!(search_id = %search_id, reason = %reason, "search continuation expired");
                metrics::counter!("suitebridge_continuations_total", "state" => "expired")
                    .increment(1);
            }
            DiagnosticEvent::FetchFailed { record_type, kind } => {
                warn!(record_type = %record_type, kind = %kind, "field fetch failed for identity");
                metrics::counter!("suitebridge_fetch_failures_total", "kind" => kind.to_string())
                    .increment(1);
            }
        }
    }
}
