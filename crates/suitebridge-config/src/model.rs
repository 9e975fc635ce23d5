// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Suitebridge.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Suitebridge configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SuitebridgeConfig {
    /// Query parsing limits.
    #[serde(default)]
    pub query: QueryConfig,

    /// Field-fetch batching.
    #[serde(default)]
    pub batch: BatchConfig,

    /// Field cache.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Retry policy for backend calls.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Search continuation lifecycle.
    #[serde(default)]
    pub search: SearchConfig,

    /// Backend endpoint settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Logging.
    #[serde(default)]
    pub log: LogConfig,
}

/// Limits applied when parsing caller query intent.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
    /// Maximum number of ids an id filter may expand to.
    #[serde(default = "default_max_id_range")]
    pub max_id_range: u64,

    /// Page size used when the caller does not ask for one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Upper clamp for page sizes. The backend rejects pages above 1000.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_id_range: default_max_id_range(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_max_id_range() -> u64 {
    10_000
}

fn default_page_size() -> u32 {
    20
}

fn default_max_page_size() -> u32 {
    1000
}

/// Field-fetch batching settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    /// Maximum identities per backend field-fetch call.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Maximum backend calls in flight across all requests.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Run the groups of one fetch in parallel. When false, groups run sequentially.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            max_concurrency: default_max_concurrency(),
            parallel: default_parallel(),
        }
    }
}

fn default_max_batch_size() -> usize {
    1000
}

fn default_max_concurrency() -> usize {
    4
}

fn default_parallel() -> bool {
    true
}

/// Field cache settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Freshness window for cached wire fragments.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl_secs() -> u64 {
    30
}

/// Retry policy for backend calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum attempts (first call included) for rate limits and connect failures.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Maximum attempts for backend faults and timeouts on idempotent reads.
    #[serde(default = "default_fault_attempts")]
    pub fault_attempts: u32,

    /// First backoff delay; doubles on each retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Ceiling for any single backoff delay, including backend retry-after hints.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            fault_attempts: default_fault_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    4
}

fn default_fault_attempts() -> u32 {
    2
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

/// Search continuation lifecycle.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// A continuation unused for this long is discarded.
    #[serde(default = "default_continuation_idle_secs")]
    pub continuation_idle_secs: u64,

    /// A continuation older than this is discarded regardless of use.
    #[serde(default = "default_continuation_max_lifetime_secs")]
    pub continuation_max_lifetime_secs: u64,
}

impl SearchConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.continuation_idle_secs)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.continuation_max_lifetime_secs)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            continuation_idle_secs: default_continuation_idle_secs(),
            continuation_max_lifetime_secs: default_continuation_max_lifetime_secs(),
        }
    }
}

fn default_continuation_idle_secs() -> u64 {
    900
}

fn default_continuation_max_lifetime_secs() -> u64 {
    3600
}

/// Backend endpoint settings for the scripted search protocol.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Account id, used to derive the endpoint host.
    #[serde(default)]
    pub account: Option<String>,

    /// Pinned backend API version (`YYYY_N`).
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Search script id.
    #[serde(default)]
    pub script_id: Option<String>,

    /// Search script deployment id.
    #[serde(default)]
    pub deploy_id: Option<String>,

    /// Overrides the derived endpoint URL (staging, tests).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-call deadline.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Application id reported to the backend.
    #[serde(default = "default_application_id")]
    pub application_id: String,
}

impl BackendConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            account: None,
            api_version: default_api_version(),
            script_id: None,
            deploy_id: None,
            base_url: None,
            call_timeout_secs: default_call_timeout_secs(),
            application_id: default_application_id(),
        }
    }
}

fn default_api_version() -> String {
    "2024_2".to_string()
}

fn default_call_timeout_secs() -> u64 {
    300
}

fn default_application_id() -> String {
    "suitebridge".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
