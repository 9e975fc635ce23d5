// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as bounded page sizes, a well-formed API version, and paired script ids.

use crate::diagnostic::ConfigError;
use crate::model::SuitebridgeConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Largest page the backend will serve.
const BACKEND_MAX_PAGE_SIZE: u32 = 1000;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &SuitebridgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |key: &str, message: String| errors.push(ConfigError::invalid(key, message));

    let query = &config.query;
    if query.max_id_range == 0 {
        fail("query.max_id_range", "must be at least 1".into());
    }
    if query.max_page_size == 0 || query.max_page_size > BACKEND_MAX_PAGE_SIZE {
        fail(
            "query.max_page_size",
            format!("must be between 1 and {BACKEND_MAX_PAGE_SIZE}, got {}", query.max_page_size),
        );
    }
    if query.default_page_size == 0 || query.default_page_size > query.max_page_size {
        fail(
            "query.default_page_size",
            format!(
                "must be between 1 and query.max_page_size ({}), got {}",
                query.max_page_size, query.default_page_size
            ),
        );
    }

    let at_least_one = [
        ("batch.max_batch_size", config.batch.max_batch_size as u64),
        ("batch.max_concurrency", config.batch.max_concurrency as u64),
        ("retry.max_attempts", u64::from(config.retry.max_attempts)),
        ("retry.fault_attempts", u64::from(config.retry.fault_attempts)),
        ("search.continuation_idle_secs", config.search.continuation_idle_secs),
        ("backend.call_timeout_secs", config.backend.call_timeout_secs),
    ];
    for (key, value) in at_least_one {
        if value == 0 {
            fail(key, "must be at least 1".into());
        }
    }

    if config.retry.base_delay_ms > config.retry.max_delay_ms {
        fail(
            "retry.base_delay_ms",
            format!(
                "{} exceeds retry.max_delay_ms ({})",
                config.retry.base_delay_ms, config.retry.max_delay_ms
            ),
        );
    }
    if config.search.continuation_max_lifetime_secs < config.search.continuation_idle_secs {
        fail(
            "search.continuation_max_lifetime_secs",
            "must not be shorter than search.continuation_idle_secs".into(),
        );
    }

    let backend = &config.backend;
    if !is_valid_api_version(&backend.api_version) {
        fail(
            "backend.api_version",
            format!("`{}` does not match YYYY_N (e.g. 2024_2)", backend.api_version),
        );
    }
    if backend.script_id.is_some() != backend.deploy_id.is_some() {
        fail(
            "backend.script_id",
            "backend.script_id and backend.deploy_id must be set together".into(),
        );
    }
    if let Some(url) = &backend.base_url
        && !(url.starts_with("https://") || url.starts_with("http://"))
    {
        fail("backend.base_url", format!("`{url}` is not an http(s) URL"));
    }

    if !LOG_LEVELS.contains(&config.log.level.to_ascii_lowercase().as_str()) {
        fail(
            "log.level",
            format!("`{}` is not one of {}", config.log.level, LOG_LEVELS.join(", ")),
        );
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Accepts `YYYY_N`, e.g. `2024_2`.
fn is_valid_api_version(version: &str) -> bool {
    match version.split_once('_') {
        Some((year, release)) => {
            year.len() == 4
                && year.chars().all(|c| c.is_ascii_digit())
                && !release.is_empty()
                && release.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| match e {
                ConfigError::Validation { key, message } => {
                    key.contains(needle) || message.contains(needle)
                }
                _ => false,
            })
    }

    #[test]
    fn default_config_validates() {
        let config = SuitebridgeConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn api_version_format_is_enforced() {
        assert!(is_valid_api_version("2024_2"));
        assert!(!is_valid_api_version("2024.2"));
        assert!(!is_valid_api_version("24_2"));
        assert!(!is_valid_api_version("2024_"));

        let mut config = SuitebridgeConfig::default();
        config.backend.api_version = "v2024".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "api_version"));
    }

    #[test]
    fn page_size_bounds_are_enforced() {
        let mut config = SuitebridgeConfig::default();
        config.query.max_page_size = 5000;
        config.query.default_page_size = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "query.max_page_size"));
        assert!(has_error(&errors, "default_page_size"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = SuitebridgeConfig::default();
        config.batch.max_batch_size = 0;
        config.batch.max_concurrency = 0;
        config.retry.base_delay_ms = 60_000;
        config.log.level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn script_and_deploy_ids_are_paired() {
        let mut config = SuitebridgeConfig::default();
        config.backend.script_id = Some("customscript_search".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "set together"));

        config.backend.deploy_id = Some("customdeploy1".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn base_url_must_be_http() {
        let mut config = SuitebridgeConfig::default();
        config.backend.base_url = Some("ftp://example.com".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "base_url"));
    }
}
