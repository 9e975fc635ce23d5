// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Suitebridge.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use suitebridge_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("page size: {}", config.query.default_page_size);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, into_core_error, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    BackendConfig, BatchConfig, CacheConfig, LogConfig, QueryConfig, RetryConfig, SearchConfig,
    SuitebridgeConfig,
};

/// Load configuration from the XDG hierarchy and validate it.
///
/// Returns either a valid `SuitebridgeConfig` or every diagnostic found.
pub fn load_and_validate() -> Result<SuitebridgeConfig, Vec<ConfigError>> {
    finish(loader::load_config())
}

/// Load configuration from a specific TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<SuitebridgeConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content))
}

/// Load configuration from a file (plus env overrides) and validate it.
pub fn load_and_validate_path(
    path: &std::path::Path,
) -> Result<SuitebridgeConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path))
}

fn finish(
    loaded: Result<SuitebridgeConfig, figment::Error>,
) -> Result<SuitebridgeConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            tracing::debug!(level = %config.log.level, "configuration loaded");
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}
