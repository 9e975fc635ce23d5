// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./suitebridge.toml` > `~/.config/suitebridge/suitebridge.toml`
//! > `/etc/suitebridge/suitebridge.toml` with environment variable overrides via the
//! `SUITEBRIDGE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SuitebridgeConfig;

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/suitebridge/suitebridge.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "suitebridge.toml";

/// Top-level sections, used to split `SUITEBRIDGE_<SECTION>_<KEY>` env vars.
const SECTIONS: &[&str] = &["query", "batch", "cache", "retry", "search", "backend", "log"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/suitebridge/suitebridge.toml` (system-wide)
/// 3. `~/.config/suitebridge/suitebridge.toml` (user XDG config)
/// 4. `./suitebridge.toml` (local directory)
/// 5. `SUITEBRIDGE_*` environment variables
pub fn load_config() -> Result<SuitebridgeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SuitebridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SuitebridgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SuitebridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SuitebridgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SuitebridgeConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

pub(crate) fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("suitebridge").join(LOCAL_CONFIG_PATH))
}

/// Environment provider mapping `SUITEBRIDGE_BATCH_MAX_BATCH_SIZE` to `batch.max_batch_size`.
///
/// Only the first underscore after a known section name becomes a dot, so keys
/// that contain underscores keep them.
fn env_provider() -> Env {
    Env::prefixed("SUITEBRIDGE_").map(|key| {
        let key_str = key.as_str();
        let mapped = SECTIONS
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or_else(|| key_str.to_string());
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn env_overrides_keep_underscores_in_key_names() {
        Jail::expect_with(|jail| {
            jail.set_env("SUITEBRIDGE_BATCH_MAX_BATCH_SIZE", "250");
            jail.set_env("SUITEBRIDGE_BACKEND_SCRIPT_ID", "customscript_search");
            jail.set_env("SUITEBRIDGE_CACHE_TTL_SECS", "5");
            let config: SuitebridgeConfig = Figment::new()
                .merge(Serialized::defaults(SuitebridgeConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.batch.max_batch_size, 250);
            assert_eq!(
                config.backend.script_id.as_deref(),
                Some("customscript_search")
            );
            assert_eq!(config.cache.ttl_secs, 5);
            Ok(())
        });
    }

    #[test]
    fn file_then_env_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
[query]
max_id_range = 500

[log]
level = "debug"
"#,
            )?;
            jail.set_env("SUITEBRIDGE_LOG_LEVEL", "trace");
            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.query.max_id_range, 500);
            assert_eq!(config.log.level, "trace");
            Ok(())
        });
    }
}
