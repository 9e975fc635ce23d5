// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config diagnostics: figment failures and semantic violations rendered
//! through miette, with typo suggestions for unknown keys.

#![allow(unused_assignments)] // emitted by miette's Diagnostic derive

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler};
use suitebridge_core::SuitebridgeError;
use thiserror::Error;

/// Jaro-Winkler score below which no correction is offered.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem, renderable as a miette report.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key not present in the config model, usually a typo.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(suitebridge::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// Dotted path, e.g. `cache.ttl_sec`.
        key: String,
        /// Closest valid key, when one is close enough.
        suggestion: Option<String>,
        /// Keys accepted in the enclosing section, comma-separated.
        valid_keys: String,
    },

    /// A value that does not deserialize into the field's type.
    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(suitebridge::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// Dotted path of the offending value.
        key: String,
        /// What was found instead.
        detail: String,
        /// Type the model expects.
        expected: String,
    },

    /// A required key with no default was not provided by any source.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(suitebridge::config::missing_key),
        help("set `{key}` in suitebridge.toml or through SUITEBRIDGE_* variables")
    )]
    MissingKey {
        /// Dotted path of the missing key.
        key: String,
    },

    /// A value that parsed but violates a semantic constraint.
    #[error("invalid `{key}`: {message}")]
    #[diagnostic(code(suitebridge::config::validation))]
    Validation {
        /// Dotted path of the key that failed validation.
        key: String,
        /// Which constraint was violated.
        message: String,
    },

    /// Any other figment failure (unreadable file, bad TOML syntax).
    #[error("configuration error: {0}")]
    #[diagnostic(code(suitebridge::config::other))]
    Other(String),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            key: key.to_string(),
            message: message.into(),
        }
    }

    fn from_figment(error: figment::Error) -> Self {
        let path = error.path.join(".");
        let qualify = |field: &str| {
            if path.is_empty() {
                field.to_string()
            } else {
                format!("{path}.{field}")
            }
        };
        match &error.kind {
            Kind::UnknownField(field, expected) => ConfigError::UnknownKey {
                key: qualify(field),
                suggestion: suggest_key(field, expected),
                valid_keys: expected.join(", "),
            },
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: qualify(field),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: path.clone(),
                detail: format!("found {actual}"),
                expected: expected.clone(),
            },
            _ => ConfigError::Other(error.to_string()),
        }
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? accepted keys: {valid_keys}"),
        None => format!("accepted keys: {valid_keys}"),
    }
}

/// Splits a figment failure into one diagnostic per underlying error.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter().map(ConfigError::from_figment).collect()
}

/// Closest accepted key to `unknown`, if any scores above the threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Writes every diagnostic to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}

/// Folds config diagnostics into a single [`SuitebridgeError::Config`].
pub fn into_core_error(errors: Vec<ConfigError>) -> SuitebridgeError {
    let joined = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    SuitebridgeError::Config(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_closest_cache_key() {
        assert_eq!(
            suggest_key("ttl_sec", &["enabled", "ttl_secs"]),
            Some("ttl_secs".to_string())
        );
        assert_eq!(
            suggest_key("max_concurency", &["max_batch_size", "max_concurrency", "parallel"]),
            Some("max_concurrency".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_unrelated_key() {
        assert_eq!(suggest_key("zzzzzz", &["max_batch_size", "parallel"]), None);
    }

    #[test]
    fn core_error_names_each_key() {
        let err = into_core_error(vec![
            ConfigError::invalid("batch.max_concurrency", "must be at least 1"),
            ConfigError::Other("b".into()),
        ]);
        assert_eq!(err.kind(), suitebridge_core::ErrorKind::Config);
        assert!(
            err.to_string()
                .contains("invalid `batch.max_concurrency`: must be at least 1; configuration error: b")
        );
    }
}
