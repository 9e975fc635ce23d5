// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy shared by every Suitebridge component.
//!
//! Every surfaced error carries a [`ErrorKind`] tag plus structured detail so
//! the boundary layer can map it to a transport response without parsing text.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Stable classification tag for a [`SuitebridgeError`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Authentication,
    Permission,
    RecordNotFound,
    Validation,
    RateLimit,
    StaleContinuation,
    BackendFault,
    Timeout,
    Mapping,
    Config,
    Internal,
}

/// A single rejected input, reported as part of an aggregated validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Caller-facing parameter or field name.
    pub field: String,
    /// The offending value as supplied.
    pub value: String,
    /// Why the value was rejected.
    pub reason: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} (got `{}`)", self.field, self.reason, self.value)
    }
}

/// The primary error type returned by every Suitebridge operation.
///
/// `Clone` so that a single backend result can be shared between coalesced
/// callers of the field cache.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SuitebridgeError {
    /// Backend rejected the caller's credentials.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// Credentials are valid but lack access to the requested operation.
    #[error("permission denied: {message}")]
    Permission { message: String },

    /// The requested record does not exist (or is not visible).
    #[error("{record_type} with id {record_id} not found")]
    RecordNotFound {
        record_type: String,
        record_id: String,
    },

    /// Caller input was rejected. Lists every violation, not just the first.
    #[error("validation failed: {}", format_violations(.violations))]
    Validation { violations: Vec<Violation> },

    /// Backend throttled the request.
    #[error("backend rate limit exceeded{}", format_retry_after(.retry_after))]
    RateLimit { retry_after: Option<Duration> },

    /// A search continuation was invalidated; iteration must restart from the first page.
    #[error("search continuation `{search_id}` is no longer valid, restart from the first page")]
    StaleContinuation { search_id: String },

    /// Backend returned a fault not covered by a more specific kind.
    #[error("backend fault {code}: {message}")]
    BackendFault { code: String, message: String },

    /// A backend call exceeded its deadline.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    /// A wire record could not be translated to or from the domain shape.
    #[error("cannot map field `{field}` at `{path}`: {reason}")]
    Mapping {
        field: String,
        path: String,
        reason: String,
    },

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SuitebridgeError {
    /// Returns the classification tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Permission { .. } => ErrorKind::Permission,
            Self::RecordNotFound { .. } => ErrorKind::RecordNotFound,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::RateLimit { .. } => ErrorKind::RateLimit,
            Self::StaleContinuation { .. } => ErrorKind::StaleContinuation,
            Self::BackendFault { .. } => ErrorKind::BackendFault,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Mapping { .. } => ErrorKind::Mapping,
            Self::Config(_) => ErrorKind::Config,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Builds a validation error holding a single violation.
    pub fn invalid(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            violations: vec![Violation::new(field, value, reason)],
        }
    }

    /// Returns the violations of a validation error, or an empty slice.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Validation { violations } => violations,
            _ => &[],
        }
    }

    /// Returns the backend-supplied retry hint of a rate-limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit { retry_after } => *retry_after,
            _ => None,
        }
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_retry_after(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", retry after {}s", d.as_secs()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn kind_matches_variant() {
        let cases = [
            (
                SuitebridgeError::Authentication {
                    message: "bad login".into(),
                },
                ErrorKind::Authentication,
            ),
            (
                SuitebridgeError::RateLimit { retry_after: None },
                ErrorKind::RateLimit,
            ),
            (
                SuitebridgeError::StaleContinuation {
                    search_id: "s-1".into(),
                },
                ErrorKind::StaleContinuation,
            ),
            (SuitebridgeError::Config("x".into()), ErrorKind::Config),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn error_kind_string_round_trip() {
        for kind in [
            ErrorKind::Authentication,
            ErrorKind::Permission,
            ErrorKind::RecordNotFound,
            ErrorKind::Validation,
            ErrorKind::RateLimit,
            ErrorKind::StaleContinuation,
            ErrorKind::BackendFault,
            ErrorKind::Timeout,
        ] {
            let s = kind.to_string();
            assert_eq!(ErrorKind::from_str(&s).unwrap(), kind);
        }
        assert_eq!(ErrorKind::RecordNotFound.to_string(), "record_not_found");
    }

    #[test]
    fn validation_message_lists_every_violation() {
        let err = SuitebridgeError::Validation {
            violations: vec![
                Violation::new("ids", "abc", "not an integer"),
                Violation::new("fields", "nme", "unknown field"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("ids: not an integer"), "got: {msg}");
        assert!(msg.contains("fields: unknown field"), "got: {msg}");
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn rate_limit_carries_retry_after() {
        let err = SuitebridgeError::RateLimit {
            retry_after: Some(Duration::from_secs(7)),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
        assert!(err.to_string().contains("retry after 7s"));
    }
}
