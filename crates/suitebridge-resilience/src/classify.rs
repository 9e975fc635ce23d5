// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps raw backend failures onto the error taxonomy.
//!
//! Sources are consulted in order: backend fault code, HTTP status, message
//! heuristics, then transport kind. Anything unrecognised becomes a
//! `BackendFault` carrying the backend code and message.

use std::time::Duration;

use suitebridge_core::{BackendFailure, RecordType, SuitebridgeError, TransportKind, Violation};

/// How a classified failure may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Rate limits and connect failures: retried for every operation.
    Always,
    /// Faults and timeouts: retried only when the operation is an idempotent read.
    IdempotentOnly,
    Never,
}

/// Describes the backend call being made, for error detail and retry decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub idempotent: bool,
    pub record_type: Option<RecordType>,
    pub record_id: Option<String>,
    pub search_id: Option<String>,
    /// Per-call deadline. `None` leaves the call unbounded.
    pub timeout: Option<Duration>,
}

impl Operation {
    /// An idempotent read.
    pub fn read(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            idempotent: true,
            record_type: None,
            record_id: None,
            search_id: None,
            timeout: None,
        }
    }

    /// A mutating call. Faults and timeouts are never retried.
    pub fn write(name: impl Into<String>) -> Self {
        Self {
            idempotent: false,
            ..Self::read(name)
        }
    }

    pub fn record_type(mut self, record_type: &RecordType) -> Self {
        self.record_type = Some(record_type.clone());
        self
    }

    pub fn record_id(mut self, id: impl ToString) -> Self {
        self.record_id = Some(id.to_string());
        self
    }

    pub fn search_id(mut self, search_id: impl Into<String>) -> Self {
        self.search_id = Some(search_id.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn not_found(&self) -> SuitebridgeError {
        SuitebridgeError::RecordNotFound {
            record_type: self
                .record_type
                .as_ref()
                .map_or_else(|| "record".to_string(), ToString::to_string),
            record_id: self.record_id.clone().unwrap_or_else(|| "unknown".to_string()),
        }
    }

    fn stale(&self) -> SuitebridgeError {
        SuitebridgeError::StaleContinuation {
            search_id: self.search_id.clone().unwrap_or_default(),
        }
    }

    fn timed_out(&self) -> SuitebridgeError {
        SuitebridgeError::Timeout {
            operation: self.name.clone(),
            timeout: self.timeout.unwrap_or_default(),
        }
    }
}

/// A classified failure and its retry class.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub error: SuitebridgeError,
    pub retry: RetryClass,
}

/// Classifies a backend failure in the context of `op`.
pub fn classify(failure: &BackendFailure, op: &Operation) -> Classified {
    let error = match failure {
        BackendFailure::Fault { code, message } => by_code(code, message, None, op)
            .or_else(|| by_message(message, op))
            .unwrap_or_else(|| SuitebridgeError::BackendFault {
                code: code.clone(),
                message: message.clone(),
            }),
        BackendFailure::Http {
            status,
            code,
            message,
            retry_after,
        } => code
            .as_deref()
            .and_then(|c| by_code(c, message, *retry_after, op))
            .or_else(|| by_status(*status, message, *retry_after, op))
            .or_else(|| by_message(message, op))
            .unwrap_or_else(|| SuitebridgeError::BackendFault {
                code: code.clone().unwrap_or_else(|| format!("HTTP_{status}")),
                message: message.clone(),
            }),
        BackendFailure::Transport { kind, message } => {
            let error = match kind {
                TransportKind::Timeout => op.timed_out(),
                TransportKind::Connect => SuitebridgeError::BackendFault {
                    code: "CONNECTION_FAILED".to_string(),
                    message: message.clone(),
                },
                TransportKind::Other => SuitebridgeError::BackendFault {
                    code: "TRANSPORT".to_string(),
                    message: message.clone(),
                },
            };
            let retry = if *kind == TransportKind::Connect {
                RetryClass::Always
            } else {
                retry_class(&error)
            };
            return Classified { error, retry };
        }
    };
    let retry = retry_class(&error);
    Classified { error, retry }
}

fn retry_class(error: &SuitebridgeError) -> RetryClass {
    match error {
        SuitebridgeError::RateLimit { .. } => RetryClass::Always,
        SuitebridgeError::BackendFault { .. } | SuitebridgeError::Timeout { .. } => {
            RetryClass::IdempotentOnly
        }
        _ => RetryClass::Never,
    }
}

fn by_code(
    code: &str,
    message: &str,
    retry_after: Option<Duration>,
    op: &Operation,
) -> Option<SuitebridgeError> {
    Some(match code {
        "INVALID_LOGIN_CREDENTIALS" | "INVALID_LOGIN_ATTEMPT" | "INVALID_LOGIN" | "LOGIN_DISABLED" => {
            SuitebridgeError::Authentication {
                message: message.to_string(),
            }
        }
        "INSUFFICIENT_PERMISSION" | "INVALID_ROLE" => SuitebridgeError::Permission {
            message: message.to_string(),
        },
        "RCRD_DSNT_EXIST" => op.not_found(),
        "EXCEEDED_REQUEST_LIMIT" | "EXCEEDED_CONCURRENCY_LIMIT" | "SSS_REQUEST_LIMIT_EXCEEDED" => {
            SuitebridgeError::RateLimit { retry_after }
        }
        "INVALID_SEARCH_ID" | "SEARCH_EXPIRED" => op.stale(),
        "SSS_REQUEST_TIME_EXCEEDED" | "SSS_TIME_LIMIT_EXCEEDED" => op.timed_out(),
        "INVALID_FLD_VALUE" | "INVALID_KEY_OR_REF" | "INVALID_SEARCH_CRITERIA" => {
            backend_validation(code, message)
        }
        _ => return None,
    })
}

fn by_status(
    status: u16,
    message: &str,
    retry_after: Option<Duration>,
    op: &Operation,
) -> Option<SuitebridgeError> {
    Some(match status {
        401 => SuitebridgeError::Authentication {
            message: message.to_string(),
        },
        403 => SuitebridgeError::Permission {
            message: message.to_string(),
        },
        404 => op.not_found(),
        429 => SuitebridgeError::RateLimit { retry_after },
        408 | 504 => op.timed_out(),
        400 | 422 => backend_validation("request", message),
        _ => return None,
    })
}

fn by_message(message: &str, op: &Operation) -> Option<SuitebridgeError> {
    let lower = message.to_ascii_lowercase();
    if lower.contains("invalid search id") || lower.contains("search has expired") {
        Some(op.stale())
    } else if lower.contains("timeout") || lower.contains("timed out") {
        Some(op.timed_out())
    } else if lower.contains("invalid login") || lower.contains("authentication") {
        Some(SuitebridgeError::Authentication {
            message: message.to_string(),
        })
    } else if lower.contains("request limit") || lower.contains("rate limit") {
        Some(SuitebridgeError::RateLimit { retry_after: None })
    } else {
        None
    }
}

fn backend_validation(field: &str, message: &str) -> SuitebridgeError {
    SuitebridgeError::Validation {
        violations: vec![Violation::new(field, "", message)],
    }
}

#[cfg(test)]
mod tests {
    use suitebridge_core::ErrorKind;

    use super::*;

    fn op() -> Operation {
        Operation::read("search_more")
            .record_type(&RecordType::new("customer"))
            .record_id(42)
            .search_id("WEBSERVICES_1")
            .timeout(Duration::from_secs(30))
    }

    fn kind_of(failure: BackendFailure) -> ErrorKind {
        classify(&failure, &op()).error.kind()
    }

    fn http(status: u16, code: Option<&str>, message: &str) -> BackendFailure {
        BackendFailure::Http {
            status,
            code: code.map(str::to_string),
            message: message.to_string(),
            retry_after: None,
        }
    }

    #[test]
    fn status_codes_map_to_kinds() {
        assert_eq!(kind_of(http(401, None, "nope")), ErrorKind::Authentication);
        assert_eq!(kind_of(http(403, None, "nope")), ErrorKind::Permission);
        assert_eq!(kind_of(http(404, None, "gone")), ErrorKind::RecordNotFound);
        assert_eq!(kind_of(http(429, None, "slow down")), ErrorKind::RateLimit);
        assert_eq!(kind_of(http(400, None, "bad")), ErrorKind::Validation);
        assert_eq!(kind_of(http(504, None, "gateway")), ErrorKind::Timeout);
        assert_eq!(kind_of(http(500, None, "boom")), ErrorKind::BackendFault);
        assert_eq!(kind_of(http(502, None, "bad gateway")), ErrorKind::BackendFault);
    }

    #[test]
    fn fault_codes_map_to_kinds() {
        let cases = [
            ("INVALID_LOGIN_CREDENTIALS", ErrorKind::Authentication),
            ("INSUFFICIENT_PERMISSION", ErrorKind::Permission),
            ("RCRD_DSNT_EXIST", ErrorKind::RecordNotFound),
            ("EXCEEDED_REQUEST_LIMIT", ErrorKind::RateLimit),
            ("INVALID_SEARCH_ID", ErrorKind::StaleContinuation),
            ("SSS_REQUEST_TIME_EXCEEDED", ErrorKind::Timeout),
            ("INVALID_FLD_VALUE", ErrorKind::Validation),
            ("UNEXPECTED_ERROR", ErrorKind::BackendFault),
        ];
        for (code, kind) in cases {
            assert_eq!(
                kind_of(BackendFailure::fault(code, "detail")),
                kind,
                "code {code}"
            );
        }
    }

    #[test]
    fn code_wins_over_status() {
        // A 400 carrying INVALID_SEARCH_ID is an expired continuation, not bad input.
        let classified = classify(&http(400, Some("INVALID_SEARCH_ID"), "x"), &op());
        assert_eq!(
            classified.error,
            SuitebridgeError::StaleContinuation {
                search_id: "WEBSERVICES_1".into()
            }
        );
        assert_eq!(classified.retry, RetryClass::Never);
    }

    #[test]
    fn message_heuristics_apply_to_unknown_faults() {
        assert_eq!(
            kind_of(BackendFailure::fault("USER_ERROR", "Invalid search id: WEBSERVICES_1")),
            ErrorKind::StaleContinuation
        );
        assert_eq!(
            kind_of(BackendFailure::fault("soap:Server", "Read timeout on socket")),
            ErrorKind::Timeout
        );
        assert_eq!(
            kind_of(http(500, None, "Invalid login attempt.")),
            ErrorKind::Authentication
        );
    }

    #[test]
    fn not_found_carries_identity() {
        let err = classify(&BackendFailure::fault("RCRD_DSNT_EXIST", "missing"), &op()).error;
        assert_eq!(
            err,
            SuitebridgeError::RecordNotFound {
                record_type: "customer".into(),
                record_id: "42".into()
            }
        );
    }

    #[test]
    fn retry_classes() {
        let rate = classify(
            &BackendFailure::Http {
                status: 429,
                code: None,
                message: String::new(),
                retry_after: Some(Duration::from_secs(3)),
            },
            &op(),
        );
        assert_eq!(rate.retry, RetryClass::Always);
        assert_eq!(rate.error.retry_after(), Some(Duration::from_secs(3)));

        assert_eq!(
            classify(&BackendFailure::connect("refused"), &op()).retry,
            RetryClass::Always
        );
        assert_eq!(
            classify(&BackendFailure::timeout("deadline"), &op()).retry,
            RetryClass::IdempotentOnly
        );
        assert_eq!(
            classify(&http(500, None, "boom"), &op()).retry,
            RetryClass::IdempotentOnly
        );
        assert_eq!(
            classify(&http(403, None, "no"), &op()).retry,
            RetryClass::Never
        );
    }
}
