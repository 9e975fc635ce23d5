// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw, unclassified backend failures as reported by protocol adapters.
//!
//! Adapters describe what happened on the wire; `suitebridge-resilience`
//! decides what it means.

use std::time::Duration;

use thiserror::Error;

/// Transport-level failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// The call exceeded its deadline.
    Timeout,
    /// Connection could not be established or was reset.
    Connect,
    /// Any other transport failure (TLS, body decode, ...).
    Other,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendFailure {
    /// Non-success HTTP response from the scripted search protocol.
    #[error("HTTP {status}{}: {message}", format_code(.code))]
    Http {
        status: u16,
        code: Option<String>,
        message: String,
        retry_after: Option<Duration>,
    },

    /// Fault returned in the body of an XML-record or scripted response.
    #[error("fault {code}: {message}")]
    Fault { code: String, message: String },

    /// The request never produced a backend response.
    #[error("transport failure ({kind:?}): {message}")]
    Transport { kind: TransportKind, message: String },
}

fn format_code(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default()
}

impl BackendFailure {
    pub fn fault(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fault {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Transport {
            kind: TransportKind::Timeout,
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::Transport {
            kind: TransportKind::Connect,
            message: message.into(),
        }
    }
}
