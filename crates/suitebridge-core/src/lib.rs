// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Suitebridge.
//!
//! This crate provides the error taxonomy, identity and record types, and the
//! collaborator traits shared by the query, mapping, search, batching, and
//! resilience crates. Protocol adapters implement the traits defined here.

pub mod error;
pub mod failure;
pub mod record;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ErrorKind, SuitebridgeError, Violation};
pub use failure::{BackendFailure, TransportKind};
pub use record::{DomainRecord, DomainValue, WireFragment, WirePatch, WireRecord};
pub use types::{Credentials, FieldSet, Page, PageToken, RecordId, RecordType, SortDirection};

pub use traits::{
    CustomFieldResolver, DiagnosticEvent, DiagnosticSink, FieldFetcher, SearchBackend,
    TracingSink,
};
