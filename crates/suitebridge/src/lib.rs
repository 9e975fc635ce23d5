// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Suitebridge: uniform, paginated record access over a NetSuite-style backend.
//!
//! [`RecordService`] wires the query, mapping, search, batching and
//! resilience crates together behind the four caller-facing operations.

pub mod service;
pub mod telemetry;

pub use service::{Maintenance, RecordService, RecordServiceBuilder};
pub use telemetry::init_tracing;

pub use suitebridge_batch::FetchOutcome;
pub use suitebridge_config::SuitebridgeConfig;
pub use suitebridge_core::{
    Credentials, DomainRecord, DomainValue, ErrorKind, FieldSet, Page, PageToken, RecordId,
    RecordType, SuitebridgeError, WireFragment, WirePatch, WireRecord,
};
pub use suitebridge_query::{QuerySpec, QuerySpecBuilder};
