// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the core.
//!
//! Backend protocols, custom-field resolution, and the diagnostic sink are all
//! injected through these seams so each component can be tested against stubs.

pub mod backend;
pub mod diagnostics;

pub use backend::{
    Criterion, CustomFieldResolver, FetchBatch, FieldFetcher, SearchBackend, SearchOperator,
    SearchPage, SearchRequest, SortSpec, StaticCustomFieldResolver,
};
pub use diagnostics::{DiagnosticEvent, DiagnosticSink, TracingSink, register_metrics};
