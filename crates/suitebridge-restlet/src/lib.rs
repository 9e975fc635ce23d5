// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RESTlet backend adapter for Suitebridge.
//!
//! Implements [`SearchBackend`](suitebridge_core::SearchBackend) and
//! [`FieldFetcher`](suitebridge_core::FieldFetcher) by POSTing JSON actions
//! (`search`, `searchMore`, `fetchFields`) to a deployed search script.
//! Failures are reported as raw [`BackendFailure`](suitebridge_core::BackendFailure)s;
//! classification and retry happen in `suitebridge-resilience`.

pub mod client;
pub mod types;

pub use client::{RestletClient, endpoint_url};
