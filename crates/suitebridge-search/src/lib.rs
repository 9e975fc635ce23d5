// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search and pagination controller for Suitebridge.
//!
//! A first request (no page token) opens a backend search and, when more pages
//! remain, registers a continuation keyed by the backend search id. Later
//! requests present that id as an opaque page token and are served strictly
//! in page order. Expired or unknown continuations surface as
//! [`StaleContinuation`](suitebridge_core::SuitebridgeError::StaleContinuation);
//! iteration is never silently restarted.

pub mod continuation;
pub mod controller;
pub mod criteria;

pub use continuation::{Checkout, ContinuationRegistry, ContinuationState, SearchContinuation};
pub use controller::SearchController;
pub use criteria::{build_criteria, search_request};
