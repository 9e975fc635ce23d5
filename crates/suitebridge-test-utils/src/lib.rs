// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Suitebridge integration tests.
//!
//! Provides [`MockBackend`], an in-memory implementation of the search and
//! field-fetch protocols with call counters and fault injection, and
//! [`RecordingSink`], a diagnostic sink that keeps every event for assertions.

pub mod mock_backend;
pub mod recording_sink;

pub use mock_backend::{Call, MockBackend, customer_record};
pub use recording_sink::RecordingSink;
