// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error translation and retry for Suitebridge backend calls.
//!
//! [`classify`] turns a raw [`BackendFailure`](suitebridge_core::BackendFailure)
//! into a typed error plus a [`RetryClass`]. [`ErrorTranslator::call`] wraps a
//! backend call with a per-call timeout and bounded exponential backoff:
//! rate limits and connect failures are always retried, faults and timeouts
//! only for idempotent reads, everything else propagates immediately.

pub mod classify;
pub mod retry;

pub use classify::{Classified, Operation, RetryClass, classify};
pub use retry::{ErrorTranslator, RetryPolicy};
