// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batching and caching service for Suitebridge field fetches.
//!
//! [`BatchFetcher`] serves identities from the [`FieldCache`] when a fresh
//! entry exists for the exact field set, coalesces concurrent requests for the
//! same missing entry, and sends the rest to the backend in bounded groups
//! under a shared [`ConcurrencyLimit`].

pub mod cache;
pub mod fetcher;
pub mod limit;

pub use cache::{CacheKey, FieldCache};
pub use fetcher::{BatchFetcher, BatchSettings, BatchTransform, FetchOutcome};
pub use limit::ConcurrencyLimit;
